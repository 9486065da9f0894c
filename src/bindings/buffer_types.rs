/*! Defines types for use in buffers.
*/

/**
Marker for types that can be uploaded to the GPU as raw bytes.

# Safety

Implementors must be `#[repr(C)]` (or `#[repr(transparent)]` over such a type), contain
no padding and no uninitialized bytes, and be valid for any bit pattern the GPU might write back.
*/
pub unsafe trait CRepr: Copy + 'static {}

unsafe impl CRepr for f32 {}
unsafe impl CRepr for u32 {}
unsafe impl CRepr for u16 {}
unsafe impl CRepr for [f32; 2] {}
unsafe impl CRepr for [f32; 4] {}
unsafe impl CRepr for [[f32; 4]; 4] {}

/// Views a slice of [CRepr] elements as bytes.
pub fn as_bytes<T: CRepr>(t: &[T]) -> &[u8] {
    //safe because CRepr guarantees no padding or uninitialized bytes
    unsafe { std::slice::from_raw_parts(t.as_ptr() as *const u8, std::mem::size_of_val(t)) }
}

/// Views a single [CRepr] value as bytes.
pub fn value_as_bytes<T: CRepr>(t: &T) -> &[u8] {
    as_bytes(std::slice::from_ref(t))
}

#[cfg(test)]
mod tests {
    use super::{as_bytes, value_as_bytes};

    #[test]
    fn byte_views() {
        let v = [1.0f32, 2.0];
        let bytes = as_bytes(&v);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(value_as_bytes(&7u32), &7u32.to_ne_bytes());
    }
}
