// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The get-or-create primitive shared by both cache tiers.

A [LazySlot] is either empty or holds an `Arc<T>`.  Creation runs while the slot's lock is held, so
concurrent first accesses serialize: exactly one caller runs the factory and everyone else observes
its result.  A factory that fails leaves the slot empty, so a later call can try again.
*/

use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct LazySlot<T> {
    value: Mutex<Option<Arc<T>>>,
}

impl<T> Default for LazySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazySlot<T> {
    pub const fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Returns the value, running `create` first if the slot is empty.
    pub fn get_or_try_init<E>(&self, create: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut guard = self.value.lock().unwrap();
        if let Some(value) = guard.as_ref() {
            return Ok(value.clone());
        }
        let value = Arc::new(create()?);
        *guard = Some(value.clone());
        Ok(value)
    }

    /// The value, if it has been created.
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.lock().unwrap().clone()
    }

    /// Empties the slot, returning what it held.
    pub fn take(&self) -> Option<Arc<T>> {
        self.value.lock().unwrap().take()
    }

    pub fn is_initialized(&self) -> bool {
        self.value.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::LazySlot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn failure_leaves_slot_empty() {
        let slot = LazySlot::<u32>::new();
        let r: Result<_, &str> = slot.get_or_try_init(|| Err("nope"));
        assert!(r.is_err());
        assert!(!slot.is_initialized());
        let v = slot.get_or_try_init(|| Ok::<_, &str>(4)).unwrap();
        assert_eq!(*v, 4);
        //second factory never runs
        let v = slot.get_or_try_init(|| Ok::<_, &str>(5)).unwrap();
        assert_eq!(*v, 4);
    }

    #[test]
    fn concurrent_first_access_creates_once() {
        let slot = LazySlot::<usize>::new();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    let v = slot
                        .get_or_try_init(|| {
                            Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) + 100)
                        })
                        .unwrap();
                    assert_eq!(*v, 100);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_resets() {
        let slot = LazySlot::<u8>::new();
        slot.get_or_try_init(|| Ok::<_, ()>(1)).unwrap();
        assert_eq!(slot.take().as_deref(), Some(&1));
        assert!(slot.get().is_none());
    }
}
