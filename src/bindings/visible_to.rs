//! Resource visibility and usage declarations for GPU resources.
//!
//! These declarations travel with every `create_*` call into a [crate::images::device::Device],
//! so a backend can pick usage flags and memory placement without inspecting the data.
//!
//! # Examples
//!
//! ```
//! use shapes_and_passes::bindings::visible_to::{GPUBufferUsage, TextureUsage};
//!
//! // The packed vertex+index buffer owned by a draw operation
//! let geometry = GPUBufferUsage::VertexAndIndex;
//! assert!(geometry.is_vertex() && geometry.is_index());
//!
//! // A decoded image sampled by the fragment shader
//! let texture_usage = TextureUsage::FragmentShaderSample;
//! # let _ = texture_usage;
//! ```

/// Describes how a texture resource will be used by shaders.
///
/// - **Reading** means direct texel fetch operations
/// - **Sampling** means using a sampler with filtering and wrapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    /// The texture will be read directly (without sampling) in the fragment shader.
    FragmentShaderRead,
    /// The texture will be sampled (with filtering) in fragment shaders.
    ///
    /// This is the usage for decoded images drawn onto shapes.
    FragmentShaderSample,
    /// The texture will be sampled in both vertex and fragment shaders.
    VertexAndFragmentShaderSample,
}

/// Describes how a buffer resource will be used on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GPUBufferUsage {
    /// The buffer is read as uniform data in the vertex shader.
    VertexShaderRead,
    /// The buffer is read as uniform data in the fragment shader.
    FragmentShaderRead,
    /// The buffer is read as uniform data in both stages.
    VertexAndFragmentShaderRead,
    /// The buffer contains vertex attribute data.
    VertexBuffer,
    /// The buffer contains index data for indexed drawing.
    Index,
    /// One allocation holding vertex data followed by index data.
    ///
    /// This is how draw operations store their geometry: one buffer, two logical regions.
    VertexAndIndex,
}

impl GPUBufferUsage {
    pub fn is_vertex(self) -> bool {
        matches!(self, GPUBufferUsage::VertexBuffer | GPUBufferUsage::VertexAndIndex)
    }
    pub fn is_index(self) -> bool {
        matches!(self, GPUBufferUsage::Index | GPUBufferUsage::VertexAndIndex)
    }
    pub fn is_uniform(self) -> bool {
        matches!(
            self,
            GPUBufferUsage::VertexShaderRead
                | GPUBufferUsage::FragmentShaderRead
                | GPUBufferUsage::VertexAndFragmentShaderRead
        )
    }
}
