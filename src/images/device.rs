// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Cross-platform device abstraction.
//!
//! Everything above this module talks to the GPU through [Device]: it creates buffers, textures,
//! samplers, pipelines and binding objects, writes buffer contents, and records draws.  Handles are
//! opaque `Copy` values; what they point to is up to the backend (see [crate::RecordingDevice],
//! and `WgpuDevice` behind the `backend_wgpu` feature).
//!
//! The trait is object-safe and is always used as `&dyn Device`, so the cache, the layout builder
//! and draw operations don't need to be generic over the backend.

use crate::bindings::bind_style::BoundResource;
use crate::bindings::layout_builder::LayoutEntry;
use crate::bindings::sampler::SamplerType;
use crate::bindings::visible_to::{GPUBufferUsage, TextureUsage};
use crate::images::index_algorithms::Topology;
use crate::images::vertex_layout::VertexLayout;
use std::ops::Range;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);
        impl $name {
            /// Raw backend identifier, for diagnostics.
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle!(
    /// A device buffer.
    BufferHandle
);
handle!(
    /// A device texture.
    TextureHandle
);
handle!(
    /// A device sampler.
    SamplerHandle
);
handle!(
    /// A compiled render pipeline.
    PipelineHandle
);
handle!(
    /// A binding layout (the ordered slot description a pipeline expects).
    LayoutHandle
);
handle!(
    /// A binding set: concrete resources bound against a [LayoutHandle].
    SetHandle
);

/// Any device object, for [Device::release].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceObject {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Sampler(SamplerHandle),
    Pipeline(PipelineHandle),
    Layout(LayoutHandle),
    Set(SetHandle),
}

/// Describes a 2D RGBA8 texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescription {
    pub width: u32,
    pub height: u32,
    pub usage: TextureUsage,
    pub debug_name: String,
}

/// Everything a backend needs to build a render pipeline.
#[derive(Debug, Clone)]
pub struct PipelineDescription<'a> {
    pub label: &'a str,
    pub vertex_wgsl: &'a str,
    pub fragment_wgsl: &'a str,
    pub vertex_layout: &'a VertexLayout,
    pub topology: Topology,
    pub layout: LayoutHandle,
    pub alpha: bool,
}

/// A single indexed draw against a packed geometry buffer.
///
/// `vertices` and `indices` are byte ranges into their respective buffers; for draw operations both
/// buffers are the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub index_count: u32,
    pub vertex_buffer: BufferHandle,
    pub vertices: Range<u64>,
    pub index_buffer: BufferHandle,
    pub indices: Range<u64>,
    pub pipeline: PipelineHandle,
    pub binding_sets: Vec<SetHandle>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DeviceError {
    #[error("no live device object with id {0}")]
    UnknownHandle(u64),
    #[error("write of {len} bytes at offset {offset} exceeds buffer capacity {capacity}")]
    OutOfBounds { offset: u64, len: u64, capacity: u64 },
    #[error("device rejected the request: {0}")]
    Rejected(String),
}

/// The GPU backend as seen by the rest of the crate.
///
/// Creation calls may be made from any thread; recording calls are expected from the rendering
/// thread between [Device::begin_frame] and [Device::end_frame].
pub trait Device: Send + Sync {
    fn create_buffer(
        &self,
        size: u64,
        usage: GPUBufferUsage,
        debug_name: &str,
    ) -> Result<BufferHandle, DeviceError>;

    fn update_buffer(&self, buffer: BufferHandle, offset: u64, bytes: &[u8])
    -> Result<(), DeviceError>;

    /// Creates a texture initialized with tightly packed RGBA8 texels.
    fn create_texture(
        &self,
        description: &TextureDescription,
        rgba: &[u8],
    ) -> Result<TextureHandle, DeviceError>;

    fn create_sampler(&self, sampler_type: SamplerType) -> Result<SamplerHandle, DeviceError>;

    fn create_pipeline(
        &self,
        description: &PipelineDescription<'_>,
    ) -> Result<PipelineHandle, DeviceError>;

    /// `entries` arrive sorted by binding index, which is contiguous from 0.
    fn create_binding_layout(&self, entries: &[LayoutEntry]) -> Result<LayoutHandle, DeviceError>;

    /// `resources[i]` is bound to binding `i` of `layout`.
    fn create_binding_set(
        &self,
        layout: LayoutHandle,
        resources: &[BoundResource],
    ) -> Result<SetHandle, DeviceError>;

    fn record_draw(&self, draw: &DrawCall) -> Result<(), DeviceError>;

    /// Releases a device object.  Releasing an unknown handle is ignored.
    fn release(&self, object: DeviceObject);

    fn begin_frame(&self) {}

    /// Submits everything recorded since [Device::begin_frame].
    fn end_frame(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}
