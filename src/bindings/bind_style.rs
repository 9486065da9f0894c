// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Describes individual resource bindings.
//!
//! A binding is two things: a *description* of the shader-visible slot (what kind of resource, which
//! stages can see it) and the *resource* that fills the slot for a particular draw.  The
//! description is what a binding layout is made of; the resources are what a binding set is made of.
//!
//! Slot numbers are not chosen here.  [crate::bindings::layout_builder::ResourceLayoutBuilder]
//! assigns them when it builds, from the relative positions elements were inserted at.
//!
//! # Example
//!
//! ```
//! use shapes_and_passes::bindings::bind_style::{BindingDescription, BindingKind, Stage};
//!
//! let uniforms = BindingDescription::new("uniforms", BindingKind::UniformBuffer, Stage::VertexAndFragment);
//! let image = BindingDescription::new("image", BindingKind::Texture, Stage::Fragment);
//! assert!(uniforms.stage.includes_vertex());
//! assert!(!image.stage.includes_vertex());
//! ```

use crate::images::device::{BufferHandle, SamplerHandle, TextureHandle};

/// Specifies which shader stages can see a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Resource will be bound to fragment (pixel) shaders.
    Fragment,
    /// Resource will be bound to vertex shaders.
    Vertex,
    /// Resource will be visible to both stages.
    VertexAndFragment,
}

impl Stage {
    pub fn includes_vertex(self) -> bool {
        matches!(self, Stage::Vertex | Stage::VertexAndFragment)
    }
    pub fn includes_fragment(self) -> bool {
        matches!(self, Stage::Fragment | Stage::VertexAndFragment)
    }
}

/// The kind of resource a slot expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    UniformBuffer,
    StorageBuffer { read_only: bool },
    /// A filterable 2D float texture.
    Texture,
    /// A filtering sampler.
    Sampler,
}

/// The shader-visible description of one slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingDescription {
    /// Used for debug labels only.
    pub name: String,
    pub kind: BindingKind,
    pub stage: Stage,
}

impl BindingDescription {
    pub fn new(name: impl Into<String>, kind: BindingKind, stage: Stage) -> Self {
        Self {
            name: name.into(),
            kind,
            stage,
        }
    }

    /// Whether `resource` can fill a slot of this description.
    pub fn accepts(&self, resource: &BoundResource) -> bool {
        matches!(
            (self.kind, resource),
            (BindingKind::UniformBuffer, BoundResource::Buffer(_))
                | (BindingKind::StorageBuffer { .. }, BoundResource::Buffer(_))
                | (BindingKind::Texture, BoundResource::Texture(_))
                | (BindingKind::Sampler, BoundResource::Sampler(_))
        )
    }
}

/// A concrete resource bound into a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundResource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Sampler(SamplerHandle),
}

/// Represents a final, renumbered binding slot.
///
/// Binding slots correspond to `@binding(n)` in the shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindSlot {
    pub(crate) pass_index: u32,
}

impl BindSlot {
    pub fn new(pass_index: u32) -> Self {
        Self { pass_index }
    }
    pub fn index(self) -> u32 {
        self.pass_index
    }
}
