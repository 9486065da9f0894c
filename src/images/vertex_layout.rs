// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Vertex buffer layout descriptions.
//!
//! Every vertex generator publishes a [VertexLayout] describing the attributes of the vertices it
//! writes, in memory order.  Backends turn it into vertex attributes at `shader_location` 0, 1, …
//!
//! # Example
//!
//! ```
//! use shapes_and_passes::images::vertex_layout::{VertexLayout, VertexFieldType};
//!
//! // position followed by texture coordinates
//! let mut layout = VertexLayout::new();
//! layout.add_field("position", VertexFieldType::F32x2);
//! layout.add_field("uv", VertexFieldType::F32x2);
//! assert_eq!(layout.element_stride(), 16);
//! ```

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub(crate) fields: Vec<VertexField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VertexField {
    pub(crate) name: &'static str,
    pub(crate) r#type: VertexFieldType,
}

/// Specifies the data type of a vertex attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VertexFieldType {
    /// A 32-bit floating point value.
    F32,
    /// Two 32-bit floats, e.g. a 2D position.
    F32x2,
    /// Four 32-bit floats, e.g. an RGBA color.
    F32x4,
}

impl VertexFieldType {
    pub(crate) fn stride(&self) -> usize {
        match self {
            VertexFieldType::F32 => 4,
            VertexFieldType::F32x2 => 8,
            VertexFieldType::F32x4 => 16,
        }
    }
}

impl VertexLayout {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field.  Fields are added in the order they appear in memory.
    pub fn add_field(&mut self, name: &'static str, r#type: VertexFieldType) {
        self.fields.push(VertexField { name, r#type });
    }

    /// Bytes per vertex.
    pub fn element_stride(&self) -> usize {
        self.fields.iter().map(|e| e.r#type.stride()).sum()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field names in memory order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Byte offset of each field, in memory order.
    pub fn field_offsets(&self) -> impl Iterator<Item = (usize, VertexFieldType)> + '_ {
        self.fields.iter().scan(0, |offset, f| {
            let this = *offset;
            *offset += f.r#type.stride();
            Some((this, f.r#type))
        })
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::new()
    }
}
