// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Assembles an ordered, renumbered binding layout.
//!
//! Elements are inserted with a relative `position`.  Positions are only used for ordering: they
//! need not start at zero or be contiguous.  Final slot numbers are assigned by
//! [ResourceLayoutBuilder::build], which stably sorts by position and numbers the result `0..n`.
//!
//! ```
//! use shapes_and_passes::bindings::bind_style::{BindingDescription, BindingKind, BoundResource, Stage};
//! use shapes_and_passes::bindings::layout_builder::{LayoutElement, ResourceLayoutBuilder};
//! # use shapes_and_passes::RecordingDevice;
//! # use shapes_and_passes::images::device::Device;
//! # use shapes_and_passes::bindings::visible_to::GPUBufferUsage;
//! # use shapes_and_passes::bindings::sampler::SamplerType;
//! # let device = RecordingDevice::new();
//! # let uniforms = device.create_buffer(64, GPUBufferUsage::VertexShaderRead, "uniforms").unwrap();
//! # let sampler = device.create_sampler(SamplerType::Mipmapped).unwrap();
//!
//! let builder = ResourceLayoutBuilder::new();
//! builder.insert_last(LayoutElement::new(
//!     BindingDescription::new("sampler", BindingKind::Sampler, Stage::Fragment),
//!     BoundResource::Sampler(sampler),
//! )).unwrap();
//! builder.insert_first(LayoutElement::new(
//!     BindingDescription::new("uniforms", BindingKind::UniformBuffer, Stage::Vertex),
//!     BoundResource::Buffer(uniforms),
//! )).unwrap();
//! let built = builder.build(|entries| device.create_binding_layout(entries)).unwrap();
//! assert_eq!(built.resources[0], BoundResource::Buffer(uniforms));
//! assert_eq!(built.entries[1].slot.index(), 1);
//! ```

use crate::bindings::bind_style::{BindSlot, BindingDescription, BoundResource};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutError {
    /// Making room next to `position` would step outside the `i32` range.
    #[error("no room for another element next to position {position}")]
    PositionOverflow { position: i32 },
}

/// One binding plus its relative position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutElement {
    pub description: BindingDescription,
    pub resource: BoundResource,
    /// Relative ordering key; not a slot number.
    pub position: i32,
}

impl LayoutElement {
    pub fn new(description: BindingDescription, resource: BoundResource) -> Self {
        Self::at(description, resource, 0)
    }

    pub fn at(description: BindingDescription, resource: BoundResource, position: i32) -> Self {
        debug_assert!(
            description.accepts(&resource),
            "{:?} can't hold {:?}",
            description.kind,
            resource
        );
        Self {
            description,
            resource,
            position,
        }
    }
}

/// A renumbered slot, as handed to [crate::images::device::Device::create_binding_layout].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutEntry {
    pub slot: BindSlot,
    pub description: BindingDescription,
}

/// Output of [ResourceLayoutBuilder::build].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLayout<L> {
    /// Whatever the build factory produced, typically a layout handle.
    pub layout: L,
    /// `resources[i]` belongs in slot `i`.
    pub resources: Vec<BoundResource>,
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug)]
struct BuilderState {
    elements: Vec<LayoutElement>,
    //extremes, always including 0
    first_pos: i32,
    last_pos: i32,
}

impl BuilderState {
    fn push(&mut self, element: LayoutElement) {
        self.first_pos = self.first_pos.min(element.position);
        self.last_pos = self.last_pos.max(element.position);
        self.elements.push(element);
    }

    fn refresh_extremes(&mut self) {
        let (first, last) = self
            .elements
            .iter()
            .fold((0, 0), |(lo, hi), e| (lo.min(e.position), hi.max(e.position)));
        self.first_pos = first;
        self.last_pos = last;
    }
}

/**
Builds a binding layout from elements inserted in arbitrary order.

Every operation takes a single internal lock; [Self::build] holds it for its whole duration, so no
insertion can interleave with a build.
*/
#[derive(Debug)]
pub struct ResourceLayoutBuilder {
    state: Mutex<BuilderState>,
}

impl Default for ResourceLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLayoutBuilder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BuilderState {
                elements: Vec::new(),
                first_pos: 0,
                last_pos: 0,
            }),
        }
    }

    /// Places `element` before every element currently in the builder.  Returns the assigned position.
    pub fn insert_first(&self, mut element: LayoutElement) -> Result<i32, LayoutError> {
        let mut state = self.state.lock().unwrap();
        element.position = state
            .first_pos
            .checked_sub(1)
            .ok_or(LayoutError::PositionOverflow {
                position: state.first_pos,
            })?;
        let position = element.position;
        state.push(element);
        Ok(position)
    }

    /// Places `element` after every element currently in the builder.  Returns the assigned position.
    pub fn insert_last(&self, mut element: LayoutElement) -> Result<i32, LayoutError> {
        let mut state = self.state.lock().unwrap();
        element.position = state
            .last_pos
            .checked_add(1)
            .ok_or(LayoutError::PositionOverflow {
                position: state.last_pos,
            })?;
        let position = element.position;
        state.push(element);
        Ok(position)
    }

    /**
    Places `element` after every element below `position` and before every element at or above it.

    Of the two groups, the smaller one makes room: either every element at or above `position`
    moves up by one and the new element takes `position`, or every element below it moves down by
    one and the new element takes `position - 1`.  An empty group moves nothing.

    Returns how many existing elements were moved, `min(before, after)`.  Fails without changing
    anything when a moved position would overflow.
    */
    pub fn insert(&self, mut element: LayoutElement, position: i32) -> Result<usize, LayoutError> {
        let mut state = self.state.lock().unwrap();
        let before = state
            .elements
            .iter()
            .filter(|e| e.position < position)
            .count();
        let after = state.elements.len() - before;
        let overflow = LayoutError::PositionOverflow { position };
        let moved = if after <= before {
            if after > 0 && state.last_pos == i32::MAX {
                return Err(overflow);
            }
            for e in state.elements.iter_mut().filter(|e| e.position >= position) {
                e.position += 1;
            }
            element.position = position;
            after
        } else {
            if position == i32::MIN || (before > 0 && state.first_pos == i32::MIN) {
                return Err(overflow);
            }
            for e in state.elements.iter_mut().filter(|e| e.position < position) {
                e.position -= 1;
            }
            element.position = position - 1;
            before
        };
        logwise::trace_sync!(
            "layout insert at {position} moved {moved} elements",
            position = position,
            moved = moved
        );
        state.push(element);
        state.refresh_extremes();
        Ok(moved)
    }

    /// Adds `element` at `position` without moving anything.  Ties are left to [Self::build].
    pub fn add(&self, mut element: LayoutElement, position: i32) {
        element.position = position;
        self.state.lock().unwrap().push(element);
    }

    /// Adds `element` at its own [LayoutElement::position] without moving anything.
    pub fn add_entry(&self, element: LayoutElement) {
        self.state.lock().unwrap().push(element);
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current `(first_pos, last_pos)`.  `first_pos <= 0 <= last_pos` always holds.
    pub fn extremes(&self) -> (i32, i32) {
        let state = self.state.lock().unwrap();
        (state.first_pos, state.last_pos)
    }

    /// Positions in build order.
    pub fn positions(&self) -> Vec<i32> {
        let state = self.state.lock().unwrap();
        let mut positions: Vec<i32> = state.elements.iter().map(|e| e.position).collect();
        positions.sort();
        positions
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.elements.clear();
        state.first_pos = 0;
        state.last_pos = 0;
    }

    /**
    Orders the elements and hands the renumbered entries to `factory`.

    This is the only operation that reaches the device (through `factory`).  Equal positions keep
    their insertion order.
    */
    pub fn build<L, E>(
        &self,
        factory: impl FnOnce(&[LayoutEntry]) -> Result<L, E>,
    ) -> Result<BuiltLayout<L>, E> {
        let state = self.state.lock().unwrap();
        let mut ordered: Vec<&LayoutElement> = state.elements.iter().collect();
        //sort_by_key is stable
        ordered.sort_by_key(|e| e.position);
        let entries: Vec<LayoutEntry> = ordered
            .iter()
            .enumerate()
            .map(|(i, e)| LayoutEntry {
                slot: BindSlot::new(i as u32),
                description: e.description.clone(),
            })
            .collect();
        let resources = ordered.iter().map(|e| e.resource).collect();
        let layout = factory(&entries)?;
        Ok(BuiltLayout {
            layout,
            resources,
            entries,
        })
    }
}
