// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-memory device.

[RecordingDevice] keeps buffer contents in memory, validates handles and bounds the way a real
backend would, and records the draws of each frame instead of executing them.  It counts every
creation, so callers can check what was shared and what was reused.
*/

use crate::bindings::bind_style::BoundResource;
use crate::bindings::layout_builder::LayoutEntry;
use crate::bindings::sampler::SamplerType;
use crate::bindings::visible_to::GPUBufferUsage;
use crate::images::device::{
    BufferHandle, Device, DeviceError, DeviceObject, DrawCall, LayoutHandle, PipelineDescription,
    PipelineHandle, SamplerHandle, SetHandle, TextureDescription, TextureHandle,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct Buffer {
    bytes: Vec<u8>,
    usage: GPUBufferUsage,
}

#[derive(Debug)]
struct Pipeline {
    label: String,
    layout: LayoutHandle,
}

#[derive(Debug)]
struct BindingSet {
    resources: Vec<BoundResource>,
}

/// How many objects of each kind were ever created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationCounts {
    pub buffers: usize,
    pub textures: usize,
    pub samplers: usize,
    pub pipelines: usize,
    pub layouts: usize,
    pub sets: usize,
    pub buffer_writes: usize,
    pub releases: usize,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    buffers: HashMap<u64, Buffer>,
    textures: HashMap<u64, TextureDescription>,
    samplers: HashMap<u64, SamplerType>,
    pipelines: HashMap<u64, Pipeline>,
    layouts: HashMap<u64, Vec<LayoutEntry>>,
    sets: HashMap<u64, BindingSet>,
    counts: CreationCounts,
    fail_next_creation: Option<String>,
    fail_next_write: Option<String>,
    frame_open: bool,
    current: Vec<DrawCall>,
    frames: Vec<Vec<DrawCall>>,
}

impl State {
    fn next(&mut self) -> Result<u64, DeviceError> {
        if let Some(reason) = self.fail_next_creation.take() {
            return Err(DeviceError::Rejected(reason));
        }
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn is_live(&self, resource: &BoundResource) -> bool {
        match resource {
            BoundResource::Buffer(b) => self.buffers.contains_key(&b.0),
            BoundResource::Texture(t) => self.textures.contains_key(&t.0),
            BoundResource::Sampler(s) => self.samplers.contains_key(&s.0),
        }
    }
}

/**
A device that records instead of rendering.

```
use shapes_and_passes::RecordingDevice;
use shapes_and_passes::images::device::Device;
use shapes_and_passes::bindings::visible_to::GPUBufferUsage;

let device = RecordingDevice::new();
let buffer = device.create_buffer(8, GPUBufferUsage::VertexBuffer, "points").unwrap();
device.update_buffer(buffer, 4, &[1, 2, 3, 4]).unwrap();
assert_eq!(device.buffer_contents(buffer).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
assert!(device.update_buffer(buffer, 6, &[0; 4]).is_err());
```
*/
#[derive(Debug, Default)]
pub struct RecordingDevice {
    state: Mutex<State>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next creation call fail with [DeviceError::Rejected].
    pub fn fail_next_creation(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().fail_next_creation = Some(reason.into());
    }

    /// Makes the next [Device::update_buffer] fail with [DeviceError::Rejected], writing nothing.
    pub fn fail_next_write(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().fail_next_write = Some(reason.into());
    }

    pub fn counts(&self) -> CreationCounts {
        self.state.lock().unwrap().counts
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .buffers
            .get(&buffer.0)
            .map(|b| b.bytes.clone())
    }

    pub fn buffer_capacity(&self, buffer: BufferHandle) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .buffers
            .get(&buffer.0)
            .map(|b| b.bytes.len() as u64)
    }

    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<GPUBufferUsage> {
        self.state
            .lock()
            .unwrap()
            .buffers
            .get(&buffer.0)
            .map(|b| b.usage)
    }

    pub fn pipeline_label(&self, pipeline: PipelineHandle) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pipelines
            .get(&pipeline.0)
            .map(|p| p.label.clone())
    }

    pub fn layout_entries(&self, layout: LayoutHandle) -> Option<Vec<LayoutEntry>> {
        self.state.lock().unwrap().layouts.get(&layout.0).cloned()
    }

    pub fn binding_set_resources(&self, set: SetHandle) -> Option<Vec<BoundResource>> {
        self.state
            .lock()
            .unwrap()
            .sets
            .get(&set.0)
            .map(|s| s.resources.clone())
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().unwrap().buffers.len()
    }

    /// Live objects of every kind.
    pub fn live_object_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.buffers.len()
            + state.textures.len()
            + state.samplers.len()
            + state.pipelines.len()
            + state.layouts.len()
            + state.sets.len()
    }

    pub fn is_live(&self, object: DeviceObject) -> bool {
        let state = self.state.lock().unwrap();
        match object {
            DeviceObject::Buffer(h) => state.buffers.contains_key(&h.0),
            DeviceObject::Texture(h) => state.textures.contains_key(&h.0),
            DeviceObject::Sampler(h) => state.samplers.contains_key(&h.0),
            DeviceObject::Pipeline(h) => state.pipelines.contains_key(&h.0),
            DeviceObject::Layout(h) => state.layouts.contains_key(&h.0),
            DeviceObject::Set(h) => state.sets.contains_key(&h.0),
        }
    }

    /// Draws of every completed frame, oldest first.
    pub fn recorded_frames(&self) -> Vec<Vec<DrawCall>> {
        self.state.lock().unwrap().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Vec<DrawCall>> {
        self.state.lock().unwrap().frames.last().cloned()
    }

    /// Draws recorded since the last [Device::begin_frame].
    pub fn pending_draws(&self) -> Vec<DrawCall> {
        self.state.lock().unwrap().current.clone()
    }
}

impl Device for RecordingDevice {
    fn create_buffer(
        &self,
        size: u64,
        usage: GPUBufferUsage,
        _debug_name: &str,
    ) -> Result<BufferHandle, DeviceError> {
        if size == 0 {
            return Err(DeviceError::Rejected("zero-sized buffer".to_owned()));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next()?;
        state.buffers.insert(
            id,
            Buffer {
                bytes: vec![0; size as usize],
                usage,
            },
        );
        state.counts.buffers += 1;
        Ok(BufferHandle(id))
    }

    fn update_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.fail_next_write.take() {
            return Err(DeviceError::Rejected(reason));
        }
        let stored = state
            .buffers
            .get_mut(&buffer.0)
            .ok_or(DeviceError::UnknownHandle(buffer.0))?;
        let capacity = stored.bytes.len() as u64;
        let len = bytes.len() as u64;
        if offset + len > capacity {
            return Err(DeviceError::OutOfBounds {
                offset,
                len,
                capacity,
            });
        }
        stored.bytes[offset as usize..(offset + len) as usize].copy_from_slice(bytes);
        state.counts.buffer_writes += 1;
        Ok(())
    }

    fn create_texture(
        &self,
        description: &TextureDescription,
        rgba: &[u8],
    ) -> Result<TextureHandle, DeviceError> {
        let expected = description.width as usize * description.height as usize * 4;
        if expected == 0 || rgba.len() != expected {
            return Err(DeviceError::Rejected(format!(
                "{}x{} texture needs {expected} bytes, got {}",
                description.width,
                description.height,
                rgba.len()
            )));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next()?;
        state.textures.insert(id, description.clone());
        state.counts.textures += 1;
        Ok(TextureHandle(id))
    }

    fn create_sampler(&self, sampler_type: SamplerType) -> Result<SamplerHandle, DeviceError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next()?;
        state.samplers.insert(id, sampler_type);
        state.counts.samplers += 1;
        Ok(SamplerHandle(id))
    }

    fn create_pipeline(
        &self,
        description: &PipelineDescription<'_>,
    ) -> Result<PipelineHandle, DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.layouts.contains_key(&description.layout.0) {
            return Err(DeviceError::UnknownHandle(description.layout.0));
        }
        if description.vertex_layout.field_count() == 0 {
            return Err(DeviceError::Rejected(format!(
                "pipeline {} has no vertex fields",
                description.label
            )));
        }
        if !description.topology.is_supported() {
            return Err(DeviceError::Rejected(format!(
                "pipeline {} uses unsupported topology {:?}",
                description.label, description.topology
            )));
        }
        let id = state.next()?;
        state.pipelines.insert(
            id,
            Pipeline {
                label: description.label.to_owned(),
                layout: description.layout,
            },
        );
        state.counts.pipelines += 1;
        Ok(PipelineHandle(id))
    }

    fn create_binding_layout(&self, entries: &[LayoutEntry]) -> Result<LayoutHandle, DeviceError> {
        if let Some((i, e)) = entries
            .iter()
            .enumerate()
            .find(|(i, e)| e.slot.index() != *i as u32)
        {
            return Err(DeviceError::Rejected(format!(
                "entry {i} has binding {}",
                e.slot.index()
            )));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next()?;
        state.layouts.insert(id, entries.to_vec());
        state.counts.layouts += 1;
        Ok(LayoutHandle(id))
    }

    fn create_binding_set(
        &self,
        layout: LayoutHandle,
        resources: &[BoundResource],
    ) -> Result<SetHandle, DeviceError> {
        let mut state = self.state.lock().unwrap();
        let entries = state
            .layouts
            .get(&layout.0)
            .ok_or(DeviceError::UnknownHandle(layout.0))?;
        if entries.len() != resources.len() {
            return Err(DeviceError::Rejected(format!(
                "layout has {} bindings, got {} resources",
                entries.len(),
                resources.len()
            )));
        }
        if let Some(entry) = entries
            .iter()
            .zip(resources)
            .find(|(entry, resource)| !entry.description.accepts(resource))
            .map(|(entry, _)| entry)
        {
            return Err(DeviceError::Rejected(format!(
                "binding {} can't hold the resource provided",
                entry.slot.index()
            )));
        }
        if let Some(dead) = resources.iter().find(|r| !state.is_live(r)) {
            return Err(DeviceError::Rejected(format!("{dead:?} is not live")));
        }
        if let Some(BoundResource::Buffer(b)) = resources.iter().find(|r| match r {
            BoundResource::Buffer(b) => !state.buffers[&b.0].usage.is_uniform(),
            _ => false,
        }) {
            return Err(DeviceError::Rejected(format!(
                "buffer {} isn't a uniform buffer",
                b.0
            )));
        }
        let id = state.next()?;
        state.sets.insert(
            id,
            BindingSet {
                resources: resources.to_vec(),
            },
        );
        state.counts.sets += 1;
        Ok(SetHandle(id))
    }

    fn record_draw(&self, draw: &DrawCall) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.frame_open {
            return Err(DeviceError::Rejected(
                "draw recorded outside a frame".to_owned(),
            ));
        }
        let pipeline = state
            .pipelines
            .get(&draw.pipeline.0)
            .ok_or(DeviceError::UnknownHandle(draw.pipeline.0))?;
        if !state.layouts.contains_key(&pipeline.layout.0) {
            return Err(DeviceError::UnknownHandle(pipeline.layout.0));
        }
        if let Some(set) = draw.binding_sets.iter().find(|s| !state.sets.contains_key(&s.0)) {
            return Err(DeviceError::UnknownHandle(set.0));
        }
        for (buffer, range, index) in [
            (draw.vertex_buffer, &draw.vertices, false),
            (draw.index_buffer, &draw.indices, true),
        ] {
            let recorded = state
                .buffers
                .get(&buffer.0)
                .ok_or(DeviceError::UnknownHandle(buffer.0))?;
            let usable = if index {
                recorded.usage.is_index()
            } else {
                recorded.usage.is_vertex()
            };
            if !usable {
                return Err(DeviceError::Rejected(format!(
                    "buffer {} was created for {:?}",
                    buffer.0, recorded.usage
                )));
            }
            let capacity = recorded.bytes.len() as u64;
            if range.end > capacity {
                return Err(DeviceError::OutOfBounds {
                    offset: range.start,
                    len: range.end - range.start,
                    capacity,
                });
            }
        }
        if draw.indices.end - draw.indices.start != draw.index_count as u64 * 4 {
            return Err(DeviceError::Rejected(format!(
                "{} indices don't fill {:?}",
                draw.index_count, draw.indices
            )));
        }
        state.current.push(draw.clone());
        Ok(())
    }

    fn release(&self, object: DeviceObject) {
        let mut state = self.state.lock().unwrap();
        let released = match object {
            DeviceObject::Buffer(h) => state.buffers.remove(&h.0).is_some(),
            DeviceObject::Texture(h) => state.textures.remove(&h.0).is_some(),
            DeviceObject::Sampler(h) => state.samplers.remove(&h.0).is_some(),
            DeviceObject::Pipeline(h) => state.pipelines.remove(&h.0).is_some(),
            DeviceObject::Layout(h) => state.layouts.remove(&h.0).is_some(),
            DeviceObject::Set(h) => state.sets.remove(&h.0).is_some(),
        };
        if released {
            state.counts.releases += 1;
        }
    }

    fn begin_frame(&self) {
        let mut state = self.state.lock().unwrap();
        state.frame_open = true;
        state.current.clear();
    }

    fn end_frame(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.frame_open {
            return Err(DeviceError::Rejected("end_frame without begin_frame".to_owned()));
        }
        state.frame_open = false;
        let frame = std::mem::take(&mut state.current);
        state.frames.push(frame);
        Ok(())
    }
}
