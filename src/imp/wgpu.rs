// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The wgpu backend.

Creation calls map directly onto `wgpu::Device`.  Draws are collected between
[Device::begin_frame] and [Device::end_frame], then encoded into a single render pass that clears
and draws into the view given to [WgpuDevice::set_target].

wgpu reports shader and pipeline validation failures through the device's uncaptured error
handler, not through the return values here.
*/

mod pipeline;
mod sampler;

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
use wgpu::{LoadOp, Operations, StoreOp};

struct Texture {
    //kept alive for the view
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

#[derive(Default)]
struct State {
    next_id: u64,
    buffers: HashMap<u64, wgpu::Buffer>,
    textures: HashMap<u64, Texture>,
    samplers: HashMap<u64, wgpu::Sampler>,
    layouts: HashMap<u64, wgpu::BindGroupLayout>,
    pipelines: HashMap<u64, wgpu::RenderPipeline>,
    sets: HashMap<u64, wgpu::BindGroup>,
    target: Option<wgpu::TextureView>,
    frame_open: bool,
    draws: Vec<DrawCall>,
}

impl State {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [Device] backed by wgpu.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    state: Mutex<State>,
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("target_format", &self.target_format)
            .finish()
    }
}

fn buffer_usages(usage: GPUBufferUsage) -> wgpu::BufferUsages {
    let base = wgpu::BufferUsages::COPY_DST;
    match usage {
        GPUBufferUsage::VertexShaderRead
        | GPUBufferUsage::FragmentShaderRead
        | GPUBufferUsage::VertexAndFragmentShaderRead => base | wgpu::BufferUsages::UNIFORM,
        GPUBufferUsage::VertexBuffer => base | wgpu::BufferUsages::VERTEX,
        GPUBufferUsage::Index => base | wgpu::BufferUsages::INDEX,
        GPUBufferUsage::VertexAndIndex => {
            base | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::INDEX
        }
    }
}

impl WgpuDevice {
    /// Wraps an existing device.  Pipelines render into `target_format`.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, target_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            target_format,
            clear_color: wgpu::Color::TRANSPARENT,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Where the next [Device::end_frame] renders.
    pub fn set_target(&self, view: wgpu::TextureView) {
        self.state.lock().unwrap().target = Some(view);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl Device for WgpuDevice {
    fn create_buffer(
        &self,
        size: u64,
        usage: GPUBufferUsage,
        debug_name: &str,
    ) -> Result<BufferHandle, DeviceError> {
        if size == 0 {
            return Err(DeviceError::Rejected("zero-sized buffer".to_owned()));
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(debug_name),
            size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            usage: buffer_usages(usage),
            mapped_at_creation: false,
        });
        let mut state = self.state.lock().unwrap();
        let id = state.next();
        state.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn update_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let state = self.state.lock().unwrap();
        let stored = state
            .buffers
            .get(&buffer.0)
            .ok_or(DeviceError::UnknownHandle(buffer.0))?;
        let len = bytes.len() as u64;
        if offset + len > stored.size() {
            return Err(DeviceError::OutOfBounds {
                offset,
                len,
                capacity: stored.size(),
            });
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(DeviceError::Rejected(format!(
                "unaligned write of {len} bytes at {offset}"
            )));
        }
        self.queue.write_buffer(stored, offset, bytes);
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
        let size = wgpu::Extent3d {
            width: description.width,
            height: description.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&description.debug_name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(description.width * 4),
                rows_per_image: Some(description.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut state = self.state.lock().unwrap();
        let id = state.next();
        state.textures.insert(
            id,
            Texture {
                _texture: texture,
                view,
            },
        );
        Ok(TextureHandle(id))
    }

    fn create_sampler(&self, sampler_type: SamplerType) -> Result<SamplerHandle, DeviceError> {
        let sampler = sampler::create_sampler(&self.device, sampler_type);
        let mut state = self.state.lock().unwrap();
        let id = state.next();
        state.samplers.insert(id, sampler);
        Ok(SamplerHandle(id))
    }

    fn create_pipeline(
        &self,
        description: &PipelineDescription<'_>,
    ) -> Result<PipelineHandle, DeviceError> {
        if !description.topology.is_supported() {
            return Err(DeviceError::Rejected(format!(
                "unsupported topology {:?}",
                description.topology
            )));
        }
        let mut state = self.state.lock().unwrap();
        let layout = state
            .layouts
            .get(&description.layout.0)
            .ok_or(DeviceError::UnknownHandle(description.layout.0))?;
        let pipeline =
            pipeline::create_pipeline(&self.device, description, layout, self.target_format);
        logwise::info_sync!(
            "created render pipeline {label}",
            label = logwise::privacy::LogIt(description.label)
        );
        let id = state.next();
        state.pipelines.insert(id, pipeline);
        Ok(PipelineHandle(id))
    }

    fn create_binding_layout(&self, entries: &[LayoutEntry]) -> Result<LayoutHandle, DeviceError> {
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &pipeline::layout_entries(entries),
            });
        let mut state = self.state.lock().unwrap();
        let id = state.next();
        state.layouts.insert(id, layout);
        Ok(LayoutHandle(id))
    }

    fn create_binding_set(
        &self,
        layout: LayoutHandle,
        resources: &[BoundResource],
    ) -> Result<SetHandle, DeviceError> {
        let mut state = self.state.lock().unwrap();
        let bind_group_layout = state
            .layouts
            .get(&layout.0)
            .ok_or(DeviceError::UnknownHandle(layout.0))?;
        let mut entries = Vec::with_capacity(resources.len());
        for (binding, resource) in resources.iter().enumerate() {
            let resource = match resource {
                BoundResource::Buffer(b) => state
                    .buffers
                    .get(&b.0)
                    .ok_or(DeviceError::UnknownHandle(b.0))?
                    .as_entire_binding(),
                BoundResource::Texture(t) => wgpu::BindingResource::TextureView(
                    &state
                        .textures
                        .get(&t.0)
                        .ok_or(DeviceError::UnknownHandle(t.0))?
                        .view,
                ),
                BoundResource::Sampler(s) => wgpu::BindingResource::Sampler(
                    state
                        .samplers
                        .get(&s.0)
                        .ok_or(DeviceError::UnknownHandle(s.0))?,
                ),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding as u32,
                resource,
            });
        }
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: bind_group_layout,
            entries: &entries,
        });
        drop(entries);
        let id = state.next();
        state.sets.insert(id, group);
        Ok(SetHandle(id))
    }

    fn record_draw(&self, draw: &DrawCall) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.frame_open {
            return Err(DeviceError::Rejected(
                "draw recorded outside a frame".to_owned(),
            ));
        }
        if !state.pipelines.contains_key(&draw.pipeline.0) {
            return Err(DeviceError::UnknownHandle(draw.pipeline.0));
        }
        state.draws.push(draw.clone());
        Ok(())
    }

    fn release(&self, object: DeviceObject) {
        let mut state = self.state.lock().unwrap();
        match object {
            DeviceObject::Buffer(h) => {
                if let Some(b) = state.buffers.remove(&h.0) {
                    b.destroy();
                }
            }
            DeviceObject::Texture(h) => {
                state.textures.remove(&h.0);
            }
            DeviceObject::Sampler(h) => {
                state.samplers.remove(&h.0);
            }
            DeviceObject::Pipeline(h) => {
                state.pipelines.remove(&h.0);
            }
            DeviceObject::Layout(h) => {
                state.layouts.remove(&h.0);
            }
            DeviceObject::Set(h) => {
                state.sets.remove(&h.0);
            }
        }
    }

    fn begin_frame(&self) {
        let mut state = self.state.lock().unwrap();
        state.frame_open = true;
        state.draws.clear();
    }

    fn end_frame(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if !state.frame_open {
            return Err(DeviceError::Rejected("end_frame without begin_frame".to_owned()));
        }
        state.frame_open = false;
        let draws = std::mem::take(&mut state.draws);
        let Some(target) = state.target.as_ref() else {
            logwise::warn_sync!(
                "end_frame without a target; dropping {count} draws",
                count = draws.len()
            );
            return Ok(());
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shapes frame"),
            });
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shapes render"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        for draw in &draws {
            let (Some(pipeline), Some(vertices), Some(indices)) = (
                state.pipelines.get(&draw.pipeline.0),
                state.buffers.get(&draw.vertex_buffer.0),
                state.buffers.get(&draw.index_buffer.0),
            ) else {
                logwise::warn_sync!("skipping a draw whose objects were released");
                continue;
            };
            render_pass.set_pipeline(pipeline);
            for (group, set) in draw.binding_sets.iter().enumerate() {
                if let Some(bind_group) = state.sets.get(&set.0) {
                    render_pass.set_bind_group(group as u32, bind_group, &[]);
                }
            }
            render_pass.set_vertex_buffer(0, vertices.slice(draw.vertices.clone()));
            render_pass.set_index_buffer(indices.slice(draw.indices.clone()), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
        std::mem::drop(render_pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
