// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Translates layouts and pipeline descriptions into wgpu objects.

use crate::bindings::bind_style::{BindingKind, Stage};
use crate::bindings::layout_builder::LayoutEntry;
use crate::images::device::PipelineDescription;
use crate::images::index_algorithms::Topology;
use crate::images::vertex_layout::VertexFieldType;
use wgpu::{
    BindGroupLayoutEntry, BindingType, BlendState, BufferBindingType, ColorTargetState,
    MultisampleState, PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology,
    RenderPipelineDescriptor, SamplerBindingType, ShaderStages, TextureFormat, TextureSampleType,
    TextureViewDimension, VertexAttribute, VertexBufferLayout, VertexState, VertexStepMode,
};

fn visibility(stage: Stage) -> ShaderStages {
    match stage {
        Stage::Fragment => ShaderStages::FRAGMENT,
        Stage::Vertex => ShaderStages::VERTEX,
        Stage::VertexAndFragment => ShaderStages::VERTEX_FRAGMENT,
    }
}

pub(super) fn layout_entries(entries: &[LayoutEntry]) -> Vec<BindGroupLayoutEntry> {
    entries
        .iter()
        .map(|entry| {
            let ty = match entry.description.kind {
                BindingKind::UniformBuffer => BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindingKind::StorageBuffer { read_only } => BindingType::Buffer {
                    ty: BufferBindingType::Storage { read_only },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindingKind::Texture => BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                BindingKind::Sampler => BindingType::Sampler(SamplerBindingType::Filtering),
            };
            BindGroupLayoutEntry {
                binding: entry.slot.index(),
                visibility: visibility(entry.description.stage),
                ty,
                count: None,
            }
        })
        .collect()
}

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    description: &PipelineDescription<'_>,
    bind_group_layout: &wgpu::BindGroupLayout,
    target_format: TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(description.label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(description.label),
        source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(description.vertex_wgsl)),
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(description.label),
        source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(description.fragment_wgsl)),
    });

    let attributes: Vec<VertexAttribute> = description
        .vertex_layout
        .field_offsets()
        .enumerate()
        .map(|(f, (offset, r#type))| VertexAttribute {
            format: match r#type {
                VertexFieldType::F32 => wgpu::VertexFormat::Float32,
                VertexFieldType::F32x2 => wgpu::VertexFormat::Float32x2,
                VertexFieldType::F32x4 => wgpu::VertexFormat::Float32x4,
            },
            offset: offset as u64,
            shader_location: f as u32,
        })
        .collect();
    let vertex_buffers = [VertexBufferLayout {
        array_stride: description.vertex_layout.element_stride() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &attributes,
    }];

    let (topology, strip_index_format) = match description.topology {
        Topology::LineStrip => (PrimitiveTopology::LineStrip, Some(wgpu::IndexFormat::Uint32)),
        //unsupported topologies are rejected before reaching the backend
        _ => (PrimitiveTopology::TriangleList, None),
    };
    let primitive_state = PrimitiveState {
        topology,
        strip_index_format,
        front_face: wgpu::FrontFace::Ccw,
        //outlines may wind either way
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: PolygonMode::Fill,
        conservative: false,
    };
    let multisample_state = MultisampleState {
        count: 1,
        mask: !0,
        alpha_to_coverage_enabled: false,
    };
    let blend = if description.alpha {
        Some(BlendState::ALPHA_BLENDING)
    } else {
        None
    };
    let color_target_state = ColorTargetState {
        format: target_format,
        blend,
        write_mask: Default::default(),
    };

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(description.label),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &vertex_module,
            entry_point: None,
            compilation_options: Default::default(),
            buffers: &vertex_buffers,
        },
        primitive: primitive_state,
        depth_stencil: None,
        multisample: multisample_state,
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: None,
            compilation_options: Default::default(),
            targets: &[Some(color_target_state)],
        }),
        multiview: None,
        cache: None,
    })
}
