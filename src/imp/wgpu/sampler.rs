use crate::bindings::sampler::SamplerType;
use wgpu::{AddressMode, FilterMode, SamplerDescriptor};

pub(super) fn create_sampler(device: &wgpu::Device, sampler_type: SamplerType) -> wgpu::Sampler {
    //(min/mag, mipmap)
    let (filter, mipmap_filter) = match sampler_type {
        SamplerType::Mipmapped => (FilterMode::Linear, FilterMode::Linear),
        SamplerType::Nearest => (FilterMode::Nearest, FilterMode::Nearest),
    };
    device.create_sampler(&SamplerDescriptor {
        label: Some(sampler_type.cache_name()),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        lod_min_clamp: 0.0,
        lod_max_clamp: 14.0,
        compare: None,
        anisotropy_clamp: 1,
        border_color: None,
    })
}
