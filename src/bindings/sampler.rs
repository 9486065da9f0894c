#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    ///The sampler shall use normalized coordinates, and will do interpolation for mipmapping.
    Mipmapped,
    ///Normalized coordinates, nearest-texel filtering.
    Nearest,
}

impl SamplerType {
    /// Name under which a shared sampler of this type is cached.
    pub fn cache_name(self) -> &'static str {
        match self {
            SamplerType::Mipmapped => "sampler/mipmapped",
            SamplerType::Nearest => "sampler/nearest",
        }
    }
}
