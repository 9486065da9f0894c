/*!
Shader sources and the choice between built-in and custom shaders.

A [ShaderSet] is the owner-level resource of the shared cache: one per renderer kind.  It holds
WGSL source only; compiled pipelines live next to it in the cache as named resources.
*/

use crate::cache::CachedResource;
use crate::images::vertex_layout::VertexLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentShader {
    //may need additional type design for future backends
    pub(crate) wgsl_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexShader {
    //may need additional type design for future backends
    pub(crate) wgsl_code: String,
}

impl FragmentShader {
    pub fn new(wgsl_code: String) -> Self {
        Self { wgsl_code }
    }
}

impl VertexShader {
    pub fn new(wgsl_code: String) -> Self {
        Self { wgsl_code }
    }
}

const UNIFORMS: &str = "
struct Uniforms {
    transform: mat4x4<f32>,
    color: vec4<f32>,
}
@group(0) @binding(0) var<uniform> uniforms: Uniforms;
";

const SOLID_VERTEX: &str = "
struct VertexOut {
    @builtin(position) position: vec4<f32>,
}
@vertex fn vs_main(@location(0) position: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = uniforms.transform * vec4<f32>(position, 0.0, 1.0);
    return out;
}
";

const SOLID_FRAGMENT: &str = "
@fragment fn fs_main() -> @location(0) vec4<f32> {
    return uniforms.color;
}
";

const TEXTURED_VERTEX: &str = "
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}
@vertex fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = uniforms.transform * vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
";

const TEXTURED_FRAGMENT: &str = "
@group(0) @binding(1) var image: texture_2d<f32>;
@group(0) @binding(2) var image_sampler: sampler;
@fragment fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(image, image_sampler, uv) * uniforms.color;
}
";

const VERTEX_COLOR_VERTEX: &str = "
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}
@vertex fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = uniforms.transform * vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}
";

const VERTEX_COLOR_FRAGMENT: &str = "
@fragment fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color * uniforms.color;
}
";

/**
Vertex and fragment source for one renderer kind.

Both stages see the per-operation uniforms at binding 0 of group 0.  Textured kinds additionally
sample binding 1 with the sampler at binding 2.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    kind: String,
    vertex: VertexShader,
    fragment: FragmentShader,
}

impl ShaderSet {
    /// `kind` names the renderer kind and becomes the cache owner name.
    pub fn new(kind: impl Into<String>, vertex: VertexShader, fragment: FragmentShader) -> Self {
        Self {
            kind: kind.into(),
            vertex,
            fragment,
        }
    }

    fn builtin(kind: &str, vertex: &str, fragment: &str) -> Self {
        Self::new(
            kind,
            VertexShader::new(format!("{UNIFORMS}{vertex}")),
            FragmentShader::new(format!("{UNIFORMS}{fragment}")),
        )
    }

    /// Positions only, filled with the uniform color.
    pub fn solid() -> Self {
        Self::builtin("shape/solid", SOLID_VERTEX, SOLID_FRAGMENT)
    }

    /// Positions and texture coordinates, sampling the operation's image.
    pub fn textured() -> Self {
        Self::builtin("shape/textured", TEXTURED_VERTEX, TEXTURED_FRAGMENT)
    }

    /// Positions and per-vertex colors, tinted by the uniform color.
    pub fn vertex_color() -> Self {
        Self::builtin("shape/vertex_color", VERTEX_COLOR_VERTEX, VERTEX_COLOR_FRAGMENT)
    }

    /**
    The built-in set matching a vertex layout.

    Returns `None` when no built-in shader consumes exactly these fields, or when the layout and
    `textured` disagree.
    */
    pub fn builtin_for(layout: &VertexLayout, textured: bool) -> Option<Self> {
        let fields: Vec<&str> = layout.field_names().collect();
        match (fields.as_slice(), textured) {
            (["position"], false) => Some(Self::solid()),
            (["position", "uv"], true) => Some(Self::textured()),
            (["position", "color"], false) => Some(Self::vertex_color()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn vertex_wgsl(&self) -> &str {
        &self.vertex.wgsl_code
    }

    pub fn fragment_wgsl(&self) -> &str {
        &self.fragment.wgsl_code
    }
}

impl CachedResource for ShaderSet {}

/// Which shaders a draw operation uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderChoice {
    /// The built-in set for the operation's vertex layout, see [ShaderSet::builtin_for].
    #[default]
    Default,
    Custom(ShaderSet),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::vertex_algorithms::{
        PositionVertices, RadialColorVertices, TexturedVertices, VertexGenerator,
    };

    #[test]
    fn builtin_selection() {
        assert_eq!(
            ShaderSet::builtin_for(&PositionVertices.layout(), false).map(|s| s.kind),
            Some("shape/solid".to_owned())
        );
        assert_eq!(
            ShaderSet::builtin_for(&TexturedVertices.layout(), true).map(|s| s.kind),
            Some("shape/textured".to_owned())
        );
        assert!(ShaderSet::builtin_for(&TexturedVertices.layout(), false).is_none());
        let radial = RadialColorVertices::new(Vec::new(), [1.0; 4]);
        assert_eq!(
            ShaderSet::builtin_for(&radial.layout(), false).map(|s| s.kind),
            Some("shape/vertex_color".to_owned())
        );
    }

    #[test]
    fn sources_share_uniforms() {
        let set = ShaderSet::textured();
        assert!(set.vertex_wgsl().contains("var<uniform> uniforms"));
        assert!(set.fragment_wgsl().contains("var<uniform> uniforms"));
        assert!(set.fragment_wgsl().contains("textureSample"));
    }
}
