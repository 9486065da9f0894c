/*!
Implements common vertex algorithms.

A [VertexGenerator] turns the outline of a shape into vertices, one vertex per outline point.
Generators may derive attributes (texture coordinates, colors) but never add or drop vertices;
[crate::images::geometry::GeometryBufferGenerator] checks this and fails with
[crate::images::geometry::GeometryError::SizeMismatch] otherwise.

[ElementSkip] subsamples an outline before it reaches the generator, so a renderer can draw a
coarser version of a dense shape without building a new shape.
*/

use crate::bindings::buffer_types::CRepr;
use crate::images::shape::{Point, bounds_of};
use crate::images::vertex_layout::{VertexFieldType, VertexLayout};

/**
Stride applied when walking an outline.

A stride of `s` keeps points `0, s, 2s, …`.  A stride of 1 keeps everything.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementSkip(usize);

impl ElementSkip {
    pub const NONE: ElementSkip = ElementSkip(1);

    /// # Panics
    /// If `stride` is 0.
    pub fn new(stride: usize) -> Self {
        assert!(stride > 0, "Invalid stride");
        Self(stride)
    }

    pub fn stride(self) -> usize {
        self.0
    }

    /// How many of `len` elements survive.
    pub fn count(self, len: usize) -> usize {
        len.div_ceil(self.0)
    }

    pub fn select<T: Copy>(self, items: &[T]) -> Vec<T> {
        items.iter().step_by(self.0).copied().collect()
    }
}

impl Default for ElementSkip {
    fn default() -> Self {
        Self::NONE
    }
}

/**
A vertex-generation strategy.
*/
pub trait VertexGenerator: Send + Sync + 'static {
    type Vertex: CRepr + Send + Sync;

    fn layout(&self) -> VertexLayout;

    /// Produces exactly one vertex per point, for vertex set `set`.
    fn generate(&self, points: &[Point], set: usize) -> Vec<Self::Vertex>;

    /// How many vertex sets this generator writes per outline.
    ///
    /// Sets are laid out back to back, and the index stream is repeated once per set.
    fn output_set_amount(&self, _points: &[Point]) -> usize {
        1
    }
}

/// Positions only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionVertices;

impl VertexGenerator for PositionVertices {
    type Vertex = Point;

    fn layout(&self) -> VertexLayout {
        let mut layout = VertexLayout::new();
        layout.add_field("position", VertexFieldType::F32x2);
        layout
    }

    fn generate(&self, points: &[Point], _set: usize) -> Vec<Point> {
        points.to_vec()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub position: Point,
    pub uv: [f32; 2],
}

unsafe impl CRepr for TexturedVertex {}

/**
Positions plus texture coordinates normalized to the outline's bounding box.

The minimum corner maps to `(0, 0)` and the maximum corner to `(1, 1)`.  A zero-width or
zero-height outline maps that axis to 0.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct TexturedVertices;

impl VertexGenerator for TexturedVertices {
    type Vertex = TexturedVertex;

    fn layout(&self) -> VertexLayout {
        let mut layout = VertexLayout::new();
        layout.add_field("position", VertexFieldType::F32x2);
        layout.add_field("uv", VertexFieldType::F32x2);
        layout
    }

    fn generate(&self, points: &[Point], _set: usize) -> Vec<TexturedVertex> {
        let bounds = bounds_of(points);
        let (w, h) = (bounds.width(), bounds.height());
        points
            .iter()
            .map(|p| TexturedVertex {
                position: *p,
                uv: [
                    if w > 0.0 { (p.x - bounds.min.x) / w } else { 0.0 },
                    if h > 0.0 { (p.y - bounds.min.y) / h } else { 0.0 },
                ],
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredVertex {
    pub position: Point,
    pub color: [f32; 4],
}

unsafe impl CRepr for ColoredVertex {}

/// One band of [RadialColorVertices].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorZone {
    /// Upper bound of the band, as a fraction of the farthest point's distance from the center.
    pub until: f32,
    pub color: [f32; 4],
}

/**
Positions plus a color chosen by distance from the bounding-box center.

Distances are normalized so the farthest point sits at 1.0.  A vertex takes the color of the first
zone whose `until` is at least its normalized distance, or `outer` if none is.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct RadialColorVertices {
    zones: Vec<ColorZone>,
    outer: [f32; 4],
}

impl RadialColorVertices {
    /// `zones` are sorted by `until`.
    pub fn new(mut zones: Vec<ColorZone>, outer: [f32; 4]) -> Self {
        zones.sort_by(|a, b| a.until.total_cmp(&b.until));
        Self { zones, outer }
    }

    fn color_at(&self, normalized: f32) -> [f32; 4] {
        self.zones
            .iter()
            .find(|z| normalized <= z.until)
            .map(|z| z.color)
            .unwrap_or(self.outer)
    }
}

impl VertexGenerator for RadialColorVertices {
    type Vertex = ColoredVertex;

    fn layout(&self) -> VertexLayout {
        let mut layout = VertexLayout::new();
        layout.add_field("position", VertexFieldType::F32x2);
        layout.add_field("color", VertexFieldType::F32x4);
        layout
    }

    fn generate(&self, points: &[Point], _set: usize) -> Vec<ColoredVertex> {
        let center = bounds_of(points).center();
        let distance = |p: &Point| ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
        let farthest = points.iter().map(distance).fold(0.0f32, f32::max);
        points
            .iter()
            .map(|p| {
                let normalized = if farthest > 0.0 { distance(p) / farthest } else { 0.0 };
                ColoredVertex {
                    position: *p,
                    color: self.color_at(normalized),
                }
            })
            .collect()
    }
}

/**
Wraps a generator to emit the same outline `sets` times.

Useful for multi-pass effects that draw the outline once per pass from a single buffer.
*/
#[derive(Debug, Clone)]
pub struct Repeated<G> {
    inner: G,
    sets: usize,
}

impl<G> Repeated<G> {
    /// # Panics
    /// If `sets` is 0.
    pub fn new(inner: G, sets: usize) -> Self {
        assert!(sets > 0, "Invalid set count");
        Self { inner, sets }
    }
}

impl<G: VertexGenerator> VertexGenerator for Repeated<G> {
    type Vertex = G::Vertex;

    fn layout(&self) -> VertexLayout {
        self.inner.layout()
    }

    fn generate(&self, points: &[Point], set: usize) -> Vec<G::Vertex> {
        self.inner.generate(points, set)
    }

    fn output_set_amount(&self, points: &[Point]) -> usize {
        self.sets * self.inner.output_set_amount(points)
    }
}
