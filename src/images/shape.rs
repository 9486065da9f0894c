/*!
2D shapes to be drawn.

A [ShapeDefinition] is immutable once built.  Draw operations hold it behind an `Arc` and
replace the whole `Arc` to change shape, which is how they notice that geometry has to be
regenerated: two definitions are equal only if they are the same definition.
*/

use crate::bindings::buffer_types::CRepr;
use crate::images::geometry::GeometryError;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

unsafe impl CRepr for Point {}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Identity of a [ShapeDefinition], unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u64);

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

#[derive(Debug)]
pub struct ShapeDefinition {
    id: ShapeId,
    points: Box<[Point]>,
    convex: bool,
}

impl PartialEq for ShapeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ShapeDefinition {}

impl ShapeDefinition {
    /**
    Creates a shape from an ordered outline.

    `convex` is trusted; use [Self::from_outline] to have it computed.
    */
    pub fn new(points: Vec<Point>, convex: bool) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                count: points.len(),
            });
        }
        Ok(Self {
            id: ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)),
            points: points.into_boxed_slice(),
            convex,
        })
    }

    /// Creates a shape, deciding convexity from the outline.
    pub fn from_outline(points: Vec<Point>) -> Result<Self, GeometryError> {
        let convex = is_convex(&points);
        Self::new(points, convex)
    }

    /// A regular polygon with `sides` vertices on a circle, starting at angle 0, counter-clockwise.
    pub fn regular_polygon(sides: usize, center: Point, radius: f32) -> Result<Self, GeometryError> {
        let points = (0..sides)
            .map(|i| {
                let angle = i as f32 / sides as f32 * std::f32::consts::TAU;
                Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
            })
            .collect();
        Self::new(points, true)
    }

    /// An axis-aligned rectangle, counter-clockwise from the minimum corner.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self {
            id: ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)),
            points: vec![
                min,
                Point::new(max.x, min.y),
                max,
                Point::new(min.x, max.y),
            ]
            .into_boxed_slice(),
            convex: true,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; shapes have at least 3 points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_convex(&self) -> bool {
        self.convex
    }

    pub fn bounds(&self) -> Bounds {
        bounds_of(&self.points)
    }
}

pub(crate) fn bounds_of(points: &[Point]) -> Bounds {
    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Bounds { min, max }
}

//all turns in the same direction (collinear runs allowed)
fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{Point, ShapeDefinition};

    #[test]
    fn convexity_detection() {
        let square = ShapeDefinition::from_outline(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
        .unwrap();
        assert!(square.is_convex());
        let arrow = ShapeDefinition::from_outline(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert!(!arrow.is_convex());
    }

    #[test]
    fn identity_not_geometry() {
        let a = ShapeDefinition::rectangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = ShapeDefinition::rectangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(a, a);
        assert!(ShapeDefinition::new(vec![Point::default(); 2], true).is_err());
    }
}
