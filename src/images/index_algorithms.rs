/*!
Algorithms for generating index lists for shape outlines.

Two topologies are supported: a closed line strip around the outline, and a triangle fan over a
convex outline.  Both work on the outline *after* [crate::images::vertex_algorithms::ElementSkip]
has been applied, so index `i` always refers to the `i`th emitted vertex.

# Example

```
use shapes_and_passes::images::index_algorithms::{ConvexFanIndices, LineStripIndices};

// closed loop around a square
let strip = LineStripIndices::new(4);
assert_eq!(strip.num_indices(), 5);
assert_eq!(strip.index_for(4), 0);

// a hexagon is 4 triangles fanned from vertex 0
let fan = ConvexFanIndices::new(6);
assert_eq!(fan.num_triangles(), 4);
assert_eq!((0..3).map(|i| fan.index_for(i)).collect::<Vec<_>>(), vec![0, 1, 2]);
assert_eq!((9..12).map(|i| fan.index_for(i)).collect::<Vec<_>>(), vec![0, 4, 5]);
```
*/

use crate::images::geometry::GeometryError;

const VERTEX_PER_TRIANGLE: usize = 3;

const TRIANGLE: [u32; 3] = [0, 1, 2];
const QUAD: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// How a shape's outline is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Topology {
    /// A closed outline drawn as lines.
    LineStrip,
    /// A filled convex outline, fanned from the first vertex.
    ConvexFan,
    /// A filled concave outline.  Not supported.
    ConcaveTriangulation,
    /// Not supported.
    PointList,
    /// Not supported.
    TriangleStrip,
}

impl Topology {
    pub fn is_supported(self) -> bool {
        matches!(self, Topology::LineStrip | Topology::ConvexFan)
    }

    /// Short name used in cache keys and logs.
    pub fn name(self) -> &'static str {
        match self {
            Topology::LineStrip => "line_strip",
            Topology::ConvexFan => "convex_fan",
            Topology::ConcaveTriangulation => "concave",
            Topology::PointList => "point_list",
            Topology::TriangleStrip => "triangle_strip",
        }
    }

    /// Whether the primitives are filled triangles.
    pub fn is_filled(self) -> bool {
        matches!(
            self,
            Topology::ConvexFan | Topology::ConcaveTriangulation | Topology::TriangleStrip
        )
    }
}

/**
Indices for a closed line strip.

`vertices` indices walk the outline in order and one more repeats index 0 to close the loop.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStripIndices {
    vertices: usize,
}

impl LineStripIndices {
    /// # Panics
    /// If `vertices < 2`.
    pub fn new(vertices: usize) -> Self {
        assert!(vertices >= 2, "Invalid geometry");
        Self { vertices }
    }

    pub fn num_indices(&self) -> usize {
        self.vertices + 1
    }

    pub fn index_for(&self, buffer_pos: usize) -> u32 {
        assert!(buffer_pos < self.num_indices(), "Index out of bounds");
        if buffer_pos == self.vertices {
            0
        } else {
            buffer_pos as u32
        }
    }
}

/**
Indices for a triangle fan over a convex outline.

Triangles are `(0, i, i + 1)` for `i` in `1..n - 1`, giving `n - 2` triangles.  Triangles and
quads use fixed index lists.

Note the index count is exactly `3 * (n - 2)`, not `3 * (n - n % 2)`: every triangle is real, none
is padding, and the last one ends on vertex `n - 1`.

```text
        3───────2
       ╱ ╲    ╱ │
      4   ╲  ╱  │
       ╲   ╲╱   │
        5───0───1
```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvexFanIndices {
    vertices: usize,
}

impl ConvexFanIndices {
    /// # Panics
    /// If `vertices < 3`.
    pub fn new(vertices: usize) -> Self {
        assert!(vertices >= 3, "Invalid geometry");
        Self { vertices }
    }

    pub fn num_triangles(&self) -> usize {
        self.vertices - 2
    }

    pub fn num_indices(&self) -> usize {
        self.num_triangles() * VERTEX_PER_TRIANGLE
    }

    pub fn index_for(&self, buffer_pos: usize) -> u32 {
        assert!(buffer_pos < self.num_indices(), "Index out of bounds");
        match self.vertices {
            3 => TRIANGLE[buffer_pos],
            4 => QUAD[buffer_pos],
            _ => {
                let triangle = buffer_pos / VERTEX_PER_TRIANGLE;
                match buffer_pos % VERTEX_PER_TRIANGLE {
                    0 => 0,
                    1 => (triangle + 1) as u32,
                    2 => (triangle + 2) as u32,
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// A validated index strategy for one outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPlan {
    LineStrip(LineStripIndices),
    ConvexFan(ConvexFanIndices),
}

impl IndexPlan {
    /**
    Chooses the index strategy for `vertices` emitted vertices.

    Fails with [GeometryError::NotSupported] for unsupported topologies and for a fan over a
    non-convex outline, and with [GeometryError::TooFewPoints] if the outline is too short.
    */
    pub fn new(topology: Topology, vertices: usize, convex: bool) -> Result<Self, GeometryError> {
        match topology {
            Topology::LineStrip => {
                if vertices < 2 {
                    return Err(GeometryError::TooFewPoints { count: vertices });
                }
                Ok(IndexPlan::LineStrip(LineStripIndices::new(vertices)))
            }
            Topology::ConvexFan => {
                if !convex {
                    return Err(GeometryError::NotSupported(
                        "triangulation of a concave shape".to_owned(),
                    ));
                }
                if vertices < 3 {
                    return Err(GeometryError::TooFewPoints { count: vertices });
                }
                Ok(IndexPlan::ConvexFan(ConvexFanIndices::new(vertices)))
            }
            other => Err(GeometryError::NotSupported(format!(
                "{} topology",
                other.name()
            ))),
        }
    }

    pub fn num_indices(&self) -> usize {
        match self {
            IndexPlan::LineStrip(s) => s.num_indices(),
            IndexPlan::ConvexFan(f) => f.num_indices(),
        }
    }

    pub fn index_for(&self, buffer_pos: usize) -> u32 {
        match self {
            IndexPlan::LineStrip(s) => s.index_for(buffer_pos),
            IndexPlan::ConvexFan(f) => f.index_for(buffer_pos),
        }
    }

    /// Appends every index, each offset by `base`.
    pub fn extend_into(&self, indices: &mut Vec<u32>, base: u32) {
        indices.extend((0..self.num_indices()).map(|i| self.index_for(i) + base));
    }
}
