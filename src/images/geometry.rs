/*!
Turns shapes into packed vertex/index data.

A [GeometryBufferGenerator] pairs a [VertexGenerator] with a [Topology] and an [ElementSkip].
Generation happens in two steps:

1. [GeometryBufferGenerator::plan] validates the request and sizes the output.  Every
   [GeometryError::NotSupported] case is caught here, before anything is generated or written.
2. [GeometryBufferGenerator::generate] produces the bytes.

The output goes into one device buffer, managed by [PackedBuffer]: vertex data in
`[0, vertex_end)`, then `u32` indices.

```
use shapes_and_passes::images::geometry::GeometryBufferGenerator;
use shapes_and_passes::images::index_algorithms::Topology;
use shapes_and_passes::images::shape::{Point, ShapeDefinition};
use shapes_and_passes::images::vertex_algorithms::PositionVertices;

let square = ShapeDefinition::rectangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
let generator = GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan);
let geometry = generator.generate(&square).unwrap();
assert_eq!(geometry.vertex_end, 4 * 8);
assert_eq!(geometry.indices, vec![0, 1, 2, 0, 2, 3]);
```
*/

use crate::bindings::buffer_types::as_bytes;
use crate::bindings::visible_to::GPUBufferUsage;
use crate::images::device::{BufferHandle, Device, DeviceError, DeviceObject};
use crate::images::index_algorithms::{IndexPlan, Topology};
use crate::images::shape::{Point, ShapeDefinition};
use crate::images::vertex_algorithms::{ElementSkip, VertexGenerator};
use crate::images::vertex_layout::VertexLayout;
use std::ops::Range;

const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GeometryError {
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("vertex generator returned {actual} vertices for {expected} points")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("{count} points is too few for this topology")]
    TooFewPoints { count: usize },
    #[error("{count} vertices cannot be addressed by 32-bit indices")]
    TooManyVertices { count: usize },
}

/// Sizing of one generation pass, computed before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPlan {
    points: Vec<Point>,
    sets: usize,
    indices: IndexPlan,
    vertex_stride: usize,
}

impl GeometryPlan {
    /// The outline after skipping.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn set_count(&self) -> usize {
        self.sets
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len() * self.sets
    }

    pub fn index_count(&self) -> usize {
        self.indices.num_indices() * self.sets
    }

    /// End of the vertex region, padded so indices start 4-byte aligned.
    pub fn vertex_end(&self) -> u64 {
        ((self.vertex_count() * self.vertex_stride) as u64).next_multiple_of(INDEX_SIZE)
    }

    /// Bytes needed for vertices and indices together.
    pub fn required_bytes(&self) -> u64 {
        self.vertex_end() + self.index_count() as u64 * INDEX_SIZE
    }
}

/// Generated geometry, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedGeometry {
    /// Vertex bytes, padded up to `vertex_end`.
    pub vertex_bytes: Vec<u8>,
    pub vertex_end: u64,
    pub vertex_count: usize,
    pub indices: Vec<u32>,
}

impl GeneratedGeometry {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn required_bytes(&self) -> u64 {
        self.vertex_end + self.indices.len() as u64 * INDEX_SIZE
    }

    /// The complete packed buffer contents.
    pub fn packed(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.required_bytes() as usize);
        bytes.extend_from_slice(&self.vertex_bytes);
        bytes.extend_from_slice(as_bytes(&self.indices));
        bytes
    }
}

/**
Generates vertex and index data for shapes.
*/
#[derive(Debug, Clone)]
pub struct GeometryBufferGenerator<G> {
    vertices: G,
    topology: Topology,
    skip: ElementSkip,
}

impl<G: VertexGenerator> GeometryBufferGenerator<G> {
    pub fn new(vertices: G, topology: Topology) -> Self {
        Self {
            vertices,
            topology,
            skip: ElementSkip::NONE,
        }
    }

    pub fn with_skip(mut self, skip: ElementSkip) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn set_skip(&mut self, skip: ElementSkip) {
        self.skip = skip;
    }

    pub fn skip(&self) -> ElementSkip {
        self.skip
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_generator(&self) -> &G {
        &self.vertices
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        self.vertices.layout()
    }

    /// Validates `shape` against this generator and sizes the output.
    pub fn plan(&self, shape: &ShapeDefinition) -> Result<GeometryPlan, GeometryError> {
        let points = self.skip.select(shape.points());
        let indices = IndexPlan::new(self.topology, points.len(), shape.is_convex())?;
        let sets = self.vertices.output_set_amount(&points).max(1);
        let vertex_count = points.len() * sets;
        if u32::try_from(vertex_count).is_err() {
            return Err(GeometryError::TooManyVertices {
                count: vertex_count,
            });
        }
        Ok(GeometryPlan {
            points,
            sets,
            indices,
            vertex_stride: std::mem::size_of::<G::Vertex>(),
        })
    }

    /**
    Generates geometry for `shape`.

    Each vertex set `j` is followed in the index stream by its own copy of the indices, offset by
    `j * n` where `n` is the number of points after skipping.
    */
    pub fn generate(&self, shape: &ShapeDefinition) -> Result<GeneratedGeometry, GeometryError> {
        let plan = self.plan(shape)?;
        self.generate_planned(&plan)
    }

    pub fn generate_planned(&self, plan: &GeometryPlan) -> Result<GeneratedGeometry, GeometryError> {
        let n = plan.points.len();
        let vertex_end = plan.vertex_end();
        let mut vertex_bytes = Vec::with_capacity(vertex_end as usize);
        let mut indices = Vec::with_capacity(plan.index_count());
        for set in 0..plan.sets {
            let vertices = self.vertices.generate(&plan.points, set);
            if vertices.len() != n {
                return Err(GeometryError::SizeMismatch {
                    expected: n,
                    actual: vertices.len(),
                });
            }
            vertex_bytes.extend_from_slice(as_bytes(&vertices));
            plan.indices.extend_into(&mut indices, (set * n) as u32);
        }
        vertex_bytes.resize(vertex_end as usize, 0);
        Ok(GeneratedGeometry {
            vertex_bytes,
            vertex_end,
            vertex_count: plan.vertex_count(),
            indices,
        })
    }
}

/// What [PackedBuffer::fit] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFit {
    /// The existing buffer was large enough.
    Reused,
    /// There was no buffer yet.
    Allocated,
    /// The existing buffer was too small and was replaced.
    Reallocated,
}

/**
One device buffer holding vertices then indices.

The buffer grows to exactly what is required when it is too small, and is never shrunk.
*/
#[derive(Debug, Default)]
pub struct PackedBuffer {
    buffer: Option<BufferHandle>,
    capacity: u64,
    vertex_end: u64,
    index_count: u32,
}

impl PackedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn vertex_end(&self) -> u64 {
        self.vertex_end
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_range(&self) -> Range<u64> {
        0..self.vertex_end
    }

    pub fn index_range(&self) -> Range<u64> {
        self.vertex_end..self.vertex_end + self.index_count as u64 * INDEX_SIZE
    }

    /**
    Makes sure the buffer holds at least `required` bytes.

    A new buffer holds nothing yet, so the region markers are reset when one is created.
    */
    pub fn fit(
        &mut self,
        device: &dyn Device,
        required: u64,
        debug_name: &str,
    ) -> Result<BufferFit, DeviceError> {
        if self.buffer.is_some() && self.capacity >= required {
            logwise::trace_sync!(
                "reusing packed buffer: {required} of {capacity} bytes",
                required = required,
                capacity = self.capacity
            );
            return Ok(BufferFit::Reused);
        }
        let new = device.create_buffer(required, GPUBufferUsage::VertexAndIndex, debug_name)?;
        let fit = self.install(device, new, required);
        self.vertex_end = 0;
        self.index_count = 0;
        Ok(fit)
    }

    //swaps in `new`, releasing the buffer it replaces
    fn install(&mut self, device: &dyn Device, new: BufferHandle, capacity: u64) -> BufferFit {
        let fit = match self.buffer.replace(new) {
            Some(old) => {
                device.release(DeviceObject::Buffer(old));
                logwise::trace_sync!(
                    "reallocated packed buffer: {old_capacity} -> {capacity} bytes",
                    old_capacity = self.capacity,
                    capacity = capacity
                );
                BufferFit::Reallocated
            }
            None => BufferFit::Allocated,
        };
        self.capacity = capacity;
        fit
    }

    /**
    Fits the buffer to `geometry`, uploads it, and updates the region markers.

    A replacement buffer is uploaded before the old one is released; if that upload fails the old
    buffer and its markers are kept.  If an in-place upload fails the markers are reset, since the
    contents are no longer known.
    */
    pub fn write(
        &mut self,
        device: &dyn Device,
        geometry: &GeneratedGeometry,
        debug_name: &str,
    ) -> Result<BufferFit, DeviceError> {
        let required = geometry.required_bytes();
        let packed = geometry.packed();
        let fit = match self.buffer {
            Some(buffer) if self.capacity >= required => {
                if let Err(e) = device.update_buffer(buffer, 0, &packed) {
                    self.vertex_end = 0;
                    self.index_count = 0;
                    return Err(e);
                }
                logwise::trace_sync!(
                    "reusing packed buffer: {required} of {capacity} bytes",
                    required = required,
                    capacity = self.capacity
                );
                BufferFit::Reused
            }
            _ => {
                let new = device.create_buffer(required, GPUBufferUsage::VertexAndIndex, debug_name)?;
                if let Err(e) = device.update_buffer(new, 0, &packed) {
                    device.release(DeviceObject::Buffer(new));
                    return Err(e);
                }
                self.install(device, new, required)
            }
        };
        self.vertex_end = geometry.vertex_end;
        self.index_count = geometry.index_count();
        Ok(fit)
    }

    /// Releases the buffer, leaving this empty.
    pub fn release(&mut self, device: &dyn Device) {
        if let Some(buffer) = self.buffer.take() {
            device.release(DeviceObject::Buffer(buffer));
        }
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::vertex_algorithms::{PositionVertices, Repeated};

    #[test]
    fn multi_set_offsets() {
        let triangle = ShapeDefinition::regular_polygon(3, Point::new(0.0, 0.0), 1.0).unwrap();
        let generator =
            GeometryBufferGenerator::new(Repeated::new(PositionVertices, 2), Topology::LineStrip);
        let geometry = generator.generate(&triangle).unwrap();
        assert_eq!(geometry.vertex_count, 6);
        assert_eq!(geometry.indices, vec![0, 1, 2, 0, 3, 4, 5, 3]);
    }

    #[test]
    fn skip_applies_to_both_streams() {
        let octagon = ShapeDefinition::regular_polygon(8, Point::new(0.0, 0.0), 1.0).unwrap();
        let generator = GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan)
            .with_skip(ElementSkip::new(2));
        let plan = generator.plan(&octagon).unwrap();
        assert_eq!(plan.vertex_count(), 4);
        assert_eq!(plan.points()[1], octagon.points()[2]);
        let geometry = generator.generate_planned(&plan).unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(geometry.required_bytes(), plan.required_bytes());
    }

    struct Dropping;
    impl VertexGenerator for Dropping {
        type Vertex = Point;
        fn layout(&self) -> VertexLayout {
            VertexLayout::new()
        }
        fn generate(&self, points: &[Point], _set: usize) -> Vec<Point> {
            points[1..].to_vec()
        }
    }

    #[test]
    fn size_mismatch() {
        let square = ShapeDefinition::rectangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let generator = GeometryBufferGenerator::new(Dropping, Topology::LineStrip);
        assert!(matches!(
            generator.generate(&square),
            Err(GeometryError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
