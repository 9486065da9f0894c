/*! shapes_and_passes is the resource-and-draw-operation core of a 2D renderer.

It sits between "draw this shape" requests and a stateful GPU backend that wants explicit buffer
sizes, pipeline objects and binding layouts.

| Piece                     | Module                                  | Job                                                                 |
|---------------------------|-----------------------------------------|---------------------------------------------------------------------|
| Resource cache            | [cache]                                 | Creates each shared device object once per owner and name           |
| Binding layout builder    | [bindings::layout_builder]              | Orders bindings inserted at relative positions, then numbers them   |
| Geometry generation       | [images::geometry]                      | Turns shapes into one packed vertex/index buffer, reusing capacity  |
| Draw operation lifecycle  | [images::draw_operation]                | Setup, materialization, batched refresh and draw for one shape      |
| Frame driver              | [images::frame_driver]                  | Calls lifecycle hooks in frame order                                |

# Backends

Everything talks to the GPU through [images::device::Device].  [RecordingDevice] keeps everything
in memory and records draws instead of executing them; it is what headless tools and the tests
use.  With the `backend_wgpu` feature, `WgpuDevice` renders through [wgpu](https://wgpu.rs).

# Example

```
use std::sync::Arc;
use shapes_and_passes::RecordingDevice;
use shapes_and_passes::images::draw_operation::{DrawOperation, SharedCache};
use shapes_and_passes::images::frame_driver::FrameDriver;
use shapes_and_passes::images::geometry::GeometryBufferGenerator;
use shapes_and_passes::images::index_algorithms::Topology;
use shapes_and_passes::images::shape::{Point, ShapeDefinition};
use shapes_and_passes::images::vertex_algorithms::PositionVertices;

let device = RecordingDevice::new();
let cache = Arc::new(SharedCache::new());
let square = Arc::new(ShapeDefinition::rectangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0)));
let operation = DrawOperation::new(
    "square",
    cache,
    GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan),
    square,
);

let mut driver = FrameDriver::default();
driver.add(operation);
let report = driver.frame(&device).unwrap();
assert_eq!(report.drawn, 1);
assert_eq!(device.last_frame().unwrap()[0].index_count, 6);
```
*/

pub mod bindings;
pub mod cache;
pub mod images;
mod imp;

pub use imp::recording::{CreationCounts, RecordingDevice};

#[cfg(feature = "backend_wgpu")]
pub use imp::WgpuDevice;
