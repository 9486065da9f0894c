// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//
// Times geometry generation and buffer refresh for dense outlines.
// Run with `cargo bench --bench fan_triangulation`.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shapes_and_passes::RecordingDevice;
use shapes_and_passes::images::draw_operation::{DrawOperation, SharedCache};
use shapes_and_passes::images::geometry::GeometryBufferGenerator;
use shapes_and_passes::images::index_algorithms::Topology;
use shapes_and_passes::images::shape::{Point, ShapeDefinition};
use shapes_and_passes::images::vertex_algorithms::{ElementSkip, PositionVertices, TexturedVertices};
use std::hint::black_box;
use std::sync::Arc;
use std::task::{Context, Waker};

const SIDES: [usize; 3] = [64, 1024, 16384];

fn polygon(sides: usize) -> ShapeDefinition {
    ShapeDefinition::regular_polygon(sides, Point::new(0.0, 0.0), 1.0).expect("enough sides")
}

fn generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let fan = GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan);
    let textured = GeometryBufferGenerator::new(TexturedVertices, Topology::ConvexFan);
    let strip = GeometryBufferGenerator::new(PositionVertices, Topology::LineStrip)
        .with_skip(ElementSkip::new(4));
    for sides in SIDES {
        let shape = polygon(sides);
        group.bench_with_input(BenchmarkId::new("fan/position", sides), &shape, |b, shape| {
            b.iter(|| fan.generate(black_box(shape)).expect("convex"))
        });
        group.bench_with_input(BenchmarkId::new("fan/textured", sides), &shape, |b, shape| {
            b.iter(|| textured.generate(black_box(shape)).expect("convex"))
        });
        group.bench_with_input(BenchmarkId::new("strip/skip4", sides), &shape, |b, shape| {
            b.iter(|| strip.generate(black_box(shape)).expect("supported"))
        });
    }
    group.finish();
}

fn refresh(c: &mut Criterion) {
    //same-size shapes alternate, so the buffer is reused every time
    let device = RecordingDevice::new();
    let shapes = [Arc::new(polygon(4096)), Arc::new(polygon(4096))];
    let mut operation = DrawOperation::new(
        "bench",
        Arc::new(SharedCache::new()),
        GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan),
        shapes[0].clone(),
    );
    assert!(
        operation
            .poll_initialize(&mut Context::from_waker(Waker::noop()))
            .is_ready()
    );
    operation.materialize_for_device(&device).expect("materialized");
    let mut which = 0;
    c.bench_function("refresh/reused/4096", |b| {
        b.iter(|| {
            which ^= 1;
            operation
                .set_shape(shapes[which].clone(), ElementSkip::NONE)
                .expect("convex");
            operation.refresh_pending(&device).expect("refresh")
        })
    });
    assert_eq!(device.counts().buffers, 2);
}

criterion_group!(benches, generation, refresh);
criterion_main!(benches);
