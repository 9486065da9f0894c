//! Layout builder ordering and device-facing build.

use shapes_and_passes::RecordingDevice;
use shapes_and_passes::bindings::bind_style::{BindingDescription, BindingKind, BoundResource, Stage};
use shapes_and_passes::bindings::layout_builder::{LayoutElement, ResourceLayoutBuilder};
use shapes_and_passes::bindings::visible_to::GPUBufferUsage;
use shapes_and_passes::images::device::{BufferHandle, Device};

fn uniform(device: &RecordingDevice, name: &str) -> (LayoutElement, BufferHandle) {
    let buffer = device
        .create_buffer(16, GPUBufferUsage::FragmentShaderRead, name)
        .expect("buffer");
    (
        LayoutElement::new(
            BindingDescription::new(name, BindingKind::UniformBuffer, Stage::Fragment),
            BoundResource::Buffer(buffer),
        ),
        buffer,
    )
}

fn names(builder: &ResourceLayoutBuilder) -> Vec<String> {
    builder
        .build(|entries| Ok::<_, ()>(entries.iter().map(|e| e.description.name.clone()).collect()))
        .expect("infallible")
        .layout
}

#[test]
fn build_orders_and_renumbers() {
    let device = RecordingDevice::new();
    let builder = ResourceLayoutBuilder::new();
    let (c, _) = uniform(&device, "c");
    let (a, a_buffer) = uniform(&device, "a");
    let (b, _) = uniform(&device, "b");
    builder.add(c, 40);
    builder.add(a, -7);
    builder.add(b, 3);

    let built = builder
        .build(|entries| device.create_binding_layout(entries))
        .expect("layout");
    let slots: Vec<u32> = built.entries.iter().map(|e| e.slot.index()).collect();
    assert_eq!(slots, vec![0, 1, 2]);
    assert_eq!(built.resources[0], BoundResource::Buffer(a_buffer));
    let stored = device.layout_entries(built.layout).expect("live layout");
    assert_eq!(stored, built.entries);

    let set = device
        .create_binding_set(built.layout, &built.resources)
        .expect("resources match the layout");
    assert_eq!(device.binding_set_resources(set), Some(built.resources));
}

#[test]
fn equal_positions_keep_insertion_order() {
    let device = RecordingDevice::new();
    let builder = ResourceLayoutBuilder::new();
    for name in ["first", "second", "third"] {
        let (element, _) = uniform(&device, name);
        builder.add(element, 5);
    }
    let (early, _) = uniform(&device, "early");
    builder.add_entry(LayoutElement { position: 1, ..early });
    assert_eq!(names(&builder), vec!["early", "first", "second", "third"]);
}

#[test]
fn insert_moves_the_smaller_group() {
    let device = RecordingDevice::new();
    let builder = ResourceLayoutBuilder::new();
    for (name, position) in [("p0", 0), ("p1", 1), ("p2", 2), ("p3", 3), ("p4", 4)] {
        let (element, _) = uniform(&device, name);
        builder.add(element, position);
    }

    //one element at or after 4, four before
    let (late, _) = uniform(&device, "late");
    assert_eq!(builder.insert(late, 4), Ok(1));
    assert_eq!(builder.positions(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(names(&builder), vec!["p0", "p1", "p2", "p3", "late", "p4"]);

    //one before 1, five at or after
    let (early, _) = uniform(&device, "early");
    assert_eq!(builder.insert(early, 1), Ok(1));
    assert_eq!(builder.positions(), vec![-1, 0, 1, 2, 3, 4, 5]);
    assert_eq!(
        names(&builder),
        vec!["p0", "early", "p1", "p2", "p3", "late", "p4"]
    );
    assert_eq!(builder.extremes(), (-1, 5));
}

#[test]
fn first_and_last_extend_the_extremes() {
    let device = RecordingDevice::new();
    let builder = ResourceLayoutBuilder::new();
    assert_eq!(builder.extremes(), (0, 0));
    let (middle, _) = uniform(&device, "middle");
    builder.add(middle, 0);
    let (head, _) = uniform(&device, "head");
    let (tail, _) = uniform(&device, "tail");
    let (new_head, _) = uniform(&device, "new_head");
    assert_eq!(builder.insert_last(tail), Ok(1));
    assert_eq!(builder.insert_first(head), Ok(-1));
    assert_eq!(builder.insert_first(new_head), Ok(-2));
    assert_eq!(names(&builder), vec!["new_head", "head", "middle", "tail"]);

    builder.clear();
    assert!(builder.is_empty());
    assert_eq!(builder.extremes(), (0, 0));
}

#[test]
fn mismatched_set_is_rejected() {
    let device = RecordingDevice::new();
    let builder = ResourceLayoutBuilder::new();
    let (element, buffer) = uniform(&device, "u");
    builder.insert_last(element).expect("room");
    let built = builder
        .build(|entries| device.create_binding_layout(entries))
        .expect("layout");
    assert!(device.create_binding_set(built.layout, &[]).is_err());
    let sampler = device
        .create_sampler(shapes_and_passes::bindings::sampler::SamplerType::Nearest)
        .expect("sampler");
    assert!(
        device
            .create_binding_set(built.layout, &[BoundResource::Sampler(sampler)])
            .is_err()
    );
    let geometry = device
        .create_buffer(16, GPUBufferUsage::VertexAndIndex, "geometry")
        .expect("buffer");
    assert!(
        device
            .create_binding_set(built.layout, &[BoundResource::Buffer(geometry)])
            .is_err()
    );
    assert!(
        device
            .create_binding_set(built.layout, &[BoundResource::Buffer(buffer)])
            .is_ok()
    );
}
