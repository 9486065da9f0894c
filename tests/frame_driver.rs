//! Frame ordering and failure handling.

use shapes_and_passes::RecordingDevice;
use shapes_and_passes::cache::CacheError;
use shapes_and_passes::images::device::{Device, DeviceError, DeviceObject};
use shapes_and_passes::images::draw_operation::{
    DrawError, DrawOperation, ImageData, LifecycleState, SetupError, SharedCache,
};
use shapes_and_passes::images::frame_driver::{
    DriverConfig, FailurePolicy, FrameDriver, FrameHooks,
};
use shapes_and_passes::images::geometry::GeometryBufferGenerator;
use shapes_and_passes::images::index_algorithms::Topology;
use shapes_and_passes::images::shape::{Point, ShapeDefinition};
use shapes_and_passes::images::vertex_algorithms::{PositionVertices, TexturedVertices};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// Records the hooks it receives.
struct Tracer {
    name: String,
    events: Arc<Mutex<Vec<String>>>,
    state: LifecycleState,
    active: bool,
    fail_draws: bool,
}

impl Tracer {
    fn new(name: &str, events: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_owned(),
            events: events.clone(),
            state: LifecycleState::Uninitialized,
            active: true,
            fail_draws: false,
        }
    }

    fn log(&self, event: &str) {
        self.events.lock().unwrap().push(format!("{event} {}", self.name));
    }
}

impl FrameHooks for Tracer {
    fn name(&self) -> &str {
        &self.name
    }
    fn lifecycle(&self) -> LifecycleState {
        self.state
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) -> Result<(), DrawError> {
        self.active = active;
        Ok(())
    }
    fn poll_initialize(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), DrawError>> {
        self.log("initialize");
        self.state = LifecycleState::ResourcesCreated;
        Poll::Ready(Ok(()))
    }
    fn materialize_for_device(&mut self, _device: &dyn Device) -> Result<(), DrawError> {
        self.log("materialize");
        //always something to write on the first frame
        self.state = LifecycleState::PendingUpdate;
        Ok(())
    }
    fn refresh_pending(&mut self, _device: &dyn Device) -> Result<bool, DrawError> {
        if self.state == LifecycleState::PendingUpdate {
            self.log("refresh");
            self.state = LifecycleState::Idle;
            return Ok(true);
        }
        Ok(false)
    }
    fn detach_device(&mut self, _device: &dyn Device) -> Result<(), DrawError> {
        self.log("detach");
        self.state = LifecycleState::ResourcesCreated;
        Ok(())
    }
    fn draw(&self, _device: &dyn Device) -> Result<bool, DrawError> {
        self.log("draw");
        if self.fail_draws {
            return Err(DrawError::Device(DeviceError::Rejected("tracer".to_owned())));
        }
        Ok(true)
    }
    fn dispose(&mut self, _device: &dyn Device) -> Result<(), DrawError> {
        self.log("dispose");
        self.state = LifecycleState::Disposed;
        Ok(())
    }
}

fn square() -> Arc<ShapeDefinition> {
    Arc::new(ShapeDefinition::rectangle(
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
    ))
}

fn fan(name: &str, cache: &Arc<SharedCache>) -> DrawOperation<PositionVertices> {
    DrawOperation::new(
        name,
        cache.clone(),
        GeometryBufferGenerator::new(PositionVertices, Topology::ConvexFan),
        square(),
    )
}

#[test]
fn refreshes_complete_before_draws() {
    let device = RecordingDevice::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut driver = FrameDriver::default();
    driver.add(Tracer::new("a", &events));
    driver.add(Tracer::new("b", &events));

    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.materialized, 2);
    assert_eq!(report.refreshed, 2);
    assert_eq!(report.drawn, 2);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "initialize a",
            "materialize a",
            "initialize b",
            "materialize b",
            "refresh a",
            "refresh b",
            "draw a",
            "draw b",
        ]
    );

    //nothing pending: draws only
    events.lock().unwrap().clear();
    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.refreshed, 0);
    assert_eq!(*events.lock().unwrap(), vec!["draw a", "draw b"]);
    assert_eq!(driver.frame_count(), 2);
    assert_eq!(device.recorded_frames().len(), 2);
}

#[test]
fn pending_setup_waits() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let (sender, receiver) = futures::channel::oneshot::channel::<ImageData>();
    let picture = DrawOperation::new(
        "picture",
        cache.clone(),
        GeometryBufferGenerator::new(TexturedVertices, Topology::ConvexFan),
        square(),
    )
    .with_setup(Box::pin(async move {
        let image = receiver
            .await
            .map_err(|_| SetupError("loader went away".to_owned()))?;
        Ok::<_, SetupError>(Some(image))
    }));
    let mut driver = FrameDriver::default();
    let picture = driver.add(picture);
    driver.add(fan("plain", &cache));

    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.waiting, 1);
    assert_eq!(report.drawn, 1);
    assert!(report.failures.is_empty());
    assert_eq!(
        driver.get(picture).map(|op| op.lifecycle()),
        Some(LifecycleState::Uninitialized)
    );

    sender
        .send(ImageData::filled(4, 4, [0, 255, 0, 255]))
        .expect("receiver alive");
    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.waiting, 0);
    assert_eq!(report.materialized, 1);
    assert_eq!(report.drawn, 2);
    assert_eq!(device.counts().textures, 1);
}

#[test]
fn failed_setup_is_reported_once() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let mut driver = FrameDriver::default();
    let broken = driver.add(fan("broken", &cache).with_setup(Box::pin(async {
        Err::<Option<ImageData>, _>(SetupError("no image".to_owned()))
    })));
    driver.add(fan("fine", &cache));

    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken);
    assert!(matches!(report.failures[0].1, DrawError::SetupFailed(_)));
    assert_eq!(report.drawn, 1);

    let report = driver.frame(&device).expect("frame");
    assert!(report.failures.is_empty());
    assert_eq!(report.drawn, 1);
    assert_eq!(
        driver.get(broken).map(|op| op.lifecycle()),
        Some(LifecycleState::Unusable)
    );
}

#[test]
fn failing_draws_are_deactivated_by_default() {
    let device = RecordingDevice::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut driver = FrameDriver::default();
    let mut tracer = Tracer::new("flaky", &events);
    tracer.fail_draws = true;
    let flaky = driver.add(tracer);

    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].1,
        DrawError::Device(DeviceError::Rejected(_))
    ));
    assert_eq!(driver.get(flaky).map(|op| op.is_active()), Some(false));

    let report = driver.frame(&device).expect("frame");
    assert!(report.failures.is_empty());
    assert_eq!(report.drawn, 0);
}

#[test]
fn keep_policy_retries_draws() {
    let device = RecordingDevice::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut driver = FrameDriver::new(DriverConfig {
        failure_policy: FailurePolicy::Keep,
        label: "retrying".to_owned(),
    });
    let mut tracer = Tracer::new("flaky", &events);
    tracer.fail_draws = true;
    let flaky = driver.add(tracer);

    for _ in 0..3 {
        let report = driver.frame(&device).expect("frame");
        assert_eq!(report.failures.len(), 1);
    }
    assert_eq!(driver.get(flaky).map(|op| op.is_active()), Some(true));
    driver.get_mut::<Tracer>(flaky).expect("a tracer").fail_draws = false;
    assert_eq!(driver.frame(&device).expect("frame").drawn, 1);
}

#[test]
fn failed_materialization_is_retried() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let mut driver = FrameDriver::default();
    let id = driver.add(fan("shape", &cache));

    device.fail_next_creation("out of memory");
    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.materialized, 0);
    assert_eq!(report.drawn, 0);
    assert!(matches!(report.failures[0].1, DrawError::Device(_)));
    //not ready, so not deactivated
    assert_eq!(driver.get(id).map(|op| op.is_active()), Some(true));

    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.materialized, 1);
    assert_eq!(report.drawn, 1);
}

#[test]
fn typed_access_and_mutation() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let mut driver = FrameDriver::default();
    let id = driver.add(fan("shape", &cache));
    driver.frame(&device).expect("frame");

    assert!(driver.get_mut::<DrawOperation<TexturedVertices>>(id).is_none());
    let operation = driver
        .get_mut::<DrawOperation<PositionVertices>>(id)
        .expect("right type");
    operation.set_color([0.0, 0.0, 1.0, 1.0]).expect("color");
    assert_eq!(operation.state(), LifecycleState::PendingUpdate);

    let writes = device.counts().buffer_writes;
    let report = driver.frame(&device).expect("frame");
    assert_eq!(report.refreshed, 1);
    assert_eq!(device.counts().buffer_writes, writes + 1);
    assert_eq!(driver.get(id).map(|op| op.lifecycle()), Some(LifecycleState::Idle));
}

#[test]
fn remove_and_dispose_all() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let mut driver = FrameDriver::default();
    let first = driver.add(fan("first", &cache));
    driver.add(fan("second", &cache));
    driver.add(fan("third", &cache));
    driver.frame(&device).expect("frame");
    let buffer = driver
        .get_mut::<DrawOperation<PositionVertices>>(first)
        .and_then(|op| op.buffer().buffer())
        .expect("materialized");

    assert!(driver.remove(first, &device).expect("disposed"));
    assert!(!device.is_live(DeviceObject::Buffer(buffer)));
    assert!(!driver.remove(first, &device).expect("already gone"));
    assert_eq!(driver.len(), 2);
    assert_eq!(driver.frame(&device).expect("frame").drawn, 2);

    driver.dispose_all(&device);
    assert!(driver.is_empty());
    cache.clear(&device);
    assert_eq!(device.live_object_count(), 0);
}

#[test]
fn device_change_moves_operations() {
    let old = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    let mut driver = FrameDriver::default();
    let id = driver.add(fan("shape", &cache));
    driver.frame(&old).expect("frame");
    assert!(old.live_object_count() > 0);

    cache.clear(&old);
    driver.device_changed(&old);
    assert_eq!(old.live_object_count(), 0);
    assert_eq!(
        driver.get(id).map(|op| op.lifecycle()),
        Some(LifecycleState::ResourcesCreated)
    );

    let new = RecordingDevice::new();
    let report = driver.frame(&new).expect("frame");
    assert_eq!(report.materialized, 1);
    assert_eq!(report.drawn, 1);
    assert_eq!(new.counts().pipelines, 1);
    assert_eq!(new.last_frame().expect("frame").len(), 1);
}

#[test]
fn cache_errors_surface_as_failures() {
    let device = RecordingDevice::new();
    let cache = Arc::new(SharedCache::new());
    //a resource under the renderer's owner name that isn't a layout
    let owner = cache.get_or_register_owner("shape/solid", |_| {
        Ok(shapes_and_passes::images::shader::ShaderSet::solid())
    });
    owner
        .register_resource("layout/plain", |device, _| {
            Ok(shapes_and_passes::images::draw_operation::SharedObject::Sampler(
                device.create_sampler(shapes_and_passes::bindings::sampler::SamplerType::Nearest)?,
            ))
        })
        .expect("fresh name");
    assert!(matches!(
        owner.register_resource("layout/plain", |_, _| Err("unused".into())),
        Err(CacheError::DuplicateName(_))
    ));
    //materialized entries are returned as they are
    owner.resource(&device, "layout/plain").expect("materialized");

    let mut driver = FrameDriver::default();
    driver.add(fan("shape", &cache));
    let report = driver.frame(&device).expect("frame");
    assert!(matches!(
        report.failures[0].1,
        DrawError::WrongCachedKind(ref name) if name == "layout/plain"
    ));
    assert_eq!(report.drawn, 0);
}
