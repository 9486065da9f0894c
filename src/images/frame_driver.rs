/*!
Drives draw operations once per frame.

[FrameDriver::frame] runs these steps, in order, over every operation it owns:

1. Operations still in setup are polled once, without blocking.  A failing setup is reported and
   leaves the operation unusable; the frame goes on.
2. Operations that finished setup, and operations detached by [FrameDriver::device_changed], are
   materialized.  A failed materialization is retried next frame.
3. Every ready operation refreshes pending changes.
4. Every active ready operation records its draw, between [Device::begin_frame] and
   [Device::end_frame].

All refreshes of a frame therefore complete before its first draw is recorded.
*/

use crate::images::device::{Device, DeviceError};
use crate::images::draw_operation::{DrawError, LifecycleState};
use std::any::Any;
use std::task::{Context, Poll, Waker};

/// The lifecycle hooks a [FrameDriver] calls.
pub trait FrameHooks: Any + Send {
    fn name(&self) -> &str;
    fn lifecycle(&self) -> LifecycleState;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool) -> Result<(), DrawError>;
    fn poll_initialize(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), DrawError>>;
    fn materialize_for_device(&mut self, device: &dyn Device) -> Result<(), DrawError>;
    fn refresh_pending(&mut self, device: &dyn Device) -> Result<bool, DrawError>;
    /// Releases device objects on `device` (the previous one) so the next materialization starts over.
    fn detach_device(&mut self, device: &dyn Device) -> Result<(), DrawError>;
    fn draw(&self, device: &dyn Device) -> Result<bool, DrawError>;
    fn dispose(&mut self, device: &dyn Device) -> Result<(), DrawError>;
}

/// What the driver does with an operation whose refresh or draw failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Mark it inactive, so it is no longer drawn.
    #[default]
    Deactivate,
    /// Leave it alone; it is tried again next frame.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub failure_policy: FailurePolicy,
    /// Used in logs.
    pub label: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            label: "frame driver".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

/// The outcome of one [FrameDriver::frame].
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Operations materialized this frame, including after a device change.
    pub materialized: usize,
    /// Operations that wrote pending changes.
    pub refreshed: usize,
    pub drawn: usize,
    /// Operations whose setup has not finished.
    pub waiting: usize,
    pub failures: Vec<(OperationId, DrawError)>,
}

struct Slot {
    id: OperationId,
    hooks: Box<dyn FrameHooks>,
}

/// Owns draw operations and calls their hooks in frame order.
pub struct FrameDriver {
    config: DriverConfig,
    next_id: u64,
    operations: Vec<Slot>,
    frames: u64,
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("config", &self.config)
            .field("operations", &self.operations.len())
            .field("frames", &self.frames)
            .finish()
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

impl FrameDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            next_id: 0,
            operations: Vec::new(),
            frames: 0,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Takes ownership of an operation.  It is initialized on the next frame.
    pub fn add(&mut self, hooks: impl FrameHooks) -> OperationId {
        let id = OperationId(self.next_id);
        self.next_id += 1;
        self.operations.push(Slot {
            id,
            hooks: Box::new(hooks),
        });
        id
    }

    pub fn get(&self, id: OperationId) -> Option<&dyn FrameHooks> {
        self.operations
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.hooks.as_ref())
    }

    /// The operation `id`, if it exists and is a `T`.
    pub fn get_mut<T: FrameHooks>(&mut self, id: OperationId) -> Option<&mut T> {
        let slot = self.operations.iter_mut().find(|s| s.id == id)?;
        let any: &mut dyn Any = slot.hooks.as_mut();
        any.downcast_mut::<T>()
    }

    /// Disposes and drops the operation `id`.  Returns `Ok(false)` if there was none.
    pub fn remove(&mut self, id: OperationId, device: &dyn Device) -> Result<bool, DrawError> {
        let Some(index) = self.operations.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        let mut slot = self.operations.remove(index);
        if slot.hooks.lifecycle() != LifecycleState::Disposed {
            slot.hooks.dispose(device)?;
        }
        Ok(true)
    }

    /// Disposes and drops every operation.
    pub fn dispose_all(&mut self, device: &dyn Device) {
        for mut slot in self.operations.drain(..) {
            if slot.hooks.lifecycle() == LifecycleState::Disposed {
                continue;
            }
            if let Err(e) = slot.hooks.dispose(device) {
                logwise::warn_sync!(
                    "dispose of {name} failed: {err}",
                    name = logwise::privacy::LogIt(slot.hooks.name()),
                    err = logwise::privacy::LogIt(&e)
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /**
    Moves every materialized operation off `previous`.  They are materialized on whatever device
    the next [Self::frame] receives.

    Shared objects live in the cache; clear it for `previous` as well.
    */
    pub fn device_changed(&mut self, previous: &dyn Device) {
        let mut detached = 0usize;
        for slot in &mut self.operations {
            if !slot.hooks.lifecycle().is_ready() {
                continue;
            }
            match slot.hooks.detach_device(previous) {
                Ok(()) => detached += 1,
                Err(e) => logwise::warn_sync!(
                    "detaching {name} failed: {err}",
                    name = logwise::privacy::LogIt(slot.hooks.name()),
                    err = logwise::privacy::LogIt(&e)
                ),
            }
        }
        logwise::info_sync!(
            "{label}: device changed, {detached} operations detached",
            label = logwise::privacy::LogIt(&self.config.label),
            detached = detached
        );
    }

    fn fail(&mut self, index: usize, error: DrawError, report: &mut FrameReport) {
        let slot = &mut self.operations[index];
        logwise::warn_sync!(
            "{label}: {name} failed: {err}",
            label = logwise::privacy::LogIt(&self.config.label),
            name = logwise::privacy::LogIt(slot.hooks.name()),
            err = logwise::privacy::LogIt(&error)
        );
        if self.config.failure_policy == FailurePolicy::Deactivate && slot.hooks.lifecycle().is_ready() {
            //cannot fail outside the disposed state
            let _ = slot.hooks.set_active(false);
        }
        report.failures.push((slot.id, error));
    }

    /// Runs one frame against `device`.
    pub fn frame(&mut self, device: &dyn Device) -> Result<FrameReport, DeviceError> {
        let mut report = FrameReport::default();
        let mut cx = Context::from_waker(Waker::noop());

        for index in 0..self.operations.len() {
            let hooks = &mut self.operations[index].hooks;
            match hooks.lifecycle() {
                LifecycleState::Uninitialized => match hooks.poll_initialize(&mut cx) {
                    Poll::Pending => {
                        logwise::trace_sync!(
                            "{name} still in setup",
                            name = logwise::privacy::LogIt(hooks.name())
                        );
                        report.waiting += 1;
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        let id = self.operations[index].id;
                        report.failures.push((id, e));
                        continue;
                    }
                    Poll::Ready(Ok(())) => {}
                },
                LifecycleState::ResourcesCreated => {}
                _ => continue,
            }
            match self.operations[index].hooks.materialize_for_device(device) {
                Ok(()) => report.materialized += 1,
                Err(e) => self.fail(index, e, &mut report),
            }
        }

        for index in 0..self.operations.len() {
            let hooks = &mut self.operations[index].hooks;
            if !hooks.lifecycle().is_ready() {
                continue;
            }
            match hooks.refresh_pending(device) {
                Ok(true) => report.refreshed += 1,
                Ok(false) => {}
                Err(e) => self.fail(index, e, &mut report),
            }
        }

        device.begin_frame();
        for index in 0..self.operations.len() {
            let hooks = &self.operations[index].hooks;
            if !hooks.lifecycle().is_ready() || !hooks.is_active() {
                continue;
            }
            match hooks.draw(device) {
                Ok(true) => report.drawn += 1,
                Ok(false) => {}
                Err(e) => self.fail(index, e, &mut report),
            }
        }
        device.end_frame()?;
        self.frames += 1;
        Ok(report)
    }
}
