// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Tiered resource cache behavior against the recording device.

use shapes_and_passes::RecordingDevice;
use shapes_and_passes::bindings::sampler::SamplerType;
use shapes_and_passes::cache::{CacheError, CachedResource, ResourceCache};
use shapes_and_passes::images::device::{Device, DeviceObject, SamplerHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Sources {
    created: usize,
}
impl CachedResource for Sources {}

/// A device object that releases itself when the cache clears it.
#[derive(Debug, PartialEq, Eq)]
struct Sampler(SamplerHandle);
impl CachedResource for Sampler {
    fn dispose(&self, device: &dyn Device) {
        device.release(DeviceObject::Sampler(self.0));
    }
}

type Cache = ResourceCache<Sources, Sampler>;

fn sampler_factory(
    calls: Arc<AtomicUsize>,
) -> impl Fn(&dyn Device, &Sources) -> Result<Sampler, shapes_and_passes::cache::FactoryError>
+ Send
+ Sync
+ 'static {
    move |device, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Sampler(device.create_sampler(SamplerType::Mipmapped)?))
    }
}

#[test]
fn concurrent_get_or_add_creates_once() {
    let device = RecordingDevice::new();
    let cache = Cache::new();
    let owner = cache
        .register_owner("Shape2DRenderer", |_| Ok(Sources { created: 1 }))
        .expect("fresh owner");
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<SamplerHandle> = std::thread::scope(|s| {
        let spawned: Vec<_> = (0..50)
            .map(|_| {
                let owner = owner.clone();
                let calls = calls.clone();
                let device = &device;
                s.spawn(move || {
                    owner
                        .get_or_add_resource(device, "pipeline", sampler_factory(calls))
                        .expect("factory succeeds")
                        .0
                })
            })
            .collect();
        spawned
            .into_iter()
            .map(|h| h.join().expect("no panic"))
            .collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(handles.iter().all(|h| *h == handles[0]));
    assert_eq!(device.counts().samplers, 1);
}

#[test]
fn concurrent_owner_access_creates_once() {
    let cache = Arc::new(Cache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let owner_calls = calls.clone();
    let owner = cache
        .register_owner("Shape2DRenderer", move |_| {
            Ok(Sources {
                created: owner_calls.fetch_add(1, Ordering::SeqCst) + 1,
            })
        })
        .expect("fresh owner");
    std::thread::scope(|s| {
        for _ in 0..16 {
            let owner = owner.clone();
            s.spawn(move || {
                assert_eq!(owner.owner_resource().expect("owner").created, 1);
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicate_and_missing_names() {
    let cache = Cache::new();
    let owner = cache
        .register_owner("renderer", |_| Ok(Sources { created: 0 }))
        .expect("fresh owner");
    assert!(matches!(
        cache.register_owner("renderer", |_| Ok(Sources { created: 0 })),
        Err(CacheError::DuplicateName(name)) if name == "renderer"
    ));
    assert!(matches!(
        cache.owner("other"),
        Err(CacheError::NotFound(name)) if name == "other"
    ));

    let calls = Arc::new(AtomicUsize::new(0));
    owner
        .register_resource("sampler", sampler_factory(calls.clone()))
        .expect("fresh name");
    assert!(matches!(
        owner.register_resource("sampler", sampler_factory(calls.clone())),
        Err(CacheError::DuplicateName(_))
    ));
    //a failed registration leaves the entry as it was
    assert_eq!(owner.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let device = RecordingDevice::new();
    assert!(matches!(
        owner.resource(&device, "missing"),
        Err(CacheError::NotFound(_))
    ));
    assert!(owner.try_get_resource(&device, "missing").is_none());
    assert!(owner.try_get_resource(&device, "sampler").is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn clear_disposes_and_recreates() {
    let device = RecordingDevice::new();
    let cache = Cache::new();
    let owner_calls = Arc::new(AtomicUsize::new(0));
    let counted = owner_calls.clone();
    let owner = cache
        .register_owner("renderer", move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Sources { created: 0 })
        })
        .expect("fresh owner");
    let calls = Arc::new(AtomicUsize::new(0));
    let first = owner
        .get_or_add_resource(&device, "sampler", sampler_factory(calls.clone()))
        .expect("created");
    assert!(device.is_live(DeviceObject::Sampler(first.0)));

    owner.clear(&device);
    assert!(!device.is_live(DeviceObject::Sampler(first.0)));
    assert!(owner.contains("sampler"));

    let second = owner.resource(&device, "sampler").expect("re-created");
    assert_ne!(first.0, second.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(owner_calls.load(Ordering::SeqCst), 2);

    cache.clear(&device);
    assert_eq!(device.counts().samplers, 2);
    assert_eq!(device.live_object_count(), 0);
}

#[test]
fn failed_factory_can_be_retried() {
    let device = RecordingDevice::new();
    let cache = Cache::new();
    let owner = cache.get_or_register_owner("renderer", |_| Ok(Sources { created: 0 }));

    device.fail_next_creation("out of samplers");
    let calls = Arc::new(AtomicUsize::new(0));
    let failed = owner.get_or_add_resource(&device, "sampler", sampler_factory(calls.clone()));
    assert!(matches!(failed, Err(CacheError::Factory { ref name, .. }) if name == "sampler"));
    //not poisoned: the entry exists but holds nothing
    assert!(owner.contains("sampler"));

    let corrected = owner
        .get_or_add_resource(&device, "sampler", |device, _| {
            Ok(Sampler(device.create_sampler(SamplerType::Nearest)?))
        })
        .expect("second factory succeeds");
    assert!(device.is_live(DeviceObject::Sampler(corrected.0)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    //the corrected factory is the one used after a clear
    owner.clear(&device);
    owner.resource(&device, "sampler").expect("re-created");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn remove_detaches_without_disposing() {
    let device = RecordingDevice::new();
    let cache = Cache::new();
    let owner = cache.get_or_register_owner("renderer", |_| Ok(Sources { created: 0 }));
    let calls = Arc::new(AtomicUsize::new(0));
    let created = owner
        .get_or_add_resource(&device, "sampler", sampler_factory(calls))
        .expect("created");

    let removed = owner.remove_resource("sampler").expect("was materialized");
    assert_eq!(removed, created);
    assert!(!owner.contains("sampler"));
    owner.clear(&device);
    //the caller owns it now
    assert!(device.is_live(DeviceObject::Sampler(removed.0)));
    assert!(owner.remove_resource("sampler").is_none());
}

#[test]
fn owner_names_are_listed() {
    let cache = Cache::new();
    cache.get_or_register_owner("b", |_| Ok(Sources { created: 0 }));
    cache.get_or_register_owner("a", |_| Ok(Sources { created: 0 }));
    //second call returns the existing owner
    cache.get_or_register_owner("a", |_| Err("unused".into()));
    assert_eq!(cache.owner_names(), vec!["a".to_owned(), "b".to_owned()]);
}
