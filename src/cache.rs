// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A tiered, lazily-populated cache for expensive device objects.

The first tier is keyed by an *owner* name: a namespace such as "the resources of the shape
renderer".  Each owner has an owner-level resource (for example the shader sources of that
renderer kind), created on first use from the owner's factory.  The second tier lives inside an
owner and is keyed by resource name ("pipeline/default", "sampler/mipmapped", …); each named
resource is created on first use from its own factory, which receives the device and the owner
resource.

Both tiers are built on [LazySlot]: creation runs under the slot's lock, so when several callers
race to materialize the same resource, exactly one factory call happens and all of them observe the
same value.  A factory that fails propagates its error to the caller that triggered creation and
leaves the slot empty; the cache never retries on its own.

```
use shapes_and_passes::cache::{CachedResource, ResourceCache};
use shapes_and_passes::RecordingDevice;

#[derive(Debug, PartialEq)]
struct Sources(&'static str);
impl CachedResource for Sources {}
#[derive(Debug, PartialEq)]
struct Compiled(String);
impl CachedResource for Compiled {}

let device = RecordingDevice::new();
let cache = ResourceCache::<Sources, Compiled>::new();
let owner = cache.register_owner("Shape2DRenderer", |_| Ok(Sources("fn main() {}"))).unwrap();
let compiled = owner
    .get_or_add_resource(&device, "pipeline", |_, sources| Ok(Compiled(format!("compiled {}", sources.0))))
    .unwrap();
assert_eq!(compiled.0, "compiled fn main() {}");
assert!(cache.register_owner("Shape2DRenderer", |_| Ok(Sources(""))).is_err());
```
*/

mod lazy_slot;

pub use lazy_slot::LazySlot;

use crate::images::device::Device;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

/// What a factory may fail with.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an owner-level resource from the owner name.
pub type OwnerFactory<O> = Arc<dyn Fn(&str) -> Result<O, FactoryError> + Send + Sync>;

/// Creates a named resource from the device and the owner-level resource.
pub type ResourceFactory<O, R> =
    Arc<dyn Fn(&dyn Device, &O) -> Result<R, FactoryError> + Send + Sync>;

/**
Implemented by everything the cache stores.

[Self::dispose] runs when the value is cleared out of the cache.  The default does nothing, which is
right for values that don't hold device objects.
*/
pub trait CachedResource: Send + Sync + 'static {
    fn dispose(&self, _device: &dyn Device) {}
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("{0:?} is already registered")]
    DuplicateName(String),
    #[error("nothing is registered under {0:?}")]
    NotFound(String),
    #[error("factory for {name:?} failed: {source}")]
    Factory {
        name: String,
        #[source]
        source: FactoryError,
    },
}

/// A named resource inside an owner.
pub struct SubEntry<O, R> {
    name: String,
    factory: Mutex<ResourceFactory<O, R>>,
    slot: LazySlot<R>,
}

impl<O, R> Debug for SubEntry<O, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubEntry")
            .field("name", &self.name)
            .field("materialized", &self.slot.is_initialized())
            .finish()
    }
}

impl<O: CachedResource, R: CachedResource> SubEntry<O, R> {
    fn new(name: String, factory: ResourceFactory<O, R>) -> Self {
        Self {
            name,
            factory: Mutex::new(factory),
            slot: LazySlot::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_materialized(&self) -> bool {
        self.slot.is_initialized()
    }

    fn materialize(&self, device: &dyn Device, owner: &O) -> Result<Arc<R>, CacheError> {
        let factory = self.factory.lock().unwrap().clone();
        self.slot
            .get_or_try_init(|| {
                logwise::info_sync!(
                    "materializing cached resource {name}",
                    name = logwise::privacy::LogIt(&self.name)
                );
                factory(device, owner)
            })
            .map_err(|source| CacheError::Factory {
                name: self.name.clone(),
                source,
            })
    }

    //an empty slot adopts the caller's factory
    fn materialize_with(
        &self,
        device: &dyn Device,
        owner: &O,
        factory: ResourceFactory<O, R>,
    ) -> Result<Arc<R>, CacheError> {
        self.slot
            .get_or_try_init(|| {
                *self.factory.lock().unwrap() = factory.clone();
                logwise::info_sync!(
                    "materializing cached resource {name}",
                    name = logwise::privacy::LogIt(&self.name)
                );
                factory(device, owner)
            })
            .map_err(|source| CacheError::Factory {
                name: self.name.clone(),
                source,
            })
    }

    fn clear(&self, device: &dyn Device) {
        if let Some(value) = self.slot.take() {
            value.dispose(device);
        }
    }
}

/**
One owner namespace: a lazily created owner resource plus its named resources.
*/
pub struct OwnerEntry<O, R> {
    name: String,
    factory: OwnerFactory<O>,
    owner: LazySlot<O>,
    resources: Mutex<HashMap<String, Arc<SubEntry<O, R>>>>,
}

impl<O, R> Debug for OwnerEntry<O, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerEntry")
            .field("name", &self.name)
            .field("materialized", &self.owner.is_initialized())
            .field("resources", &self.resources.lock().unwrap().len())
            .finish()
    }
}

impl<O: CachedResource, R: CachedResource> OwnerEntry<O, R> {
    fn new(name: String, factory: OwnerFactory<O>) -> Self {
        Self {
            name,
            factory,
            owner: LazySlot::new(),
            resources: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owner-level resource, created by the owner factory on first access.
    pub fn owner_resource(&self) -> Result<Arc<O>, CacheError> {
        self.owner
            .get_or_try_init(|| {
                logwise::info_sync!(
                    "materializing owner {name}",
                    name = logwise::privacy::LogIt(&self.name)
                );
                (self.factory)(self.name.as_str())
            })
            .map_err(|source| CacheError::Factory {
                name: self.name.clone(),
                source,
            })
    }

    /**
    Registers a named resource without creating it.

    Fails with [CacheError::DuplicateName] if `name` is taken; the entry is unchanged in that case.
    */
    pub fn register_resource<F>(&self, name: &str, factory: F) -> Result<(), CacheError>
    where
        F: Fn(&dyn Device, &O) -> Result<R, FactoryError> + Send + Sync + 'static,
    {
        let mut resources = self.resources.lock().unwrap();
        if resources.contains_key(name) {
            return Err(CacheError::DuplicateName(name.to_owned()));
        }
        resources.insert(
            name.to_owned(),
            Arc::new(SubEntry::new(name.to_owned(), Arc::new(factory))),
        );
        Ok(())
    }

    fn sub_entry(&self, name: &str) -> Option<Arc<SubEntry<O, R>>> {
        self.resources.lock().unwrap().get(name).cloned()
    }

    /// Returns a registered resource, creating it (and the owner resource) on first access.
    pub fn resource(&self, device: &dyn Device, name: &str) -> Result<Arc<R>, CacheError> {
        let entry = self
            .sub_entry(name)
            .ok_or_else(|| CacheError::NotFound(name.to_owned()))?;
        let owner = self.owner_resource()?;
        entry.materialize(device, &owner)
    }

    /**
    Returns the resource registered under `name`, registering and creating it with `factory` if
    needed.

    Idempotent: once a value exists, `factory` is ignored.  Under concurrent calls exactly one
    factory runs.  If an earlier creation failed, the slot is still empty and this call's `factory`
    replaces the stored one.
    */
    pub fn get_or_add_resource<F>(
        &self,
        device: &dyn Device,
        name: &str,
        factory: F,
    ) -> Result<Arc<R>, CacheError>
    where
        F: Fn(&dyn Device, &O) -> Result<R, FactoryError> + Send + Sync + 'static,
    {
        let owner = self.owner_resource()?;
        let factory: ResourceFactory<O, R> = Arc::new(factory);
        let entry = self
            .resources
            .lock()
            .unwrap()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(SubEntry::new(name.to_owned(), factory.clone())))
            .clone();
        if let Some(value) = entry.slot.get() {
            logwise::trace_sync!(
                "cache hit {name}",
                name = logwise::privacy::LogIt(&entry.name)
            );
            return Ok(value);
        }
        entry.materialize_with(device, &owner, factory)
    }

    /// Like [Self::resource], but absent names and failing factories both yield `None`.
    pub fn try_get_resource(&self, device: &dyn Device, name: &str) -> Option<Arc<R>> {
        match self.resource(device, name) {
            Ok(value) => Some(value),
            Err(CacheError::NotFound(_)) => None,
            Err(e) => {
                logwise::warn_sync!(
                    "try_get_resource swallowed {err}",
                    err = logwise::privacy::LogIt(&e)
                );
                None
            }
        }
    }

    /**
    Detaches `name` from this owner without disposing it.

    Returns the created value if there was one; the caller now owns it.
    */
    pub fn remove_resource(&self, name: &str) -> Option<Arc<R>> {
        let entry = self.resources.lock().unwrap().remove(name)?;
        entry.slot.take()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.lock().unwrap().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /**
    Disposes the owner resource and every named resource created through this entry.

    Registrations survive: the next access re-runs the factories.
    */
    pub fn clear(&self, device: &dyn Device) {
        let entries: Vec<Arc<SubEntry<O, R>>> =
            self.resources.lock().unwrap().values().cloned().collect();
        for entry in entries {
            entry.clear(device);
        }
        if let Some(owner) = self.owner.take() {
            owner.dispose(device);
        }
        logwise::info_sync!(
            "cleared owner {name}",
            name = logwise::privacy::LogIt(&self.name)
        );
    }
}

/**
The first cache tier: owner entries by name.

Usually one per device context, shared behind an `Arc` by every draw operation on that device.
*/
pub struct ResourceCache<O, R> {
    owners: Mutex<HashMap<String, Arc<OwnerEntry<O, R>>>>,
}

impl<O, R> Debug for ResourceCache<O, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("owners", &self.owners.lock().unwrap().len())
            .finish()
    }
}

impl<O: CachedResource, R: CachedResource> Default for ResourceCache<O, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: CachedResource, R: CachedResource> ResourceCache<O, R> {
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Fails with [CacheError::DuplicateName] if `name` is already an owner.
    pub fn register_owner<F>(&self, name: &str, factory: F) -> Result<Arc<OwnerEntry<O, R>>, CacheError>
    where
        F: Fn(&str) -> Result<O, FactoryError> + Send + Sync + 'static,
    {
        let mut owners = self.owners.lock().unwrap();
        if owners.contains_key(name) {
            return Err(CacheError::DuplicateName(name.to_owned()));
        }
        let entry = Arc::new(OwnerEntry::new(name.to_owned(), Arc::new(factory)));
        owners.insert(name.to_owned(), entry.clone());
        Ok(entry)
    }

    /// Fails with [CacheError::NotFound] if `name` was never registered.
    pub fn owner(&self, name: &str) -> Result<Arc<OwnerEntry<O, R>>, CacheError> {
        self.owners
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(name.to_owned()))
    }

    /// Returns the owner `name`, registering it with `factory` if absent.
    pub fn get_or_register_owner<F>(&self, name: &str, factory: F) -> Arc<OwnerEntry<O, R>>
    where
        F: Fn(&str) -> Result<O, FactoryError> + Send + Sync + 'static,
    {
        self.owners
            .lock()
            .unwrap()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(OwnerEntry::new(name.to_owned(), Arc::new(factory))))
            .clone()
    }

    pub fn owner_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.owners.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Clears every owner (see [OwnerEntry::clear]).
    pub fn clear(&self, device: &dyn Device) {
        let owners: Vec<Arc<OwnerEntry<O, R>>> =
            self.owners.lock().unwrap().values().cloned().collect();
        for owner in owners {
            owner.clear(device);
        }
    }
}
