//! Resource runtime: factory registry, instance de-duplication and
//! change propagation between fields.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, PoisonError, RwLock, Weak},
};

use log::{debug, trace, warn};

use crate::{
    error::FieldError,
    resource::{Args, LrResource, Resource, ResourceKey, ResourceRef},
};

/// Constructor registered for a resource name.
pub type Factory = fn(&Runtime, Args) -> Result<ResourceRef, FieldError>;

/// Factories keyed by resource name.
#[derive(Default, Clone)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `name`, replacing any previous factory.
    pub fn add_factory(&mut self, name: &str, factory: Factory) {
        if self.factories.insert(name.to_string(), factory).is_some() {
            debug!(name; "Replaced resource factory");
        }
    }

    pub fn factory(&self, name: &str) -> Option<Factory> {
        self.factories.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered resource names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

type FieldKey = (ResourceKey, String);

/// Tracked instances are swept for dropped entries once the map reaches
/// at least this size.
const MIN_SWEEP: usize = 64;

#[derive(Default)]
struct Instances {
    live: HashMap<ResourceKey, Weak<dyn LrResource>>,
    sweep_at: usize,
}

#[derive(Default)]
struct RuntimeInner {
    registry: Registry,
    resources: RwLock<Instances>,
    watchers: RwLock<HashMap<FieldKey, Vec<FieldKey>>>,
}

/// Shared runtime handle. Clones refer to the same runtime.
///
/// Instances are tracked weakly; the runtime never keeps a resource alive.
#[derive(Clone, Default)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                registry,
                ..RuntimeInner::default()
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Backing record for a new instance of `name`.
    pub fn new_resource(&self, name: &str) -> Resource {
        Resource::new(self, name)
    }

    /// Create an instance through its registered factory.
    ///
    /// If an instance with the same name and id is still alive it is
    /// returned instead of the new one.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ResourceNotFound`] for unregistered names and
    /// any error raised by the factory.
    pub fn create_resource(&self, name: &str, args: Args) -> Result<ResourceRef, FieldError> {
        let factory = self
            .inner
            .registry
            .factory(name)
            .ok_or_else(|| FieldError::ResourceNotFound(name.to_string()))?;
        let resource = factory(self, args)?;
        Ok(self.track(resource))
    }

    /// Record an instance for de-duplication and return the canonical one.
    pub fn track(&self, resource: ResourceRef) -> ResourceRef {
        let key = resource.mql_resource().key();
        let mut resources = self
            .inner
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = resources.live.get(&key).and_then(Weak::upgrade) {
            debug!(key:% = key; "Reusing cached resource instance");
            return existing;
        }
        trace!(key:% = key; "Tracking resource instance");
        resources.live.insert(key, Arc::downgrade(&resource));
        if resources.live.len() >= resources.sweep_at {
            self.sweep(&mut resources);
            resources.sweep_at = (resources.live.len() * 2).max(MIN_SWEEP);
        }
        resource
    }

    /// Forget dropped instances and the watch links that involve them.
    ///
    /// Returns the number of instances removed. [`Runtime::track`] also
    /// sweeps as the instance map grows.
    pub fn prune(&self) -> usize {
        let mut resources = self
            .inner
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut resources)
    }

    fn sweep(&self, resources: &mut Instances) -> usize {
        let dropped: HashSet<ResourceKey> = resources
            .live
            .iter()
            .filter(|(_, instance)| instance.strong_count() == 0)
            .map(|(key, _)| key.clone())
            .collect();
        if dropped.is_empty() {
            return 0;
        }
        resources.live.retain(|key, _| !dropped.contains(key));

        let mut watchers = self
            .inner
            .watchers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        watchers.retain(|(source, _), targets| {
            targets.retain(|(target, _)| !dropped.contains(target));
            !dropped.contains(source) && !targets.is_empty()
        });
        debug!(dropped = dropped.len(), live = resources.live.len(); "Swept dropped instances");
        dropped.len()
    }

    /// Look up a live instance by key.
    pub fn lookup(&self, key: &ResourceKey) -> Option<ResourceRef> {
        let resources = self
            .inner
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        resources.live.get(key).and_then(Weak::upgrade)
    }

    /// Register `watcher_field` of `watcher` to be recomputed whenever
    /// `field` of `watched` changes.
    ///
    /// Registering the same link twice has no effect.
    pub fn watch_and_compute(
        &self,
        watched: &dyn LrResource,
        field: &str,
        watcher: &dyn LrResource,
        watcher_field: &str,
    ) -> Result<(), FieldError> {
        let source = (watched.mql_resource().key(), field.to_string());
        let target = (watcher.mql_resource().key(), watcher_field.to_string());
        let mut watchers = self
            .inner
            .watchers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let targets = watchers.entry(source).or_default();
        if !targets.contains(&target) {
            trace!(field, watcher_field; "Linked field to watcher");
            targets.push(target);
        }
        Ok(())
    }

    fn watchers_of(&self, resource: &ResourceKey, field: &str) -> Vec<FieldKey> {
        let watchers = self
            .inner
            .watchers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        watchers
            .get(&(resource.clone(), field.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn for_each_watcher(
        &self,
        resource: &dyn LrResource,
        field: &str,
        mut visit: impl FnMut(&dyn LrResource, &str),
    ) {
        let key = resource.mql_resource().key();
        for (watcher_key, watcher_field) in self.watchers_of(&key, field) {
            if watcher_key == key {
                visit(resource, &watcher_field);
            } else if let Some(watcher) = self.lookup(&watcher_key) {
                visit(watcher.as_ref(), &watcher_field);
            } else {
                trace!(watcher:% = watcher_key; "Skipping dropped watcher");
            }
        }
    }

    /// Notify watchers that `field` of `resource` has a new value.
    ///
    /// Each watcher is recomputed. A watcher that produces a value triggers
    /// its own watchers in turn.
    pub fn trigger(&self, resource: &dyn LrResource, field: &str) {
        trace!(resource = resource.mql_resource().name(), field; "Trigger");
        self.for_each_watcher(resource, field, |watcher, watcher_field| {
            self.recompute(watcher, watcher_field);
        });
    }

    fn recompute(&self, resource: &dyn LrResource, field: &str) {
        resource.mql_resource().cache().invalidate(field);
        match resource.compute(field) {
            Ok(()) => {
                if resource.mql_resource().cache().contains(field) {
                    self.trigger(resource, field);
                }
            }
            Err(err) if err.is_not_ready() => {
                trace!(resource = resource.mql_resource().name(), field; "Watcher not ready");
            }
            Err(err) => {
                warn!(
                    resource = resource.mql_resource().name(),
                    field,
                    err:%;
                    "Failed to recompute watcher"
                );
            }
        }
    }

    /// Invalidate `field` of `resource` and every field downstream of it.
    pub fn invalidate(&self, resource: &dyn LrResource, field: &str) {
        if !resource.mql_resource().cache().invalidate(field) {
            return;
        }
        debug!(resource = resource.mql_resource().name(), field; "Invalidated field");
        self.for_each_watcher(resource, field, |watcher, watcher_field| {
            self.invalidate(watcher, watcher_field);
        });
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}
