//! The resource capability implemented by generated code.

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    sync::{Arc, OnceLock},
};

use log::{trace, warn};

use crate::{
    cache::{Cache, CacheEntry},
    error::FieldError,
    runtime::Runtime,
    value::Value,
};

/// Construction arguments keyed by field name.
pub type Args = BTreeMap<String, Value>;

/// Shared handle to any resource instance.
pub type ResourceRef = Arc<dyn LrResource>;

/// Argument name that overrides the computed identity of a new instance.
pub const ID_ARG: &str = "__id";

/// Capability every generated resource provides.
///
/// `field`, `compute` and `register` dispatch on the field name and return
/// [`FieldError::FieldNotFound`] for unknown names.
pub trait LrResource: Send + Sync + 'static {
    /// The backing record with name, identity and cache.
    fn mql_resource(&self) -> &Resource;

    /// Read a field through its typed accessor.
    fn field(&self, name: &str) -> Result<Value, FieldError>;

    /// Compute a field into the cache.
    fn compute(&self, name: &str) -> Result<(), FieldError>;

    /// Link a computed field to the arguments it depends on.
    fn register(&self, name: &str) -> Result<(), FieldError>;

    /// Check that every static field has been supplied.
    fn validate(&self) -> Result<(), FieldError>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Hand-written initialization hook run by a generated factory before it
/// consumes its arguments.
///
/// The hook may rewrite the arguments or return an existing instance,
/// in which case the factory returns that instance unchanged.
pub trait InitHook {
    fn init(&self, args: Args) -> Result<(Args, Option<ResourceRef>), FieldError>;
}

/// Identity of a resource instance: resource name plus instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    name: String,
    id: String,
}

impl ResourceKey {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\x00{}", self.name, self.id)
    }
}

/// Backing record embedded in every generated resource struct.
pub struct Resource {
    name: String,
    id: OnceLock<String>,
    cache: Arc<Cache>,
    runtime: Runtime,
}

impl Resource {
    pub fn new(runtime: &Runtime, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: OnceLock::new(),
            cache: Arc::new(Cache::new()),
            runtime: runtime.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance id, empty until the factory assigns it.
    pub fn id(&self) -> &str {
        self.id.get().map(String::as_str).unwrap_or_default()
    }

    /// Assign the instance id. The id is immutable once set.
    pub fn set_id(&self, id: String) {
        if let Err(id) = self.id.set(id) {
            warn!(resource = self.name, id; "Ignoring second id assignment");
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.name.clone(), self.id())
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Shared handle to the cache, for callers that outlive this record.
    pub fn shared_cache(&self) -> Arc<Cache> {
        Arc::clone(&self.cache)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Store the outcome of a claimed computation.
    ///
    /// A not-ready outcome releases the claim and is returned to the
    /// caller. Anything else, including an error, is cached.
    pub fn finish(&self, field: &str, result: Result<Value, FieldError>) -> Result<(), FieldError> {
        match result {
            Err(err) if err.is_not_ready() => {
                trace!(resource = self.name, field; "Computation not ready");
                self.cache.release(field);
                Err(err)
            }
            result => {
                self.cache.store(field, CacheEntry::new(result));
                Ok(())
            }
        }
    }

    /// Handle a failed dependency read during a claimed computation.
    pub fn fail(&self, field: &str, err: FieldError) -> Result<(), FieldError> {
        self.finish(field, Err(err))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("id", &self.id())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
