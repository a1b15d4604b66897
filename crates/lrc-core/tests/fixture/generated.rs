// Code generated by lrc. DO NOT EDIT.

#[allow(unused_imports)]
use std::{any::Any, collections::BTreeMap, sync::Arc, time::SystemTime};

#[allow(unused_imports)]
use log::trace;

#[allow(unused_imports)]
use lrc_core::{
    Args, CacheEntry, Claim, FieldError, FromValue, ID_ARG, InitHook, LrResource, Registry,
    Resource, ResourceKey, ResourceRef, Runtime, Type, Value,
};

/// Register the factories of every resource in this module.
pub fn init(registry: &mut Registry) {
    registry.add_factory("demo.file", new_demo_file);
    registry.add_factory("demo.user", new_demo_user);
}

// demo.file

/// A file on the demo system
pub trait DemoFile: LrResource {
    fn path(&self) -> Result<String, FieldError>;
    fn size(&self) -> Result<i64, FieldError>;
    fn perms(&self) -> Result<String, FieldError>;
}

/// Backing struct of the `demo.file` resource.
pub struct MqlDemoFile {
    inner: Resource,
}

/// Create a `demo.file` instance from its arguments.
pub fn new_demo_file(runtime: &Runtime, args: Args) -> Result<ResourceRef, FieldError> {
    let res = MqlDemoFile {
        inner: runtime.new_resource("demo.file"),
    };
    let mut id = None;
    for (name, value) in args {
        if value.is_null() {
            res.inner.cache().store(&name, CacheEntry::value(value));
            continue;
        }
        match name.as_str() {
            "path" => {
                if !value.conforms_to(&Type::String) {
                    return Err(FieldError::type_mismatch("demo.file", "path", "string"));
                }
            }
            "size" => {
                if !value.conforms_to(&Type::Int) {
                    return Err(FieldError::type_mismatch("demo.file", "size", "int"));
                }
            }
            "perms" => {
                if !value.conforms_to(&Type::String) {
                    return Err(FieldError::type_mismatch("demo.file", "perms", "string"));
                }
            }
            ID_ARG => {
                let Value::String(value) = value else {
                    return Err(FieldError::type_mismatch("demo.file", ID_ARG, "string"));
                };
                id = Some(value);
                continue;
            }
            _ => return Err(FieldError::unknown_argument("demo.file", &name)),
        }
        res.inner.cache().store(&name, CacheEntry::value(value));
    }
    let id = match id {
        Some(id) => id,
        None => res.id()?,
    };
    res.inner.set_id(id);
    Ok(Arc::new(res))
}

impl LrResource for MqlDemoFile {
    fn mql_resource(&self) -> &Resource {
        &self.inner
    }

    fn field(&self, name: &str) -> Result<Value, FieldError> {
        trace!(resource = "demo.file", field = name; "Get field");
        match name {
            "path" => DemoFile::path(self).map(Value::from),
            "size" => DemoFile::size(self).map(Value::from),
            "perms" => DemoFile::perms(self).map(Value::from),
            _ => Err(FieldError::field_not_found("demo.file", name)),
        }
    }

    fn compute(&self, name: &str) -> Result<(), FieldError> {
        trace!(resource = "demo.file", field = name; "Compute field");
        match name {
            "path" => Ok(()),
            "size" => self.compute_size(),
            "perms" => self.compute_perms(),
            _ => Err(FieldError::field_not_found("demo.file", name)),
        }
    }

    fn register(&self, name: &str) -> Result<(), FieldError> {
        trace!(resource = "demo.file", field = name; "Register field");
        match name {
            "path" => Ok(()),
            "size" => Ok(()),
            "perms" => {
                let runtime = self.inner.runtime();
                runtime.watch_and_compute(self, "path", self, "perms")?;
                runtime.watch_and_compute(self, "size", self, "perms")?;
                Ok(())
            }
            _ => Err(FieldError::field_not_found("demo.file", name)),
        }
    }

    fn validate(&self) -> Result<(), FieldError> {
        for field in ["path"] {
            if !self.inner.cache().contains(field) {
                return Err(FieldError::no_value("demo.file", field));
            }
        }
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl DemoFile for MqlDemoFile {
    fn path(&self) -> Result<String, FieldError> {
        let Some(entry) = self.inner.cache().load("path") else {
            return Err(FieldError::no_value("demo.file", "path"));
        };
        let value = entry.into_result()?;
        FromValue::from_value(value)
            .ok_or_else(|| FieldError::cast_failed("demo.file", "path", "String"))
    }

    fn size(&self) -> Result<i64, FieldError> {
        let entry = match self.inner.cache().load("size") {
            Some(entry) => entry,
            None => {
                self.compute_size()?;
                let entry = self
                    .inner
                    .cache()
                    .load("size")
                    .ok_or_else(|| FieldError::cache_miss("demo.file", "size"))?;
                self.inner.runtime().trigger(self, "size");
                entry
            }
        };
        let value = entry.into_result()?;
        FromValue::from_value(value)
            .ok_or_else(|| FieldError::cast_failed("demo.file", "size", "i64"))
    }

    fn perms(&self) -> Result<String, FieldError> {
        let Some(entry) = self.inner.cache().load("perms") else {
            return Err(FieldError::NotReady);
        };
        let value = entry.into_result()?;
        FromValue::from_value(value)
            .ok_or_else(|| FieldError::cast_failed("demo.file", "perms", "String"))
    }
}

impl MqlDemoFile {
    /// Compute `size` with `get_size(&self) -> Result<i64, FieldError>`.
    pub fn compute_size(&self) -> Result<(), FieldError> {
        match self.inner.cache().claim("size") {
            Claim::Acquired => {}
            Claim::Present => return Ok(()),
            Claim::InFlight => return Err(FieldError::NotReady),
        }
        let result = self.get_size();
        self.inner.finish("size", result.map(Value::from))
    }

    /// Compute `perms` with `get_perms(&self, path: String, size: i64) -> Result<String, FieldError>`.
    pub fn compute_perms(&self) -> Result<(), FieldError> {
        if self.inner.cache().reclaim("perms") == Claim::InFlight {
            return Err(FieldError::NotReady);
        }
        let arg_path = match DemoFile::path(self) {
            Ok(value) => value,
            Err(err) => return self.inner.fail("perms", err),
        };
        let arg_size = match DemoFile::size(self) {
            Ok(value) => value,
            Err(err) => return self.inner.fail("perms", err),
        };
        let result = self.get_perms(arg_path, arg_size);
        self.inner.finish("perms", result.map(Value::from))
    }
}

// demo.user

pub trait DemoUser: LrResource {
    fn name(&self) -> Result<String, FieldError>;
    fn home(&self) -> Result<Arc<MqlDemoFile>, FieldError>;
}

/// Backing struct of the `demo.user` resource.
pub struct MqlDemoUser {
    inner: Resource,
}

/// Create a `demo.user` instance from its arguments.
pub fn new_demo_user(runtime: &Runtime, args: Args) -> Result<ResourceRef, FieldError> {
    let res = MqlDemoUser {
        inner: runtime.new_resource("demo.user"),
    };
    let (args, existing) = InitHook::init(&res, args)?;
    if let Some(existing) = existing {
        return Ok(existing);
    }
    let mut id = None;
    for (name, value) in args {
        if value.is_null() {
            res.inner.cache().store(&name, CacheEntry::value(value));
            continue;
        }
        match name.as_str() {
            "name" => {
                if !value.conforms_to(&Type::String) {
                    return Err(FieldError::type_mismatch("demo.user", "name", "string"));
                }
            }
            "home" => {
                if !value.conforms_to(&Type::resource("demo.file")) {
                    return Err(FieldError::type_mismatch("demo.user", "home", "demo.file"));
                }
            }
            ID_ARG => {
                let Value::String(value) = value else {
                    return Err(FieldError::type_mismatch("demo.user", ID_ARG, "string"));
                };
                id = Some(value);
                continue;
            }
            _ => return Err(FieldError::unknown_argument("demo.user", &name)),
        }
        res.inner.cache().store(&name, CacheEntry::value(value));
    }
    let id = match id {
        Some(id) => id,
        None => res.id()?,
    };
    res.inner.set_id(id);
    Ok(Arc::new(res))
}

impl LrResource for MqlDemoUser {
    fn mql_resource(&self) -> &Resource {
        &self.inner
    }

    fn field(&self, name: &str) -> Result<Value, FieldError> {
        trace!(resource = "demo.user", field = name; "Get field");
        match name {
            "name" => DemoUser::name(self).map(Value::from),
            "home" => DemoUser::home(self).map(|res| Value::Resource(res)),
            _ => Err(FieldError::field_not_found("demo.user", name)),
        }
    }

    fn compute(&self, name: &str) -> Result<(), FieldError> {
        trace!(resource = "demo.user", field = name; "Compute field");
        match name {
            "name" => Ok(()),
            "home" => self.compute_home(),
            _ => Err(FieldError::field_not_found("demo.user", name)),
        }
    }

    fn register(&self, name: &str) -> Result<(), FieldError> {
        trace!(resource = "demo.user", field = name; "Register field");
        match name {
            "name" => Ok(()),
            "home" => Ok(()),
            _ => Err(FieldError::field_not_found("demo.user", name)),
        }
    }

    fn validate(&self) -> Result<(), FieldError> {
        for field in ["name"] {
            if !self.inner.cache().contains(field) {
                return Err(FieldError::no_value("demo.user", field));
            }
        }
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl DemoUser for MqlDemoUser {
    fn name(&self) -> Result<String, FieldError> {
        let Some(entry) = self.inner.cache().load("name") else {
            return Err(FieldError::no_value("demo.user", "name"));
        };
        let value = entry.into_result()?;
        FromValue::from_value(value)
            .ok_or_else(|| FieldError::cast_failed("demo.user", "name", "String"))
    }

    fn home(&self) -> Result<Arc<MqlDemoFile>, FieldError> {
        let entry = match self.inner.cache().load("home") {
            Some(entry) => entry,
            None => {
                self.compute_home()?;
                let entry = self
                    .inner
                    .cache()
                    .load("home")
                    .ok_or_else(|| FieldError::cache_miss("demo.user", "home"))?;
                self.inner.runtime().trigger(self, "home");
                entry
            }
        };
        let value = entry.into_result()?;
        value
            .into_resource::<MqlDemoFile>()
            .ok_or_else(|| FieldError::cast_failed("demo.user", "home", "Arc<MqlDemoFile>"))
    }
}

impl MqlDemoUser {
    /// Compute `home` with `get_home(&self) -> Result<Arc<MqlDemoFile>, FieldError>`.
    pub fn compute_home(&self) -> Result<(), FieldError> {
        match self.inner.cache().claim("home") {
            Claim::Acquired => {}
            Claim::Present => return Ok(()),
            Claim::InFlight => return Err(FieldError::NotReady),
        }
        let result = self.get_home();
        self.inner.finish("home", result.map(|res| Value::Resource(res)))
    }
}
