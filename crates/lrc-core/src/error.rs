//! Field-level errors raised by generated resources.

use std::{error::Error, sync::Arc};

use thiserror::Error;

/// Failure reading, computing or constructing a resource field.
///
/// Cloneable so a computed failure can live in the field cache and be
/// returned to every later reader.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    /// The value is being computed elsewhere, or one of its inputs is not
    /// available yet. Callers retry after the next trigger.
    #[error("field is not ready yet")]
    NotReady,

    #[error("cannot find field '{field}' in \"{resource}\" resource")]
    FieldNotFound { resource: String, field: String },

    #[error("\"{resource}\" has no value for field \"{field}\"")]
    NoValue { resource: String, field: String },

    #[error("\"{resource}\" computed \"{field}\" but its value is missing from the cache")]
    CacheMiss { resource: String, field: String },

    #[error(
        "failed to initialize \"{resource}\": argument \"{field}\" has the wrong type (expected type \"{expected}\")"
    )]
    TypeMismatch {
        resource: String,
        field: String,
        expected: String,
    },

    #[error("initialized \"{resource}\" with unknown argument \"{argument}\"")]
    UnknownArgument { resource: String, argument: String },

    #[error("\"{resource}\" failed to cast field \"{field}\" to {expected}")]
    CastFailed {
        resource: String,
        field: String,
        expected: String,
    },

    #[error("cannot find resource \"{0}\"")]
    ResourceNotFound(String),

    #[error("{0}")]
    Message(String),

    /// Error raised by a hand-written fetch routine.
    #[error(transparent)]
    Fetch(Arc<dyn Error + Send + Sync>),
}

impl FieldError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    pub fn field_not_found(resource: &str, field: &str) -> Self {
        Self::FieldNotFound {
            resource: resource.to_string(),
            field: field.to_string(),
        }
    }

    pub fn no_value(resource: &str, field: &str) -> Self {
        Self::NoValue {
            resource: resource.to_string(),
            field: field.to_string(),
        }
    }

    pub fn cache_miss(resource: &str, field: &str) -> Self {
        Self::CacheMiss {
            resource: resource.to_string(),
            field: field.to_string(),
        }
    }

    pub fn type_mismatch(resource: &str, field: &str, expected: &str) -> Self {
        Self::TypeMismatch {
            resource: resource.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn unknown_argument(resource: &str, argument: &str) -> Self {
        Self::UnknownArgument {
            resource: resource.to_string(),
            argument: argument.to_string(),
        }
    }

    pub fn cast_failed(resource: &str, field: &str, expected: &str) -> Self {
        Self::CastFailed {
            resource: resource.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an error produced by a fetch routine.
    pub fn fetch<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Fetch(Arc::new(err))
    }
}
