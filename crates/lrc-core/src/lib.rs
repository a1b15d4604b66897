//! LR Runtime Contract
//!
//! Code generated from an LR resource definition links against this crate.
//! It provides:
//!
//! - **Types**: The LR type system shared with the schema ([`types::Type`])
//! - **Values**: Dynamic field values and typed conversions ([`value::Value`])
//! - **Cache**: Per-instance field cache with single-writer claims ([`cache::Cache`])
//! - **Resources**: The capability every generated resource implements ([`resource::LrResource`])
//! - **Runtime**: Factory registry, instance de-duplication and change
//!   propagation ([`runtime::Runtime`])
//! - **Errors**: Field-level failures surfaced by generated accessors ([`error::FieldError`])

pub mod cache;
pub mod error;
pub mod resource;
pub mod runtime;
pub mod types;
pub mod value;

pub use cache::{CacheEntry, Claim};
pub use error::FieldError;
pub use resource::{Args, ID_ARG, InitHook, LrResource, Resource, ResourceKey, ResourceRef};
pub use runtime::{Factory, Registry, Runtime};
pub use types::Type;
pub use value::{FromValue, Value};
