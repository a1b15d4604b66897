//! Dynamic field values.
//!
//! Generated factories receive their arguments as [`Value`]s and the field
//! cache stores them. Typed accessors convert back with [`FromValue`].

use std::{collections::BTreeMap, fmt, sync::Arc, time::SystemTime};

use crate::{
    resource::{LrResource, ResourceRef},
    types::Type,
};

/// A dynamically typed field value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Stored without a type check.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Regex(String),
    Time(SystemTime),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Resource(ResourceRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short label of the runtime variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Regex(_) => "regex",
            Self::Time(_) => "time",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Resource(_) => "resource",
        }
    }

    /// Check whether this value can be stored in a field of type `ty`.
    ///
    /// `dict` and `any` accept every value. Strings are accepted where a
    /// regex is expected. Null elements inside lists and maps are skipped.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (_, Type::Dict | Type::Any) => true,
            (Self::Bool(_), Type::Bool)
            | (Self::Int(_), Type::Int)
            | (Self::Float(_), Type::Float)
            | (Self::String(_), Type::String)
            | (Self::Regex(_) | Self::String(_), Type::Regex)
            | (Self::Time(_), Type::Time) => true,
            (Self::Array(items), Type::Array(element)) => items
                .iter()
                .all(|item| item.is_null() || item.conforms_to(element)),
            (Self::Map(entries), Type::Map(_, value)) => entries
                .values()
                .all(|item| item.is_null() || item.conforms_to(value)),
            (Self::Resource(resource), Type::Resource(name)) => {
                resource.mql_resource().name() == name
            }
            _ => false,
        }
    }

    /// Downcast a resource value to the concrete generated struct.
    pub fn into_resource<T: LrResource>(self) -> Option<Arc<T>> {
        match self {
            Self::Resource(resource) => resource.into_any().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::String(value) => f.debug_tuple("String").field(value).finish(),
            Self::Regex(value) => f.debug_tuple("Regex").field(value).finish(),
            Self::Time(value) => f.debug_tuple("Time").field(value).finish(),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Resource(resource) => f
                .debug_tuple("Resource")
                .field(&resource.mql_resource().key())
                .finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) | (Self::Regex(a), Self::Regex(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Resource(a), Self::Resource(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<SystemTime> for Value {
    fn from(value: SystemTime) -> Self {
        Self::Time(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl From<ResourceRef> for Value {
    fn from(value: ResourceRef) -> Self {
        Self::Resource(value)
    }
}

/// Typed extraction out of a [`Value`].
///
/// Returns `None` when the value holds a different variant. A null list or
/// map converts to an empty collection.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(value) => Some(value),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(value) | Value::Regex(value) => Some(value),
            _ => None,
        }
    }
}

impl FromValue for SystemTime {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Time(value) => Some(value),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items),
            Value::Null => Some(Vec::new()),
            _ => None,
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => Some(entries),
            Value::Null => Some(BTreeMap::new()),
            _ => None,
        }
    }
}

impl FromValue for ResourceRef {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Resource(resource) => Some(resource),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conforms_to_primitives() {
        assert!(Value::from(true).conforms_to(&Type::Bool));
        assert!(Value::from(3_i64).conforms_to(&Type::Int));
        assert!(!Value::from(3_i64).conforms_to(&Type::Float));
        assert!(Value::from("x").conforms_to(&Type::Regex));
        assert!(!Value::Regex("x".into()).conforms_to(&Type::String));
        assert!(Value::from(SystemTime::UNIX_EPOCH).conforms_to(&Type::Time));
    }

    #[test]
    fn test_dict_and_any_accept_everything() {
        for value in [Value::from(1_i64), Value::from("a"), Value::Array(vec![])] {
            assert!(value.conforms_to(&Type::Dict));
            assert!(value.conforms_to(&Type::Any));
        }
    }

    #[test]
    fn test_conforms_to_collections() {
        let list = Value::from(vec![Value::from(1_i64), Value::Null, Value::from(2_i64)]);
        assert!(list.conforms_to(&Type::array(Type::Int)));
        assert!(!list.conforms_to(&Type::array(Type::String)));
        assert!(!list.conforms_to(&Type::Int));

        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::from("x"));
        let map = Value::from(entries);
        assert!(map.conforms_to(&Type::map(Type::String, Type::String)));
        assert!(!map.conforms_to(&Type::map(Type::String, Type::Int)));
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(i64::from_value(Value::from(7_i64)), Some(7));
        assert_eq!(i64::from_value(Value::from("7")), None);
        assert_eq!(
            String::from_value(Value::Regex("a+".into())),
            Some("a+".to_string())
        );
        assert_eq!(Vec::<Value>::from_value(Value::Null), Some(vec![]));
        assert_eq!(bool::from_value(Value::Null), None);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from("a"), Value::from("a".to_string()));
        assert_ne!(Value::from("a"), Value::Regex("a".into()));
        assert_ne!(Value::from(1_i64), Value::from(1.0));
        assert_eq!(Value::default(), Value::Null);
    }
}
