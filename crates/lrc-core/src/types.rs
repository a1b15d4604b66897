//! The LR type system.
//!
//! A [`Type`] is the lowered form of an LR type expression. Aliased and
//! package-qualified references have already been replaced by the target
//! resource name, so two types are equal exactly when their canonical
//! labels are equal.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A lowered LR type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int,
    Float,
    String,
    Regex,
    Time,
    /// Free-form dictionary value.
    Dict,
    Any,
    /// Homogeneous list, written `[]T`.
    Array(Box<Type>),
    /// Keyed map, written `map[K]V`.
    Map(Box<Type>, Box<Type>),
    /// Reference to a resource by its dotted id.
    Resource(String),
}

impl Type {
    /// Look up one of the built-in primitive names.
    ///
    /// Returns `None` for anything that is not a primitive, which callers
    /// treat as a resource reference.
    pub fn primitive(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "regex" => Self::Regex,
            "time" => Self::Time,
            "dict" => Self::Dict,
            "any" => Self::Any,
            _ => return None,
        };
        Some(ty)
    }

    pub fn array(element: Type) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn resource(name: impl Into<String>) -> Self {
        Self::Resource(name.into())
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Map(..) | Self::Resource(_))
    }

    /// The referenced resource id, if this is a resource type.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Self::Resource(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Regex => write!(f, "regex"),
            Self::Time => write!(f, "time"),
            Self::Dict => write!(f, "dict"),
            Self::Any => write!(f, "any"),
            Self::Array(element) => write!(f, "[]{element}"),
            Self::Map(key, value) => write!(f, "map[{key}]{value}"),
            Self::Resource(name) => write!(f, "{name}"),
        }
    }
}

/// Error returned when a type label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type label `{0}`")]
pub struct InvalidTypeLabel(String);

impl FromStr for Type {
    type Err = InvalidTypeLabel;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        if let Some(element) = label.strip_prefix("[]") {
            return Ok(Self::array(element.parse()?));
        }
        if let Some(rest) = label.strip_prefix("map[") {
            let (key, value) = rest
                .split_once(']')
                .ok_or_else(|| InvalidTypeLabel(label.to_string()))?;
            return Ok(Self::map(key.parse()?, value.parse()?));
        }
        if label.is_empty() || label.contains(['[', ']']) {
            return Err(InvalidTypeLabel(label.to_string()));
        }
        Ok(Self::primitive(label).unwrap_or_else(|| Self::resource(label)))
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(de::Error::custom)
    }
}
