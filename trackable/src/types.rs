//! Core value types carried by tracked properties
//!
//! A property's payload is deliberately small: the handful of scalar types an
//! analytics backend understands, plus nested property sets which are
//! flattened before an event leaves the engine.

use crate::property::PropertySet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Flattened property map handed to the sink
///
/// Keys are full dotted paths; values never contain nested sets.
pub type Dictionary = BTreeMap<String, Payload>;

/// Value types supported by tracked properties
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Boolean value
    Boolean(bool),
    /// Signed integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Text value
    Text(String),
    /// Nested set of properties, flattened on emission
    Properties(PropertySet),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            Payload::Integer(v) => write!(f, "{}", v),
            Payload::Float(v) => write!(f, "{}", v),
            Payload::Text(v) => write!(f, "{}", v),
            Payload::Properties(set) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in set.dictionary_representation().iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Payload {
    /// Boolean value, if this is a boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, if this is an integer payload
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Payload::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as f64 (integers are widened)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Payload::Integer(v) => Some(*v as f64),
            Payload::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is a text payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Nested set, if this is a nested payload
    pub fn as_properties(&self) -> Option<&PropertySet> {
        match self {
            Payload::Properties(set) => Some(set),
            _ => None,
        }
    }

    /// True for nested property sets
    pub fn is_nested(&self) -> bool {
        matches!(self, Payload::Properties(_))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Boolean(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Payload::Integer(value.into())
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Integer(value)
    }
}

impl From<u32> for Payload {
    fn from(value: u32) -> Self {
        Payload::Integer(value.into())
    }
}

impl From<f32> for Payload {
    fn from(value: f32) -> Self {
        Payload::Float(value.into())
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Payload::Float(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<PropertySet> for Payload {
    fn from(value: PropertySet) -> Self {
        Payload::Properties(value)
    }
}
