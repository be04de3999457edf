// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Parameter values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Transform;

/// Named parameters of a transform, ordered by name
pub type Params = BTreeMap<String, ParamValue>;

/// A single parameter value
///
/// `Map` values, non-finite floats and transforms nested inside plain values
/// have no direct JSON form; the flow value codec wraps them in an opaque
/// fallback encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
    Transform(Box<Transform>),
}

impl ParamValue {
    /// The nested transform, if this value is one
    pub fn as_transform(&self) -> Option<&Transform> {
        match self {
            Self::Transform(t) => Some(t),
            _ => None,
        }
    }

    /// The nested transforms, if this value is a non-empty list made only of
    /// transforms
    pub fn as_transform_list(&self) -> Option<Vec<&Transform>> {
        match self {
            Self::List(items) if !items.is_empty() => {
                items.iter().map(ParamValue::as_transform).collect()
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value maps onto a JSON literal without any wrapping
    pub fn is_primitive(&self) -> bool {
        match self {
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Str(_) => true,
            Self::Float(f) => f.is_finite(),
            Self::List(_) | Self::Map(_) | Self::Transform(_) => false,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Transform> for ParamValue {
    fn from(v: Transform) -> Self {
        Self::Transform(Box::new(v))
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
