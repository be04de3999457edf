// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Hyperparameter value codec
//!
//! Lists are encoded element-wise; null, booleans, integers, strings and
//! finite floats pass through as JSON literals. Everything else is wrapped as
//! `{"encoding": "pickle", "value": <base64>}` around the postcard bytes of the
//! value, so nothing is dropped even though the payload is opaque to readers
//! outside this crate.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

use crate::errors::{FlowError, FlowResult};
use crate::transform::ParamValue;

/// Tag of the fallback wrapper
pub const PICKLE_ENCODING: &str = "pickle";

const ENCODING_KEY: &str = "encoding";
const VALUE_KEY: &str = "value";

/// Encode a parameter value as JSON
pub fn encode_value(value: &ParamValue) -> FlowResult<Value> {
    let encoded = match value {
        ParamValue::List(items) => Value::Array(
            items
                .iter()
                .map(encode_value)
                .collect::<FlowResult<_>>()?,
        ),
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int(i) => Value::from(*i),
        ParamValue::Str(s) => Value::String(s.clone()),
        ParamValue::Float(f) => match serde_json::Number::from_f64(*f) {
            Some(n) => Value::Number(n),
            None => wrap(value)?,
        },
        ParamValue::Map(_) | ParamValue::Transform(_) => wrap(value)?,
    };

    Ok(encoded)
}

/// Decode a JSON value produced by [`encode_value`]
pub fn decode_value(value: &Value) -> FlowResult<ParamValue> {
    let decoded = match value {
        Value::Array(items) => ParamValue::List(
            items
                .iter()
                .map(decode_value)
                .collect::<FlowResult<_>>()?,
        ),
        Value::Object(map) => unwrap(map)?,
        Value::Null => ParamValue::Null,
        Value::Bool(b) => ParamValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ParamValue::Int(i),
            None => ParamValue::Float(n.as_f64().ok_or_else(|| FlowError::InvalidEncodedValue {
                reason: format!("number {} is not representable", n),
            })?),
        },
        Value::String(s) => ParamValue::Str(s.clone()),
    };

    Ok(decoded)
}

fn wrap(value: &ParamValue) -> FlowResult<Value> {
    let blob = postcard::to_allocvec(value).map_err(|e| FlowError::InvalidEncodedValue {
        reason: e.to_string(),
    })?;

    Ok(json!({
        ENCODING_KEY: PICKLE_ENCODING,
        VALUE_KEY: STANDARD.encode(blob),
    }))
}

fn unwrap(map: &Map<String, Value>) -> FlowResult<ParamValue> {
    match map.get(ENCODING_KEY) {
        Some(Value::String(encoding)) if encoding == PICKLE_ENCODING => {}
        Some(Value::String(encoding)) => {
            return Err(FlowError::UnknownEncoding {
                encoding: encoding.clone(),
            })
        }
        Some(other) => {
            return Err(FlowError::UnknownEncoding {
                encoding: other.to_string(),
            })
        }
        None => {
            return Err(FlowError::UnknownEncoding {
                encoding: "<missing>".to_string(),
            })
        }
    }

    let payload = map
        .get(VALUE_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| FlowError::InvalidEncodedValue {
            reason: "missing 'value' string".to_string(),
        })?;

    let blob = STANDARD
        .decode(payload)
        .map_err(|e| FlowError::InvalidEncodedValue {
            reason: format!("invalid base64: {}", e),
        })?;

    postcard::from_bytes(&blob).map_err(|e| FlowError::InvalidEncodedValue {
        reason: format!("unreadable payload: {}", e),
    })
}
