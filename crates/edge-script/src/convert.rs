//! Conversions between `serde_json::Value` and Rhai `Dynamic`.

use crate::response::{ResponseBuilder, ResponseValue};
use crate::state::StateHandle;
use rhai::{Dynamic, Map};
use serde_json::Value;

/// Largest integer a float can represent exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Convert a JSON value to a Rhai `Dynamic`.
pub fn json_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(arr) => Dynamic::from(arr.iter().map(json_to_dynamic).collect::<rhai::Array>()),
        Value::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.as_str().into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

/// Convert a Rhai `Dynamic` to a JSON value.
///
/// Floats without a fractional part serialise as integers, the way a
/// JavaScript number would (`5.0` → `5`). Non-finite floats become `null`.
pub fn dynamic_to_json(value: &Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::from(i);
    }
    if let Ok(f) = value.as_float() {
        return float_to_json(f);
    }
    if let Ok(c) = value.as_char() {
        return Value::String(c.to_string());
    }
    if value.is_string() {
        return Value::String(value.to_string());
    }
    if let Some(arr) = value.read_lock::<rhai::Array>() {
        return Value::Array(arr.iter().map(dynamic_to_json).collect());
    }
    if let Some(map) = value.read_lock::<Map>() {
        return map_to_json(&map);
    }
    if let Some(response) = value.read_lock::<ResponseValue>() {
        return response.to_json();
    }
    if let Some(state) = value.read_lock::<StateHandle>() {
        return state.to_json();
    }
    if value.is::<ResponseBuilder>() {
        return Value::Null;
    }
    Value::String(value.to_string())
}

pub(crate) fn map_to_json(map: &Map) -> Value {
    let mut obj = serde_json::Map::new();
    for (k, v) in map.iter() {
        obj.insert(k.to_string(), dynamic_to_json(v));
    }
    Value::Object(obj)
}

pub(crate) fn float_to_json(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Value::from(f as i64);
    }
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Render a value as plain header/display text: strings verbatim, anything
/// else through its JSON form.
pub(crate) fn dynamic_to_text(value: &Dynamic) -> String {
    if value.is_string() {
        return value.to_string();
    }
    match dynamic_to_json(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
