//! Per-module handler state exposed to scripts as `req.state`.
//!
//! A [`StateHandle`] is a cheap clone of a shared concurrent map. The
//! gateway creates one per handler module on first use and hands the same
//! handle to every invocation of that module, whichever route served it, so
//! counters and lookup tables survive between requests (and hot reloads)
//! until the process exits. Nothing is persisted.

use crate::convert::{dynamic_to_json, json_to_dynamic};
use dashmap::DashMap;
use rhai::{Dynamic, Engine, EvalAltResult};
use serde_json::Value;
use std::sync::Arc;

/// Shared key/value state owned by one handler module.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    entries: Arc<DashMap<String, Value>>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomically add `by` to an integer entry, starting from 0.
    /// Returns the new value. Fails if the entry holds a non-integer.
    pub fn incr(&self, key: &str, by: i64) -> Result<i64, String> {
        let mut entry = self.entries.entry(key.to_string()).or_insert(Value::from(0));
        let current = entry
            .as_i64()
            .ok_or_else(|| format!("state key '{key}' does not hold an integer"))?;
        let next = current.saturating_add(by);
        *entry = Value::from(next);
        Ok(next)
    }

    /// Snapshot of the whole map as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        )
    }
}

pub(crate) fn register(engine: &mut Engine) {
    engine.register_type_with_name::<StateHandle>("State");

    engine.register_fn("get", |s: &mut StateHandle, key: &str| -> Dynamic {
        s.get(key).map(|v| json_to_dynamic(&v)).unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("set", |s: &mut StateHandle, key: &str, value: Dynamic| {
        s.set(key, dynamic_to_json(&value));
    });
    engine.register_fn(
        "incr",
        |s: &mut StateHandle, key: &str| -> Result<i64, Box<EvalAltResult>> {
            s.incr(key, 1).map_err(Into::into)
        },
    );
    engine.register_fn(
        "incr",
        |s: &mut StateHandle, key: &str, by: i64| -> Result<i64, Box<EvalAltResult>> {
            s.incr(key, by).map_err(Into::into)
        },
    );
    engine.register_fn("contains", |s: &mut StateHandle, key: &str| s.contains(key));
    engine.register_fn("remove", |s: &mut StateHandle, key: &str| -> Dynamic {
        s.remove(key).map(|v| json_to_dynamic(&v)).unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("len", |s: &mut StateHandle| s.len() as i64);
}
