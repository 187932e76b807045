//! The script-visible request object (`Request`).

use crate::convert::json_to_dynamic;
use crate::state::StateHandle;
use edge_kernel::gateway::{AdaptedRequest, RequestBody};
use rhai::{Dynamic, Engine, EvalAltResult, Map};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only view of one [`AdaptedRequest`] plus its module's state handle.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    inner: Arc<AdaptedRequest>,
    state: StateHandle,
}

impl EdgeRequest {
    pub fn new(inner: Arc<AdaptedRequest>, state: StateHandle) -> Self {
        Self { inner, state }
    }

    fn body(&self) -> Dynamic {
        match &self.inner.body {
            RequestBody::Empty => Dynamic::UNIT,
            RequestBody::Json { value, .. } => json_to_dynamic(value),
            RequestBody::Text(text) => Dynamic::from(text.clone()),
        }
    }

    /// The body parsed at request start. Never touches the transport again.
    fn json(&self) -> Result<Dynamic, Box<EvalAltResult>> {
        match &self.inner.body {
            RequestBody::Empty => Ok(Dynamic::UNIT),
            RequestBody::Json { value, .. } => Ok(json_to_dynamic(value)),
            RequestBody::Text(_) => Err("request body is not valid JSON".into()),
        }
    }
}

fn string_map(entries: &BTreeMap<String, String>) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.as_str().into(), Dynamic::from(v.clone())))
        .collect()
}

pub(crate) fn register(engine: &mut Engine) {
    engine.register_type_with_name::<EdgeRequest>("Request");

    engine.register_get("id", |r: &mut EdgeRequest| r.inner.id.clone());
    engine.register_get("method", |r: &mut EdgeRequest| r.inner.method.clone());
    engine.register_get("url", |r: &mut EdgeRequest| r.inner.url.clone());
    engine.register_get("path", |r: &mut EdgeRequest| r.inner.path.clone());
    engine.register_get("query", |r: &mut EdgeRequest| string_map(&r.inner.query));
    engine.register_get("headers", |r: &mut EdgeRequest| string_map(&r.inner.headers));
    engine.register_get("params", |r: &mut EdgeRequest| string_map(&r.inner.params));
    engine.register_get("body", |r: &mut EdgeRequest| r.body());
    engine.register_get("state", |r: &mut EdgeRequest| r.state.clone());

    engine.register_fn("json", |r: &mut EdgeRequest| r.json());
    engine.register_fn("text", |r: &mut EdgeRequest| r.inner.body.text().to_string());
    engine.register_fn("header", |r: &mut EdgeRequest, name: &str| -> Dynamic {
        r.inner
            .header(name)
            .map(|v| Dynamic::from(v.to_string()))
            .unwrap_or(Dynamic::UNIT)
    });
}
