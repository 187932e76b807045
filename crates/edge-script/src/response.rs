//! Response-side script types.
//!
//! * `Response(body[, init])` builds a [`ResponseValue`], the per-request
//!   stand-in for a platform `Response` object. Nothing global is touched.
//! * [`ResponseBuilder`] is the legacy `res` argument. Rhai passes arguments
//!   by value, so every clone shares one [`ResponseRecord`] behind a mutex
//!   and the engine reads it back after the entry point returns.

use crate::convert::{dynamic_to_json, dynamic_to_text};
use edge_kernel::gateway::{EnvelopeBody, ResponseRecord, ReturnedBody, ReturnedResponse};
use parking_lot::Mutex;
use rhai::{Dynamic, Engine, EvalAltResult, Map};
use serde_json::{Value, json};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Response adapter
// ─────────────────────────────────────────────────────────────────────────────

/// A Response-shaped value constructed by a handler.
#[derive(Debug, Clone)]
pub struct ResponseValue {
    pub(crate) inner: ReturnedResponse,
}

impl ResponseValue {
    pub fn into_returned(self) -> ReturnedResponse {
        self.inner
    }

    pub(crate) fn to_json(&self) -> Value {
        let body = match &self.inner.body {
            ReturnedBody::Null => Value::Null,
            ReturnedBody::Text(text) => Value::String(text.clone()),
            ReturnedBody::Value(value) => value.clone(),
        };
        json!({
            "status": self.inner.status.unwrap_or(200),
            "headers": self
                .inner
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<serde_json::Map<_, _>>(),
            "body": body,
        })
    }
}

fn returned_body(body: &Dynamic) -> ReturnedBody {
    if body.is_unit() {
        ReturnedBody::Null
    } else if body.is_string() {
        ReturnedBody::Text(body.to_string())
    } else {
        ReturnedBody::Value(dynamic_to_json(body))
    }
}

fn header_pairs(headers: &Map) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), dynamic_to_text(v)))
        .collect()
}

fn status_code(value: &Dynamic) -> Option<i64> {
    if let Ok(i) = value.as_int() {
        return Some(i);
    }
    value
        .as_float()
        .ok()
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
}

fn checked_status(code: i64) -> Result<u16, Box<EvalAltResult>> {
    match u16::try_from(code) {
        Ok(code) if (100..=599).contains(&code) => Ok(code),
        _ => Err(format!("status {code} is outside the range 100-599").into()),
    }
}

fn new_response(body: Dynamic, init: &Map) -> Result<ResponseValue, Box<EvalAltResult>> {
    let status = match init.get("status") {
        None => None,
        Some(v) if v.is_unit() => None,
        Some(v) => {
            let code = status_code(v).ok_or("Response status must be a number")?;
            Some(checked_status(code)?)
        }
    };
    let headers = match init.get("headers") {
        None => Vec::new(),
        Some(v) => match v.read_lock::<Map>() {
            Some(map) => header_pairs(&map),
            None if v.is_unit() => Vec::new(),
            None => return Err("Response headers must be a map".into()),
        },
    };
    Ok(ResponseValue {
        inner: ReturnedResponse {
            status,
            headers,
            body: returned_body(&body),
        },
    })
}

/// Treat a plain map as a Response-shaped value when it has a `body` key
/// plus a numeric `status` and/or a map of `headers`. A `status` or
/// `headers` of any other type leaves the map as plain data. An out-of-range
/// status is kept as-is and answered with 500 when the envelope is written.
pub(crate) fn response_from_map(map: &Map) -> Option<ReturnedResponse> {
    let body = map.get("body")?;
    let status = match map.get("status") {
        None => None,
        Some(v) => Some(status_code(v)?),
    };
    let headers = match map.get("headers") {
        None => None,
        Some(v) => Some(header_pairs(&*v.read_lock::<Map>()?)),
    };
    if status.is_none() && headers.is_none() {
        return None;
    }
    Some(ReturnedResponse {
        status: status.map(|code| u16::try_from(code).unwrap_or(0)),
        headers: headers.unwrap_or_default(),
        body: returned_body(body),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy builder
// ─────────────────────────────────────────────────────────────────────────────

/// The legacy `res` object. Calls accumulate into a shared record.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
    record: Arc<Mutex<ResponseRecord>>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the accumulated record.
    pub fn snapshot(&self) -> ResponseRecord {
        self.record.lock().clone()
    }

    fn touch(&self, f: impl FnOnce(&mut ResponseRecord)) -> Self {
        let mut record = self.record.lock();
        record.touched = true;
        f(&mut *record);
        self.clone()
    }

    fn set_json(record: &mut ResponseRecord, data: &Dynamic) {
        record.body = EnvelopeBody::Json(dynamic_to_json(data));
        if !record.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            record.set_header("Content-Type", "application/json");
        }
    }

    fn set_send(record: &mut ResponseRecord, data: &Dynamic) {
        if data.is_unit() {
            record.body = EnvelopeBody::Empty;
        } else if data.is_string() {
            record.body = EnvelopeBody::Text(data.to_string());
        } else {
            Self::set_json(record, data);
        }
    }

    fn redirect(&self, code: i64, url: &str) -> Result<Self, Box<EvalAltResult>> {
        let code = checked_status(code)?;
        Ok(self.touch(|r| {
            r.status_code = code;
            r.set_header("Location", url);
        }))
    }
}

pub(crate) fn register(engine: &mut Engine) {
    engine.register_type_with_name::<ResponseValue>("Response");
    engine.register_fn("Response", |body: Dynamic| {
        new_response(body, &Map::new())
    });
    engine.register_fn("Response", |body: Dynamic, init: Map| new_response(body, &init));
    engine.register_get("status", |r: &mut ResponseValue| {
        i64::from(r.inner.status.unwrap_or(200))
    });
    engine.register_get("body", |r: &mut ResponseValue| -> Dynamic {
        match &r.inner.body {
            ReturnedBody::Null => Dynamic::UNIT,
            ReturnedBody::Text(text) => Dynamic::from(text.clone()),
            ReturnedBody::Value(value) => crate::convert::json_to_dynamic(value),
        }
    });

    engine.register_type_with_name::<ResponseBuilder>("ResponseBuilder");
    engine.register_fn(
        "status",
        |b: &mut ResponseBuilder, code: i64| -> Result<ResponseBuilder, Box<EvalAltResult>> {
            let code = checked_status(code)?;
            Ok(b.touch(|r| r.status_code = code))
        },
    );
    for name in ["set_header", "setHeader"] {
        engine.register_fn(name, |b: &mut ResponseBuilder, key: &str, value: Dynamic| {
            b.touch(|r| r.set_header(key, dynamic_to_text(&value)))
        });
    }
    engine.register_fn("json", |b: &mut ResponseBuilder, data: Dynamic| {
        b.touch(|r| ResponseBuilder::set_json(r, &data))
    });
    engine.register_fn("send", |b: &mut ResponseBuilder, data: Dynamic| {
        b.touch(|r| ResponseBuilder::set_send(r, &data))
    });
    engine.register_fn("redirect", |b: &mut ResponseBuilder, url: &str| {
        b.redirect(302, url)
    });
    engine.register_fn("redirect", |b: &mut ResponseBuilder, code: i64, url: &str| {
        b.redirect(code, url)
    });
    engine.register_fn("end", |b: &mut ResponseBuilder| b.touch(|_| {}));
    engine.register_fn("end", |b: &mut ResponseBuilder, data: Dynamic| {
        b.touch(|r| ResponseBuilder::set_send(r, &data))
    });
}
