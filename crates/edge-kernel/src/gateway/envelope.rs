//! Response-side data types: what a handler produced, and the single
//! normalized envelope the gateway writes back to the client.
//!
//! Handlers speak one of two conventions. A handler may *return* a
//! Response-shaped value ([`ReturnedValue::Response`]), or *write* into the
//! legacy response builder, whose accumulated state is the
//! [`ResponseRecord`]. [`HandlerOutput`] carries both observations to the
//! translator, which reduces them to one [`ResponseEnvelope`].

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// CORS
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed CORS header set attached to every gateway response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "authorization, x-client-info, apikey, content-type",
    ),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
];

/// The answer to an `OPTIONS` preflight: 200, empty body, CORS headers.
pub fn cors_preflight() -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::new(200);
    envelope.apply_cors();
    envelope
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a [`ResponseEnvelope`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EnvelopeBody {
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
}

/// The normalized `{status, headers, body}` triple written to the transport
/// exactly once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Headers in insertion order. Names keep the case the handler used;
    /// lookups and replacement are case-insensitive.
    pub headers: Vec<(String, String)>,
    pub body: EnvelopeBody,
}

impl ResponseEnvelope {
    /// An envelope with the given status, no headers and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: EnvelopeBody::Empty,
        }
    }

    /// An envelope with a JSON body.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: EnvelopeBody::Json(value),
        }
    }

    /// Builder helper: set a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Merge the CORS triple in. Headers the handler already set win.
    pub fn apply_cors(&mut self) {
        for (name, value) in CORS_HEADERS {
            if self.header(name).is_none() {
                self.headers.push((name.to_string(), value.to_string()));
            }
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some(slot) => slot.1 = value,
        None => headers.push((name, value)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy builder record
// ─────────────────────────────────────────────────────────────────────────────

/// State accumulated by the legacy response builder during one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: EnvelopeBody,
    /// Set by every builder call; an untouched record means the handler
    /// never wrote a response.
    pub touched: bool,
}

impl Default for ResponseRecord {
    fn default() -> Self {
        Self {
            status_code: 200,
            headers: Vec::new(),
            body: EnvelopeBody::Empty,
            touched: false,
        }
    }
}

impl ResponseRecord {
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler output
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a Response-shaped return value, before JSON sniffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnedBody {
    Null,
    Text(String),
    Value(serde_json::Value),
}

/// A Response-shaped value returned by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnedResponse {
    /// `None` when the handler did not specify one.
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: ReturnedBody,
}

/// Classification of whatever the handler's entry point returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnedValue {
    /// A Response-shaped value.
    Response(ReturnedResponse),
    /// Any other non-unit value, e.g. a plain map.
    Value(serde_json::Value),
    /// Unit, or the legacy builder itself.
    Nothing,
}

/// Everything the translator needs to know about one handler invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerOutput {
    pub returned: ReturnedValue,
    /// The legacy builder's record, present only if the builder was touched.
    pub record: Option<ResponseRecord>,
}

impl HandlerOutput {
    pub fn returned(returned: ReturnedValue) -> Self {
        Self {
            returned,
            record: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_carries_cors_triple() {
        let envelope = cors_preflight();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.body, EnvelopeBody::Empty);
        assert_eq!(envelope.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            envelope.header("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(envelope.headers.len(), 3);
    }

    #[test]
    fn handler_headers_win_over_cors_defaults() {
        let mut envelope =
            ResponseEnvelope::new(200).with_header("access-control-allow-origin", "https://a.test");
        envelope.apply_cors();
        assert_eq!(
            envelope.header("Access-Control-Allow-Origin"),
            Some("https://a.test")
        );
        assert_eq!(envelope.headers.len(), 3);
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut record = ResponseRecord::default();
        record.set_header("Content-Type", "text/plain");
        record.set_header("content-type", "application/json");
        assert_eq!(record.headers.len(), 1);
        assert_eq!(record.headers[0].1, "application/json");
    }
}
