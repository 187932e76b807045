//! Core request-side data types for the gateway kernel contract.
//!
//! These types are shared between the HTTP server (which builds them from
//! the transport request) and the script runtime (which exposes them to
//! handler modules). They carry no runtime dependencies beyond `serde`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Request body
// ─────────────────────────────────────────────────────────────────────────────

/// The request body, parsed once when the adapted request is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestBody {
    /// No body, or a body consisting only of whitespace.
    Empty,
    /// A body that parsed as JSON, kept alongside the text it came from.
    Json { value: serde_json::Value, raw: String },
    /// Any other body, as (lossily decoded) UTF-8 text.
    Text(String),
}

impl RequestBody {
    /// Classify raw body bytes. JSON is recognised regardless of the
    /// declared content type.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        if text.trim().is_empty() {
            return RequestBody::Empty;
        }
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => RequestBody::Json {
                value,
                raw: text.into_owned(),
            },
            Err(_) => RequestBody::Text(text.into_owned()),
        }
    }

    /// The body exactly as received (`""` when empty).
    pub fn text(&self) -> &str {
        match self {
            RequestBody::Empty => "",
            RequestBody::Json { raw, .. } => raw,
            RequestBody::Text(text) => text,
        }
    }

    /// The parsed value, for JSON bodies.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            RequestBody::Json { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapted request
// ─────────────────────────────────────────────────────────────────────────────

/// The request object handed to handler modules.
///
/// Built once per request and read-only from the handler's perspective.
/// All fields use owned types so the struct can cross into the blocking
/// pool that runs handler code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptedRequest {
    /// Unique identifier for correlating this request across logs.
    pub id: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute URL, `http://{host}{path}[?{query}]`.
    pub url: String,
    /// Request path, e.g. `/api/calculator`.
    pub path: String,
    /// Decoded query parameters (the last occurrence of a name wins).
    pub query: BTreeMap<String, String>,
    /// HTTP headers (header names are lowercased).
    pub headers: BTreeMap<String, String>,
    /// Values captured by `{param}` segments of the matched route.
    pub params: BTreeMap<String, String>,
    /// The body, parsed at construction time.
    pub body: RequestBody,
}

impl AdaptedRequest {
    /// Construct a minimal request with the given id, method, and path.
    pub fn new(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: id.into(),
            method: method.into().to_uppercase(),
            url: format!("http://localhost{path}"),
            path,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Builder helper: set the absolute URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: attach a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Builder helper: set the captured path parameters.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route match
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a successful route lookup.
///
/// Carries the matched route plus any path parameters extracted during
/// matching (e.g. `code → "Ab12Cd"` for `/api/url-shortener/{code}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Template of the matched route.
    pub route: String,
    /// Handler module backing the route.
    pub module: PathBuf,
    /// Path parameters extracted from the URL template.
    pub path_params: HashMap<String, String>,
}
