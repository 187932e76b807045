//! Gateway router trait and route entries.
//!
//! The [`GatewayRouter`] trait is the single kernel-level abstraction for
//! request routing. Implementations (e.g. the route table in
//! `edge-gateway`) are populated at startup and looked up on every inbound
//! request. Routes accept every HTTP method; the method only matters for the
//! CORS preflight short-circuit, which the server handles after matching.

use super::error::GatewayError;
use super::types::RouteMatch;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Route entry
// ─────────────────────────────────────────────────────────────────────────────

/// A single routing rule mapping a path template to a handler module file.
///
/// Path templates follow the `{param}` syntax used by axum 0.8+:
/// ```text
/// /api/calculator              exact path
/// /api/url-shortener/{code}    captures `code`
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    /// URL path template. Must begin with `/`. Unique within a table.
    pub path: String,
    /// Path of the handler module backing this route.
    pub module: PathBuf,
}

impl RouteEntry {
    /// Create a route entry.
    pub fn new(path: impl Into<String>, module: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            module: module.into(),
        }
    }

    /// Whether the template contains at least one `{param}` segment.
    pub fn is_templated(&self) -> bool {
        self.path.split('/').any(is_param_segment)
    }

    /// Basic sanity checks run during [`GatewayConfig::validate()`](super::GatewayConfig::validate).
    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.path.trim().is_empty() {
            return Err(GatewayError::EmptyRoutePath);
        }
        if !self.path.starts_with('/') {
            return Err(GatewayError::InvalidPathPattern(
                self.path.clone(),
                "path pattern must start with '/'".to_string(),
            ));
        }
        for segment in self.path.split('/') {
            let opens = segment.matches('{').count();
            let closes = segment.matches('}').count();
            if opens == 0 && closes == 0 {
                continue;
            }
            if !is_param_segment(segment) || segment.len() == 2 {
                return Err(GatewayError::InvalidPathPattern(
                    self.path.clone(),
                    format!("malformed parameter segment '{segment}'"),
                ));
            }
        }
        if self.module.as_os_str().is_empty() {
            return Err(GatewayError::EmptyModulePath(self.path.clone()));
        }
        Ok(())
    }
}

/// `true` for a whole-segment capture such as `{code}`.
pub fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('{')
        && segment.ends_with('}')
        && segment.matches('{').count() == 1
        && segment.matches('}').count() == 1
}

// ─────────────────────────────────────────────────────────────────────────────
// Router trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for request routing.
///
/// The trait is intentionally synchronous: route lookups are pure in-memory
/// matching. No I/O, and in particular no module loading.
pub trait GatewayRouter: Send + Sync {
    /// Register a new route. Returns [`GatewayError::DuplicateRoute`] if a
    /// route with the same path is already registered.
    fn register(&mut self, route: RouteEntry) -> Result<(), GatewayError>;

    /// Resolve a request path to the best matching route.
    /// Returns `None` when no route matches.
    fn resolve(&self, path: &str) -> Option<RouteMatch>;

    /// Return a snapshot of all registered routes in resolution order.
    fn routes(&self) -> Vec<&RouteEntry>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_segment_detection() {
        assert!(is_param_segment("{code}"));
        assert!(!is_param_segment("code"));
        assert!(!is_param_segment("{code"));
        assert!(!is_param_segment("{a}{b}"));
    }

    #[test]
    fn templated_entry_is_detected() {
        assert!(RouteEntry::new("/api/url-shortener/{code}", "u.rhai").is_templated());
        assert!(!RouteEntry::new("/api/counter", "c.rhai").is_templated());
    }

    #[test]
    fn malformed_parameter_is_rejected() {
        let entry = RouteEntry::new("/api/{}", "x.rhai");
        assert!(matches!(
            entry.validate(),
            Err(GatewayError::InvalidPathPattern(_, _))
        ));
        let entry = RouteEntry::new("/api/{code", "x.rhai");
        assert!(entry.validate().is_err());
    }

    #[test]
    fn empty_module_is_rejected() {
        let entry = RouteEntry::new("/api/counter", "");
        assert_eq!(
            entry.validate(),
            Err(GatewayError::EmptyModulePath("/api/counter".to_string()))
        );
    }
}
