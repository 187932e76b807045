//! Gateway error types for `edge-kernel`.
//!
//! [`GatewayError`] covers every failure mode that can be detected at
//! *definition time* (empty paths, duplicate registrations, malformed
//! templates) before the first request is accepted. Per-request failures
//! (missing module, handler exception, untranslatable output) belong in the
//! gateway implementation crate (`edge-gateway`).

use thiserror::Error;

/// Configuration error type for the gateway kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Routes ───────────────────────────────────────────────────────────────
    /// The configuration contains no routes.
    #[error("gateway config must define at least one route")]
    NoRoutes,

    /// A route path is empty or whitespace-only.
    #[error("route path cannot be empty")]
    EmptyRoutePath,

    /// A route with this path has already been registered.
    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),

    /// A route path template is syntactically invalid.
    #[error("route '{0}' has an invalid path pattern: {1}")]
    InvalidPathPattern(String, String),

    // ── Modules ──────────────────────────────────────────────────────────────
    /// A route does not name a handler module.
    #[error("route '{0}' does not reference a handler module")]
    EmptyModulePath(String),
}
