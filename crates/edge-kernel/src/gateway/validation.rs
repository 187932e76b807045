//! Gateway route configuration container and startup validation.
//!
//! [`GatewayConfig`] aggregates the route definitions and exposes a single
//! [`validate()`](GatewayConfig::validate) method that checks all structural
//! invariants *before* the server binds its listener.

use super::error::GatewayError;
use super::router::RouteEntry;
use std::collections::HashSet;

// ─────────────────────────────────────────────────────────────────────────────
// GatewayConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The set of routes the gateway will serve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// All route definitions, explicit entries first.
    pub routes: Vec<RouteEntry>,
}

impl GatewayConfig {
    /// Construct an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a route.
    pub fn with_route(mut self, route: RouteEntry) -> Self {
        self.routes.push(route);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns the *first* detected [`GatewayError`]. Checks performed, in
    /// order:
    /// 1. At least one route is defined.
    /// 2. Each route passes its own entry check (non-empty path starting
    ///    with `/`, well-formed `{param}` segments, a module path).
    /// 3. No two routes share the same path template.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.routes.is_empty() {
            return Err(GatewayError::NoRoutes);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen.insert(route.path.as_str()) {
                return Err(GatewayError::DuplicateRoute(route.path.clone()));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> RouteEntry {
        RouteEntry::new("/api/calculator", "functions/calculator.rhai")
    }

    fn valid_config() -> GatewayConfig {
        GatewayConfig::new()
            .with_route(calculator())
            .with_route(RouteEntry::new(
                "/api/url-shortener/{code}",
                "functions/url-shortener.rhai",
            ))
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn no_routes_returns_error() {
        assert_eq!(GatewayConfig::new().validate(), Err(GatewayError::NoRoutes));
    }

    #[test]
    fn duplicate_route_path_returns_error() {
        let cfg = valid_config().with_route(calculator());
        assert_eq!(
            cfg.validate(),
            Err(GatewayError::DuplicateRoute("/api/calculator".to_string()))
        );
    }

    #[test]
    fn same_module_under_two_paths_is_allowed() {
        let cfg = valid_config().with_route(RouteEntry::new(
            "/api/calc",
            "functions/calculator.rhai",
        ));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn route_without_leading_slash_returns_error() {
        let cfg = GatewayConfig::new().with_route(RouteEntry::new("api/calculator", "c.rhai"));
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::InvalidPathPattern(_, _))
        ));
    }

    #[test]
    fn whitespace_only_path_returns_error() {
        let cfg = GatewayConfig::new().with_route(RouteEntry::new("   ", "c.rhai"));
        assert_eq!(cfg.validate(), Err(GatewayError::EmptyRoutePath));
    }
}
