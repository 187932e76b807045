//! Route table implementing [`GatewayRouter`].
//!
//! Exact routes are kept ahead of templated ones so a literal path always
//! wins over a `{param}` capture; within each group routes resolve in
//! registration order. Resolution is a linear scan over segment-wise
//! template matches, which is plenty for a local route table.

use edge_kernel::gateway::{
    GatewayConfig, GatewayError, GatewayRouter, RouteEntry, RouteMatch, router::is_param_segment,
};
use std::collections::HashMap;

/// [`GatewayRouter`] backed by an ordered list of [`RouteEntry`] values.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and register every route it declares.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let mut table = Self::new();
        for route in &config.routes {
            table.register(route.clone())?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match a concrete path against a template such as
    /// `/api/url-shortener/{code}`.
    ///
    /// Returns the captured parameters on a match. Captures must be
    /// non-empty, so `/api/url-shortener/` does not match the template above.
    fn match_path(template: &str, path: &str) -> Option<HashMap<String, String>> {
        let t_parts: Vec<&str> = template.trim_matches('/').split('/').collect();
        let p_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

        if t_parts.len() != p_parts.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (t, p) in t_parts.iter().zip(p_parts.iter()) {
            if is_param_segment(t) {
                if p.is_empty() {
                    return None;
                }
                params.insert(t[1..t.len() - 1].to_string(), p.to_string());
            } else if t != p {
                return None;
            }
        }
        Some(params)
    }
}

impl GatewayRouter for RouteTable {
    fn register(&mut self, route: RouteEntry) -> Result<(), GatewayError> {
        if self.routes.iter().any(|r| r.path == route.path) {
            return Err(GatewayError::DuplicateRoute(route.path));
        }
        let pos = if route.is_templated() {
            self.routes.len()
        } else {
            self.routes.partition_point(|r| !r.is_templated())
        };
        self.routes.insert(pos, route);
        Ok(())
    }

    fn resolve(&self, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            Self::match_path(&route.path, path).map(|path_params| RouteMatch {
                route: route.path.clone(),
                module: route.module.clone(),
                path_params,
            })
        })
    }

    fn routes(&self) -> Vec<&RouteEntry> {
        self.routes.iter().collect()
    }
}
