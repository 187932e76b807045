//! Gateway settings.
//!
//! Layered as defaults → optional config file → `EDGE_GATEWAY_*`
//! environment variables (`__` separates nested keys). CLI flags are
//! applied on top by [`crate::cli::Cli::apply`].

use crate::error::{GatewayError, GatewayResult};
use crate::loader::watcher::is_module_file;
use edge_kernel::config::ConfigLoader;
use edge_kernel::gateway::{GatewayConfig, RouteEntry};
use edge_script::ScriptLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "EDGE_GATEWAY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub server: ServerSettings,
    pub functions: FunctionsSettings,
    /// Explicit routes; module paths are relative to the functions root.
    pub routes: Vec<RouteSettings>,
    pub script: ScriptLimits,
    pub errors: ErrorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest request body read into a handler context.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8082,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionsSettings {
    /// Directory holding handler modules.
    pub root: PathBuf,
    /// Prefix of discovered routes, e.g. `/api` → `/api/calculator`.
    pub route_prefix: String,
    /// Register one route per module file in `root`.
    pub discover: bool,
    /// Evict modules when their files change.
    pub watch: bool,
}

impl Default for FunctionsSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("functions"),
            route_prefix: "/api".to_string(),
            discover: true,
            watch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSettings {
    pub path: String,
    pub module: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorSettings {
    /// Include the script diagnostic trace as `stack` in error bodies.
    pub expose_stack: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "edge_gateway=info,edge_script=info".to_string(),
            json: false,
        }
    }
}

impl GatewaySettings {
    /// Load settings from defaults, an optional file, and the environment.
    pub fn load(file: Option<&Path>) -> GatewayResult<Self> {
        let mut loader = ConfigLoader::new().with_defaults(&Self::default())?;
        if let Some(file) = file {
            loader = loader.with_file(file)?;
        }
        Ok(loader.with_env(ENV_PREFIX).load()?)
    }

    /// `host:port` to listen on.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Resolve the route table: explicit routes first, then discovered
    /// module files that do not collide with them.
    pub fn route_config(&self) -> GatewayResult<GatewayConfig> {
        let root = &self.functions.root;
        let mut config = GatewayConfig::new();
        for route in &self.routes {
            let module = if route.module.is_absolute() {
                route.module.clone()
            } else {
                root.join(&route.module)
            };
            config = config.with_route(RouteEntry::new(route.path.clone(), module));
        }

        if self.functions.discover {
            for module in discover_modules(root)? {
                let Some(stem) = module.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let path = format!("{}/{}", self.functions.route_prefix.trim_end_matches('/'), stem);
                if config.routes.iter().any(|r| r.path == path) {
                    debug!(route = %path, "Explicit route shadows discovered module");
                    continue;
                }
                config = config.with_route(RouteEntry::new(path, module));
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Module files directly under `root`, sorted. Names starting with `_`
/// are skipped.
pub fn discover_modules(root: &Path) -> GatewayResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|source| GatewayError::FunctionsRoot {
        root: root.to_path_buf(),
        source,
    })?;
    let mut modules = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'));
        if path.is_file() && is_module_file(&path) && !hidden {
            modules.push(path);
        }
    }
    modules.sort();
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn settings_for(root: &Path) -> GatewaySettings {
        let mut settings = GatewaySettings::default();
        settings.functions.root = root.to_path_buf();
        settings
    }

    #[test]
    fn defaults() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.socket_addr(), "127.0.0.1:8082");
        assert_eq!(settings.server.max_body_bytes, 2 * 1024 * 1024);
        assert!(settings.functions.discover);
        assert!(!settings.errors.expose_stack);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("edge-gateway.toml");
        fs::write(
            &file,
            r#"
[server]
port = 9090

[errors]
expose_stack = true

[[routes]]
path = "/api/url-shortener/{code}"
module = "url-shortener.rhai"
"#,
        )
        .unwrap();
        let settings = GatewaySettings::load(Some(&file)).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.errors.expose_stack);
        assert_eq!(settings.routes.len(), 1);
        assert_eq!(settings.script, ScriptLimits::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = GatewaySettings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, GatewayError::Settings(_)));
    }

    #[test]
    fn discovery_skips_underscored_and_foreign_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("counter.rhai"), "").unwrap();
        fs::write(dir.path().join("calculator.rhai"), "").unwrap();
        fs::write(dir.path().join("_shared.rhai"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let config = settings_for(dir.path()).route_config().unwrap();
        let paths: Vec<_> = config.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/calculator", "/api/counter"]);
    }

    #[test]
    fn explicit_routes_resolve_against_root_and_win() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("counter.rhai"), "").unwrap();
        fs::write(dir.path().join("other.rhai"), "").unwrap();

        let mut settings = settings_for(dir.path());
        settings.routes.push(RouteSettings {
            path: "/api/counter".into(),
            module: "other.rhai".into(),
        });
        let config = settings.route_config().unwrap();
        let counter = config
            .routes
            .iter()
            .find(|r| r.path == "/api/counter")
            .unwrap();
        assert_eq!(counter.module, dir.path().join("other.rhai"));
        assert_eq!(config.routes.len(), 2);
    }

    #[test]
    fn duplicate_explicit_routes_are_rejected() {
        let dir = tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.functions.discover = false;
        for module in ["a.rhai", "b.rhai"] {
            settings.routes.push(RouteSettings {
                path: "/api/a".into(),
                module: module.into(),
            });
        }
        assert!(matches!(
            settings.route_config(),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = tempdir().unwrap();
        let settings = settings_for(&dir.path().join("missing"));
        assert!(matches!(
            settings.route_config(),
            Err(GatewayError::FunctionsRoot { .. })
        ));
    }
}
