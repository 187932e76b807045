//! Versioned handler registry keyed by canonical module path.

use super::ModuleLoader;
use crate::error::GatewayError;
use async_trait::async_trait;
use dashmap::DashMap;
use edge_script::{HandlerEngine, HandlerModule};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache of compiled handler modules.
///
/// Every [`load`](ModuleLoader::load) re-reads the source and compares its
/// SHA-256 digest with the cached module. A changed digest compiles a new
/// module with the next version number and swaps it in; an unchanged one
/// reuses the compiled module. A compile failure removes the stale entry
/// so an outdated handler is never served.
pub struct HandlerRegistry {
    engine: Arc<HandlerEngine>,
    modules: DashMap<PathBuf, Arc<HandlerModule>>,
    /// Last version handed out per path. Survives eviction so versions
    /// keep increasing across reloads.
    versions: DashMap<PathBuf, u64>,
}

impl HandlerRegistry {
    pub fn new(engine: Arc<HandlerEngine>) -> Self {
        Self {
            engine,
            modules: DashMap::new(),
            versions: DashMap::new(),
        }
    }

    /// Cached module for `path`, if any. `path` must be canonical.
    pub fn get(&self, path: &Path) -> Option<Arc<HandlerModule>> {
        self.modules.get(path).map(|entry| entry.value().clone())
    }

    fn digest(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn next_version(&self, path: &Path) -> u64 {
        let mut version = self.versions.entry(path.to_path_buf()).or_insert(0);
        *version += 1;
        *version
    }
}

#[async_trait]
impl ModuleLoader for HandlerRegistry {
    async fn load(&self, path: &Path) -> Result<Arc<HandlerModule>, GatewayError> {
        let load_error = |err: std::io::Error| GatewayError::Load {
            module: path.to_path_buf(),
            message: err.to_string(),
            trace: None,
        };
        let canonical = tokio::fs::canonicalize(path).await.map_err(load_error)?;
        let source = tokio::fs::read_to_string(&canonical)
            .await
            .map_err(load_error)?;
        let digest = Self::digest(&source);

        if let Some(module) = self.get(&canonical) {
            if module.digest == digest {
                debug!(module = %canonical.display(), version = module.version, "Reusing compiled module");
                return Ok(module);
            }
        }

        let version = self.next_version(&canonical);
        match self.engine.compile(&canonical, &source, digest, version) {
            Ok(module) => {
                let module = Arc::new(module);
                self.modules.insert(canonical.clone(), module.clone());
                info!(
                    module = %canonical.display(),
                    version,
                    kind = module.kind.label(),
                    "Loaded handler module"
                );
                Ok(module)
            }
            Err(err) => {
                self.modules.remove(&canonical);
                warn!(module = %canonical.display(), error = %err, "Handler module failed to load");
                Err(GatewayError::from_script(canonical, err))
            }
        }
    }

    fn evict(&self, path: &Path) -> bool {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let evicted = self.modules.remove(&key).is_some();
        if evicted {
            debug!(module = %key.display(), "Evicted handler module");
        }
        evicted
    }

    fn cached(&self) -> usize {
        self.modules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_script::HandlerKind;
    use std::fs;
    use tempfile::tempdir;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new(Arc::new(HandlerEngine::default()))
    }

    #[tokio::test]
    async fn unchanged_source_reuses_module() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.rhai");
        fs::write(&file, "fn handler(req) { 1 }").unwrap();

        let registry = registry();
        let first = registry.load(&file).await.unwrap();
        let second = registry.load(&file).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.version, 1);
        assert_eq!(registry.cached(), 1);
    }

    #[tokio::test]
    async fn changed_source_bumps_version() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.rhai");
        fs::write(&file, "fn handler(req) { 1 }").unwrap();

        let registry = registry();
        let first = registry.load(&file).await.unwrap();
        fs::write(&file, "fn handler(req, res) { res.end() }").unwrap();
        let second = registry.load(&file).await.unwrap();
        assert_eq!(second.version, first.version + 1);
        assert_ne!(first.digest, second.digest);
        assert!(matches!(second.kind, HandlerKind::WritesResponse(_)));
    }

    #[tokio::test]
    async fn missing_file_is_load_error() {
        let dir = tempdir().unwrap();
        let err = registry()
            .load(&dir.path().join("missing.rhai"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Load { .. }));
    }

    #[tokio::test]
    async fn failed_compile_drops_stale_module() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.rhai");
        fs::write(&file, "fn handler(req) { 1 }").unwrap();

        let registry = registry();
        registry.load(&file).await.unwrap();
        fs::write(&file, "fn handler(req) { ").unwrap();
        let err = registry.load(&file).await.unwrap_err();
        assert!(matches!(err, GatewayError::Load { .. }));
        assert_eq!(registry.cached(), 0);

        fs::write(&file, "fn handler(req) { 2 }").unwrap();
        let module = registry.load(&file).await.unwrap();
        assert_eq!(module.version, 3);
    }

    #[tokio::test]
    async fn evict_forces_recompile() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.rhai");
        fs::write(&file, "fn handler(req) { 1 }").unwrap();

        let registry = registry();
        let first = registry.load(&file).await.unwrap();
        assert!(registry.evict(&file));
        assert!(!registry.evict(&file));
        let second = registry.load(&file).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.version, 2);
    }
}
