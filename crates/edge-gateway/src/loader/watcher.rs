//! File-system watcher that evicts handler modules on change.

use super::ModuleLoader;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Extension of handler module files.
pub const MODULE_EXTENSION: &str = "rhai";

/// Watches the functions root and evicts changed modules from a loader.
///
/// Eviction is an early reload signal only: the loader's digest check
/// already picks up edits. Dropping the watcher stops it.
pub struct ModuleWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl ModuleWatcher {
    /// Start watching `root` recursively. Must be called inside a tokio
    /// runtime.
    pub fn spawn(root: &Path, loader: Arc<dyn ModuleLoader>) -> Result<Self, notify::Error> {
        let root = std::fs::canonicalize(root).map_err(notify::Error::io)?;
        let (tx, mut rx) = mpsc::channel::<Event>(1024);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(err) => warn!(error = %err, "Module watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "Watching handler modules");

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    continue;
                }
                for path in event.paths.iter().filter(|p| is_module_file(p)) {
                    if loader.evict(path) {
                        info!(module = %path.display(), "Handler module changed, evicted");
                    } else {
                        debug!(module = %path.display(), "Handler module changed");
                    }
                }
            }
        });

        Ok(Self {
            root,
            _watcher: watcher,
            task,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for ModuleWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `true` for paths with the handler module extension.
pub fn is_module_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::HandlerRegistry;
    use edge_script::HandlerEngine;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn module_files_are_recognised() {
        assert!(is_module_file(Path::new("functions/counter.rhai")));
        assert!(!is_module_file(Path::new("functions/counter.rhai.swp")));
        assert!(!is_module_file(Path::new("functions/README")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn modification_evicts_cached_module() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.rhai");
        std::fs::write(&file, "fn handler(req) { 1 }").unwrap();

        let registry = Arc::new(HandlerRegistry::new(Arc::new(HandlerEngine::default())));
        registry.load(&file).await.unwrap();
        let _watcher = ModuleWatcher::spawn(dir.path(), registry.clone()).unwrap();

        std::fs::write(&file, "fn handler(req) { 2 }").unwrap();
        let mut evicted = false;
        for _ in 0..50 {
            if registry.cached() == 0 {
                evicted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(evicted, "watcher did not evict the modified module");
    }
}
