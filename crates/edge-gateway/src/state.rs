//! Handler state shared across invocations.

use dashmap::DashMap;
use edge_script::StateHandle;
use std::path::{Path, PathBuf};

/// One [`StateHandle`] per handler module, keyed by canonical module path.
///
/// Keying by module lets several routes served by one module (for example
/// `/api/url-shortener` and `/api/url-shortener/{code}`) share state.
/// Handles outlive module reloads, so a counter keeps counting when its
/// source is edited. State is process-local and lost on restart.
#[derive(Debug, Default)]
pub struct StateStore {
    handles: DashMap<PathBuf, StateHandle>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle for `module`, created on first use.
    pub fn handle(&self, module: &Path) -> StateHandle {
        if let Some(handle) = self.handles.get(module) {
            return handle.clone();
        }
        self.handles
            .entry(module.to_path_buf())
            .or_insert_with(StateHandle::new)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
