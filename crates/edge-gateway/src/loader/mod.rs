//! Module loading with hot reload.
//!
//! [`ModuleLoader`] is the seam between the request pipeline and handler
//! source on disk. [`HandlerRegistry`] is the production implementation;
//! [`ModuleWatcher`] feeds it file-system change events.

pub mod registry;
pub mod watcher;

pub use registry::HandlerRegistry;
pub use watcher::ModuleWatcher;

use crate::error::GatewayError;
use async_trait::async_trait;
use edge_script::HandlerModule;
use std::path::Path;
use std::sync::Arc;

/// Supplies the current compiled version of a handler module.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Return a module reflecting the file's current content on disk.
    ///
    /// Fails with [`GatewayError::Load`] when the file is missing or does
    /// not compile.
    async fn load(&self, path: &Path) -> Result<Arc<HandlerModule>, GatewayError>;

    /// Drop any cached compilation of `path`. Returns whether one existed.
    fn evict(&self, path: &Path) -> bool;

    /// Number of cached modules.
    fn cached(&self) -> usize;
}
