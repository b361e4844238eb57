//! Interpreter runtime abstraction
//!
//! The stager drives the runtime through these traits so it never depends
//! on how the runtime is hosted:
//! - `NodeRuntimeLoader`: Pyodide hosted by Node.js through the bridge
//! - test doubles that record calls in memory

use crate::error::StageResult;
use crate::proxy::ProxySelection;
use async_trait::async_trait;
use std::path::Path;

/// Loads the embedded interpreter runtime
#[async_trait]
pub trait RuntimeLoader: Send + Sync {
    /// Start the runtime with its package cache bound to `cache_dir`.
    ///
    /// Network calls made by the runtime go through the selected proxy.
    async fn load(
        &self,
        cache_dir: &Path,
        proxy: &ProxySelection,
    ) -> StageResult<Box<dyn InterpreterRuntime>>;

    /// Human-readable runtime name for display
    fn runtime_name(&self) -> &'static str;
}

/// A loaded interpreter runtime and its package installer.
///
/// Calls must not overlap; the installer keeps internal state that is not
/// safe for concurrent use.
#[async_trait]
pub trait InterpreterRuntime: Send {
    /// Runtime version reported at load time
    fn version(&self) -> Option<&str>;

    /// Load the installer module into the runtime
    async fn load_installer(&mut self, name: &str) -> StageResult<()>;

    /// Install one package and its dependencies
    async fn install(&mut self, package: &str) -> StageResult<()>;

    /// Produce the lock file payload for everything installed so far
    async fn freeze(&mut self) -> StageResult<serde_json::Value>;

    /// Stop the runtime
    async fn shutdown(&mut self) -> StageResult<()>;
}
