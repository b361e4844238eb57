//! CLI command implementations

pub mod assets;
pub mod completions;
pub mod config;
pub mod init;
pub mod packages;
pub mod prepare;
pub mod proxy;

pub use assets::execute as assets;
pub use completions::execute as completions;
pub use config::execute as config;
pub use init::execute as init;
pub use packages::execute as packages;
pub use prepare::execute as prepare;
pub use proxy::execute as proxy;

use crate::config::{resolve_path, Config};
use crate::proxy::{resolve_proxy, ProxySelection};
use std::path::{Path, PathBuf};

/// A project root with its loaded configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory relative config paths resolve against
    pub root: PathBuf,
    /// Effective configuration
    pub config: Config,
    /// Where the configuration was (or would be) read from
    pub config_path: PathBuf,
    /// `--no-proxy` was passed
    pub no_proxy: bool,
}

impl Workspace {
    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_path(&self.root, path)
    }

    /// Select the proxy for this run from flags, config and environment
    pub fn select_proxy(&self) -> ProxySelection {
        resolve_proxy(
            self.no_proxy,
            self.config.network.proxy.as_deref(),
            |name| std::env::var(name).ok(),
        )
    }
}
