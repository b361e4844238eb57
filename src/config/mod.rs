//! Configuration management for pystage

pub mod schema;

pub use schema::Config;

use crate::error::{StageError, StageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "pystage.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigManager {
    /// Create a config manager for the project rooted at `project_root`
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            config_path: project_root.join(CONFIG_FILE_NAME),
            explicit: false,
        }
    }

    /// Create a config manager with a custom path.
    ///
    /// Unlike the project-local file, an explicit path must exist.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            explicit: true,
        }
    }

    /// Load configuration, falling back to defaults when the project has none
    pub async fn load(&self) -> StageResult<Config> {
        if !self.config_path.exists() {
            if self.explicit {
                return Err(StageError::ConfigNotFound(self.config_path.clone()));
            }
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> StageResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StageError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| StageError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config
            .validate()
            .map_err(|reason| StageError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            })?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Resolve a configured path against the project root
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
