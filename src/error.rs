//! Error types for pystage
//!
//! All modules use `StageResult<T>` as their return type. Failures that only
//! abort part of a stage are not errors; they are reported through
//! [`crate::stager::StageOutcome`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pystage operations
pub type StageResult<T> = Result<T, StageError>;

/// All errors that can occur in pystage
#[derive(Error, Debug)]
pub enum StageError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // Cache errors
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read project manifest {path}: {reason}")]
    ManifestRead { path: PathBuf, reason: String },

    #[error("Runtime package '{package}' is not declared in {path}")]
    RuntimeNotDeclared { package: String, path: PathBuf },

    #[error("Failed to write lock file {path}: {source}")]
    LockWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Runtime bridge errors
    #[error("Failed to start runtime bridge: {command}")]
    RuntimeSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime bridge request '{op}' failed: {reason}")]
    Bridge { op: String, reason: String },

    #[error("Runtime bridge exited before answering '{op}'")]
    BridgeClosed { op: String },

    // Asset errors
    #[error("Failed to copy {src} to {dest}: {source}")]
    AssetCopy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare asset directory {path}: {source}")]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Network errors
    #[error("Network probe failed: {0}")]
    Probe(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl StageError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a bridge request error
    pub fn bridge(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Bridge {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RuntimeSpawn { .. } => Some("Install Node.js 18+ or set [runtime] node in pystage.toml"),
            Self::RuntimeNotDeclared { .. } => Some("Run: npm install pyodide"),
            Self::ManifestRead { .. } => Some("Run pystage from the project root or pass --project"),
            Self::CacheDirCreate { .. } => Some("Check permissions on the static directory"),
            Self::ConfigInvalid { .. } => Some("Run: pystage config show"),
            _ => None,
        }
    }
}
