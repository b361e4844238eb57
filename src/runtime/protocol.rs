//! Line-delimited JSON protocol spoken with the runtime bridge
//!
//! Each request is one JSON object per line on the bridge's stdin; each
//! response is one JSON object per line on its stdout, echoing the request id.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Operations understood by the bridge
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    /// Load the runtime with its package cache in `cache_dir`
    Load {
        cache_dir: PathBuf,
        proxy: Option<String>,
    },
    /// Load the installer module and import it
    LoadInstaller { name: String },
    /// Install a single package
    Install { package: String },
    /// Freeze installed packages into a lock file payload
    Freeze,
    /// Exit the bridge
    Shutdown,
}

impl BridgeOp {
    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::LoadInstaller { .. } => "load_installer",
            Self::Install { .. } => "install",
            Self::Freeze => "freeze",
            Self::Shutdown => "shutdown",
        }
    }
}

/// A request line
#[derive(Debug, Serialize)]
pub struct BridgeRequest<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub op: &'a BridgeOp,
}

/// A response line
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    /// Echoed request id; absent when the request could not be parsed
    #[serde(default)]
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeResponse {
    /// Parse a stdout line; anything that is not a response yields `None`
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    /// Convert into the request result or the bridge's error text
    pub fn into_result(self) -> Result<serde_json::Value, String> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| "bridge reported failure without a message".to_string()))
        }
    }
}
