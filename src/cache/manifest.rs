//! Runtime version manifests
//!
//! The target runtime version comes from the project's `package.json`
//! dependency entry. The cached version comes from the `package.json` the
//! runtime distribution leaves in the cache directory.

use crate::error::{StageError, StageResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file name inside the cache directory
pub const CACHED_MANIFEST: &str = "package.json";

/// A runtime version with range operators stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    /// Normalize a version or simple range (`^0.27.7` becomes `0.27.7`)
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches(['^', '~', '=']).trim();
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare as semver when both sides parse, otherwise as text
    pub fn matches(&self, other: &RuntimeVersion) -> bool {
        match (
            semver::Version::parse(&self.0),
            semver::Version::parse(&other.0),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.0 == other.0,
        }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The parts of the project `package.json` we read
#[derive(Debug, Deserialize)]
struct ProjectManifest {
    #[serde(default)]
    dependencies: HashMap<String, String>,

    #[serde(default, rename = "devDependencies")]
    dev_dependencies: HashMap<String, String>,
}

/// The parts of the cached runtime `package.json` we read
#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> StageResult<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StageError::ManifestRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    serde_json::from_str(&content).map_err(|e| StageError::ManifestRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read the runtime version the project depends on
pub async fn target_version(manifest_path: &Path, package: &str) -> StageResult<RuntimeVersion> {
    let manifest: ProjectManifest = read_json(manifest_path).await?;

    manifest
        .dependencies
        .get(package)
        .or_else(|| manifest.dev_dependencies.get(package))
        .map(|v| RuntimeVersion::parse(v))
        .ok_or_else(|| StageError::RuntimeNotDeclared {
            package: package.to_string(),
            path: manifest_path.to_path_buf(),
        })
}

/// Read the runtime version recorded in the cache directory
pub async fn cached_version(cache_dir: &Path) -> StageResult<RuntimeVersion> {
    let manifest: PackageManifest = read_json(&cached_manifest_path(cache_dir)).await?;
    Ok(RuntimeVersion::parse(&manifest.version))
}

/// State of the cache directory relative to the target version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCheck {
    /// No readable cached manifest; treated as a fresh cache
    Fresh { reason: String },
    /// Cached version matches the target
    Current(RuntimeVersion),
    /// Cached version differs from the target
    Stale {
        cached: RuntimeVersion,
        target: RuntimeVersion,
    },
}

/// Compare the cached manifest against the target version
pub async fn check_cache(cache_dir: &Path, target: &RuntimeVersion) -> CacheCheck {
    match cached_version(cache_dir).await {
        Ok(cached) if cached.matches(target) => {
            debug!("Cached runtime {} matches target", cached);
            CacheCheck::Current(cached)
        }
        Ok(cached) => CacheCheck::Stale {
            cached,
            target: target.clone(),
        },
        Err(e) => CacheCheck::Fresh {
            reason: e.to_string(),
        },
    }
}

/// Where the runtime records its version inside the cache directory
pub fn cached_manifest_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHED_MANIFEST)
}
