//! Lock file output
//!
//! The installer's freeze payload is written verbatim. It is never merged
//! with an earlier lock file.

use crate::error::{StageError, StageResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A frozen dependency set ready to be written
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    contents: String,
}

impl LockFile {
    pub fn new(path: PathBuf, contents: String) -> Self {
        Self { path, contents }
    }

    /// Build a lock file from a freeze payload.
    ///
    /// The installer returns the lock file as a JSON string; any other JSON
    /// value is serialized as-is.
    pub fn from_payload(path: PathBuf, payload: serde_json::Value) -> StageResult<Self> {
        let contents = match payload {
            serde_json::Value::String(text) => text,
            other => serde_json::to_string(&other)?,
        };
        Ok(Self::new(path, contents))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// SHA256 of the contents, first 12 hex chars
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.contents.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..6])
    }

    /// Number of entries in the `packages` table, if the payload has one
    pub fn package_count(&self) -> Option<usize> {
        let value: serde_json::Value = serde_json::from_str(&self.contents).ok()?;
        value.get("packages")?.as_object().map(|p| p.len())
    }

    /// Write the lock file, replacing any previous content.
    ///
    /// The parent directory is recreated if a stale cache was removed.
    pub async fn write(&self) -> StageResult<()> {
        if serde_json::from_str::<serde_json::Value>(&self.contents).is_err() {
            warn!("Freeze payload is not valid JSON; writing it unchanged");
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StageError::LockWrite {
                    path: self.path.clone(),
                    source: e,
                })?;
        }

        fs::write(&self.path, &self.contents)
            .await
            .map_err(|e| StageError::LockWrite {
                path: self.path.clone(),
                source: e,
            })?;

        debug!(
            "Wrote lock file {} ({} bytes, {})",
            self.path.display(),
            self.contents.len(),
            self.digest()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOCK: &str = r#"{"info":{"arch":"wasm32"},"packages":{"numpy":{"version":"2.0.2"},"micropip":{"version":"0.8.0"}}}"#;

    #[test]
    fn digest_deterministic() {
        let a = LockFile::new(PathBuf::from("a"), LOCK.to_string());
        let b = LockFile::new(PathBuf::from("b"), LOCK.to_string());
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 12);
    }

    #[test]
    fn digest_differs_by_content() {
        let a = LockFile::new(PathBuf::from("a"), "{}".to_string());
        let b = LockFile::new(PathBuf::from("a"), LOCK.to_string());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn string_payload_kept_verbatim() {
        let lock = LockFile::from_payload(
            PathBuf::from("lock.json"),
            serde_json::Value::String(LOCK.to_string()),
        )
        .unwrap();
        assert_eq!(lock.contents(), LOCK);
        assert_eq!(lock.package_count(), Some(2));
    }

    #[test]
    fn object_payload_serialized() {
        let lock = LockFile::from_payload(
            PathBuf::from("lock.json"),
            serde_json::json!({"packages": {}}),
        )
        .unwrap();
        assert_eq!(lock.contents(), r#"{"packages":{}}"#);
        assert_eq!(lock.package_count(), Some(0));
    }

    #[tokio::test]
    async fn write_overwrites_and_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wiped").join("pyodide-lock.json");

        LockFile::new(path.clone(), "old".to_string()).write().await.unwrap();
        LockFile::new(path.clone(), LOCK.to_string()).write().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), LOCK);
    }
}
