//! Runtime package cache
//!
//! The cache directory is either reused as a whole or removed as a whole
//! when the runtime version changes. It is never partially invalidated.

pub mod lockfile;
pub mod manifest;

pub use lockfile::LockFile;
pub use manifest::{check_cache, target_version, CacheCheck, RuntimeVersion};
