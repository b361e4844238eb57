//! Package stager
//!
//! Populates the runtime package cache: loads the runtime, drops the cache
//! when the runtime version changed, installs each configured package one at
//! a time and freezes the result into a lock file.
//!
//! Only a failure to create the cache directory (or to read the project
//! manifest) is an error. Every other failure ends the stage early and is
//! reported as a [`StageOutcome`].

use crate::cache::{check_cache, target_version, CacheCheck, LockFile, RuntimeVersion};
use crate::config::{resolve_path, Config};
use crate::error::{StageError, StageResult};
use crate::proxy::ProxySelection;
use crate::runtime::{InterpreterRuntime, RuntimeLoader};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Progress notifications emitted while staging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    RuntimeLoaded { version: Option<String> },
    CacheCleared {
        cached: RuntimeVersion,
        target: RuntimeVersion,
    },
    Installing {
        index: usize,
        total: usize,
        package: String,
    },
    Freezing,
}

/// How the stage ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every package installed and the lock file written
    Completed {
        lock_path: PathBuf,
        installed: usize,
        digest: String,
    },
    /// The runtime could not be loaded; nothing installed
    RuntimeUnavailable { reason: String },
    /// The installer module could not be loaded; nothing installed
    InstallerUnavailable { reason: String },
    /// A package failed to install; `attempted` counts installs tried,
    /// including the failing one
    InstallFailed {
        package: String,
        attempted: usize,
        reason: String,
    },
    /// Installs succeeded but the lock file could not be produced or written
    LockFailed { reason: String },
}

impl StageOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// One-line description for terminal output
    pub fn summary(&self) -> String {
        match self {
            Self::Completed {
                lock_path,
                installed,
                digest,
            } => format!(
                "Staged {} package(s), lock file {} ({})",
                installed,
                lock_path.display(),
                digest
            ),
            Self::RuntimeUnavailable { reason } => format!("Failed to load runtime: {}", reason),
            Self::InstallerUnavailable { reason } => {
                format!("Failed to load installer: {}", reason)
            }
            Self::InstallFailed {
                package, reason, ..
            } => format!("Package installation failed: {}: {}", package, reason),
            Self::LockFailed { reason } => format!("Failed to write lock file: {}", reason),
        }
    }
}

/// Stages packages into the runtime cache
#[derive(Debug, Clone)]
pub struct PackageStager {
    cache_dir: PathBuf,
    project_manifest: PathBuf,
    lock_path: PathBuf,
    runtime_package: String,
    installer: String,
    packages: Vec<String>,
    proxy: ProxySelection,
}

impl PackageStager {
    /// Build a stager from configuration, resolving paths against the project root
    pub fn from_config(config: &Config, project_root: &Path, proxy: ProxySelection) -> Self {
        let cache_dir = resolve_path(project_root, &config.paths.cache_dir);
        Self {
            lock_path: cache_dir.join(&config.paths.lock_file),
            project_manifest: resolve_path(project_root, &config.paths.project_manifest),
            cache_dir,
            runtime_package: config.runtime.package.clone(),
            installer: config.runtime.installer.clone(),
            packages: config.packages.names(),
            proxy,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Run the stage to completion or to its first failure
    pub async fn stage(
        &self,
        loader: &dyn RuntimeLoader,
        on_event: &(dyn Fn(StageEvent) + Send + Sync),
    ) -> StageResult<StageOutcome> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| StageError::CacheDirCreate {
                path: self.cache_dir.clone(),
                source: e,
            })?;

        info!(
            "Setting up {} + {}",
            loader.runtime_name(),
            self.installer
        );

        let mut runtime = match loader.load(&self.cache_dir, &self.proxy).await {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to load runtime: {}", e);
                return Ok(StageOutcome::RuntimeUnavailable {
                    reason: e.to_string(),
                });
            }
        };
        on_event(StageEvent::RuntimeLoaded {
            version: runtime.version().map(String::from),
        });

        let outcome = self.run_loaded(runtime.as_mut(), on_event).await;

        if let Err(e) = runtime.shutdown().await {
            warn!("Failed to stop runtime: {}", e);
        }

        outcome
    }

    async fn run_loaded(
        &self,
        runtime: &mut dyn InterpreterRuntime,
        on_event: &(dyn Fn(StageEvent) + Send + Sync),
    ) -> StageResult<StageOutcome> {
        let target = target_version(&self.project_manifest, &self.runtime_package).await?;
        self.invalidate_stale_cache(&target, on_event).await;

        info!("Loading {} package", self.installer);
        if let Err(e) = runtime.load_installer(&self.installer).await {
            error!("Failed to load {}: {}", self.installer, e);
            return Ok(StageOutcome::InstallerUnavailable {
                reason: e.to_string(),
            });
        }

        let total = self.packages.len();
        info!("Downloading {} package(s): {:?}", total, self.packages);
        for (idx, package) in self.packages.iter().enumerate() {
            on_event(StageEvent::Installing {
                index: idx + 1,
                total,
                package: package.clone(),
            });
            info!("Installing package: {}", package);

            if let Err(e) = runtime.install(package).await {
                error!("Package installation failed: {}: {}", package, e);
                return Ok(StageOutcome::InstallFailed {
                    package: package.clone(),
                    attempted: idx + 1,
                    reason: e.to_string(),
                });
            }
        }

        on_event(StageEvent::Freezing);
        info!("Packages downloaded, freezing into lock file");

        let lock = match runtime
            .freeze()
            .await
            .and_then(|payload| LockFile::from_payload(self.lock_path.clone(), payload))
        {
            Ok(lock) => lock,
            Err(e) => {
                error!("Failed to freeze packages: {}", e);
                return Ok(StageOutcome::LockFailed {
                    reason: e.to_string(),
                });
            }
        };

        if let Err(e) = lock.write().await {
            error!("Failed to write lock file: {}", e);
            return Ok(StageOutcome::LockFailed {
                reason: e.to_string(),
            });
        }

        if let Some(count) = lock.package_count() {
            debug!("Lock file pins {} package(s)", count);
        }

        Ok(StageOutcome::Completed {
            lock_path: lock.path().to_path_buf(),
            installed: total,
            digest: lock.digest(),
        })
    }

    /// Remove the whole cache when it holds a different runtime version
    async fn invalidate_stale_cache(
        &self,
        target: &RuntimeVersion,
        on_event: &(dyn Fn(StageEvent) + Send + Sync),
    ) {
        match check_cache(&self.cache_dir, target).await {
            CacheCheck::Fresh { reason } => {
                info!(
                    "Cached runtime manifest not found, proceeding with download ({})",
                    reason
                );
            }
            CacheCheck::Current(version) => {
                debug!("Reusing cache for runtime {}", version);
            }
            CacheCheck::Stale { cached, target } => {
                info!(
                    "Runtime version mismatch ({} cached, {} required), removing {}",
                    cached,
                    target,
                    self.cache_dir.display()
                );
                match fs::remove_dir_all(&self.cache_dir).await {
                    Ok(()) => on_event(StageEvent::CacheCleared { cached, target }),
                    Err(e) => warn!(
                        "Failed to remove stale cache {}: {}",
                        self.cache_dir.display(),
                        e
                    ),
                }
            }
        }
    }
}
