//! Runtime asset copier
//!
//! Copies the runtime distribution tree into the static-assets directory.
//! Every run visits every file; there is no manifest or checksum sync.
//!
//! Each source node falls in one of three cases:
//!
//! | Node | Rule |
//! |------|------|
//! | Directory | create destination, visit children |
//! | File | copy; an existing destination counts as success, other errors propagate |
//! | Unreadable | log, skip the node, continue with siblings |

use crate::error::{StageError, StageResult};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

/// What to do when a destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Replace the destination file
    Overwrite,
    /// Leave the destination file untouched
    KeepExisting,
}

impl CopyMode {
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::KeepExisting
        }
    }
}

/// Classification of a source node
#[derive(Debug)]
pub enum SourceEntry {
    Directory,
    File,
    /// Metadata could not be read
    Unreadable(io::Error),
}

impl SourceEntry {
    /// Inspect a source path, following symlinks
    pub async fn inspect(path: &Path) -> Self {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Self::Directory,
            Ok(_) => Self::File,
            Err(e) => Self::Unreadable(e),
        }
    }
}

/// Counts from a copy run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub directories: usize,
    pub files_copied: usize,
    pub already_present: usize,
    pub unreadable: Vec<PathBuf>,
}

/// Copies a source tree into a destination tree
#[derive(Debug, Clone)]
pub struct AssetCopier {
    source: PathBuf,
    dest: PathBuf,
    mode: CopyMode,
}

impl AssetCopier {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>, mode: CopyMode) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            mode,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Copy the whole tree, one node at a time, depth-first in name order
    pub async fn copy(&self) -> StageResult<CopyReport> {
        let mut report = CopyReport::default();
        let mut pending = vec![(self.source.clone(), self.dest.clone())];

        while let Some((src, dest)) = pending.pop() {
            match SourceEntry::inspect(&src).await {
                SourceEntry::Unreadable(e) => {
                    error!("Failed to stat {}: {}", src.display(), e);
                    report.unreadable.push(src);
                }
                SourceEntry::Directory => {
                    fs::create_dir_all(&dest)
                        .await
                        .map_err(|e| StageError::AssetDir {
                            path: dest.clone(),
                            source: e,
                        })?;
                    report.directories += 1;

                    let children = list_children(&src).await?;
                    // reversed so the stack pops them in name order
                    for name in children.into_iter().rev() {
                        pending.push((src.join(&name), dest.join(&name)));
                    }
                }
                SourceEntry::File => match copy_file(&src, &dest, self.mode).await {
                    Ok(()) => report.files_copied += 1,
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                        debug!("Already copied: {}", dest.display());
                        report.already_present += 1;
                    }
                    Err(e) => {
                        return Err(StageError::AssetCopy {
                            src,
                            dest,
                            source: e,
                        })
                    }
                },
            }
        }

        Ok(report)
    }
}

/// Child names of a directory, sorted
async fn list_children(dir: &Path) -> StageResult<Vec<std::ffi::OsString>> {
    let read_err = |e: io::Error| StageError::AssetDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = fs::read_dir(dir).await.map_err(read_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

async fn copy_file(src: &Path, dest: &Path, mode: CopyMode) -> io::Result<()> {
    match mode {
        CopyMode::Overwrite => fs::copy(src, dest).await.map(|_| ()),
        CopyMode::KeepExisting => {
            let mut input = fs::File::open(src).await?;
            let mut out = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dest)
                .await?;

            // A partial file must not be mistaken for an earlier copy on the next run
            let copied = async {
                tokio::io::copy(&mut input, &mut out).await?;
                out.flush().await
            }
            .await;
            if let Err(e) = copied {
                drop(out);
                if let Err(rm) = fs::remove_file(dest).await {
                    warn!("Failed to remove partial copy {}: {}", dest.display(), rm);
                }
                return Err(e);
            }
            Ok(())
        }
    }
}
