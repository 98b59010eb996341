//! File system capability and copy helpers.
//!
//! The orchestrator and signer only touch the disk through [`FileSystem`],
//! so tests can observe (or fake) every operation. Directory helpers are
//! idempotent so a failed pipeline can simply be re-run.

use crate::packager::{Error, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// The subset of file metadata the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub len: u64,
    pub modified: SystemTime,
    pub is_file: bool,
    pub is_dir: bool,
}

impl From<std::fs::Metadata> for FileInfo {
    fn from(metadata: std::fs::Metadata) -> Self {
        Self {
            len: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
        }
    }
}

/// Capability to access the file system.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn metadata(&self, path: &Path) -> io::Result<FileInfo>;

    /// Entries directly inside `path` (non-recursive).
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Copies `from` to `to`, overwriting `to`.
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileInfo> {
        Ok(fs::metadata(path).await?.into())
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        Ok(paths)
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }
}

/// Removes a file, treating "already gone" as success.
pub async fn remove_file_if_exists(filesystem: &dyn FileSystem, path: &Path) -> io::Result<()> {
    match filesystem.remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Recursively copies a directory tree, creating parents of `to` as needed.
///
/// Symlinks are recreated rather than followed. Returns the number of
/// regular files copied. Errors are RESOURCE errors since this only ever
/// moves user-provided assets.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    if !from.is_dir() {
        return Err(Error::resource(format!(
            "{} is not a directory",
            from.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<usize> {
        let wrap = |e: io::Error, path: &Path| {
            Error::resource(format!("copying {} failed: {}", path.display(), e)).with_source(e)
        };

        std::fs::create_dir_all(&to).map_err(|e| wrap(e, &to))?;

        let mut copied = 0;
        for entry in walkdir::WalkDir::new(&from).min_depth(1) {
            let entry = entry.map_err(|e| {
                Error::resource(format!("walking {} failed: {}", from.display(), e))
            })?;
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| Error::resource(e.to_string()))?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path()).map_err(|e| wrap(e, entry.path()))?;
                let linked = if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                };
                linked.map_err(|e| wrap(e, &dest_path))?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).map_err(|e| wrap(e, &dest_path))?;
            } else {
                std::fs::copy(entry.path(), &dest_path).map_err(|e| wrap(e, entry.path()))?;
                copied += 1;
            }
        }

        Ok(copied)
    })
    .await
    .map_err(|e| Error::resource(format!("Directory copy task panicked: {}", e)))?
}
