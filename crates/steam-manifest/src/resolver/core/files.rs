//! File operation utilities
//!
//! Centralized file handling so every component writes, checks and removes
//! output the same way.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::resolver::core::{FileOperation, ResolveError, Result};

/// Check whether a file is already present at `dest_path`
pub async fn file_exists(dest_path: &Path) -> Result<bool> {
    match fs::metadata(dest_path).await {
        Ok(meta) => {
            debug!("File already exists: {} ({} bytes)", dest_path.display(), meta.len());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ResolveError::fs(dest_path, FileOperation::Metadata, e)),
    }
}

/// Join a listing path onto the destination directory
///
/// Absolute paths and `..` components are rejected so a listing can never
/// write outside `dir`.
pub fn join_entry_path(dir: &Path, entry_path: &str) -> Result<PathBuf> {
    let relative = Path::new(entry_path);
    let safe = !entry_path.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(ResolveError::UnsafePath { path: entry_path.to_string() });
    }
    Ok(dir.join(relative))
}

/// Create a temporary file path for in-flight writes
pub fn create_temp_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest_path.with_file_name(name)
}

/// Atomically rename a temporary file to its final destination
pub async fn atomic_rename(temp_path: &Path, dest_path: &Path) -> Result<()> {
    fs::rename(temp_path, dest_path)
        .await
        .map_err(|e| ResolveError::fs(temp_path, FileOperation::Move, e))?;
    debug!("Atomically renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}

/// Write `bytes` to `dest_path` through a `.part` file
///
/// The destination either holds the complete content or does not exist.
pub async fn write_atomically(dest_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ResolveError::fs(parent, FileOperation::CreateDir, e))?;
    }
    let temp_path = create_temp_path(dest_path);
    fs::write(&temp_path, bytes)
        .await
        .map_err(|e| ResolveError::fs(&temp_path, FileOperation::Write, e))?;
    atomic_rename(&temp_path, dest_path).await
}

/// Create `dir` and its parents if they do not exist yet
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ResolveError::fs(dir, FileOperation::CreateDir, e))?;
    debug!("Ensured directory {}", dir.display());
    Ok(())
}

/// Remove `dir` and everything below it, ignoring a missing directory
pub async fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!("Removed directory {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ResolveError::fs(dir, FileOperation::RemoveDir, e)),
    }
}
