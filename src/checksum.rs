//! Content checksums for layer reuse
//!
//! Hashes files (and directory trees) with SHA256 so the build can tell
//! whether an input changed since the layer was last built.

use crate::error::{CondaEnvError, CondaEnvResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Computes a deterministic digest over a set of files and/or directories
pub trait Summer: Send + Sync {
    /// Hex-encoded digest of the given paths
    fn sum(&self, paths: &[&Path]) -> CondaEnvResult<String>;
}

/// SHA256 checksum calculator
///
/// A single regular file hashes to the SHA256 of its contents. Anything else
/// (several paths, or a directory) hashes to the SHA256 of the per-file
/// digests, taken in sorted path order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumCalculator;

impl ChecksumCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Summer for ChecksumCalculator {
    fn sum(&self, paths: &[&Path]) -> CondaEnvResult<String> {
        if let [path] = paths {
            if path.is_file() {
                return hash_file_contents(path);
            }
        }

        let mut files = Vec::new();
        for path in paths {
            collect_files(path, &mut files)?;
        }
        files.sort();

        let mut hasher = Sha256::new();
        for file in &files {
            hasher.update(hash_file_contents(file)?.as_bytes());
        }

        debug!("Hashed {} files", files.len());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Hash a file's contents using SHA256
fn hash_file_contents(path: &Path) -> CondaEnvResult<String> {
    let contents = fs::read(path).map_err(|e| {
        CondaEnvError::io(format!("computing checksum of {}", path.display()), e)
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Collect regular files under `path`. Symlinked files are hashed through
/// their target; symlinked directories are never descended into.
fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> CondaEnvResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| CondaEnvError::stat(path, e))?;
    if metadata.file_type().is_symlink() {
        let target = fs::metadata(path).map_err(|e| CondaEnvError::stat(path, e))?;
        if target.is_dir() {
            debug!("Skipping symlinked directory {}", path.display());
        } else {
            files.push(path.to_path_buf());
        }
        return Ok(());
    }

    if !metadata.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    let entries = fs::read_dir(path)
        .map_err(|e| CondaEnvError::io(format!("reading directory {}", path.display()), e))?;
    for entry in entries {
        let entry = entry
            .map_err(|e| CondaEnvError::io(format!("reading directory {}", path.display()), e))?;
        collect_files(&entry.path(), files)?;
    }
    Ok(())
}
