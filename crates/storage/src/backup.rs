// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local backup archive for built artifacts.
//!
//! One file per (artifact, version tag) at `<root>/<base_name>#<tag>`;
//! latest write wins. Integrity is the caller's concern: the store never
//! compares what it holds against what a restore expects.

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOCK_STRIPES: usize = 16;

/// Errors from backup operations
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup not found: {name}")]
    NotFound { name: String },
    #[error("source has no file name: {path}")]
    InvalidSource { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Content-addressed-by-name store of artifact copies.
///
/// Backup and restore of the same (artifact, tag) are mutually excluded
/// through a striped lock keyed by the backup file name, so concurrent
/// runs cannot interleave partial copies of one file.
pub struct BackupStore {
    root: PathBuf,
    stripes: Vec<Mutex<()>>,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location for a (base name, tag) pair.
    pub fn backup_path(&self, base_name: &str, tag: &str) -> PathBuf {
        self.root.join(format!("{base_name}#{tag}"))
    }

    /// Whether a backup exists for the tag. Drives the rollback
    /// fast/slow-path decision.
    pub fn exists(&self, base_name: &str, tag: &str) -> bool {
        self.backup_path(base_name, tag).is_file()
    }

    /// Copy `source` into the store under `tag`, overwriting any previous
    /// backup at that key. Returns the stored path.
    pub fn backup(&self, source: &Path, tag: &str) -> Result<PathBuf, BackupError> {
        let base_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BackupError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let dest = self.backup_path(base_name, tag);

        let _guard = self.stripe(&dest).lock();
        fs::create_dir_all(&self.root)?;
        fs::copy(source, &dest)?;
        tracing::debug!(source = %source.display(), dest = %dest.display(), "artifact backed up");
        Ok(dest)
    }

    /// Copy the backup for `tag` back to `dest`.
    pub fn restore(&self, base_name: &str, tag: &str, dest: &Path) -> Result<(), BackupError> {
        let stored = self.backup_path(base_name, tag);

        let _guard = self.stripe(&stored).lock();
        if !stored.is_file() {
            return Err(BackupError::NotFound {
                name: format!("{base_name}#{tag}"),
            });
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&stored, dest)?;
        tracing::debug!(stored = %stored.display(), dest = %dest.display(), "artifact restored");
        Ok(())
    }

    fn stripe(&self, path: &Path) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % LOCK_STRIPES]
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
