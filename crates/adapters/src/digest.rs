// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content digests over artifact bytes.

use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Errors from digest computation
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Hex-encoded SHA-256 of a file's bytes.
pub fn file_sha256(path: &Path) -> Result<String, DigestError> {
    let bytes = std::fs::read(path).map_err(|source| DigestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
