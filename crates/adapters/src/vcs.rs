// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version-control collaborator.

use crate::subprocess::{run_with_timeout, SubprocessError, VCS_COMMAND_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Errors from VCS queries
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("vcs query failed: {detail}")]
    Query { detail: String },
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Adapter answering revision queries against a working copy
#[async_trait]
pub trait VcsAdapter: Clone + Send + Sync + 'static {
    /// Revision id of the working copy's latest commit.
    async fn latest_revision(&self, workdir: &Path) -> Result<String, VcsError>;
}

/// Git-backed VCS adapter shelling out to the git CLI.
#[derive(Clone, Copy, Debug, Default)]
pub struct GitVcs;

#[async_trait]
impl VcsAdapter for GitVcs {
    async fn latest_revision(&self, workdir: &Path) -> Result<String, VcsError> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "HEAD"]).current_dir(workdir);

        let output = run_with_timeout(cmd, VCS_COMMAND_TIMEOUT, "git rev-parse").await?;
        if !output.status.success() {
            return Err(VcsError::Query {
                detail: crate::subprocess::error_detail(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Scripted VCS adapter for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeVcs {
    inner: std::sync::Arc<parking_lot::Mutex<FakeVcsInner>>,
}

#[cfg(any(test, feature = "test-support"))]
struct FakeVcsInner {
    revision: String,
    calls: u32,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeVcs {
    /// Always answer with the given revision.
    pub fn returning(revision: impl Into<String>) -> Self {
        Self {
            inner: std::sync::Arc::new(parking_lot::Mutex::new(FakeVcsInner {
                revision: revision.into(),
                calls: 0,
            })),
        }
    }

    pub fn calls(&self) -> u32 {
        self.inner.lock().calls
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl VcsAdapter for FakeVcs {
    async fn latest_revision(&self, _workdir: &Path) -> Result<String, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(inner.revision.clone())
    }
}

#[cfg(test)]
#[path = "vcs_tests.rs"]
mod tests;
