// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build collaborator: turns a working copy into an artifact.

use crate::subprocess::{run_with_timeout, SubprocessError, BUILD_COMMAND_TIMEOUT};
use async_trait::async_trait;
use sw_core::{LogSink, Project};
use thiserror::Error;
use tokio::process::Command;

/// Errors from the build stage boundary
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build command exited with status {code}: {detail}")]
    Failed { code: i32, detail: String },
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Adapter running a project's build
#[async_trait]
pub trait Builder: Clone + Send + Sync + 'static {
    /// Produce the project's artifact in its working copy, streaming
    /// command output into the run log.
    async fn build(&self, project: &Project, log: &dyn LogSink) -> Result<(), BuildError>;
}

/// Runs the project's configured build command through bash.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellBuilder;

#[async_trait]
impl Builder for ShellBuilder {
    async fn build(&self, project: &Project, log: &dyn LogSink) -> Result<(), BuildError> {
        tracing::info!(
            project = %project.id,
            command = %project.build_command,
            cwd = %project.workdir.display(),
            "running build command"
        );
        log.append(&format!("$ {}\n", project.build_command));

        let wrapped = format!("set -euo pipefail\n{}", project.build_command);
        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(&wrapped).current_dir(&project.workdir);

        let output = run_with_timeout(cmd, BUILD_COMMAND_TIMEOUT, "build command").await?;

        if !output.stdout.is_empty() {
            log.append(&String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            log.append(&String::from_utf8_lossy(&output.stderr));
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let detail = crate::subprocess::error_detail(&output);
            tracing::error!(project = %project.id, code, "build command failed");
            return Err(BuildError::Failed { code, detail });
        }
        Ok(())
    }
}

/// Scripted builder for tests: records invocations and optionally writes
/// the artifact file or fails.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeBuilder {
    inner: std::sync::Arc<parking_lot::Mutex<FakeBuilderInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeBuilderInner {
    artifact_bytes: Option<Vec<u8>>,
    failure: Option<String>,
    calls: u32,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write these bytes to the project's artifact path on each build.
    pub fn producing(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.inner.lock().artifact_bytes = Some(bytes.into());
        self
    }

    /// Fail every build with the given detail.
    pub fn failing(self, detail: impl Into<String>) -> Self {
        self.inner.lock().failure = Some(detail.into());
        self
    }

    pub fn calls(&self) -> u32 {
        self.inner.lock().calls
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Builder for FakeBuilder {
    async fn build(&self, project: &Project, log: &dyn LogSink) -> Result<(), BuildError> {
        let (bytes, failure) = {
            let mut inner = self.inner.lock();
            inner.calls += 1;
            (inner.artifact_bytes.clone(), inner.failure.clone())
        };
        log.append("build started\n");
        if let Some(detail) = failure {
            return Err(BuildError::Failed { code: 1, detail });
        }
        if let Some(bytes) = bytes {
            let artifact = project.artifact_file();
            if let Some(parent) = artifact.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = std::fs::write(&artifact, bytes);
        }
        log.append("build finished\n");
        Ok(())
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
