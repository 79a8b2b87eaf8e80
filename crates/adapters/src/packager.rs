// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Packaging collaborator: turns a built working copy into a deployable
//! image reference.

use crate::subprocess::{run_with_timeout, SubprocessError, IMAGE_BUILD_TIMEOUT};
use async_trait::async_trait;
use sw_core::{LogSink, Project};
use thiserror::Error;
use tokio::process::Command;

/// Errors from the packaging boundary
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("image build exited with status {code}: {detail}")]
    Failed { code: i32, detail: String },
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Adapter packaging a built working copy
#[async_trait]
pub trait Packager: Clone + Send + Sync + 'static {
    /// Build the deployable image over the working copy; returns the
    /// image reference instances will pull.
    async fn build_image(&self, project: &Project, log: &dyn LogSink)
        -> Result<String, PackagingError>;
}

/// Packages via `docker build` in the project working copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct DockerPackager;

#[async_trait]
impl Packager for DockerPackager {
    async fn build_image(
        &self,
        project: &Project,
        log: &dyn LogSink,
    ) -> Result<String, PackagingError> {
        let image = project.image_ref();
        tracing::info!(project = %project.id, %image, "building image");
        log.append(&format!("$ docker build -t {image} .\n"));

        let mut cmd = Command::new("docker");
        cmd.args(["build", "-t", &image, "."])
            .current_dir(&project.workdir);

        let output = run_with_timeout(cmd, IMAGE_BUILD_TIMEOUT, "docker build").await?;

        if !output.stdout.is_empty() {
            log.append(&String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            log.append(&String::from_utf8_lossy(&output.stderr));
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let detail = crate::subprocess::error_detail(&output);
            tracing::error!(project = %project.id, code, "image build failed");
            return Err(PackagingError::Failed { code, detail });
        }
        Ok(image)
    }
}

/// Scripted packager for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakePackager {
    inner: std::sync::Arc<parking_lot::Mutex<FakePackagerInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakePackagerInner {
    failure: Option<String>,
    calls: u32,
}

#[cfg(any(test, feature = "test-support"))]
impl FakePackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every image build with the given detail.
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
impl Packager for FakePackager {
    async fn build_image(
        &self,
        project: &Project,
        log: &dyn LogSink,
    ) -> Result<String, PackagingError> {
        let failure = {
            let mut inner = self.inner.lock();
            inner.calls += 1;
            inner.failure.clone()
        };
        if let Some(detail) = failure {
            return Err(PackagingError::Failed { code: 1, detail });
        }
        log.append("image packaged\n");
        Ok(project.image_ref())
    }
}

#[cfg(test)]
#[path = "packager_tests.rs"]
mod tests;
