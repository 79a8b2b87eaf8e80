// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build stage: produce a fresh artifact and record where it came from.

use std::path::PathBuf;
use sw_adapters::{BuildError, Builder, VcsAdapter, VcsError};
use sw_core::{LogSink, Project};
use thiserror::Error;

/// Errors from the build stage. All fatal: the run never reaches an
/// instance after one of these.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error("build produced no artifact at {path}")]
    MissingArtifact { path: PathBuf },
}

/// What a successful build stage yields.
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    /// VCS revision the working copy was at.
    pub revision: String,
    /// Absolute path of the produced artifact.
    pub artifact: PathBuf,
}

/// Runs the project build and captures its provenance.
pub struct BuildStage<'a, V, B> {
    vcs: &'a V,
    builder: &'a B,
}

impl<'a, V: VcsAdapter, B: Builder> BuildStage<'a, V, B> {
    pub fn new(vcs: &'a V, builder: &'a B) -> Self {
        Self { vcs, builder }
    }

    pub async fn run(
        &self,
        project: &Project,
        log: &dyn LogSink,
    ) -> Result<BuiltArtifact, StageError> {
        tracing::info!(project = %project.id, "build stage starting");
        self.builder.build(project, log).await?;

        let revision = self.vcs.latest_revision(&project.workdir).await?;

        let artifact = project.artifact_file();
        if !artifact.is_file() {
            return Err(StageError::MissingArtifact { path: artifact });
        }
        tracing::info!(project = %project.id, revision = %revision, "build stage finished");
        Ok(BuiltArtifact { revision, artifact })
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
