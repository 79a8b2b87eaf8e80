// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project and target-instance configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a deployable project.
    pub struct ProjectId("prj-");
}

crate::define_id! {
    /// Unique identifier for a target application instance.
    pub struct InstanceId("ins-");
}

/// How artifacts reach a target instance.
///
/// Selected by configuration at run start; every mechanism shares the
/// same pipeline state machine, backup store, and fan-out executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployMechanism {
    /// Pull a container image on the instance and restart the container.
    #[default]
    Container,
    /// Copy the artifact archive to the instance and run a restart command.
    Archive,
}

crate::simple_display! {
    DeployMechanism {
        Container => "container",
        Archive => "archive",
    }
}

/// One target host an artifact is deployed to.
///
/// Read-only to the pipeline core; connection details are consumed by the
/// transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInstance {
    pub id: InstanceId,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    /// Directory on the instance the artifact is installed into.
    pub remote_path: String,
}

fn default_ssh_port() -> u16 {
    22
}

impl AppInstance {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: InstanceId::new(),
            host: host.into(),
            port: default_ssh_port(),
            user: user.into(),
            remote_path: String::new(),
        }
    }
}

/// A deployable project: where it builds, what it produces, and which
/// instances it fans out to. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Local working copy the build runs in.
    pub workdir: PathBuf,
    /// Artifact path relative to `workdir` (e.g. `target/app.tar.gz`).
    pub artifact_path: String,
    /// Shell command that produces the artifact.
    pub build_command: String,
    /// Image reference for container deploys; `name:latest` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Remote command that restarts the service after an archive deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_command: Option<String>,
    pub instances: Vec<AppInstance>,
}

impl Project {
    /// Absolute path of the built artifact in the working copy.
    pub fn artifact_file(&self) -> PathBuf {
        self.workdir.join(&self.artifact_path)
    }

    /// Artifact file name, the base of every backup key for this project.
    pub fn artifact_base_name(&self) -> &str {
        self.artifact_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.artifact_path)
    }

    /// Image reference used by container deploys.
    pub fn image_ref(&self) -> String {
        self.image
            .clone()
            .unwrap_or_else(|| format!("{}:latest", self.name))
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
