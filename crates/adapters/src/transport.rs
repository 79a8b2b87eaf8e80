// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance deploy transport.
//!
//! One handler call is one unit of fan-out work: move the artifact to a
//! single instance and restart the target service, narrating progress into
//! the run log. Failures are returned to the fan-out layer, which captures
//! them as that instance's outcome; they never propagate across siblings.

use crate::subprocess::{run_with_timeout, SubprocessError, REMOTE_COMMAND_TIMEOUT};
use async_trait::async_trait;
use sw_core::{AppInstance, LogSink, Project};
use thiserror::Error;
use tokio::process::Command;

/// Errors from one instance's deploy
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("remote command failed on {host}: {detail}")]
    Remote { host: String, detail: String },
    #[error("transfer to {host} failed: {detail}")]
    Transfer { host: String, detail: String },
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Single-instance unit of deploy work
#[async_trait]
pub trait DeployHandler: Clone + Send + Sync + 'static {
    /// Push or pull the artifact onto the instance and restart the target
    /// service. Returns a human-readable completion message.
    async fn deploy(
        &self,
        project: &Project,
        instance: &AppInstance,
        log: &dyn LogSink,
    ) -> Result<String, TransportError>;
}

/// Argument vector for running `remote_cmd` on an instance over ssh.
fn ssh_args(instance: &AppInstance, remote_cmd: &str) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-p".to_string(),
        instance.port.to_string(),
        format!("{}@{}", instance.user, instance.host),
    ];
    args.push(remote_cmd.to_string());
    args
}

/// Argument vector for copying `local` to `remote_path` on an instance.
fn scp_args(instance: &AppInstance, local: &str, remote_path: &str) -> Vec<String> {
    vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-P".to_string(),
        instance.port.to_string(),
        local.to_string(),
        format!("{}@{}:{}", instance.user, instance.host, remote_path),
    ]
}

async fn run_remote(
    instance: &AppInstance,
    remote_cmd: &str,
    log: &dyn LogSink,
) -> Result<(), TransportError> {
    log.append(&format!("[{}] $ {}\n", instance.host, remote_cmd));

    let mut cmd = Command::new("ssh");
    cmd.args(ssh_args(instance, remote_cmd));
    let output = run_with_timeout(cmd, REMOTE_COMMAND_TIMEOUT, "remote command").await?;

    if !output.stdout.is_empty() {
        log.append(&String::from_utf8_lossy(&output.stdout));
    }
    if !output.status.success() {
        return Err(TransportError::Remote {
            host: instance.host.clone(),
            detail: crate::subprocess::error_detail(&output),
        });
    }
    Ok(())
}

/// Container mechanism: the instance pulls the packaged image and the
/// container is restarted in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerTransport;

#[async_trait]
impl DeployHandler for ContainerTransport {
    async fn deploy(
        &self,
        project: &Project,
        instance: &AppInstance,
        log: &dyn LogSink,
    ) -> Result<String, TransportError> {
        let image = project.image_ref();
        tracing::info!(host = %instance.host, %image, "container deploy");

        run_remote(instance, &format!("docker pull {image}"), log).await?;
        run_remote(
            instance,
            &format!("docker rm -f {name} || true", name = project.name),
            log,
        )
        .await?;
        run_remote(
            instance,
            &format!(
                "docker run -d --name {name} --restart always {image}",
                name = project.name
            ),
            log,
        )
        .await?;

        Ok(format!("pulled {image} and restarted container"))
    }
}

/// Archive mechanism: the artifact is copied up and a restart command runs
/// on the instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArchiveTransport;

#[async_trait]
impl DeployHandler for ArchiveTransport {
    async fn deploy(
        &self,
        project: &Project,
        instance: &AppInstance,
        log: &dyn LogSink,
    ) -> Result<String, TransportError> {
        let artifact = project.artifact_file();
        let local = artifact.display().to_string();
        let remote = format!("{}/{}", instance.remote_path, project.artifact_base_name());
        tracing::info!(host = %instance.host, artifact = %local, "archive deploy");

        log.append(&format!("[{}] uploading {}\n", instance.host, local));
        let mut cmd = Command::new("scp");
        cmd.args(scp_args(instance, &local, &remote));
        let output = run_with_timeout(cmd, REMOTE_COMMAND_TIMEOUT, "artifact upload").await?;
        if !output.status.success() {
            return Err(TransportError::Transfer {
                host: instance.host.clone(),
                detail: crate::subprocess::error_detail(&output),
            });
        }

        if let Some(restart) = project.restart_command.as_deref() {
            run_remote(instance, restart, log).await?;
        }

        Ok(format!("uploaded {} and restarted", project.artifact_base_name()))
    }
}

/// Scriptable transport for tests: per-instance delays and failures,
/// call recording, and a high-water mark of concurrent deploys.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: std::sync::Arc<parking_lot::Mutex<FakeTransportInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeTransportInner {
    delays: std::collections::HashMap<String, std::time::Duration>,
    failures: std::collections::HashMap<String, String>,
    deployed: Vec<sw_core::InstanceId>,
    in_flight: usize,
    max_in_flight: usize,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before completing the given host's deploy.
    pub fn delay(self, host: impl Into<String>, delay: std::time::Duration) -> Self {
        self.inner.lock().delays.insert(host.into(), delay);
        self
    }

    /// Fail the given host's deploy with a message.
    pub fn fail(self, host: impl Into<String>, message: impl Into<String>) -> Self {
        self.inner.lock().failures.insert(host.into(), message.into());
        self
    }

    /// Instances that completed a successful deploy, in completion order.
    pub fn deployed(&self) -> Vec<sw_core::InstanceId> {
        self.inner.lock().deployed.clone()
    }

    /// Highest number of deploys observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl DeployHandler for FakeTransport {
    async fn deploy(
        &self,
        _project: &Project,
        instance: &AppInstance,
        log: &dyn LogSink,
    ) -> Result<String, TransportError> {
        let (delay, failure) = {
            let mut inner = self.inner.lock();
            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
            (
                inner.delays.get(&instance.host).copied(),
                inner.failures.get(&instance.host).cloned(),
            )
        };

        log.append(&format!("[{}] deploying\n", instance.host));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        inner.in_flight -= 1;
        if let Some(message) = failure {
            return Err(TransportError::Remote {
                host: instance.host.clone(),
                detail: message,
            });
        }
        inner.deployed.push(instance.id.clone());
        Ok(format!("deployed to {}", instance.host))
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
