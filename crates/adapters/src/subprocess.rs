// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts.
//!
//! Every adapter that shells out goes through [`run_with_timeout`] so a
//! wedged external command can never hang a pipeline stage indefinitely.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Project build commands (compilers, packagers) get the longest leash.
pub const BUILD_COMMAND_TIMEOUT: Duration = Duration::from_secs(1800);
/// Container image builds.
pub const IMAGE_BUILD_TIMEOUT: Duration = Duration::from_secs(900);
/// Remote ssh/scp operations against one instance.
pub const REMOTE_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);
/// Local VCS queries.
pub const VCS_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from subprocess execution
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{label} timed out after {timeout_secs}s")]
    Timeout {
        label: &'static str,
        timeout_secs: u64,
    },
    #[error("{label} failed to start: {source}")]
    Spawn {
        label: &'static str,
        source: std::io::Error,
    },
}

/// Run a command to completion, killing it if the timeout elapses.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &'static str,
) -> Result<Output, SubprocessError> {
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Spawn { label, source }),
        Err(_) => {
            tracing::warn!(label, timeout_secs = timeout.as_secs(), "subprocess timed out");
            Err(SubprocessError::Timeout {
                label,
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

/// Lossy UTF-8 view of a command's stderr, falling back to stdout.
pub fn error_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
