// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline configuration.

use crate::fanout::FanoutConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use sw_core::DeployMechanism;
use thiserror::Error;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pipeline config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Fan-out tuning as written in configuration files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FanoutSettings {
    /// Maximum concurrent instance deploys; unset = one task per instance.
    #[serde(default)]
    pub width: Option<usize>,
    /// Per-instance deadline; unset = wait indefinitely.
    #[serde(default)]
    pub instance_timeout_secs: Option<u64>,
}

impl FanoutSettings {
    pub fn to_config(&self) -> FanoutConfig {
        FanoutConfig {
            width: self.width,
            instance_timeout: self.instance_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Directory artifact backups are written to.
    pub backup_root: PathBuf,
    /// Deploy mechanism instances receive artifacts through.
    #[serde(default)]
    pub mechanism: DeployMechanism,
    #[serde(default)]
    pub fanout: FanoutSettings,
    /// Whether a fast-path restore whose digest disagrees with the
    /// referenced run's recorded digest aborts the rollback.
    #[serde(default = "default_verify_restore")]
    pub verify_restore: bool,
    /// Append-only JSONL journal of completed runs; unset disables it.
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

fn default_verify_restore() -> bool {
    true
}

impl PipelineConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Minimal config for a backup root, defaults everywhere else.
    pub fn with_backup_root(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            mechanism: DeployMechanism::default(),
            fanout: FanoutSettings::default(),
            verify_restore: default_verify_restore(),
            journal_path: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
