// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance deploy outcomes.

use crate::project::InstanceId;
use serde::{Deserialize, Serialize};

/// Status of one instance's deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Pending,
    Succeeded,
    Failed,
}

crate::simple_display! {
    OutcomeStatus {
        Pending => "pending",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// Result of deploying to a single instance.
///
/// Handler errors are captured here rather than propagated, so one
/// instance's failure never aborts its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceOutcome {
    pub instance_id: InstanceId,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InstanceOutcome {
    pub fn succeeded(instance_id: InstanceId, message: impl Into<String>) -> Self {
        Self {
            instance_id,
            status: OutcomeStatus::Succeeded,
            message: Some(message.into()),
        }
    }

    pub fn failed(instance_id: InstanceId, message: impl Into<String>) -> Self {
        Self {
            instance_id,
            status: OutcomeStatus::Failed,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// True when every instance in the fan-out succeeded.
pub fn all_succeeded(outcomes: &[InstanceOutcome]) -> bool {
    outcomes.iter().all(InstanceOutcome::is_success)
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
