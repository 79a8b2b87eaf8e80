// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-history records and the run state machine.

use crate::outcome::OutcomeStatus;
use crate::project::{InstanceId, ProjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for one pipeline run.
    ///
    /// Each execute or rollback invocation gets its own ID; backups written
    /// by the run are keyed by it.
    pub struct RunId("run-");
}

/// State of a pipeline run.
///
/// execute walks `Init → Building → Packaging → Deploying`; rollback walks
/// `Init → (Restoring | Rebuilding) → BackingUp → Deploying`. Build-side
/// failures land in `Failure` without touching any instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    Building,
    Packaging,
    Restoring,
    Rebuilding,
    BackingUp,
    Deploying,
    Success,
    PartialFailure,
    Failure,
}

crate::simple_display! {
    RunState {
        Init => "init",
        Building => "building",
        Packaging => "packaging",
        Restoring => "restoring",
        Rebuilding => "rebuilding",
        BackingUp => "backing_up",
        Deploying => "deploying",
        Success => "success",
        PartialFailure => "partial_failure",
        Failure => "failure",
    }
}

impl RunState {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Success | RunState::PartialFailure | RunState::Failure
        )
    }

    /// Whether the state machine admits `next` from `self`.
    pub fn can_transition(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Init, Building) | (Init, Restoring) | (Init, Rebuilding) => true,
            (Building, Packaging) => true,
            (Packaging, Deploying) => true,
            (Restoring, BackingUp) | (Rebuilding, BackingUp) => true,
            (BackingUp, Deploying) => true,
            (Deploying, Success) | (Deploying, PartialFailure) | (Deploying, Failure) => true,
            // Any pre-deploy stage may abort the run.
            (Building, Failure)
            | (Packaging, Failure)
            | (Restoring, Failure)
            | (Rebuilding, Failure)
            | (BackingUp, Failure)
            | (Init, Failure) => true,
            _ => false,
        }
    }
}

/// Rejected run-state transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid run state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: RunState,
    pub to: RunState,
}

/// Durable record of one run's inputs and outputs.
///
/// `sha_git` and `sha_local` are write-once per run: the first recorded
/// value wins and later writes are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistory {
    pub id: RunId,
    pub project_id: ProjectId,
    /// Prior run this rollback references; `None` for execute runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<RunId>,
    /// VCS revision the deployed artifact was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha_git: Option<String>,
    /// Content digest of the deployed artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha_local: Option<String>,
    pub status: RunState,
    pub created_at_ms: u64,
}

impl TaskHistory {
    pub fn new(project_id: ProjectId, created_at_ms: u64) -> Self {
        Self {
            id: RunId::new(),
            project_id,
            ref_id: None,
            sha_git: None,
            sha_local: None,
            status: RunState::Init,
            created_at_ms,
        }
    }

    /// Reference a prior run, making this record a rollback target.
    pub fn with_ref(mut self, ref_id: RunId) -> Self {
        self.ref_id = Some(ref_id);
        self
    }

    /// Advance the state machine, rejecting transitions the graph forbids.
    pub fn advance(&mut self, next: RunState) -> Result<(), TransitionError> {
        if !self.status.can_transition(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Record the VCS revision. First write wins.
    pub fn record_revision(&mut self, sha: impl Into<String>) {
        if self.sha_git.is_none() {
            self.sha_git = Some(sha.into());
        }
    }

    /// Record the artifact content digest. First write wins.
    pub fn record_digest(&mut self, sha: impl Into<String>) {
        if self.sha_local.is_none() {
            self.sha_local = Some(sha.into());
        }
    }
}

/// Per-(run, instance) outcome record.
///
/// Created pending when the fan-out starts and completed once the
/// instance's handler finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistoryDetail {
    pub run_id: RunId,
    pub instance_id: InstanceId,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskHistoryDetail {
    pub fn pending(run_id: RunId, instance_id: InstanceId) -> Self {
        Self {
            run_id,
            instance_id,
            status: OutcomeStatus::Pending,
            message: None,
        }
    }

    /// Fill the record from a finished handler.
    pub fn complete(&mut self, status: OutcomeStatus, message: Option<String>) {
        self.status = status;
        self.message = message;
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
