// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit per-run context threaded through build and deploy calls.
//!
//! Carries the run's identity and its log handle so no stage depends on
//! ambient state; every fan-out task gets a cheap clone.

use crate::console::RunLog;
use std::sync::Arc;
use sw_core::{LogSink, Project, RunId};

/// Everything a stage needs to know about the run it serves.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub project: Arc<Project>,
    pub log: Arc<RunLog>,
}

impl RunContext {
    pub fn new(run_id: RunId, project: Arc<Project>, log: Arc<RunLog>) -> Self {
        Self {
            run_id,
            project,
            log,
        }
    }

    /// The run's log buffer as the sink adapters write into.
    pub fn sink(&self) -> &dyn LogSink {
        self.log.as_ref()
    }
}
