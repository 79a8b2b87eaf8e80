// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execute/rollback state machine. One `PipelineRun` per triggered run.

use crate::build::{BuildStage, StageError};
use crate::config::PipelineConfig;
use crate::console::{LogError, LogRegistry, RunLog};
use crate::context::RunContext;
use crate::fanout::FanoutExecutor;
use std::sync::Arc;
use sw_adapters::digest::{file_sha256, DigestError};
use sw_adapters::{Builder, DeployHandler, Packager, PackagingError, VcsAdapter};
use sw_core::{
    all_succeeded, Clock, InstanceOutcome, Project, RunState, TaskHistory, TaskHistoryDetail,
    TransitionError,
};
use sw_storage::{BackupError, BackupStore, HistoryLog, SharedHistory};
use thiserror::Error;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("build stage failed: {0}")]
    Build(#[from] StageError),
    #[error("packaging failed: {0}")]
    Packaging(#[from] PackagingError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("artifact digest failed: {0}")]
    Digest(#[from] DigestError),
    #[error("restored artifact digest {actual} does not match recorded digest {expected}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("rollback requires a reference run id")]
    MissingRef,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Collaborators and shared stores a run executes against.
pub struct PipelineDeps<V, B, P, T> {
    pub vcs: V,
    pub builder: B,
    pub packager: P,
    pub transport: T,
    pub backups: Arc<BackupStore>,
    pub state: SharedHistory,
    /// Completed runs are journaled here when set; failures to write are
    /// logged and swallowed.
    pub journal: Option<HistoryLog>,
}

/// One execute() or rollback() invocation against a TaskHistory record.
pub struct PipelineRun<V, B, P, T, C: Clock> {
    history: TaskHistory,
    project: Arc<Project>,
    deps: PipelineDeps<V, B, P, T>,
    console: Arc<LogRegistry>,
    fanout: FanoutExecutor,
    verify_restore: bool,
    clock: C,
    trace: Vec<RunState>,
}

impl<V, B, P, T, C> PipelineRun<V, B, P, T, C>
where
    V: VcsAdapter,
    B: Builder,
    P: Packager,
    T: DeployHandler,
    C: Clock,
{
    pub fn new(
        history: TaskHistory,
        project: Project,
        deps: PipelineDeps<V, B, P, T>,
        console: Arc<LogRegistry>,
        config: &PipelineConfig,
        clock: C,
    ) -> Self {
        Self {
            history,
            project: Arc::new(project),
            deps,
            console,
            fanout: FanoutExecutor::new(config.fanout.to_config()),
            verify_restore: config.verify_restore,
            clock,
            trace: Vec::new(),
        }
    }

    /// Record for this run as it currently stands.
    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    /// States visited so far, in order.
    pub fn states(&self) -> &[RunState] {
        &self.trace
    }

    /// Build a fresh artifact, package it, and fan out to every instance.
    ///
    /// Build and package failures are fatal and leave the run in
    /// `Failure` with no instance touched; instance failures surface only
    /// in the aggregate `PartialFailure` after the barrier. A partial
    /// failure never auto-triggers rollback; that is the caller's call.
    pub async fn execute(&mut self) -> Result<RunState, PipelineError> {
        let started = self.clock.now();
        let ctx = self.begin()?;
        let result = self.run_execute(&ctx).await;
        self.complete(result, started)
    }

    /// Restore the referenced run's artifact (or rebuild it), leave a
    /// fresh backup under this run's id, and fan out.
    pub async fn rollback(&mut self) -> Result<RunState, PipelineError> {
        let started = self.clock.now();
        let ctx = self.begin()?;
        let result = self.run_rollback(&ctx).await;
        self.complete(result, started)
    }

    async fn run_execute(&mut self, ctx: &RunContext) -> Result<RunState, PipelineError> {
        self.advance(RunState::Building)?;
        let built = BuildStage::new(&self.deps.vcs, &self.deps.builder)
            .run(&self.project, ctx.sink())
            .await?;
        self.history.record_revision(built.revision);

        self.advance(RunState::Packaging)?;
        let image = self
            .deps
            .packager
            .build_image(&self.project, ctx.sink())
            .await?;
        tracing::info!(run = %self.history.id, image = %image, "artifact packaged");

        // Leave a fast-path backup for future rollbacks.
        self.deps
            .backups
            .backup(&built.artifact, self.history.id.as_str())?;
        let digest = file_sha256(&built.artifact)?;
        self.history.record_digest(digest);

        self.advance(RunState::Deploying)?;
        self.open_details();
        let outcomes = self
            .fanout
            .deploy(&self.deps.transport, ctx, &self.project.instances)
            .await;
        self.close_details(&outcomes);

        Ok(if all_succeeded(&outcomes) {
            RunState::Success
        } else {
            RunState::PartialFailure
        })
    }

    async fn run_rollback(&mut self, ctx: &RunContext) -> Result<RunState, PipelineError> {
        let ref_id = self.history.ref_id.clone().ok_or(PipelineError::MissingRef)?;
        let base_name = self.project.artifact_base_name().to_string();
        let artifact = self.project.artifact_file();

        if self.deps.backups.exists(&base_name, ref_id.as_str()) {
            // Fast path: restore the referenced run's bytes, adopt its
            // revision, never rebuild.
            self.advance(RunState::Restoring)?;
            ctx.log
                .append(&format!("restoring backup {base_name}#{ref_id}\n"));
            self.deps
                .backups
                .restore(&base_name, ref_id.as_str(), &artifact)?;

            let ref_run = self.deps.state.lock().run(&ref_id).cloned();
            if let Some(sha) = ref_run.as_ref().and_then(|r| r.sha_git.clone()) {
                self.history.record_revision(sha);
            }

            let digest = file_sha256(&artifact)?;
            if let Some(expected) = ref_run.as_ref().and_then(|r| r.sha_local.clone()) {
                if expected != digest {
                    if self.verify_restore {
                        return Err(PipelineError::IntegrityMismatch {
                            expected,
                            actual: digest,
                        });
                    }
                    tracing::warn!(
                        run = %self.history.id,
                        expected = %expected,
                        actual = %digest,
                        "restored artifact digest differs from recorded digest"
                    );
                }
            }
            self.history.record_digest(digest);
        } else {
            // Slow path: no backup to restore, regenerate from history.
            self.advance(RunState::Rebuilding)?;
            ctx.log
                .append(&format!("no backup {base_name}#{ref_id}, rebuilding\n"));
            let built = BuildStage::new(&self.deps.vcs, &self.deps.builder)
                .run(&self.project, ctx.sink())
                .await?;
            self.history.record_revision(built.revision);
            let digest = file_sha256(&artifact)?;
            self.history.record_digest(digest);
        }

        // Every completed rollback leaves a restorable backup of its own.
        self.advance(RunState::BackingUp)?;
        self.deps
            .backups
            .backup(&artifact, self.history.id.as_str())?;

        self.advance(RunState::Deploying)?;
        self.open_details();
        let outcomes = self
            .fanout
            .deploy(&self.deps.transport, ctx, &self.project.instances)
            .await;
        self.close_details(&outcomes);

        Ok(if all_succeeded(&outcomes) {
            RunState::Success
        } else {
            RunState::Failure
        })
    }

    /// Acquire the run-scoped log buffer and publish the initial record.
    fn begin(&mut self) -> Result<RunContext, PipelineError> {
        let log: RunLog = self.console.acquire(self.history.id.as_str())?;
        self.deps.state.lock().upsert_run(self.history.clone());
        Ok(RunContext::new(
            self.history.id.clone(),
            Arc::clone(&self.project),
            Arc::new(log),
        ))
    }

    /// Seal the run: terminal state, shared record, journal line.
    fn complete(
        &mut self,
        result: Result<RunState, PipelineError>,
        started: std::time::Instant,
    ) -> Result<RunState, PipelineError> {
        let sealed = match result {
            Ok(terminal) => {
                self.advance(terminal)?;
                Ok(terminal)
            }
            Err(e) => {
                if self.history.status.can_transition(RunState::Failure) {
                    self.advance(RunState::Failure)?;
                }
                Err(e)
            }
        };

        let elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64;
        match &sealed {
            Ok(state) => {
                tracing::info!(run = %self.history.id, status = %state, elapsed_ms, "run completed")
            }
            Err(e) => {
                tracing::error!(run = %self.history.id, error = %e, elapsed_ms, "run failed")
            }
        }

        if let Some(journal) = &self.deps.journal {
            let state = self.deps.state.lock();
            journal.append(&self.history, state.details(&self.history.id));
        }
        sealed
    }

    fn advance(&mut self, next: RunState) -> Result<(), PipelineError> {
        self.history.advance(next)?;
        self.trace.push(next);
        self.deps.state.lock().upsert_run(self.history.clone());
        Ok(())
    }

    /// One empty detail per instance, created when the fan-out starts.
    fn open_details(&self) {
        let mut state = self.deps.state.lock();
        for instance in &self.project.instances {
            state.record_detail(TaskHistoryDetail::pending(
                self.history.id.clone(),
                instance.id.clone(),
            ));
        }
    }

    fn close_details(&self, outcomes: &[InstanceOutcome]) {
        let mut state = self.deps.state.lock();
        for outcome in outcomes {
            state.complete_detail(
                &self.history.id,
                &outcome.instance_id,
                outcome.status,
                outcome.message.clone(),
            );
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
