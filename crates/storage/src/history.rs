// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory run-history state and its append-only journal.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use sw_core::{InstanceId, OutcomeStatus, RunId, TaskHistory, TaskHistoryDetail};

/// Shared handle to run history used by the engine and its observers.
pub type SharedHistory = Arc<Mutex<HistoryState>>;

/// Fresh, empty shared history.
pub fn shared_history() -> SharedHistory {
    Arc::new(Mutex::new(HistoryState::new()))
}

/// Run records and per-instance details, keyed by run id.
///
/// The engine owns a shared handle to this for the duration of a run and
/// hands completed records to the journal; nothing here is durable by
/// itself.
#[derive(Debug, Default)]
pub struct HistoryState {
    runs: HashMap<RunId, TaskHistory>,
    details: HashMap<RunId, Vec<TaskHistoryDetail>>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a run.
    pub fn upsert_run(&mut self, run: TaskHistory) {
        self.runs.insert(run.id.clone(), run);
    }

    pub fn run(&self, id: &RunId) -> Option<&TaskHistory> {
        self.runs.get(id)
    }

    /// Append one per-instance detail record for a run.
    pub fn record_detail(&mut self, detail: TaskHistoryDetail) {
        self.details
            .entry(detail.run_id.clone())
            .or_default()
            .push(detail);
    }

    /// Fill a pending detail once its instance's handler has finished.
    pub fn complete_detail(
        &mut self,
        run_id: &RunId,
        instance_id: &InstanceId,
        status: OutcomeStatus,
        message: Option<String>,
    ) {
        let pending = self.details.get_mut(run_id).and_then(|details| {
            details
                .iter_mut()
                .find(|d| &d.instance_id == instance_id && d.status == OutcomeStatus::Pending)
        });
        match pending {
            Some(detail) => detail.complete(status, message),
            None => tracing::warn!(%run_id, %instance_id, "no pending detail to complete"),
        }
    }

    pub fn details(&self, run_id: &RunId) -> &[TaskHistoryDetail] {
        self.details.get(run_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

/// One journal line: a completed run with its instance details.
#[derive(Debug, Serialize)]
struct JournalRecord<'a> {
    run: &'a TaskHistory,
    details: &'a [TaskHistoryDetail],
}

/// Append-only JSONL journal of completed runs.
///
/// Each `append()` call opens, writes one line, and closes the file.
/// Failures are logged via tracing but do not propagate — journaling
/// must not fail a finished run.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append a completed run and its details as one JSON line.
    pub fn append(&self, run: &TaskHistory, details: &[TaskHistoryDetail]) {
        let record = JournalRecord { run, details };
        if let Err(e) = self.write_line(&record) {
            tracing::warn!(
                run_id = %run.id,
                error = %e,
                "failed to append history journal"
            );
        }
    }

    fn write_line(&self, record: &JournalRecord<'_>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
