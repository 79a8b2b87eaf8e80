// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for pipeline specs.

pub use std::sync::Arc;
pub use std::time::Duration;

pub use sw_adapters::{digest::file_sha256, FakeBuilder, FakePackager, FakeTransport, FakeVcs};
pub use sw_core::{
    AppInstance, FakeClock, InstanceId, OutcomeStatus, Project, ProjectId, RunState, TaskHistory,
};
pub use sw_engine::{LogRegistry, PipelineConfig, PipelineDeps, PipelineError, PipelineRun};
pub use sw_storage::{shared_history, BackupStore, SharedHistory};

use tempfile::TempDir;

pub type SpecRun = PipelineRun<FakeVcs, FakeBuilder, FakePackager, FakeTransport, FakeClock>;

/// One wired pipeline environment in a temp directory.
pub struct Rig {
    pub dir: TempDir,
    pub console: Arc<LogRegistry>,
    pub state: SharedHistory,
    pub backups: Arc<BackupStore>,
    pub config: PipelineConfig,
    pub project: Project,
}

impl Rig {
    /// Project with two configured instances, `a.local` and `b.local`.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let backup_root = dir.path().join("backups");
        let project = Project {
            id: ProjectId::new(),
            name: "billing".to_string(),
            workdir: dir.path().join("work"),
            artifact_path: "out/app.tar".to_string(),
            build_command: "make dist".to_string(),
            image: None,
            restart_command: None,
            instances: vec![Self::instance("a.local"), Self::instance("b.local")],
        };
        std::fs::create_dir_all(project.workdir.join("out")).unwrap();
        Self {
            console: LogRegistry::new(),
            state: shared_history(),
            backups: Arc::new(BackupStore::new(&backup_root)),
            config: PipelineConfig::with_backup_root(backup_root),
            project,
            dir,
        }
    }

    pub fn instance(host: &str) -> AppInstance {
        AppInstance {
            id: InstanceId::new(),
            host: host.to_string(),
            port: 22,
            user: "deploy".to_string(),
            remote_path: "/opt/app".to_string(),
        }
    }

    pub fn history(&self) -> TaskHistory {
        TaskHistory::new(self.project.id.clone(), 1_000)
    }

    /// Completed prior run with its artifact bytes backed up, ready to be
    /// rolled back to.
    pub fn seed_reference_run(&self, bytes: &[u8]) -> TaskHistory {
        let staged = self.dir.path().join("staged/app.tar");
        std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
        std::fs::write(&staged, bytes).unwrap();

        let mut prior = self.history();
        prior.record_revision("rev-old");
        prior.record_digest(file_sha256(&staged).unwrap());
        self.backups.backup(&staged, prior.id.as_str()).unwrap();
        self.state.lock().upsert_run(prior.clone());
        prior
    }

    pub fn pipeline(
        &self,
        history: TaskHistory,
        vcs: FakeVcs,
        builder: FakeBuilder,
        transport: FakeTransport,
    ) -> SpecRun {
        let deps = PipelineDeps {
            vcs,
            builder,
            packager: FakePackager::new(),
            transport,
            backups: Arc::clone(&self.backups),
            state: Arc::clone(&self.state),
            journal: None,
        };
        PipelineRun::new(
            history,
            self.project.clone(),
            deps,
            Arc::clone(&self.console),
            &self.config,
            FakeClock::new(),
        )
    }
}
