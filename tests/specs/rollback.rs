// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollback specs
//!
//! Verify restore-or-rebuild selection, integrity handling, and that every
//! completed rollback leaves its own restorable backup.

use crate::specs::prelude::*;

#[tokio::test]
async fn rollback_with_existing_backup_restores_referenced_bytes() {
    let rig = Rig::new();
    let prior = rig.seed_reference_run(b"known-good-bytes");

    let builder = FakeBuilder::new().producing(b"would-be-rebuilt".to_vec());
    let mut run = rig.pipeline(
        rig.history().with_ref(prior.id.clone()),
        FakeVcs::returning("rev-new"),
        builder.clone(),
        FakeTransport::new(),
    );

    let terminal = run.rollback().await.unwrap();

    assert_eq!(terminal, RunState::Success);
    // Working artifact equals the referenced backup bytes X.
    assert_eq!(
        std::fs::read(rig.project.artifact_file()).unwrap(),
        b"known-good-bytes"
    );
    // sha_local == digest(X), adopted revision from the referenced run.
    assert_eq!(run.history().sha_local, prior.sha_local);
    assert_eq!(run.history().sha_git.as_deref(), Some("rev-old"));
    // The rebuild path never ran.
    assert_eq!(builder.calls(), 0);
    // A fresh backup keyed by the CURRENT run exists.
    assert!(rig.backups.exists("app.tar", run.history().id.as_str()));
}

#[tokio::test]
async fn rollback_without_backup_takes_the_rebuild_path() {
    let rig = Rig::new();
    // Referenced run is known but left no backup behind.
    let mut prior = rig.history();
    prior.record_revision("rev-old");
    rig.state.lock().upsert_run(prior.clone());

    let builder = FakeBuilder::new().producing(b"rebuilt-bytes".to_vec());
    let mut run = rig.pipeline(
        rig.history().with_ref(prior.id.clone()),
        FakeVcs::returning("rev-rebuilt"),
        builder.clone(),
        FakeTransport::new(),
    );

    let terminal = run.rollback().await.unwrap();

    assert_eq!(terminal, RunState::Success);
    assert_eq!(builder.calls(), 1);
    assert!(run
        .states()
        .starts_with(&[RunState::Rebuilding, RunState::BackingUp]));
    // Afterwards a backup keyed by the current run id exists on disk.
    let stored = rig
        .backups
        .backup_path("app.tar", run.history().id.as_str());
    assert_eq!(std::fs::read(stored).unwrap(), b"rebuilt-bytes");
}

#[tokio::test]
async fn tampered_backup_aborts_rollback_before_deploy() {
    let rig = Rig::new();
    let prior = rig.seed_reference_run(b"known-good-bytes");
    let stored = rig.backups.backup_path("app.tar", prior.id.as_str());
    std::fs::write(&stored, b"tampered").unwrap();

    let transport = FakeTransport::new();
    let mut run = rig.pipeline(
        rig.history().with_ref(prior.id.clone()),
        FakeVcs::returning("rev-new"),
        FakeBuilder::new(),
        transport.clone(),
    );

    let err = run.rollback().await.unwrap_err();

    assert!(matches!(err, PipelineError::IntegrityMismatch { .. }));
    assert!(transport.deployed().is_empty());
    assert_eq!(run.history().status, RunState::Failure);
}

#[tokio::test]
async fn chained_rollbacks_keep_producing_fast_paths() {
    let rig = Rig::new();
    let first = rig.seed_reference_run(b"gen-one-bytes");

    // Roll back to the seeded run.
    let mut second = rig.pipeline(
        rig.history().with_ref(first.id.clone()),
        FakeVcs::returning("rev-new"),
        FakeBuilder::new(),
        FakeTransport::new(),
    );
    second.rollback().await.unwrap();

    // A later rollback referencing the SECOND run takes the fast path off
    // the backup that run just wrote.
    let builder = FakeBuilder::new();
    let mut third = rig.pipeline(
        rig.history().with_ref(second.history().id.clone()),
        FakeVcs::returning("rev-newer"),
        builder.clone(),
        FakeTransport::new(),
    );
    let terminal = third.rollback().await.unwrap();

    assert_eq!(terminal, RunState::Success);
    assert_eq!(builder.calls(), 0);
    assert_eq!(
        std::fs::read(rig.project.artifact_file()).unwrap(),
        b"gen-one-bytes"
    );
}
