// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execute specs
//!
//! Verify a triggered run walks build → package → deploy and records its
//! provenance and per-instance outcomes.

use crate::specs::prelude::*;

#[tokio::test]
async fn execute_visits_states_in_order_and_records_details() {
    let rig = Rig::new();
    let mut run = rig.pipeline(
        rig.history(),
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().producing(b"artifact-v1".to_vec()),
        FakeTransport::new(),
    );

    let terminal = run.execute().await.unwrap();

    assert_eq!(terminal, RunState::Success);
    assert_eq!(
        run.states(),
        &[
            RunState::Building,
            RunState::Packaging,
            RunState::Deploying,
            RunState::Success,
        ]
    );

    // Revision recorded on the run.
    assert_eq!(run.history().sha_git.as_deref(), Some("0f3a9c1d"));

    // A detail record exists for both configured instances.
    let state = rig.state.lock();
    let details = state.details(&run.history().id);
    assert_eq!(details.len(), 2);
    let mut detailed: Vec<_> = details.iter().map(|d| d.instance_id.clone()).collect();
    detailed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    let mut configured: Vec<_> = rig.project.instances.iter().map(|i| i.id.clone()).collect();
    configured.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(detailed, configured);
}

#[tokio::test]
async fn execute_deploys_all_instances_in_parallel() {
    let rig = Rig::new();
    let delay = Duration::from_millis(80);
    let transport = FakeTransport::new()
        .delay("a.local", delay)
        .delay("b.local", delay);
    let mut run = rig.pipeline(
        rig.history(),
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().producing(b"artifact-v1".to_vec()),
        transport.clone(),
    );

    let start = std::time::Instant::now();
    run.execute().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(transport.deployed().len(), 2);
    assert!(
        elapsed < delay * 2,
        "two {delay:?} deploys should overlap, took {elapsed:?}"
    );
}

#[tokio::test]
async fn partial_failure_is_terminal_without_rollback() {
    let rig = Rig::new();
    let transport = FakeTransport::new().fail("b.local", "no route to host");
    let builder = FakeBuilder::new().producing(b"artifact-v1".to_vec());
    let mut run = rig.pipeline(
        rig.history(),
        FakeVcs::returning("0f3a9c1d"),
        builder.clone(),
        transport,
    );

    let terminal = run.execute().await.unwrap();

    assert_eq!(terminal, RunState::PartialFailure);
    // No rollback was auto-triggered: nothing rebuilt, working artifact
    // untouched.
    assert_eq!(builder.calls(), 1);
    assert_eq!(
        std::fs::read(rig.project.artifact_file()).unwrap(),
        b"artifact-v1"
    );
}

#[tokio::test]
async fn build_failure_never_reaches_an_instance() {
    let rig = Rig::new();
    let transport = FakeTransport::new();
    let mut run = rig.pipeline(
        rig.history(),
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().failing("link error"),
        transport.clone(),
    );

    let err = run.execute().await.unwrap_err();

    assert!(matches!(err, PipelineError::Build(_)));
    assert_eq!(run.history().status, RunState::Failure);
    assert!(transport.deployed().is_empty());
}

#[tokio::test]
async fn execute_backs_up_the_built_artifact_for_later_rollback() {
    let rig = Rig::new();
    let mut run = rig.pipeline(
        rig.history(),
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().producing(b"artifact-v1".to_vec()),
        FakeTransport::new(),
    );
    run.execute().await.unwrap();

    let stored = rig
        .backups
        .backup_path("app.tar", run.history().id.as_str());
    assert_eq!(std::fs::read(stored).unwrap(), b"artifact-v1");
}
