// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console specs
//!
//! Verify the operator console's view of a run: live draining while the
//! pipeline writes, key ownership, and cleanup at run completion.

use crate::specs::prelude::*;

#[test]
fn drain_returns_appended_text_then_empty() {
    let console = LogRegistry::new();
    let log = console.acquire("run-console").unwrap();

    log.append("a");
    log.append("b");

    assert_eq!(console.drain("run-console"), "ab");
    assert_eq!(console.drain("run-console"), "");
}

#[test]
fn second_owner_for_a_live_key_is_rejected() {
    let console = LogRegistry::new();
    let _owner = console.acquire("run-console").unwrap();
    assert!(console.acquire("run-console").is_err());
}

#[tokio::test]
async fn console_can_poll_while_a_run_is_deploying() {
    let rig = Rig::new();
    let history = rig.history();
    let key = history.id.as_str().to_string();
    let transport = FakeTransport::new()
        .delay("a.local", Duration::from_millis(60))
        .delay("b.local", Duration::from_millis(60));
    let mut run = rig.pipeline(
        history,
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().producing(b"artifact-v1".to_vec()),
        transport,
    );

    // External poller drains the run's key while the pipeline writes to it.
    let console = Arc::clone(&rig.console);
    let poller = tokio::spawn(async move {
        let mut collected = String::new();
        for _ in 0..50 {
            collected.push_str(&console.drain(&key));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        collected
    });

    run.execute().await.unwrap();
    let streamed = poller.await.unwrap();

    // The poller saw the handlers' progress lines as they were written.
    assert!(streamed.contains("[a.local] deploying"));
    assert!(streamed.contains("[b.local] deploying"));
    assert!(streamed.contains("build started"));
}

#[tokio::test]
async fn run_completion_releases_the_log_buffer() {
    let rig = Rig::new();
    let history = rig.history();
    let key = history.id.as_str().to_string();
    let mut run = rig.pipeline(
        history,
        FakeVcs::returning("0f3a9c1d"),
        FakeBuilder::new().producing(b"artifact-v1".to_vec()),
        FakeTransport::new(),
    );
    run.execute().await.unwrap();

    // The owning run released its key; the console sees nothing and a new
    // producer could claim it.
    assert!(rig.console.is_empty());
    assert_eq!(rig.console.drain(&key), "");
    assert!(rig.console.acquire(key.as_str()).is_ok());
}
