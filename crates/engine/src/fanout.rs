// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent per-instance fan-out with a join barrier.
//!
//! One task per target instance; the caller blocks until every task has
//! finished. A failing, panicking, or timed-out task becomes a failed
//! outcome for its instance and never cancels its siblings.

use crate::context::RunContext;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::DeployHandler;
use sw_core::{AppInstance, InstanceOutcome};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fan-out tuning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanoutConfig {
    /// Maximum deploys in flight; `None` runs one task per instance.
    pub width: Option<usize>,
    /// Deadline per instance; a handler still running past it is recorded
    /// as failed while its siblings continue.
    pub instance_timeout: Option<Duration>,
}

/// Runs the deploy stage across a project's instances.
pub struct FanoutExecutor {
    config: FanoutConfig,
}

impl FanoutExecutor {
    pub fn new(config: FanoutConfig) -> Self {
        Self { config }
    }

    /// Deploy to every instance and await all of them.
    ///
    /// Outcomes are in completion order; ordering across instances is
    /// unspecified. Every spawned task is joined before this returns.
    pub async fn deploy<T: DeployHandler>(
        &self,
        handler: &T,
        ctx: &RunContext,
        instances: &[AppInstance],
    ) -> Vec<InstanceOutcome> {
        let semaphore = self.config.width.map(|w| Arc::new(Semaphore::new(w)));
        let timeout = self.config.instance_timeout;

        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::with_capacity(instances.len());
        for instance in instances.iter().cloned() {
            let handler = handler.clone();
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();
            let instance_id = instance.id.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                deploy_one(&handler, &ctx, &instance, timeout).await
            });
            spawned.insert(handle.id(), instance_id);
        }

        let mut outcomes = Vec::with_capacity(instances.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    // A panicked handler must not take the barrier down.
                    tracing::error!(error = %e, "deploy task failed to join");
                    if let Some(instance_id) = spawned.get(&e.id()) {
                        outcomes.push(InstanceOutcome::failed(
                            instance_id.clone(),
                            format!("deploy task aborted: {e}"),
                        ));
                    }
                }
            }
        }
        outcomes
    }
}

async fn deploy_one<T: DeployHandler>(
    handler: &T,
    ctx: &RunContext,
    instance: &AppInstance,
    timeout: Option<Duration>,
) -> InstanceOutcome {
    let fut = handler.deploy(&ctx.project, instance, ctx.sink());
    let result = match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(host = %instance.host, timeout_secs = deadline.as_secs(), "instance deploy timed out");
                return InstanceOutcome::failed(
                    instance.id.clone(),
                    format!("deploy timed out after {}s", deadline.as_secs()),
                );
            }
        },
        None => fut.await,
    };

    match result {
        Ok(message) => InstanceOutcome::succeeded(instance.id.clone(), message),
        Err(e) => {
            tracing::warn!(host = %instance.host, error = %e, "instance deploy failed");
            InstanceOutcome::failed(instance.id.clone(), e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
