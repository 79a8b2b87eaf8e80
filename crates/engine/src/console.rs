// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key log buffers drained by the operator console.
//!
//! Producers acquire a key-scoped [`RunLog`] and append progress text;
//! an external console polls [`LogRegistry::drain`] to stream it out.
//! A key has exactly one producer at a time; the handle releases its
//! buffer when dropped, and `release`/`release_all` exist for explicit
//! cleanup.

use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use sw_core::LogSink;
use thiserror::Error;

/// Errors from the log registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    /// A second producer tried to acquire a live key. Signals an upstream
    /// key-reuse bug, so it is fatal rather than silently shared.
    #[error("log buffer already owned for key: {key}")]
    KeyConflict { key: SmolStr },
}

/// Registry of key → buffer.
///
/// The top-level map and each buffer are locked independently: appends to
/// one run never contend with appends to another.
#[derive(Default)]
pub struct LogRegistry {
    buffers: Mutex<HashMap<SmolStr, Arc<Mutex<String>>>>,
}

impl LogRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Atomically create the buffer for `key` and hand its producer handle
    /// to the caller. Fails if the key is already owned.
    pub fn acquire(self: &Arc<Self>, key: impl Into<SmolStr>) -> Result<RunLog, LogError> {
        let key = key.into();
        let mut buffers = self.buffers.lock();
        if buffers.contains_key(&key) {
            return Err(LogError::KeyConflict { key });
        }
        buffers.insert(key.clone(), Arc::new(Mutex::new(String::new())));
        Ok(RunLog {
            key,
            registry: Arc::clone(self),
        })
    }

    /// Read-and-clear the buffered text for `key`.
    ///
    /// Not idempotent: a second drain with no intervening append yields
    /// the empty string. A released or unknown key drains empty.
    pub fn drain(&self, key: &str) -> String {
        let buf = {
            let buffers = self.buffers.lock();
            match buffers.get(key) {
                Some(buf) => Arc::clone(buf),
                None => return String::new(),
            }
        };
        let mut buf = buf.lock();
        std::mem::take(&mut *buf)
    }

    /// Drop the buffer for `key`, discarding any undrained text.
    pub fn release(&self, key: &str) {
        self.buffers.lock().remove(key);
    }

    /// Drop every buffer.
    pub fn release_all(&self) {
        self.buffers.lock().clear();
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }

    fn append(&self, key: &str, text: &str) {
        let buf = {
            let buffers = self.buffers.lock();
            match buffers.get(key) {
                Some(buf) => Arc::clone(buf),
                None => {
                    tracing::debug!(key, "append to released log buffer dropped");
                    return;
                }
            }
        };
        buf.lock().push_str(text);
    }
}

/// Producer handle for one key's buffer.
///
/// Cloned freely across the run's tasks via `Arc`; the buffer is released
/// when the handle drops.
pub struct RunLog {
    key: SmolStr,
    registry: Arc<LogRegistry>,
}

impl RunLog {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn append(&self, text: &str) {
        self.registry.append(&self.key, text);
    }
}

impl LogSink for RunLog {
    fn append(&self, text: &str) {
        RunLog::append(self, text);
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
