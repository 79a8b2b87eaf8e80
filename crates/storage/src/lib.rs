// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-storage: on-disk backups and run-history records

pub mod backup;
pub mod history;

pub use backup::{BackupError, BackupStore};
pub use history::{shared_history, HistoryLog, HistoryState, SharedHistory};
