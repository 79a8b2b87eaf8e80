// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-adapters: external-boundary collaborators for the pipeline engine.
//!
//! Each boundary (VCS, build, packaging, per-instance transport, digests)
//! is a trait with a subprocess-backed production implementation and a
//! scriptable fake behind the `test-support` feature.

pub mod builder;
pub mod digest;
pub mod packager;
pub mod subprocess;
pub mod transport;
pub mod vcs;

pub use builder::{BuildError, Builder, ShellBuilder};
pub use digest::{file_sha256, DigestError};
pub use packager::{DockerPackager, Packager, PackagingError};
pub use subprocess::{run_with_timeout, SubprocessError};
pub use transport::{ArchiveTransport, ContainerTransport, DeployHandler, TransportError};
pub use vcs::{GitVcs, VcsAdapter, VcsError};

#[cfg(any(test, feature = "test-support"))]
pub use builder::FakeBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use packager::FakePackager;
#[cfg(any(test, feature = "test-support"))]
pub use transport::FakeTransport;
#[cfg(any(test, feature = "test-support"))]
pub use vcs::FakeVcs;
