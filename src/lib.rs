//! Build-and-release helper for Rust projects in CI.
//!
//! Given a list of target triples, the crate builds the selected binaries or
//! library for each target, packs the outputs into one archive per target,
//! and uploads the whole batch to a GitHub release. It backs the
//! `rust-release-action` binary and can be driven programmatically through
//! [`pipeline::run`].
//!
//! # Modules
//!
//! - [`artefact`] - Archive naming, format selection, and packaging
//! - [`builder`] - Cargo build orchestration for one target
//! - [`cli`] - Command-line and `INPUT_*` environment definitions
//! - [`config`] - Immutable run configuration
//! - [`deps`] - Command execution and system dependency installation
//! - [`error`] - Error types and retry classification
//! - [`logging`] - Logger setup
//! - [`metadata`] - Cached `cargo metadata` queries
//! - [`pipeline`] - Whole-run orchestration
//! - [`platform`] - Target triple parsing and OS family classification
//! - [`release`] - Release creation and upload with retry
//! - [`resolution`] - Output filename resolution
//! - [`toolchain`] - Rust target, cross tool, and SDK provisioning

pub mod artefact;
pub mod builder;
pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod platform;
pub mod release;
pub mod resolution;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod toolchain;
