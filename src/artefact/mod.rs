//! Archive naming, format selection, and packaging.
//!
//! # Sub-modules
//!
//! - [`format`] - Archive format chosen from the target's OS family.
//! - [`naming`] - Archive stem naming (`<primary>-<target>`).
//! - [`packaging`] - Archive jobs and archive creation.
//! - [`packaging_error`] - Error types for packaging operations.

pub mod format;
pub mod naming;
pub mod packaging;
pub mod packaging_error;
