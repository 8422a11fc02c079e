//! Error types for the release action.
//!
//! Variants fall into four groups: configuration mistakes that are never
//! retried, external tool failures, filesystem and archive failures, and the
//! terminal upload failure raised once the retry budget is spent.

use crate::artefact::packaging_error::PackagingError;
use thiserror::Error;

/// Errors that can occur while building, packing, or publishing targets.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// No target triples were supplied.
    #[error("no targets to build; set INPUT_TARGETS or pass --targets")]
    NoTargets,

    /// A target triple could not be parsed.
    #[error("invalid target triple \"{value}\": {reason}")]
    InvalidTarget {
        /// The rejected triple.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required input is missing.
    #[error("missing required input {name}")]
    MissingInput {
        /// Name of the missing input.
        name: &'static str,
    },

    /// No package in the workspace metadata matched the requested name.
    #[error("package meta could not be none (requested: {})", .name.as_deref().unwrap_or("<first>"))]
    PackageNotFound {
        /// The requested package name, if any.
        name: Option<String>,
    },

    /// Requested binaries are not declared by the package.
    #[error("binaries {requested:?} not found in package {package}; available: {available:?}")]
    UnknownBinaries {
        /// Package the binaries were looked up in.
        package: String,
        /// Requested names missing from the package.
        requested: Vec<String>,
        /// Binary target names the package declares.
        available: Vec<String>,
    },

    /// A library artefact is needed but the package has no library target.
    #[error("package {package} has no library target")]
    LibraryTargetMissing {
        /// Package without a library target.
        package: String,
    },

    /// The library target declares a crate type with no known artefact name.
    #[error("unknown lib type \"{crate_type}\"")]
    UnknownLibraryType {
        /// The unrecognised crate type.
        crate_type: String,
    },

    /// Output resolution produced nothing to pack.
    #[error("no output files resolved for package {package} on target {target}")]
    EmptyOutputSet {
        /// Package being resolved.
        package: String,
        /// Target being resolved.
        target: String,
    },

    /// An external command exited unsuccessfully or could not be spawned.
    #[error("command `{command}` failed: {reason}")]
    ExternalTool {
        /// The command line that failed.
        command: String,
        /// Captured stderr or spawn error.
        reason: String,
    },

    /// `cargo metadata` produced output that could not be parsed.
    #[error("cannot parse cargo metadata: {0}")]
    MetadataParse(#[from] serde_json::Error),

    /// The cargo build for a target failed.
    #[error("build failed for target {target}: {reason}")]
    BuildFailed {
        /// Target triple that failed to build.
        target: String,
        /// Description of the build failure.
        reason: String,
    },

    /// A toolchain component or system package could not be installed.
    #[error("failed to install {tool}: {message}")]
    DependencyInstall {
        /// Name of the tool or package.
        tool: String,
        /// Description of the installation failure.
        message: String,
    },

    /// A release CLI operation other than upload failed.
    #[error("release {operation} failed: {message}")]
    Release {
        /// The release operation (view, create, upload).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// Archive creation failed.
    #[error("packaging failed: {0}")]
    Packaging(#[from] PackagingError),

    /// Uploading the artefact batch failed on every attempt.
    #[error("cannot upload files after {attempts} attempt(s)")]
    UploadFailed {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<ReleaseError>,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl ReleaseError {
    /// Whether repeating the failed operation could plausibly succeed.
    ///
    /// Process, network, and I/O failures are retryable. Configuration and
    /// packaging errors are deterministic and are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTool { .. } | Self::Release { .. } | Self::Io(_)
        )
    }

    /// Whether this error reflects invalid input rather than a runtime failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoTargets
                | Self::InvalidTarget { .. }
                | Self::MissingInput { .. }
                | Self::PackageNotFound { .. }
                | Self::UnknownBinaries { .. }
                | Self::LibraryTargetMissing { .. }
                | Self::UnknownLibraryType { .. }
                | Self::EmptyOutputSet { .. }
        )
    }
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn package_not_found_reports_missing_package_meta() {
        let err = ReleaseError::PackageNotFound {
            name: Some("missing".to_owned()),
        };
        let msg = err.to_string();
        assert!(msg.contains("package meta could not be none"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn unknown_library_type_names_the_crate_type() {
        let err = ReleaseError::UnknownLibraryType {
            crate_type: "proc-macro".to_owned(),
        };
        assert!(err.to_string().contains("proc-macro"));
    }

    #[test]
    fn upload_failed_preserves_last_error_as_source() {
        let err = ReleaseError::UploadFailed {
            attempts: 5,
            source: Box::new(ReleaseError::ExternalTool {
                command: "gh release upload".to_owned(),
                reason: "HTTP 502".to_owned(),
            }),
        };
        assert!(err.to_string().contains("5 attempt"));
        let source = std::error::Error::source(&err).expect("source is preserved");
        assert!(source.to_string().contains("HTTP 502"));
    }

    #[rstest]
    #[case::external(ReleaseError::ExternalTool { command: "gh".to_owned(), reason: "x".to_owned() }, true)]
    #[case::io(ReleaseError::Io(std::io::Error::other("disk")), true)]
    #[case::release(ReleaseError::Release { operation: "view", message: "x".to_owned() }, true)]
    #[case::config(ReleaseError::NoTargets, false)]
    #[case::lib_type(ReleaseError::UnknownLibraryType { crate_type: "x".to_owned() }, false)]
    #[case::packaging(ReleaseError::Packaging(PackagingError::EmptyFileList), false)]
    fn retryability_splits_by_kind(#[case] err: ReleaseError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(ReleaseError::NoTargets.is_configuration());
        assert!(
            !ReleaseError::BuildFailed {
                target: "x86_64-unknown-linux-gnu".to_owned(),
                reason: "boom".to_owned(),
            }
            .is_configuration()
        );
    }
}
