//! Resolved run configuration.
//!
//! [`Config`] is built once from the command line and the `INPUT_*`
//! environment (see [`crate::cli::Cli::into_config`]) and never changes
//! afterwards. Every other module reads its settings from here instead of
//! consulting the environment directly.

use crate::error::{ReleaseError, Result};
use crate::platform::TargetTriple;
use crate::resolution::OutputSelection;
use camino::{Utf8Path, Utf8PathBuf};

/// Default cargo target directory.
pub const DEFAULT_TARGET_DIR: &str = "target";

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Targets to build, in the order given.
    pub targets: Vec<TargetTriple>,
    /// Binaries and library the user asked to ship.
    pub selection: OutputSelection,
    /// Cargo features passed to every build.
    pub features: Vec<String>,
    /// Package to build; the first workspace package when `None`.
    pub package: Option<String>,
    /// Extra paths added to every archive.
    pub files_to_pack: Vec<Utf8PathBuf>,
    /// Arguments passed to `gh release create` when the release is missing.
    pub release_options: Vec<String>,
    /// Tag or branch the release belongs to.
    pub ref_name: Option<String>,
    /// Token exported as `GITHUB_TOKEN` for the release CLI.
    pub token: Option<String>,
    /// Cargo target directory the build outputs land in.
    pub target_dir: Utf8PathBuf,
    /// Directory the archives are written to.
    pub output_dir: Utf8PathBuf,
    /// Workspace whose manifests are scanned for OpenSSL usage.
    pub workspace_root: Utf8PathBuf,
    /// Base `RUSTFLAGS` for every build.
    pub rustflags: Option<String>,
    /// Skip toolchain and system package provisioning.
    pub skip_deps: bool,
    /// Build and pack, but do not upload.
    pub skip_upload: bool,
    /// Verbose logging.
    pub debug: bool,
}

impl Config {
    /// Configuration for `targets` with every other setting at its default.
    ///
    /// Archives go to `output_dir`.
    #[must_use]
    pub fn new(targets: Vec<TargetTriple>, output_dir: &Utf8Path) -> Self {
        Self {
            targets,
            selection: OutputSelection::default(),
            features: Vec::new(),
            package: None,
            files_to_pack: Vec::new(),
            release_options: Vec::new(),
            ref_name: None,
            token: None,
            target_dir: Utf8PathBuf::from(DEFAULT_TARGET_DIR),
            output_dir: output_dir.to_owned(),
            workspace_root: Utf8PathBuf::from("."),
            rustflags: None,
            skip_deps: false,
            skip_upload: false,
            debug: false,
        }
    }

    /// Path cargo writes a release output to for `target`.
    #[must_use]
    pub fn release_output(&self, target: &TargetTriple, file: &str) -> Utf8PathBuf {
        self.target_dir
            .join(target.as_str())
            .join("release")
            .join(file)
    }
}

/// The system temp directory as a UTF-8 path.
///
/// # Errors
///
/// Returns [`ReleaseError::Io`] if the path is not valid UTF-8.
pub fn system_temp_dir() -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(std::env::temp_dir()).map_err(|err| ReleaseError::Io(err.into_io_error()))
}
