//! CLI argument definitions for the release action.
//!
//! Every option can also be supplied through the environment, using the
//! `INPUT_*` names a GitHub Actions runner exports for action inputs. List
//! inputs accept commas and newlines interchangeably. Boolean inputs are off
//! when empty or spelled `0`, `false`, `no`, `off`, `n`, or `f`, and on for
//! any other value.

use crate::config::{Config, DEFAULT_TARGET_DIR, system_temp_dir};
use crate::error::{ReleaseError, Result};
use crate::platform::TargetTriple;
use crate::resolution::OutputSelection;
use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::FalseyValueParser;

/// Directory under the system temp dir that receives archives by default.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "rust-release-action";

/// Build Rust targets, pack the outputs, and upload them to a GitHub release.
#[derive(Parser, Debug, Clone)]
#[command(name = "rust-release-action")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build two targets and upload to the release for v1.0.0:\n",
    "    $ rust-release-action --targets x86_64-unknown-linux-musl,aarch64-apple-darwin \\\n",
    "        --ref-name v1.0.0\n\n",
    "  Build a library-only package without uploading:\n",
    "    $ rust-release-action --targets x86_64-unknown-linux-gnu --lib --skip-upload\n",
))]
pub struct Cli {
    /// Target triples to build, separated by commas or newlines.
    #[arg(long, env = "INPUT_TARGETS", value_name = "TRIPLES")]
    pub targets: Option<String>,

    /// Binaries to build and pack; all binaries when omitted.
    #[arg(long, env = "INPUT_BINS", value_name = "NAMES")]
    pub bins: Option<String>,

    /// Single binary to build (older spelling of `--bins`).
    #[arg(long, env = "INPUT_BIN", value_name = "NAME", hide = true)]
    pub bin: Option<String>,

    /// Always pack the library artefact.
    #[arg(long, env = "INPUT_LIB", value_parser = FalseyValueParser::new())]
    pub lib: bool,

    /// Cargo features to enable, separated by commas or newlines.
    #[arg(long, env = "INPUT_FEATURES", value_name = "FEATURES")]
    pub features: Option<String>,

    /// Package to build [default: first workspace package].
    #[arg(long, env = "INPUT_PACKAGE", value_name = "NAME")]
    pub package: Option<String>,

    /// Extra files or directories to add to every archive.
    #[arg(long, env = "INPUT_FILES_TO_PACK", value_name = "PATHS")]
    pub files_to_pack: Option<String>,

    /// Options for `gh release create`, used when the release does not exist.
    #[arg(long, env = "INPUT_RELEASE_OPTIONS", value_name = "OPTIONS")]
    pub release_options: Option<String>,

    /// Tag or branch of the release to upload to.
    #[arg(long, env = "GITHUB_REF_NAME", value_name = "REF")]
    pub ref_name: Option<String>,

    /// Token for the GitHub CLI.
    #[arg(long, env = "INPUT_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Cargo target directory [default: target].
    #[arg(long, env = "CARGO_TARGET_DIR", value_name = "DIR")]
    pub target_dir: Option<Utf8PathBuf>,

    /// Directory the archives are written to [default: system temp dir].
    #[arg(long, env = "INPUT_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Workspace to scan for OpenSSL usage.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workspace_root: Utf8PathBuf,

    /// Base RUSTFLAGS for every build.
    #[arg(long, env = "RUSTFLAGS", value_name = "FLAGS", allow_hyphen_values = true)]
    pub rustflags: Option<String>,

    /// Skip toolchain and system package installation.
    #[arg(long, env = "INPUT_SKIP_DEPS", value_parser = FalseyValueParser::new())]
    pub skip_deps: bool,

    /// Build and pack without uploading.
    #[arg(long, env = "INPUT_SKIP_UPLOAD", value_parser = FalseyValueParser::new())]
    pub skip_upload: bool,

    /// Enable debug logging.
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

impl Cli {
    /// Validate the arguments and resolve defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::NoTargets`] when no target was given,
    /// [`ReleaseError::InvalidTarget`] for a malformed triple, and
    /// [`ReleaseError::MissingInput`] when uploading without a ref name.
    pub fn into_config(self) -> Result<Config> {
        let targets = split_list(self.targets.as_deref())
            .iter()
            .map(|raw| TargetTriple::parse(raw))
            .collect::<Result<Vec<_>>>()?;
        if targets.is_empty() {
            return Err(ReleaseError::NoTargets);
        }

        let ref_name = self.ref_name.filter(|name| !name.trim().is_empty());
        if ref_name.is_none() && !self.skip_upload {
            return Err(ReleaseError::MissingInput {
                name: "GITHUB_REF_NAME",
            });
        }

        let mut bins = split_list(self.bins.as_deref());
        bins.extend(split_list(self.bin.as_deref()));

        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => system_temp_dir()?.join(DEFAULT_OUTPUT_SUBDIR),
        };

        Ok(Config {
            targets,
            selection: OutputSelection::new(bins, self.lib),
            features: split_list(self.features.as_deref()),
            package: self.package.filter(|name| !name.trim().is_empty()),
            files_to_pack: split_list(self.files_to_pack.as_deref())
                .into_iter()
                .map(Utf8PathBuf::from)
                .collect(),
            release_options: self
                .release_options
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
            ref_name,
            token: self.token.filter(|token| !token.is_empty()),
            target_dir: self
                .target_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_TARGET_DIR)),
            output_dir,
            workspace_root: self.workspace_root,
            rustflags: self.rustflags,
            skip_deps: self.skip_deps,
            skip_upload: self.skip_upload,
            debug: self.debug,
        })
    }
}

/// Split a comma- or newline-separated input into trimmed, non-empty items.
///
/// # Examples
///
/// ```
/// use rust_release_action::cli::split_list;
///
/// assert_eq!(split_list(Some("a, b\nc,,")), ["a", "b", "c"]);
/// assert!(split_list(None).is_empty());
/// ```
#[must_use]
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split([',', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
