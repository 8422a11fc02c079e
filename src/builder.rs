//! Cargo build orchestration for one target.
//!
//! [`Builder::build_and_pack`] resolves the files a target must produce,
//! provisions the toolchain, runs cargo (or `cargo zigbuild`), and packs the
//! outputs plus any extra files into a single archive.

use crate::artefact::naming::ArchiveName;
use crate::artefact::packaging::{ArchiveJob, create_archive};
use crate::config::Config;
use crate::deps::{CommandExecutor, CommandLine, run_checked};
use crate::error::{ReleaseError, Result};
use crate::metadata::{MetadataQuery, PackageMetadata};
use crate::platform::{OsFamily, System, TargetTriple};
use crate::resolution::{ResolvedOutputs, is_dynamic_crate_type, resolve_outputs};
use crate::toolchain::Provisioner;
use camino::Utf8PathBuf;
use log::{debug, info};

/// Flag that keeps musl from linking the C runtime statically into a shared
/// library.
pub const DISABLE_CRT_STATIC: &str = "-C target-feature=-crt-static";

/// How cargo is invoked for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Plain `cargo build`.
    Native,
    /// `cargo zigbuild`, linking through zig.
    Zigbuild,
}

impl BuildStrategy {
    /// Pick the strategy for building `target` on `host` (with CPU `host_arch`).
    ///
    /// Windows and macOS hosts always build natively; zigbuild is broken
    /// there. Linux hosts build natively only for their own arch with glibc.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_release_action::builder::BuildStrategy;
    /// use rust_release_action::platform::{System, TargetTriple};
    ///
    /// let host = System::classify(Some("x86_64-unknown-linux-gnu"));
    /// let target = TargetTriple::parse("aarch64-unknown-linux-musl").expect("valid");
    /// assert_eq!(BuildStrategy::select(&host, "x86_64", &target), BuildStrategy::Zigbuild);
    /// ```
    #[must_use]
    pub fn select(host: &System, host_arch: &str, target: &TargetTriple) -> Self {
        if host.is_windows() || host.is_macos() {
            return Self::Native;
        }

        let same_platform = target.arch() == host_arch
            && target.os_family() == OsFamily::Linux
            && target.abi().is_some_and(|abi| abi.starts_with("gnu"));
        if same_platform {
            Self::Native
        } else {
            Self::Zigbuild
        }
    }

    /// Cargo subcommand for this strategy.
    #[must_use]
    pub const fn subcommand(self) -> &'static str {
        match self {
            Self::Native => "build",
            Self::Zigbuild => "zigbuild",
        }
    }
}

/// Compute `RUSTFLAGS` for `target`, starting from `base`.
///
/// Returns `None` when nothing needs to be set.
#[must_use]
pub fn target_rustflags(
    base: Option<&str>,
    target: &TargetTriple,
    package: &PackageMetadata,
) -> Option<String> {
    let base_flags = base.map(str::trim).filter(|flags| !flags.is_empty());
    let dynamic_lib = package
        .library_target()
        .and_then(|lib| lib.primary_crate_type())
        .is_some_and(is_dynamic_crate_type);

    match (base_flags, dynamic_lib && target.is_musl()) {
        (Some(flags), true) => Some(format!("{flags} {DISABLE_CRT_STATIC}")),
        (None, true) => Some(DISABLE_CRT_STATIC.to_owned()),
        (Some(flags), false) => Some(flags.to_owned()),
        (None, false) => None,
    }
}

/// Builds and packs targets one at a time.
pub struct Builder<'a> {
    executor: &'a dyn CommandExecutor,
    metadata: &'a MetadataQuery<'a>,
    config: &'a Config,
    provisioner: Option<Provisioner<'a>>,
    host: System,
    host_arch: String,
}

impl<'a> Builder<'a> {
    /// Create a builder. Pass `None` for `provisioner` to skip toolchain setup.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        metadata: &'a MetadataQuery<'a>,
        config: &'a Config,
        provisioner: Option<Provisioner<'a>>,
    ) -> Self {
        Self {
            executor,
            metadata,
            config,
            provisioner,
            host: System::host(),
            host_arch: std::env::consts::ARCH.to_owned(),
        }
    }

    /// Pretend to run on `host` with CPU `arch`.
    #[must_use]
    pub fn with_host(mut self, host: System, arch: &str) -> Self {
        self.host = host;
        self.host_arch = arch.to_owned();
        self
    }

    /// Build `target` and pack its outputs, returning the archive path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the outputs cannot be resolved,
    /// [`ReleaseError::DependencyInstall`] if provisioning fails,
    /// [`ReleaseError::BuildFailed`] if cargo fails, and
    /// [`ReleaseError::Packaging`] if the archive cannot be written.
    pub fn build_and_pack(&mut self, target: &TargetTriple) -> Result<Utf8PathBuf> {
        let metadata = self.metadata;
        let package = metadata.select_package(self.config.package.as_deref())?;
        let outputs = resolve_outputs(target, &self.config.selection, package)?;
        debug!("target {target} resolves to {outputs}");

        let strategy = BuildStrategy::select(&self.host, &self.host_arch, target);
        let sdk_root = self.provision(target, strategy)?;

        let mut command = self.build_command(target, strategy, package);
        if let Some(flags) = target_rustflags(self.config.rustflags.as_deref(), target, package) {
            command = command.env("RUSTFLAGS", flags);
        }
        if let Some(root) = sdk_root {
            command = command.env("SDKROOT", root.as_str());
        }

        run_checked(self.executor, &command).map_err(|err| ReleaseError::BuildFailed {
            target: target.to_string(),
            reason: err.to_string(),
        })?;
        info!("target {target} build success");

        self.pack(target, &outputs)
    }

    fn provision(
        &mut self,
        target: &TargetTriple,
        strategy: BuildStrategy,
    ) -> Result<Option<Utf8PathBuf>> {
        let Some(provisioner) = self.provisioner.as_mut() else {
            return Ok(None);
        };

        provisioner.ensure_target(target)?;
        if strategy == BuildStrategy::Zigbuild {
            provisioner.ensure_zigbuild()?;
        }
        provisioner.ensure_musl_tools(target)?;
        provisioner.ensure_macos_sdk(target)
    }

    fn build_command(
        &self,
        target: &TargetTriple,
        strategy: BuildStrategy,
        package: &PackageMetadata,
    ) -> CommandLine {
        let selection = &self.config.selection;
        let mut command = CommandLine::new("cargo").args([
            strategy.subcommand(),
            "--release",
            "--target",
            target.as_str(),
        ]);

        for bin in &selection.bins {
            let bare = bin.strip_suffix(".exe").unwrap_or(bin);
            command = command.args(["--bin", bare]);
        }
        if selection.lib {
            if selection.bins.is_empty() && package.binary_targets().next().is_some() {
                command = command.arg("--bins");
            }
            command = command.arg("--lib");
        }
        if let Some(name) = &self.config.package {
            command = command.args(["--package", name.as_str()]);
        }
        if !self.config.features.is_empty() {
            command = command.args(["--features".to_owned(), self.config.features.join(",")]);
        }

        command.args(["--target-dir", self.config.target_dir.as_str()])
    }

    fn pack(&self, target: &TargetTriple, outputs: &ResolvedOutputs) -> Result<Utf8PathBuf> {
        let name = ArchiveName::new(outputs.primary_name(), target);
        let job = ArchiveJob::from_name(&name)
            .with_sources(self.config.files_to_pack.iter().cloned())
            .with_sources(
                outputs
                    .files()
                    .iter()
                    .map(|file| self.config.release_output(target, file)),
            );

        let archive = create_archive(&job, &self.config.output_dir)?;
        info!("files packed into {archive}");
        Ok(archive)
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
