//! Toolchain provisioning for cross builds.
//!
//! Everything here is idempotent within one run: a [`Provisioner`] remembers
//! which targets, tools, and SDKs it has already set up and never repeats the
//! install commands.

use crate::deps::{
    CommandExecutor, CommandLine, PackageManager, apt_install, install_cargo_tool, run_checked,
};
use crate::error::{ReleaseError, Result};
use crate::platform::{System, TargetTriple};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::collections::HashSet;

/// Cross-compiling cargo wrapper installed on demand.
pub const ZIGBUILD_TOOL: &str = "cargo-zigbuild";

/// macOS SDK version downloaded for Linux-hosted darwin builds.
pub const MACOS_SDK_VERSION: &str = "13.3";

const MACOS_SDK_BASE_URL: &str = "https://github.com/roblabla/MacOSX-SDKs/releases/download";

/// Installs rustup targets, cargo tools, and system packages once per run.
pub struct Provisioner<'a> {
    executor: &'a dyn CommandExecutor,
    host: System,
    sdk_cache_dir: Utf8PathBuf,
    installed_targets: HashSet<String>,
    zigbuild_ready: bool,
    musl_tools_ready: bool,
    sdk_root: Option<Utf8PathBuf>,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner for the current host, caching SDKs in
    /// `sdk_cache_dir`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, sdk_cache_dir: &Utf8Path) -> Self {
        Self {
            executor,
            host: System::host(),
            sdk_cache_dir: sdk_cache_dir.to_owned(),
            installed_targets: HashSet::new(),
            zigbuild_ready: false,
            musl_tools_ready: false,
            sdk_root: None,
        }
    }

    /// Pretend to run on `host` instead of the current machine.
    #[must_use]
    pub fn with_host(mut self, host: System) -> Self {
        self.host = host;
        self
    }

    /// Run `rustup target add <target>` unless already done this run.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::DependencyInstall`] if rustup fails.
    pub fn ensure_target(&mut self, target: &TargetTriple) -> Result<()> {
        if self.installed_targets.contains(target.as_str()) {
            return Ok(());
        }

        let command = CommandLine::new("rustup").args(["target", "add", target.as_str()]);
        run_checked(self.executor, &command).map_err(|err| ReleaseError::DependencyInstall {
            tool: format!("rust target {target}"),
            message: err.to_string(),
        })?;
        self.installed_targets.insert(target.as_str().to_owned());
        Ok(())
    }

    /// Install `cargo-zigbuild` once.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::DependencyInstall`] if installation fails.
    pub fn ensure_zigbuild(&mut self) -> Result<()> {
        if self.zigbuild_ready {
            return Ok(());
        }
        install_cargo_tool(self.executor, ZIGBUILD_TOOL)?;
        self.zigbuild_ready = true;
        Ok(())
    }

    /// Install `musl-tools` through apt for musl targets on Linux hosts.
    ///
    /// A no-op on other hosts or when apt is unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::DependencyInstall`] if apt fails.
    pub fn ensure_musl_tools(&mut self, target: &TargetTriple) -> Result<()> {
        if self.musl_tools_ready || !target.is_musl() || !self.host.is_linux() {
            return Ok(());
        }

        if PackageManager::detect(self.executor) != PackageManager::Apt {
            debug!("apt not available, skip musl-tools");
            return Ok(());
        }
        apt_install(self.executor, &["musl-tools"])?;
        self.musl_tools_ready = true;
        Ok(())
    }

    /// Make a macOS SDK available for darwin targets built on Linux.
    ///
    /// Returns the directory to export as `SDKROOT`, or `None` when the host
    /// needs no SDK for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::DependencyInstall`] if the download or
    /// extraction fails.
    pub fn ensure_macos_sdk(&mut self, target: &TargetTriple) -> Result<Option<Utf8PathBuf>> {
        if !target.is_darwin() || !self.host.is_linux() {
            return Ok(None);
        }
        if let Some(root) = &self.sdk_root {
            return Ok(Some(root.clone()));
        }

        let sdk_name = format!("MacOSX{MACOS_SDK_VERSION}.sdk");
        let sdk_root = self.sdk_cache_dir.join(&sdk_name);
        if sdk_root.is_dir() {
            debug!("reusing macOS SDK at {sdk_root}");
        } else {
            self.download_macos_sdk(&sdk_name)?;
        }

        self.sdk_root = Some(sdk_root.clone());
        Ok(Some(sdk_root))
    }

    fn download_macos_sdk(&self, sdk_name: &str) -> Result<()> {
        let archive = self.sdk_cache_dir.join(format!("{sdk_name}.tar.xz"));
        let url = format!("{MACOS_SDK_BASE_URL}/{MACOS_SDK_VERSION}/{sdk_name}.tar.xz");
        info!("downloading macOS SDK {MACOS_SDK_VERSION}");

        let download = CommandLine::new("curl").args(["-fsSL", "-o", archive.as_str(), &url]);
        let extract = CommandLine::new("tar").args([
            "xJf",
            archive.as_str(),
            "-C",
            self.sdk_cache_dir.as_str(),
        ]);

        run_checked(self.executor, &download)
            .and_then(|_| run_checked(self.executor, &extract))
            .map(drop)
            .map_err(|err| ReleaseError::DependencyInstall {
                tool: "macOS SDK".to_owned(),
                message: err.to_string(),
            })
    }
}
