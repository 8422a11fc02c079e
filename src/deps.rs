//! External command execution and system dependency installation.
//!
//! Every subprocess the action launches goes through [`CommandExecutor`], so
//! tests can replace the host with a stub. The rest of the module installs
//! cargo subcommands and system packages the builds need.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use log::{debug, info};
use std::fmt;
use std::process::{Command, Output};

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandLine {
    /// Start a command line for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process only.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Environment overrides in insertion order.
    #[must_use]
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Value of an environment override, if set.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Renders the program and arguments; environment values are omitted so
/// tokens never reach the log.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_release_action::deps::{CommandExecutor, CommandLine, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run(&CommandLine::new("cargo").arg("--version"))?;
    /// assert!(output.status.success());
    /// # Ok::<(), rust_release_action::error::ReleaseError>(())
    /// ```
    fn run(&self, command: &CommandLine) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, command: &CommandLine) -> Result<Output> {
        Command::new(command.program())
            .args(command.arguments())
            .envs(command.envs().iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(ReleaseError::from)
    }
}

/// Logs and runs `command`, failing when it exits unsuccessfully.
///
/// # Errors
///
/// Returns [`ReleaseError::ExternalTool`] carrying the trimmed stderr when the
/// command cannot be spawned or exits non-zero.
pub fn run_checked(executor: &dyn CommandExecutor, command: &CommandLine) -> Result<Output> {
    info!("run: `{command}`");
    let output = executor
        .run(command)
        .map_err(|err| ReleaseError::ExternalTool {
            command: command.to_string(),
            reason: err.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReleaseError::ExternalTool {
            command: command.to_string(),
            reason: format!("exit status {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(output)
}

/// Returns true if the given command executes successfully.
#[must_use]
pub fn command_succeeds(executor: &dyn CommandExecutor, command: &CommandLine) -> bool {
    executor.run(command).is_ok_and(|o| o.status.success())
}

/// Checks if `cargo binstall` is available.
fn is_binstall_available(executor: &dyn CommandExecutor) -> bool {
    command_succeeds(
        executor,
        &CommandLine::new("cargo").args(["binstall", "--version"]),
    )
}

/// Installs a cargo subcommand, preferring prebuilt binaries.
///
/// Uses `cargo binstall` if available, otherwise falls back to
/// `cargo install`.
///
/// # Errors
///
/// Returns [`ReleaseError::DependencyInstall`] if installation fails.
pub fn install_cargo_tool(executor: &dyn CommandExecutor, name: &str) -> Result<()> {
    let command = if is_binstall_available(executor) {
        CommandLine::new("cargo").args(["binstall", "-y", "--no-symlinks", name])
    } else {
        CommandLine::new("cargo").args(["install", name])
    };

    run_checked(executor, &command)
        .map(drop)
        .map_err(|err| install_error(name, &err))
}

/// System package managers the action knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Debian/Ubuntu `apt`, run through `sudo`.
    Apt,
    /// Homebrew.
    Brew,
    /// Chocolatey.
    Choco,
}

impl PackageManager {
    /// Detect the first available package manager: apt, then brew, then choco.
    #[must_use]
    pub fn detect(executor: &dyn CommandExecutor) -> Self {
        if command_succeeds(executor, &CommandLine::new("apt").arg("--version")) {
            Self::Apt
        } else if command_succeeds(executor, &CommandLine::new("brew").arg("--version")) {
            Self::Brew
        } else {
            Self::Choco
        }
    }

    /// Build the install command for `packages`.
    #[must_use]
    pub fn install_command(self, packages: &[&str]) -> CommandLine {
        match self {
            Self::Apt => CommandLine::new("sudo")
                .args(["apt", "install", "-y", "-q"])
                .args(packages.iter().copied()),
            Self::Brew => CommandLine::new("brew")
                .arg("install")
                .args(packages.iter().copied()),
            Self::Choco => CommandLine::new("choco")
                .args(["install", "-y"])
                .args(packages.iter().copied()),
        }
    }
}

/// Installs system packages with `apt`.
///
/// # Errors
///
/// Returns [`ReleaseError::DependencyInstall`] if `apt` is missing or fails.
pub fn apt_install(executor: &dyn CommandExecutor, packages: &[&str]) -> Result<()> {
    let command = PackageManager::Apt.install_command(packages);
    run_checked(executor, &command)
        .map(drop)
        .map_err(|err| install_error(&packages.join(" "), &err))
}

/// Whether the workspace at `root` depends on OpenSSL.
///
/// Looks at `Cargo.lock` and every `Cargo.toml` below `root`, skipping
/// `target` and hidden directories.
///
/// # Errors
///
/// Returns [`ReleaseError::Io`] if a manifest cannot be read.
pub fn workspace_uses_openssl(root: &Utf8Path) -> Result<bool> {
    let lock = root.join("Cargo.lock");
    if lock.is_file() && std::fs::read_to_string(&lock)?.contains("openssl") {
        return Ok(true);
    }
    manifests_mention(root, "openssl")
}

fn manifests_mention(dir: &Utf8Path, needle: &str) -> Result<bool> {
    for item in dir.read_dir_utf8()? {
        let entry = item?;
        let path = entry.path();
        let name = entry.file_name();

        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            if name == "target" || name.starts_with('.') {
                continue;
            }
            if manifests_mention(path, needle)? {
                return Ok(true);
            }
        } else if name == "Cargo.toml" && std::fs::read_to_string(path)?.contains(needle) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Installs OpenSSL development headers when the workspace needs them.
///
/// # Errors
///
/// Returns [`ReleaseError::DependencyInstall`] if the package manager fails,
/// or [`ReleaseError::Io`] if the workspace manifests cannot be read.
pub fn ensure_openssl(executor: &dyn CommandExecutor, root: &Utf8Path) -> Result<()> {
    if !workspace_uses_openssl(root)? {
        debug!("workspace does not use openssl");
        return Ok(());
    }

    let manager = PackageManager::detect(executor);
    let packages: &[&str] = match manager {
        PackageManager::Apt => &["pkg-config", "libssl-dev"],
        PackageManager::Brew | PackageManager::Choco => &["openssl"],
    };
    info!("workspace uses openssl, installing {}", packages.join(" "));

    run_checked(executor, &manager.install_command(packages))
        .map(drop)
        .map_err(|err| install_error("openssl", &err))
}

fn install_error(tool: &str, err: &ReleaseError) -> ReleaseError {
    ReleaseError::DependencyInstall {
        tool: tool.to_owned(),
        message: err.to_string(),
    }
}

#[cfg(test)]
#[path = "deps_tests.rs"]
mod tests;
