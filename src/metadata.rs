//! Cargo workspace metadata, queried once per run.
//!
//! `cargo metadata --format-version 1 --no-deps` is a slow subprocess, and
//! every target in a run must see the same package layout, so
//! [`MetadataQuery`] fills a [`OnceCell`] on first access and serves every
//! later call from it.

use crate::deps::{CommandExecutor, CommandLine, run_checked};
use crate::error::{ReleaseError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use once_cell::unsync::OnceCell;
use serde::Deserialize;

/// Target kinds that denote a library artefact.
const LIBRARY_KINDS: &[&str] = &["lib", "rlib", "cdylib", "staticlib", "dylib"];

/// The subset of `cargo metadata` output the action relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectMetadata {
    /// Workspace packages in the order cargo reports them.
    pub packages: Vec<PackageMetadata>,
}

/// One package from the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageMetadata {
    /// Package name.
    pub name: String,
    /// Build targets declared by the package.
    #[serde(default)]
    pub targets: Vec<TargetMetadata>,
}

/// One build target of a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetMetadata {
    /// Target name (binary or library name).
    pub name: String,
    /// Target kinds, e.g. `bin`, `lib`, `cdylib`.
    #[serde(default)]
    pub kind: Vec<String>,
    /// Crate types; the first entry decides the library artefact.
    #[serde(default)]
    pub crate_types: Vec<String>,
}

impl TargetMetadata {
    /// Whether the target is a binary (`kind == ["bin"]`).
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self.kind.as_slice(), [kind] if kind == "bin")
    }

    /// Whether any of the target's kinds is library-like.
    #[must_use]
    pub fn is_library(&self) -> bool {
        self.kind
            .iter()
            .any(|kind| LIBRARY_KINDS.contains(&kind.as_str()))
    }

    /// The authoritative crate type, if cargo reported any.
    #[must_use]
    pub fn primary_crate_type(&self) -> Option<&str> {
        self.crate_types.first().map(String::as_str)
    }
}

impl PackageMetadata {
    /// The first library-like target.
    #[must_use]
    pub fn library_target(&self) -> Option<&TargetMetadata> {
        self.targets.iter().find(|target| target.is_library())
    }

    /// Binary targets in the order cargo reports them.
    pub fn binary_targets(&self) -> impl Iterator<Item = &TargetMetadata> {
        self.targets.iter().filter(|target| target.is_binary())
    }

    /// Names of the binary targets.
    #[must_use]
    pub fn binary_names(&self) -> Vec<String> {
        self.binary_targets()
            .map(|target| target.name.clone())
            .collect()
    }
}

impl ProjectMetadata {
    /// Parse the JSON printed by `cargo metadata --format-version 1`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MetadataParse`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Select a package by name, or the first package when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::PackageNotFound`] if nothing matches.
    pub fn select_package(&self, name: Option<&str>) -> Result<&PackageMetadata> {
        self.packages
            .iter()
            .find(|package| name.is_none_or(|wanted| package.name == wanted))
            .ok_or_else(|| ReleaseError::PackageNotFound {
                name: name.map(str::to_owned),
            })
    }
}

/// Memoised access to the workspace metadata.
pub struct MetadataQuery<'a> {
    executor: &'a dyn CommandExecutor,
    manifest_path: Option<Utf8PathBuf>,
    cache: OnceCell<ProjectMetadata>,
}

impl<'a> MetadataQuery<'a> {
    /// Create a query for the workspace in the current directory.
    #[must_use]
    pub const fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self {
            executor,
            manifest_path: None,
            cache: OnceCell::new(),
        }
    }

    /// Query the workspace owning `manifest_path` instead.
    #[must_use]
    pub fn with_manifest_path(mut self, manifest_path: &Utf8Path) -> Self {
        self.manifest_path = Some(manifest_path.to_owned());
        self
    }

    /// Return the workspace metadata, running `cargo metadata` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ExternalTool`] if cargo fails or
    /// [`ReleaseError::MetadataParse`] if its output is not valid metadata.
    /// A failed query is not cached.
    pub fn project_metadata(&self) -> Result<&ProjectMetadata> {
        self.cache.get_or_try_init(|| self.fetch())
    }

    /// Select a package from the cached metadata.
    ///
    /// # Errors
    ///
    /// Propagates query failures and [`ReleaseError::PackageNotFound`].
    pub fn select_package(&self, name: Option<&str>) -> Result<&PackageMetadata> {
        self.project_metadata()?.select_package(name)
    }

    fn fetch(&self) -> Result<ProjectMetadata> {
        let mut command =
            CommandLine::new("cargo").args(["metadata", "--format-version", "1", "--no-deps"]);
        if let Some(path) = &self.manifest_path {
            command = command.args(["--manifest-path", path.as_str()]);
        }

        let output = run_checked(self.executor, &command)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = ProjectMetadata::from_json(stdout.trim())?;
        debug!(
            "cargo metadata reported {} package(s)",
            metadata.packages.len()
        );
        Ok(metadata)
    }
}
