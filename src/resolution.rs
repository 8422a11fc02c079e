//! Output filename resolution.
//!
//! Given a target, the user's selection, and a package's metadata, this
//! module computes exactly which files cargo leaves in
//! `<target-dir>/<target>/release/` and therefore which files go into the
//! archive.
//!
//! Policy:
//!
//! - Requested binaries must all exist in the package; otherwise every
//!   binary target is selected.
//! - Windows targets get an `.exe` suffix, applied once.
//! - The library artefact is added when requested, or when no binary was
//!   selected at all, so a library-only package still ships something.
//! - The result is never empty and never contains duplicates.

use crate::error::{ReleaseError, Result};
use crate::metadata::PackageMetadata;
use crate::platform::{OsFamily, TargetTriple};
use std::fmt;

/// Suffix cargo gives executables on Windows targets.
const EXE_SUFFIX: &str = ".exe";

/// What the user asked to ship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSelection {
    /// Binary names to ship; empty means all binaries.
    pub bins: Vec<String>,
    /// Whether the library artefact must be included.
    pub lib: bool,
}

impl OutputSelection {
    /// Select the given binaries and library flag.
    #[must_use]
    pub const fn new(bins: Vec<String>, lib: bool) -> Self {
        Self { bins, lib }
    }
}

/// Library artefact kinds with a known on-disk name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    /// `staticlib`: a native static archive.
    StaticLib,
    /// `cdylib`: a native shared library.
    CDylib,
    /// `rlib` or `lib`: a Rust library.
    RLib,
}

impl LibraryKind {
    /// File name cargo produces for a library called `name` on `family`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_release_action::platform::OsFamily;
    /// use rust_release_action::resolution::LibraryKind;
    ///
    /// assert_eq!(LibraryKind::CDylib.file_name("foo", &OsFamily::MacOs), "libfoo.dylib");
    /// assert_eq!(LibraryKind::StaticLib.file_name("foo", &OsFamily::Windows), "foo.lib");
    /// ```
    #[must_use]
    pub fn file_name(self, name: &str, family: &OsFamily) -> String {
        match (self, family) {
            (Self::StaticLib, OsFamily::Windows) => format!("{name}.lib"),
            (Self::StaticLib, _) => format!("lib{name}.a"),
            (Self::CDylib, OsFamily::Windows) => format!("{name}.dll"),
            (Self::CDylib, OsFamily::MacOs) => format!("lib{name}.dylib"),
            (Self::CDylib, _) => format!("lib{name}.so"),
            (Self::RLib, _) => format!("{name}.rlib"),
        }
    }
}

impl TryFrom<&str> for LibraryKind {
    type Error = ReleaseError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "staticlib" => Ok(Self::StaticLib),
            "cdylib" => Ok(Self::CDylib),
            "rlib" | "lib" => Ok(Self::RLib),
            other => Err(ReleaseError::UnknownLibraryType {
                crate_type: other.to_owned(),
            }),
        }
    }
}

/// Whether a crate type produces a dynamically linked library.
#[must_use]
pub fn is_dynamic_crate_type(crate_type: &str) -> bool {
    matches!(crate_type, "cdylib" | "dylib")
}

/// The files one (package, target) build must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    files: Vec<String>,
    primary: String,
}

impl ResolvedOutputs {
    /// Output file names in resolution order.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Base name used for the archive: the first binary without `.exe`, or
    /// the library target name.
    #[must_use]
    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    /// Consume the set and return the file names.
    #[must_use]
    pub fn into_files(self) -> Vec<String> {
        self.files
    }
}

impl fmt::Display for ResolvedOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.files.join(", "))
    }
}

/// Resolve the output file names for `package` built for `target`.
///
/// # Errors
///
/// Returns a configuration error when a requested binary does not exist,
/// when a library is needed but missing or of an unknown crate type, or when
/// nothing resolves.
///
/// # Examples
///
/// ```
/// use rust_release_action::metadata::ProjectMetadata;
/// use rust_release_action::platform::TargetTriple;
/// use rust_release_action::resolution::{OutputSelection, resolve_outputs};
///
/// let metadata = ProjectMetadata::from_json(r#"{"packages": [{"name": "demo",
///     "targets": [{"name": "demo", "kind": ["bin"], "crate_types": ["bin"]}]}]}"#)?;
/// let package = metadata.select_package(None)?;
/// let target = TargetTriple::parse("x86_64-pc-windows-msvc")?;
///
/// let outputs = resolve_outputs(&target, &OutputSelection::default(), package)?;
/// assert_eq!(outputs.files(), ["demo.exe"]);
/// # Ok::<(), rust_release_action::error::ReleaseError>(())
/// ```
pub fn resolve_outputs(
    target: &TargetTriple,
    selection: &OutputSelection,
    package: &PackageMetadata,
) -> Result<ResolvedOutputs> {
    let family = target.os_family();
    let bins = select_binaries(selection, package)?;

    let mut files = Vec::new();
    for bin in &bins {
        push_unique(&mut files, executable_name(bin, &family));
    }

    let mut primary = bins.first().cloned();

    if selection.lib || bins.is_empty() {
        let lib = package
            .library_target()
            .ok_or_else(|| ReleaseError::LibraryTargetMissing {
                package: package.name.clone(),
            })?;
        let crate_type = lib.primary_crate_type().unwrap_or("lib");
        let kind = LibraryKind::try_from(crate_type)?;
        push_unique(&mut files, kind.file_name(&lib.name, &family));
        primary.get_or_insert_with(|| lib.name.clone());
    }

    match primary {
        Some(primary) if !files.is_empty() => Ok(ResolvedOutputs { files, primary }),
        _ => Err(ReleaseError::EmptyOutputSet {
            package: package.name.clone(),
            target: target.to_string(),
        }),
    }
}

/// Validate the requested binaries, or fall back to every binary target.
fn select_binaries(selection: &OutputSelection, package: &PackageMetadata) -> Result<Vec<String>> {
    let available = package.binary_names();
    if selection.bins.is_empty() {
        return Ok(available);
    }

    let mut selected = Vec::new();
    let mut unknown = Vec::new();
    for requested in &selection.bins {
        let name = normalise_requested(requested, &available);
        if available.iter().any(|bin| bin == name) {
            push_unique(&mut selected, name.to_owned());
        } else {
            unknown.push(requested.clone());
        }
    }

    if unknown.is_empty() {
        Ok(selected)
    } else {
        Err(ReleaseError::UnknownBinaries {
            package: package.name.clone(),
            requested: unknown,
            available,
        })
    }
}

/// Strip a trailing `.exe` when the bare name is a real binary target.
fn normalise_requested<'a>(requested: &'a str, available: &[String]) -> &'a str {
    requested
        .strip_suffix(EXE_SUFFIX)
        .filter(|bare| available.iter().any(|bin| bin == bare))
        .unwrap_or(requested)
}

fn executable_name(bin: &str, family: &OsFamily) -> String {
    if *family == OsFamily::Windows && !bin.ends_with(EXE_SUFFIX) {
        format!("{bin}{EXE_SUFFIX}")
    } else {
        bin.to_owned()
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
#[path = "resolution_tests.rs"]
mod tests;
