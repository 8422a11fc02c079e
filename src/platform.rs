//! Target triple parsing and OS family classification.
//!
//! A triple is split on `-` once, when it is parsed, and every later
//! decision (archive format, executable suffix, library naming, build
//! strategy) reads the structured fields instead of searching the raw string.
//! The OS component is the second-to-last field: `linux` in
//! `x86_64-unknown-linux-gnu`, `apple` in `aarch64-apple-darwin`.

use crate::error::{ReleaseError, Result};
use std::fmt;
use std::str::FromStr;

/// Canonical operating system family of a host or target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS, spelled `darwin`, `apple`, or `macos` in triples.
    MacOs,
    /// Linux, any libc.
    Linux,
    /// Anything else, kept verbatim (lower-cased) for equality checks.
    Other(String),
}

impl OsFamily {
    /// Map a lower-cased OS component onto its family.
    #[must_use]
    pub fn from_component(component: &str) -> Self {
        match component.to_ascii_lowercase().as_str() {
            "darwin" | "apple" | "macos" => Self::MacOs,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The family of the machine running this process.
    #[must_use]
    pub fn host() -> Self {
        Self::from_component(std::env::consts::OS)
    }

    /// Tag used in logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target triple split into its dash-separated fields.
///
/// # Examples
///
/// ```
/// use rust_release_action::platform::{OsFamily, TargetTriple};
///
/// let triple: TargetTriple = "x86_64-unknown-linux-musl".parse().expect("valid triple");
/// assert_eq!(triple.arch(), "x86_64");
/// assert_eq!(triple.os_family(), OsFamily::Linux);
/// assert!(triple.is_musl());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple {
    raw: String,
    arch: String,
    vendor: Option<String>,
    os: String,
    abi: Option<String>,
}

impl TargetTriple {
    /// Parse a triple.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidTarget`] when the input is blank or
    /// contains an empty field.
    pub fn parse(value: &str) -> Result<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(invalid(value, "triple is empty"));
        }

        let fields: Vec<&str> = raw.split('-').collect();
        if fields.iter().any(|field| field.is_empty()) {
            return Err(invalid(value, "triple contains an empty field"));
        }

        Ok(Self {
            raw: raw.to_owned(),
            arch: fields.first().copied().unwrap_or_default().to_owned(),
            vendor: (fields.len() >= 3)
                .then(|| fields.get(1).copied())
                .flatten()
                .map(str::to_owned),
            os: os_component(&fields).to_ascii_lowercase(),
            abi: (fields.len() >= 4)
                .then(|| fields.last().copied())
                .flatten()
                .map(str::to_owned),
        })
    }

    /// Return the triple exactly as supplied (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Architecture field, e.g. `aarch64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Vendor field when the triple has at least three fields.
    #[must_use]
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// Lower-cased OS component (second-to-last field).
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// ABI / environment field when the triple has four or more fields.
    #[must_use]
    pub fn abi(&self) -> Option<&str> {
        self.abi.as_deref()
    }

    /// Family of the OS component.
    #[must_use]
    pub fn os_family(&self) -> OsFamily {
        OsFamily::from_component(&self.os)
    }

    /// Whether the target links against musl libc.
    #[must_use]
    pub fn is_musl(&self) -> bool {
        self.abi.as_deref().is_some_and(|abi| abi.starts_with("musl"))
    }

    /// Whether the target belongs to the macOS family.
    #[must_use]
    pub fn is_darwin(&self) -> bool {
        self.os_family() == OsFamily::MacOs
    }
}

impl FromStr for TargetTriple {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for TargetTriple {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn os_component<'a>(fields: &[&'a str]) -> &'a str {
    match fields.len() {
        0 => "",
        1 => fields.first().copied().unwrap_or_default(),
        n => fields.get(n - 2).copied().unwrap_or_default(),
    }
}

fn invalid(value: &str, reason: &str) -> ReleaseError {
    ReleaseError::InvalidTarget {
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Immutable OS family classification of a host or target.
///
/// Two systems compare equal when their families match; every macOS spelling
/// collapses into [`OsFamily::MacOs`] so `x86_64-apple-darwin` equals a host
/// reporting `macos`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct System {
    family: OsFamily,
}

impl System {
    /// Classify a triple, or the current host when `triple` is `None`.
    ///
    /// Never fails: a triple without a recognised OS component becomes an
    /// opaque family that only equals itself.
    #[must_use]
    pub fn classify(triple: Option<&str>) -> Self {
        let family = triple.map_or_else(OsFamily::host, |raw| {
            let lowered = raw.trim().to_ascii_lowercase();
            let fields: Vec<&str> = lowered.split('-').collect();
            OsFamily::from_component(os_component(&fields))
        });
        Self { family }
    }

    /// The machine running this process.
    #[must_use]
    pub fn host() -> Self {
        Self::classify(None)
    }

    /// Classification of an already parsed triple.
    #[must_use]
    pub fn of(target: &TargetTriple) -> Self {
        Self {
            family: target.os_family(),
        }
    }

    /// Canonical family.
    #[must_use]
    pub const fn family(&self) -> &OsFamily {
        &self.family
    }

    /// Whether the family is Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.family == OsFamily::Windows
    }

    /// Whether the family is macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.family == OsFamily::MacOs
    }

    /// Whether the family is Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.family == OsFamily::Linux
    }

    /// Whether `triple` belongs to the same family as the host.
    #[must_use]
    pub fn matches_host(triple: &str) -> bool {
        Self::classify(Some(triple)) == Self::host()
    }
}

impl From<&TargetTriple> for System {
    fn from(target: &TargetTriple) -> Self {
        Self::of(target)
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.family.fmt(f)
    }
}
