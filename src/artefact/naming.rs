//! Archive naming policy.
//!
//! Archives are named `<primary>-<target>.<ext>`, where the primary name is
//! the first shipped binary (or the library) and the extension follows the
//! target's [`ArchiveFormat`].

use super::format::ArchiveFormat;
use crate::platform::TargetTriple;
use std::fmt;

/// A fully-qualified archive name.
///
/// # Examples
///
/// ```
/// use rust_release_action::artefact::naming::ArchiveName;
/// use rust_release_action::platform::TargetTriple;
///
/// let target = TargetTriple::parse("aarch64-apple-darwin").expect("valid target");
/// let name = ArchiveName::new("git-se", &target);
/// assert_eq!(name.stem(), "git-se-aarch64-apple-darwin");
/// assert_eq!(name.filename(), "git-se-aarch64-apple-darwin.tar.gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    stem: String,
    format: ArchiveFormat,
}

impl ArchiveName {
    /// Name the archive for `primary` built for `target`.
    #[must_use]
    pub fn new(primary: &str, target: &TargetTriple) -> Self {
        Self {
            stem: format!("{primary}-{target}"),
            format: ArchiveFormat::for_target(target),
        }
    }

    /// Name without extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Archive format implied by the target.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem, self.format.extension())
    }
}
