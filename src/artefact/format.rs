//! Archive format selection.
//!
//! Windows users expect `.zip`; everyone else gets a gzip-compressed tarball.

use crate::platform::{OsFamily, TargetTriple};
use std::fmt;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// A zip archive.
    Zip,
    /// A gzip-compressed tar archive.
    TarGz,
}

impl ArchiveFormat {
    /// Choose the format for `target`: zip for Windows, tar.gz otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_release_action::artefact::format::ArchiveFormat;
    /// use rust_release_action::platform::TargetTriple;
    ///
    /// let windows = TargetTriple::parse("x86_64-pc-windows-msvc").expect("valid");
    /// assert_eq!(ArchiveFormat::for_target(&windows), ArchiveFormat::Zip);
    /// ```
    #[must_use]
    pub fn for_target(target: &TargetTriple) -> Self {
        if target.os_family() == OsFamily::Windows {
            Self::Zip
        } else {
            Self::TarGz
        }
    }

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::windows_msvc("x86_64-pc-windows-msvc", ArchiveFormat::Zip)]
    #[case::windows_gnu("i686-pc-windows-gnu", ArchiveFormat::Zip)]
    #[case::linux("x86_64-unknown-linux-musl", ArchiveFormat::TarGz)]
    #[case::macos("aarch64-apple-darwin", ArchiveFormat::TarGz)]
    #[case::other("wasm32-unknown-unknown", ArchiveFormat::TarGz)]
    fn format_follows_os_family(#[case] triple: &str, #[case] expected: ArchiveFormat) {
        let target = TargetTriple::parse(triple).expect("valid");
        assert_eq!(ArchiveFormat::for_target(&target), expected);
    }

    #[test]
    fn extensions_have_no_leading_dot() {
        assert_eq!(ArchiveFormat::Zip.extension(), "zip");
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
    }
}
