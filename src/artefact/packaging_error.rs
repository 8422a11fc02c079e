//! Error types for artefact packaging operations.
//!
//! Covers missing sources, I/O failures, and zip writer errors that can
//! occur while creating `.zip` and `.tar.gz` archives.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from artefact packaging operations.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading source files, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// The zip writer rejected an entry or failed to finish the archive.
    #[error("zip error during packaging: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A source path listed in the archive job does not exist.
    #[error("file to pack not found: {0}")]
    MissingSource(Utf8PathBuf),

    /// No source paths were provided for packaging.
    #[error("no files provided for packaging")]
    EmptyFileList,

    /// A source path has no file name component (e.g. `/` or `..`).
    #[error("path has no file name: {0}")]
    InvalidSourcePath(Utf8PathBuf),
}
