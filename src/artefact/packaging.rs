//! Archive creation for release artefacts.
//!
//! An [`ArchiveJob`] collects the paths to ship for one target. Files are
//! stored under their base name; directories are walked recursively and keep
//! their own name as the top-level entry, so packing `assets/` yields
//! `assets/logo.png` rather than `logo.png`.

use super::format::ArchiveFormat;
use super::naming::ArchiveName;
use super::packaging_error::PackagingError;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::io;

/// One packaging unit: a named archive built from a set of source paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    name: String,
    format: ArchiveFormat,
    sources: Vec<Utf8PathBuf>,
}

impl ArchiveJob {
    /// Start an empty job writing `<name>.<ext>`.
    #[must_use]
    pub fn new(name: impl Into<String>, format: ArchiveFormat) -> Self {
        Self {
            name: name.into(),
            format,
            sources: Vec::new(),
        }
    }

    /// Start an empty job from a resolved [`ArchiveName`].
    #[must_use]
    pub fn from_name(name: &ArchiveName) -> Self {
        Self::new(name.stem(), name.format())
    }

    /// Add a source path; a path already in the job is ignored.
    pub fn add_source(&mut self, path: impl Into<Utf8PathBuf>) {
        let source = path.into();
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Add several source paths, skipping duplicates.
    #[must_use]
    pub fn with_sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        for path in paths {
            self.add_source(path);
        }
        self
    }

    /// Archive stem.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archive format.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Deduplicated source paths in insertion order.
    #[must_use]
    pub fn sources(&self) -> &[Utf8PathBuf] {
        &self.sources
    }

    /// File name of the archive this job writes.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }
}

/// Write the archive described by `job` into `destination_dir`.
///
/// Returns the absolute path of the written archive. A failed job may leave a
/// partial archive behind; rerun the whole job.
///
/// # Errors
///
/// Returns [`PackagingError::EmptyFileList`] for a job without sources,
/// [`PackagingError::MissingSource`] if a source does not exist, and
/// [`PackagingError::Io`] / [`PackagingError::Zip`] if writing fails.
pub fn create_archive(
    job: &ArchiveJob,
    destination_dir: &Utf8Path,
) -> Result<Utf8PathBuf, PackagingError> {
    if job.sources().is_empty() {
        return Err(PackagingError::EmptyFileList);
    }

    let entries = collect_entries(job.sources())?;
    fs::create_dir_all(destination_dir)?;
    let archive_path = destination_dir.join(job.file_name());

    match job.format() {
        ArchiveFormat::Zip => write_zip(&archive_path, &entries)?,
        ArchiveFormat::TarGz => write_tar_gz(&archive_path, &entries)?,
    }

    let written = archive_path.canonicalize_utf8()?;
    info!("Created `{written}` successfully!");
    Ok(written)
}

/// Expand sources into `(source_path, archive_name)` pairs.
///
/// Entry names are unique: when two sources map to the same name (the same
/// file spelled two ways, or two files sharing a base name) the first wins.
fn collect_entries(sources: &[Utf8PathBuf]) -> Result<Vec<(Utf8PathBuf, String)>, PackagingError> {
    let mut entries = ArchiveEntries::default();
    for source in sources {
        if !source.exists() {
            return Err(PackagingError::MissingSource(source.clone()));
        }

        if source.is_dir() {
            let dir = source.canonicalize_utf8()?;
            let base = dir.parent().unwrap_or(&dir).to_owned();
            walk_dir(&dir, &base, &mut entries)?;
        } else {
            let name = source
                .file_name()
                .ok_or_else(|| PackagingError::InvalidSourcePath(source.clone()))?;
            entries.push(source.clone(), name.to_owned());
        }
    }
    Ok(entries.items)
}

#[derive(Default)]
struct ArchiveEntries {
    items: Vec<(Utf8PathBuf, String)>,
    names: HashSet<String>,
}

impl ArchiveEntries {
    fn push(&mut self, source: Utf8PathBuf, name: String) {
        if self.names.insert(name.clone()) {
            self.items.push((source, name));
        } else {
            debug!("skip {source}: archive already has an entry named {name}");
        }
    }
}

/// Recursively add every file under `dir`, named relative to `base`.
///
/// Symlinks to files are packed as the file they point at; symlinked
/// directories are not followed.
fn walk_dir(
    dir: &Utf8Path,
    base: &Utf8Path,
    entries: &mut ArchiveEntries,
) -> Result<(), PackagingError> {
    let mut children = dir
        .read_dir_utf8()?
        .map(|entry| entry.and_then(|e| e.file_type().map(|kind| (e.path().to_owned(), kind))))
        .collect::<io::Result<Vec<_>>>()?;
    children.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (child, file_type) in children {
        if file_type.is_dir() {
            walk_dir(&child, base, entries)?;
            continue;
        }
        if file_type.is_symlink() && child.is_dir() {
            debug!("skip symlinked directory {child}");
            continue;
        }
        let relative = child
            .strip_prefix(base)
            .map_err(|_| PackagingError::InvalidSourcePath(child.clone()))?;
        let name = archive_entry_name(relative);
        entries.push(child, name);
    }
    Ok(())
}

/// Join path components with `/` so entry names are identical on every host.
fn archive_entry_name(relative: &Utf8Path) -> String {
    relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_tar_gz(path: &Utf8Path, entries: &[(Utf8PathBuf, String)]) -> Result<(), PackagingError> {
    let file = fs::File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for (source_path, archive_name) in entries {
        archive.append_path_with_name(source_path, archive_name)?;
    }

    archive.into_inner()?.finish()?;
    Ok(())
}

fn write_zip(path: &Utf8Path, entries: &[(Utf8PathBuf, String)]) -> Result<(), PackagingError> {
    let file = fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);

    for (source_path, archive_name) in entries {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(file_mode(source_path)?);
        writer.start_file(archive_name.as_str(), options)?;
        let mut source = fs::File::open(source_path)?;
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Utf8Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;

    Ok(fs::metadata(path)?.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_path: &Utf8Path) -> io::Result<u32> {
    Ok(0o644)
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
