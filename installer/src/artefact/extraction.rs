//! Archive extraction for downloaded Liquibase distributions.
//!
//! Unpacks `.tar.gz` and `.zip` archives into a scratch directory with path
//! traversal protection to prevent zip-slip attacks.

use std::fs;
use std::io;
use std::path::{Component, Path};

/// Archive container formats published upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball.
    TarGz,
    /// Zip archive, used for the open-source Windows distribution.
    Zip,
}

impl ArchiveFormat {
    /// Return the filename extension including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::Zip => ".zip",
        }
    }

    /// Infer the format from an archive filename.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::artefact::extraction::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_filename("liquibase-4.33.0.zip"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::from_filename("liquibase.rpm"), None);
    /// ```
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Trait for extracting archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the entries that were written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`] if
    /// nothing was extracted, and [`ExtractionError::Io`] or
    /// [`ExtractionError::Archive`] on read failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive container is corrupt or unreadable.
    #[error("extraction failed: {reason}")]
    Archive {
        /// Description of the decoder failure.
        reason: String,
    },

    /// The archive filename has no recognised extension.
    #[error("extraction failed: unrecognised archive format for {name}")]
    UnknownFormat {
        /// The archive filename.
        name: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("extraction failed: archive is empty")]
    EmptyArchive,
}

/// Default extractor dispatching on the archive extension.
///
/// Validates each entry path before extraction to guard against path
/// traversal attacks.
pub struct ArchiveExtractor;

impl ArtefactExtractor for ArchiveExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ArchiveFormat::from_filename(&name)
            .ok_or(ExtractionError::UnknownFormat { name })?;
        log::debug!(
            "extracting {} ({format:?}) into {}",
            archive_path.display(),
            dest_dir.display()
        );

        fs::create_dir_all(dest_dir)?;
        let extracted = match format {
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir)?,
            ArchiveFormat::Zip => extract_zip(archive_path, dest_dir)?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        log::trace!("extracted {} entries", extracted.len());
        Ok(extracted)
    }
}

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&dest_path)?;
        extracted.push(entry_path.to_string_lossy().into_owned());
    }

    Ok(extracted)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(archive_error)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        let entry_path = entry
            .enclosed_name()
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            })?;
        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut out)?;
            apply_unix_mode(&dest_path, entry.unix_mode())?;
        }
        extracted.push(entry_path.to_string_lossy().into_owned());
    }

    Ok(extracted)
}

fn archive_error(err: zip::result::ZipError) -> ExtractionError {
    ExtractionError::Archive {
        reason: err.to_string(),
    }
}

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_unix_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
