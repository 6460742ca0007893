//! Artifact installation orchestrator.
//!
//! Runs download, checksum, extraction, payload discovery, staging, and
//! launcher creation in order. Every step aborts the run on failure; no
//! launcher is written until the payload has been copied into place.

use crate::artefact::checksum::{ChecksumOutcome, verify_archive};
use crate::artefact::download::{ArtefactDownloader, HttpDownloader};
use crate::artefact::extraction::{ArchiveExtractor, ArtefactExtractor};
use crate::artefact::payload::{PayloadRoot, locate_payload, require_executable};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::error::Result;
use crate::launcher::{Launcher, create_launcher};
use crate::output::Reporter;
use crate::platform::Os;
use crate::release::naming::ResolvedRelease;
use crate::stager::Stager;
use crate::target::InstallTarget;

/// Inputs to one installation.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    /// The release to install; its version is always concrete.
    pub release: &'a ResolvedRelease,
    /// Where to install it.
    pub target: &'a InstallTarget,
    /// Host operating system, which selects the launcher kind.
    pub os: Os,
    /// Expected archive digest, if the user supplied one.
    pub checksum: Option<&'a Sha256Digest>,
}

/// What an installation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Result of the checksum step.
    pub checksum: ChecksumOutcome,
    /// The payload root found in the archive.
    pub payload: PayloadRoot,
    /// Number of files copied into the library directory.
    pub files_copied: usize,
    /// The launcher that was written.
    pub launcher: Launcher,
}

/// Install a release using the production downloader and extractor.
///
/// # Errors
///
/// Returns the first error raised by any step; see [`install_with`].
pub fn install(request: &InstallRequest<'_>, reporter: &mut Reporter<'_>) -> Result<InstallOutcome> {
    install_with(request, &HttpDownloader, &ArchiveExtractor, reporter)
}

/// Testable inner function with injected dependencies.
///
/// The production entry point [`install`] delegates here with real
/// implementations; tests inject mocks.
///
/// # Errors
///
/// - [`crate::error::InstallerError::Download`] if the archive cannot be fetched.
/// - [`crate::error::InstallerError::ChecksumMismatch`] if a supplied digest differs.
/// - [`crate::error::InstallerError::Extraction`] if the archive cannot be unpacked.
/// - [`crate::error::InstallerError::PayloadNotFound`] if no payload root validates
///   or it lacks the executable the launcher needs.
/// - [`crate::error::InstallerError::InstallWrite`] if the target cannot be written.
pub fn install_with(
    request: &InstallRequest<'_>,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
    reporter: &mut Reporter<'_>,
) -> Result<InstallOutcome> {
    let release = request.release;
    let scratch = tempfile::tempdir()?;
    log::debug!("scratch directory {}", scratch.path().display());

    // Step 1: Download.
    let archive_path = scratch.path().join(&release.archive_name);
    reporter.info(format!("Downloading {}", release.download_url));
    downloader.download(&release.download_url, &archive_path)?;

    // Step 2: Verify checksum if one was supplied.
    let checksum = verify_archive(&archive_path, request.checksum)?;
    if let ChecksumOutcome::Verified(digest) = &checksum {
        reporter.success(format!("Checksum verified ({digest})"));
    }

    // Step 3: Extract.
    let extract_dir = scratch.path().join("extracted");
    reporter.info(format!("Extracting {}", release.archive_name));
    let entries = extractor.extract(&archive_path, &extract_dir)?;
    log::debug!("extracted {} entries", entries.len());

    // Step 4: Locate and validate the payload root.
    let payload = locate_payload(&extract_dir)?;
    require_executable(&payload.path, request.os)?;

    // Step 5: Replace any existing installation.
    let stager = Stager::new(request.target.lib_dir.clone());
    stager.prepare()?;
    reporter.info(format!("Installing into {}", request.target.lib_dir));
    let files_copied = stager.replace(&payload.path)?;

    // Steps 6 and 7: Launcher and permissions.
    let launcher = create_launcher(request.os, &request.target.lib_dir, &request.target.bin_link)?;
    reporter.success(format!("Linked {} -> {}", launcher.path, launcher.target));

    Ok(InstallOutcome {
        checksum,
        payload,
        files_copied,
        launcher,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
