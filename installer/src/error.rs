//! Error types for the Liquibase installer CLI.
//!
//! This module defines semantic error variants that classify why a run
//! failed. Every variant is terminal for the run; [`InstallerError::remediation`]
//! supplies actionable guidance where the user can do something about it.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The kernel reported an operating system the installer cannot serve.
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform {
        /// The kernel name as reported by the host.
        os: String,
    },

    /// A positional argument was neither an edition nor a version selector.
    #[error("unknown argument \"{argument}\": {reason}")]
    UnknownArgument {
        /// The offending token.
        argument: String,
        /// Why the token was rejected.
        reason: String,
    },

    /// A version string does not match `X.Y.Z` with an optional suffix.
    #[error("invalid version format \"{version}\"; expected X.Y.Z or X.Y.Z-suffix")]
    InvalidVersionFormat {
        /// The rejected version string.
        version: String,
    },

    /// The requested version is not published in the release index.
    #[error("version {version} not found in the Liquibase release index")]
    VersionNotFound {
        /// The version that was looked up.
        version: String,
    },

    /// The release index could not be reached.
    #[error("release index unreachable at {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// Transport-level description of the failure.
        reason: String,
    },

    /// The release index answered with something other than the expected JSON.
    #[error("could not parse release index response: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The archive download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A user-supplied checksum is not a SHA-256 hex digest.
    #[error("invalid checksum: {reason}")]
    InvalidChecksum {
        /// Description of the validation failure.
        reason: String,
    },

    /// The downloaded archive does not hash to the expected digest.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The digest supplied by the user.
        expected: String,
        /// The digest computed from the downloaded file.
        actual: String,
    },

    /// The archive could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// No directory in the extracted tree looks like a Liquibase payload.
    #[error("no Liquibase payload found under {searched}")]
    PayloadNotFound {
        /// The extraction root that was searched.
        searched: PathBuf,
    },

    /// Writing to the install prefix failed.
    #[error("cannot write to {path}: {reason}")]
    InstallWrite {
        /// The path that could not be written.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The installed launcher did not respond with a version.
    #[error("verification failed: {reason}")]
    VerificationFailed {
        /// Description of what was probed and why it failed.
        reason: String,
    },

    /// A package-manager call-out for a runtime dependency failed.
    #[error("failed to install {package} with {manager}: {message}")]
    DependencyInstall {
        /// The package manager that was invoked.
        manager: &'static str,
        /// The package that was requested.
        package: &'static str,
        /// Captured stderr from the package manager.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl InstallerError {
    /// Return actionable guidance for the user, if any applies.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use liquibase_installer::error::InstallerError;
    ///
    /// let err = InstallerError::InstallWrite {
    ///     path: Utf8PathBuf::from("/usr/local/lib/liquibase"),
    ///     reason: "permission denied".to_owned(),
    /// };
    /// assert!(err.remediation().is_some_and(|hint| hint.contains("sudo")));
    /// ```
    #[must_use]
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedPlatform { .. } => {
                Some("supported platforms are macOS, Linux, and Windows (Git Bash, MSYS2, Cygwin)")
            }
            Self::UnknownArgument { .. } | Self::InvalidVersionFormat { .. } => Some(
                "usage: liquibase-installer [latest|X.Y.Z] [oss|secure] [--dry-run] [--verbose]",
            ),
            Self::VersionNotFound { .. } => {
                Some("see https://github.com/liquibase/liquibase/releases for published versions")
            }
            Self::Network { .. } => Some(
                "check your network connection; set GITHUB_TOKEN if you are being rate limited",
            ),
            Self::Download(_) => Some(
                "check the version and edition; Secure and Pro artefacts exist only for their own release lines",
            ),
            Self::ChecksumMismatch { .. } => {
                Some("the download may be corrupt or tampered with; re-run the installer")
            }
            Self::InstallWrite { .. } => Some(
                "retry with elevated privileges (sudo) or install to a user-scoped location with --prefix ~/.local",
            ),
            Self::VerificationFailed { .. } => {
                Some("open a new shell so PATH changes take effect, then run: liquibase --version")
            }
            Self::DependencyInstall { .. } => {
                Some("install a Java runtime (11 or newer) manually, then re-run the installer")
            }
            _ => None,
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn install_write_suggests_elevated_or_user_scope() {
        let err = InstallerError::InstallWrite {
            path: Utf8PathBuf::from("/usr/local/lib/liquibase"),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/local/lib/liquibase"));
        assert!(msg.contains("permission denied"));

        let hint = err.remediation().expect("install errors carry a hint");
        assert!(hint.contains("sudo"));
        assert!(hint.contains("~/.local"));
    }

    #[test]
    fn checksum_mismatch_includes_both_digests() {
        let err = InstallerError::ChecksumMismatch {
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        };
        let msg = err.to_string();
        assert!(msg.contains(&"a".repeat(64)));
        assert!(msg.contains(&"b".repeat(64)));
    }

    #[test]
    fn unknown_argument_is_classified_as_such() {
        let err = InstallerError::UnknownArgument {
            argument: "enterprise".to_owned(),
            reason: "expected an edition or a version".to_owned(),
        };
        assert!(err.to_string().starts_with("unknown argument"));
        assert!(err.remediation().is_some_and(|hint| hint.contains("usage")));
    }

    #[test]
    fn download_error_is_surfaced_verbatim() {
        let err = InstallerError::from(DownloadError::NotFound {
            url: "https://example.test/liquibase-9.9.9.tar.gz".to_owned(),
        });
        assert_eq!(
            err.to_string(),
            "artefact not found: https://example.test/liquibase-9.9.9.tar.gz"
        );
    }

    #[rstest]
    #[case::io(InstallerError::Io(std::io::Error::other("boom")))]
    #[case::parse(InstallerError::Parse { reason: "tag_name is null".to_owned() })]
    fn internal_errors_have_no_hint(#[case] err: InstallerError) {
        assert!(err.remediation().is_none());
    }
}
