//! Archive download over HTTPS.
//!
//! Provides a trait-based abstraction for fetching release archives so the
//! install pipeline can be exercised in tests without network access.

use std::path::Path;
use std::sync::OnceLock;

/// User agent sent with every request.
pub(crate) const USER_AGENT: &str = concat!("liquibase-installer/", env!("CARGO_PKG_VERSION"));

/// Trait for downloading release archives.
///
/// # Examples
///
/// ```
/// use liquibase_installer::artefact::download::HttpDownloader;
///
/// let downloader = HttpDownloader;
/// // Use downloader.download(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from archive download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed (transport error, timeout, DNS, non-404 status).
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artefact was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
pub struct HttpDownloader;

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("GET {url} -> {}", dest.display());
        let response = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        let bytes = std::io::copy(&mut response.into_body().into_reader(), &mut file)?;
        log::debug!("downloaded {bytes} bytes from {url}");
        Ok(())
    }
}

/// Shared `ureq` agent.
///
/// No global timeout is configured; archives are large and the transport
/// defaults govern connection failures.
pub(crate) fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| ureq::Agent::new_with_config(ureq::Agent::config_builder().build()))
}

/// Map a ureq error to a [`DownloadError`].
pub(crate) fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/liquibase.tar.gz", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[rstest]
    #[case::server_error(500)]
    #[case::forbidden(403)]
    fn map_ureq_error_maps_other_status_to_http_error(#[case] status: u16) {
        let err = ureq::Error::StatusCode(status);
        let mapped = map_ureq_error("https://example.test/liquibase.tar.gz", &err);
        match mapped {
            DownloadError::HttpError { url, reason } => {
                assert_eq!(url, "https://example.test/liquibase.tar.gz");
                assert!(reason.contains(&status.to_string()), "reason: {reason}");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[test]
    fn user_agent_names_the_installer() {
        assert!(USER_AGENT.starts_with("liquibase-installer/"));
    }
}
