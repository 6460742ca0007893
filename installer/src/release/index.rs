//! Upstream release index client.
//!
//! The open-source edition is published as GitHub releases. The index is
//! queried for the newest tag and to confirm that a requested tag exists.

use crate::artefact::download::{USER_AGENT, http_agent};
use crate::error::{InstallerError, Result};
use serde::Deserialize;

/// GitHub REST endpoint for the Liquibase repository's releases.
const RELEASES_API: &str = "https://api.github.com/repos/liquibase/liquibase/releases";

/// A downloadable asset attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Asset filename.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// The subset of a release record the installer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    /// Git tag, usually `v`-prefixed. `None` when absent or `null`.
    #[serde(default)]
    pub tag_name: Option<String>,
    /// Attached assets.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Find an asset by filename.
    #[must_use]
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Trait for querying the release index, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseIndex {
    /// Fetch the newest published release.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Network`] if the index is unreachable and
    /// [`InstallerError::Parse`] if the body is not a release record.
    fn latest(&self) -> Result<ReleaseInfo>;

    /// Fetch the release for `tag`, or `None` if no such tag exists.
    ///
    /// # Errors
    ///
    /// As for [`ReleaseIndex::latest`].
    fn by_tag(&self, tag: &str) -> Result<Option<ReleaseInfo>>;
}

/// Release index backed by the GitHub REST API.
#[derive(Debug, Clone, Default)]
pub struct GitHubReleaseIndex {
    token: Option<String>,
}

impl GitHubReleaseIndex {
    /// Create a client, optionally authenticating with an API token.
    #[must_use]
    pub const fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// URL of the newest-release endpoint.
    #[must_use]
    pub fn latest_url() -> String {
        format!("{RELEASES_API}/latest")
    }

    /// URL of the by-tag endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::release::index::GitHubReleaseIndex;
    ///
    /// assert!(GitHubReleaseIndex::tag_url("v4.33.0").ends_with("/releases/tags/v4.33.0"));
    /// ```
    #[must_use]
    pub fn tag_url(tag: &str) -> String {
        format!("{RELEASES_API}/tags/{tag}")
    }

    fn get(&self, url: &str) -> std::result::Result<String, ureq::Error> {
        log::debug!("GET {url}");
        let mut request = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            log::trace!("authenticating release index request with API token");
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request.call()?.into_body().read_to_string()
    }
}

impl ReleaseIndex for GitHubReleaseIndex {
    fn latest(&self) -> Result<ReleaseInfo> {
        let url = Self::latest_url();
        let body = self.get(&url).map_err(|e| network_error(&url, &e))?;
        parse_release(&body)
    }

    fn by_tag(&self, tag: &str) -> Result<Option<ReleaseInfo>> {
        let url = Self::tag_url(tag);
        match self.get(&url) {
            Ok(body) => parse_release(&body).map(Some),
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(network_error(&url, &e)),
        }
    }
}

/// Decode a release record.
///
/// # Errors
///
/// Returns [`InstallerError::Parse`] if `body` is not JSON or not an object.
pub fn parse_release(body: &str) -> Result<ReleaseInfo> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(parse_error)?;
    if !value.is_object() {
        return Err(InstallerError::Parse {
            reason: "release index response is not a JSON object".to_owned(),
        });
    }
    serde_json::from_value(value).map_err(parse_error)
}

fn parse_error(err: serde_json::Error) -> InstallerError {
    InstallerError::Parse {
        reason: err.to_string(),
    }
}

fn network_error(url: &str, err: &ureq::Error) -> InstallerError {
    InstallerError::Network {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}
