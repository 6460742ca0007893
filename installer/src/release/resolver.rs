//! Version resolution against the release index.

use super::edition::Edition;
use super::index::{ReleaseIndex, ReleaseInfo};
use super::version::{Version, VersionSelector};
use crate::error::{InstallerError, Result};

/// Resolve `selector` to a concrete version for `edition`.
///
/// `latest` is looked up in the release index. An explicit version is
/// confirmed against the index for the open-source edition; the commercial
/// repository requires credentials, so for `secure` a well-formed version is
/// trusted and a missing artefact surfaces as a download failure instead.
///
/// # Errors
///
/// - [`InstallerError::Network`] if the index is unreachable.
/// - [`InstallerError::Parse`] if the newest release has no usable tag.
/// - [`InstallerError::VersionNotFound`] if an OSS tag does not exist.
pub fn resolve_version(
    selector: &VersionSelector,
    edition: Edition,
    index: &dyn ReleaseIndex,
) -> Result<Version> {
    match selector {
        VersionSelector::Latest => resolve_latest(index),
        VersionSelector::Exact(version) => match edition {
            Edition::Oss => confirm_published(version, index),
            Edition::Secure => {
                log::debug!("skipping existence check for secure {version}");
                Ok(version.clone())
            }
        },
    }
}

/// Resolve a raw selector token, validating its format first.
///
/// # Errors
///
/// Returns [`InstallerError::InvalidVersionFormat`] for malformed tokens,
/// otherwise as for [`resolve_version`].
pub fn resolve_version_str(
    selector: &str,
    edition: Edition,
    index: &dyn ReleaseIndex,
) -> Result<Version> {
    resolve_version(&VersionSelector::parse(selector)?, edition, index)
}

fn resolve_latest(index: &dyn ReleaseIndex) -> Result<Version> {
    let release = index.latest()?;
    let tag = release
        .tag_name
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| InstallerError::Parse {
            reason: "release index response has no tag_name".to_owned(),
        })?;
    let bare = tag.strip_prefix('v').unwrap_or(&tag);
    log::debug!("latest release tag is {tag}");
    Version::parse(bare).map_err(|_| InstallerError::Parse {
        reason: format!("latest release tag \"{tag}\" is not a version"),
    })
}

fn confirm_published(version: &Version, index: &dyn ReleaseIndex) -> Result<Version> {
    let release = index
        .by_tag(&version.tag())?
        .filter(|release| names_version(release, version))
        .ok_or_else(|| InstallerError::VersionNotFound {
            version: version.to_string(),
        })?;
    let archive = format!("liquibase-{version}.tar.gz");
    match release.asset(&archive) {
        Some(asset) => log::debug!("{} is {} bytes", asset.name, asset.size),
        None => log::debug!("release {} does not list {archive}", version.tag()),
    }
    Ok(version.clone())
}

/// Whether the record's tag is `version`, with or without the `v` prefix.
fn names_version(release: &ReleaseInfo, version: &Version) -> bool {
    release.tag_name.as_deref().is_some_and(|tag| {
        let matches = tag.strip_prefix('v').unwrap_or(tag) == version.as_str();
        if !matches {
            log::debug!("release index answered {} with tag {tag}", version.tag());
        }
        matches
    })
}
