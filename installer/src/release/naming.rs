//! Archive naming and download URL policy.
//!
//! Pure functions of `(version, edition, os)`. The commercial edition was
//! rebranded from Pro to Secure at major version 5, so the URL family is a
//! major-version comparison rather than a table of known releases.

use super::edition::Edition;
use super::version::Version;
use crate::artefact::extraction::ArchiveFormat;
use crate::platform::Os;
use std::fmt;

/// The product name used in archive filenames.
const PRODUCT: &str = "liquibase";

/// Public GitHub release download host for the open-source edition.
const OSS_DOWNLOAD_BASE: &str = "https://github.com/liquibase/liquibase/releases/download";

/// Private release host for commercial editions.
const COMMERCIAL_DOWNLOAD_BASE: &str = "https://repo.liquibase.com/releases";

/// First major version published under the Secure name.
const SECURE_FIRST_MAJOR: u64 = 5;

/// Upstream distribution family an artefact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionFamily {
    /// Open-source builds on GitHub releases.
    Oss,
    /// Commercial builds before the rebrand (4.32 to 4.33).
    Pro,
    /// Commercial builds from 5.0.0 onwards.
    Secure,
}

impl DistributionFamily {
    /// Classify an edition/version pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::release::edition::Edition;
    /// use liquibase_installer::release::naming::DistributionFamily;
    /// use liquibase_installer::release::version::Version;
    ///
    /// let v4 = Version::parse("4.33.0").expect("valid");
    /// assert_eq!(DistributionFamily::classify(&v4, Edition::Secure), DistributionFamily::Pro);
    /// ```
    #[must_use]
    pub const fn classify(version: &Version, edition: Edition) -> Self {
        match edition {
            Edition::Oss => Self::Oss,
            Edition::Secure if version.major() >= SECURE_FIRST_MAJOR => Self::Secure,
            Edition::Secure => Self::Pro,
        }
    }

    const fn name_infix(self) -> &'static str {
        match self {
            Self::Oss => "",
            Self::Pro => "-pro",
            Self::Secure => "-secure",
        }
    }
}

/// Return the archive format published for `edition` on `os`.
///
/// Only the open-source Windows build ships as a zip.
#[must_use]
pub const fn archive_format(edition: Edition, os: Os) -> ArchiveFormat {
    match (edition, os) {
        (Edition::Oss, Os::Windows) => ArchiveFormat::Zip,
        _ => ArchiveFormat::TarGz,
    }
}

/// Return the archive filename for a release.
///
/// # Examples
///
/// ```
/// use liquibase_installer::platform::Os;
/// use liquibase_installer::release::edition::Edition;
/// use liquibase_installer::release::naming::archive_name;
/// use liquibase_installer::release::version::Version;
///
/// let version = Version::parse("5.0.0").expect("valid");
/// assert_eq!(
///     archive_name(&version, Edition::Secure, Os::Linux),
///     "liquibase-secure-5.0.0.tar.gz"
/// );
/// ```
#[must_use]
pub fn archive_name(version: &Version, edition: Edition, os: Os) -> String {
    let family = DistributionFamily::classify(version, edition);
    format!(
        "{PRODUCT}{}-{version}{}",
        family.name_infix(),
        archive_format(edition, os).extension()
    )
}

/// Return the download URL for a release.
#[must_use]
pub fn download_url(version: &Version, edition: Edition, os: Os) -> String {
    let filename = archive_name(version, edition, os);
    match DistributionFamily::classify(version, edition) {
        DistributionFamily::Oss => {
            format!("{OSS_DOWNLOAD_BASE}/{}/{filename}", version.tag())
        }
        DistributionFamily::Pro => format!("{COMMERCIAL_DOWNLOAD_BASE}/pro/{version}/{filename}"),
        DistributionFamily::Secure => {
            format!("{COMMERCIAL_DOWNLOAD_BASE}/secure/{version}/{filename}")
        }
    }
}

/// A fully resolved release: concrete version plus where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    /// Edition being installed.
    pub edition: Edition,
    /// Concrete version; never `latest`.
    pub version: Version,
    /// Archive filename.
    pub archive_name: String,
    /// Download URL for the archive.
    pub download_url: String,
}

impl ResolvedRelease {
    /// Derive the archive name and URL for a concrete version.
    #[must_use]
    pub fn new(version: Version, edition: Edition, os: Os) -> Self {
        Self {
            edition,
            archive_name: archive_name(&version, edition, os),
            download_url: download_url(&version, edition, os),
            version,
        }
    }
}

impl fmt::Display for ResolvedRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Liquibase {} ({})", self.version, self.edition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(value: &str) -> Version {
        Version::parse(value).expect("valid version")
    }

    #[test]
    fn secure_before_rebrand_uses_pro_family() {
        let url = download_url(&v("4.33.0"), Edition::Secure, Os::Linux);
        assert!(url.contains("/releases/pro/4.33.0/"), "url: {url}");
        assert_eq!(
            archive_name(&v("4.33.0"), Edition::Secure, Os::Linux),
            "liquibase-pro-4.33.0.tar.gz"
        );
    }

    #[test]
    fn secure_from_major_five_uses_secure_family() {
        let url = download_url(&v("5.0.0"), Edition::Secure, Os::Darwin);
        assert!(url.contains("/releases/secure/5.0.0/"), "url: {url}");
        assert!(url.ends_with("/liquibase-secure-5.0.0.tar.gz"));
    }

    #[test]
    fn oss_uses_public_tag_path() {
        assert_eq!(
            download_url(&v("4.33.0"), Edition::Oss, Os::Linux),
            "https://github.com/liquibase/liquibase/releases/download/v4.33.0/liquibase-4.33.0.tar.gz"
        );
    }

    #[test]
    fn oss_windows_uses_zip() {
        assert_eq!(
            archive_name(&v("4.33.0"), Edition::Oss, Os::Windows),
            "liquibase-4.33.0.zip"
        );
    }

    #[test]
    fn secure_windows_keeps_tarball() {
        assert_eq!(
            archive_name(&v("5.1.0"), Edition::Secure, Os::Windows),
            "liquibase-secure-5.1.0.tar.gz"
        );
    }

    #[rstest]
    #[case::future_major("6.2.0", DistributionFamily::Secure)]
    #[case::prerelease("5.0.0-rc1", DistributionFamily::Secure)]
    #[case::pro_lower_bound("4.32.0", DistributionFamily::Pro)]
    fn commercial_family_is_a_major_version_rule(
        #[case] version: &str,
        #[case] expected: DistributionFamily,
    ) {
        assert_eq!(DistributionFamily::classify(&v(version), Edition::Secure), expected);
    }

    #[rstest]
    #[case(Edition::Oss, Os::Linux)]
    #[case(Edition::Oss, Os::Windows)]
    #[case(Edition::Secure, Os::Darwin)]
    fn naming_is_deterministic(#[case] edition: Edition, #[case] os: Os) {
        let version = v("4.33.0");
        assert_eq!(
            ResolvedRelease::new(version.clone(), edition, os),
            ResolvedRelease::new(version, edition, os)
        );
    }

    #[test]
    fn resolved_release_url_ends_with_archive_name() {
        let release = ResolvedRelease::new(v("5.0.1"), Edition::Secure, Os::Linux);
        assert!(release.download_url.ends_with(&release.archive_name));
        assert_eq!(release.to_string(), "Liquibase 5.0.1 (secure)");
    }
}
