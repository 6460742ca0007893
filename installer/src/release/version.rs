//! Version selectors and validated version strings.
//!
//! A selector is either the literal `latest` or a concrete version matching
//! `^\d+\.\d+\.\d+(-[\w.-]+)?$`. Only concrete [`Version`] values travel
//! past the release resolver.

use crate::error::{InstallerError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// The selector token requesting the newest published release.
pub const LATEST: &str = "latest";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([\w.-]+))?$").expect("version pattern is valid")
    })
}

/// A validated concrete version such as `4.33.0` or `5.0.0-rc1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Parse and validate a concrete version string.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidVersionFormat`] if `value` does not
    /// match the version format.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::release::version::Version;
    ///
    /// let version = Version::parse("5.0.0-rc1").expect("valid version");
    /// assert_eq!(version.major(), 5);
    /// assert!(Version::parse("v4.33.0").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || InstallerError::InvalidVersionFormat {
            version: value.to_owned(),
        };
        let captures = version_pattern().captures(value).ok_or_else(invalid)?;
        let component = |index: usize| -> Result<u64> {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(invalid)
        };
        Ok(Self {
            raw: value.to_owned(),
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Return the major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Return the minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Return the patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }

    /// Return the version exactly as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Return the upstream git tag for this version (`v` prefixed).
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{}", self.raw)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What the user asked for: the newest release or a specific one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionSelector {
    /// Resolve the newest release from the release index.
    #[default]
    Latest,
    /// Install exactly this version.
    Exact(Version),
}

impl VersionSelector {
    /// Parse a selector token.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidVersionFormat`] if the token is neither
    /// `latest` nor a valid version.
    pub fn parse(value: &str) -> Result<Self> {
        if value == LATEST {
            return Ok(Self::Latest);
        }
        Version::parse(value).map(Self::Exact)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Exact(version) => version.fmt(f),
        }
    }
}
