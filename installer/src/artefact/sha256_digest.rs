//! SHA-256 digest newtype for archive verification.
//!
//! Validates that the value is a 64-character lowercase hexadecimal string
//! representing a 256-bit hash digest.

use crate::error::{InstallerError, Result};
use std::fmt;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use liquibase_installer::artefact::sha256_digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest: Sha256Digest = hex.as_str().try_into().unwrap();
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse user input, tolerating surrounding whitespace and uppercase hex.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidChecksum`] if the normalised value is
    /// not a 64-character hex string.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::artefact::sha256_digest::Sha256Digest;
    ///
    /// let digest = Sha256Digest::parse_user_input(&format!(" {} ", "AB".repeat(32)))
    ///     .expect("valid digest");
    /// assert_eq!(digest.as_str(), "ab".repeat(32));
    /// ```
    pub fn parse_user_input(value: &str) -> Result<Self> {
        Self::try_from(value.trim().to_ascii_lowercase())
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = InstallerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = InstallerError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<()> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(InstallerError::InvalidChecksum {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(InstallerError::InvalidChecksum {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(InstallerError::InvalidChecksum {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn accepts_valid_sixty_four_char_hex() {
        assert!(Sha256Digest::try_from("a".repeat(64).as_str()).is_ok());
    }

    #[rstest]
    #[case::too_short("abcdef".to_owned())]
    #[case::too_long("a".repeat(65))]
    #[case::non_hex(format!("{}g", "a".repeat(63)))]
    #[case::uppercase("A".repeat(64))]
    fn rejects_malformed_digests(#[case] value: String) {
        let result = Sha256Digest::try_from(value);
        assert!(matches!(result, Err(InstallerError::InvalidChecksum { .. })));
    }

    #[test]
    fn user_input_is_trimmed_and_lowercased() {
        let digest =
            Sha256Digest::parse_user_input(&format!("{}\n", "F0".repeat(32))).expect("valid");
        assert_eq!(digest.as_str(), "f0".repeat(32));
    }

    #[test]
    fn user_input_still_rejects_non_hex() {
        let result = Sha256Digest::parse_user_input(&"z".repeat(64));
        assert!(result.is_err());
    }

    #[test]
    fn display_shows_full_digest() {
        let hex = "0123456789abcdef".repeat(4);
        let digest = Sha256Digest::try_from(hex.as_str()).expect("known good");
        assert_eq!(format!("{digest}"), hex);
    }
}
