//! Liquibase editions.

use crate::error::InstallerError;
use std::fmt;
use std::str::FromStr;

/// Which variant of Liquibase to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Edition {
    /// The open-source distribution published on GitHub.
    #[default]
    Oss,
    /// The commercial distribution (Liquibase Secure, formerly Pro).
    Secure,
}

impl Edition {
    /// Return the command-line token for this edition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oss => "oss",
            Self::Secure => "secure",
        }
    }
}

impl FromStr for Edition {
    type Err = InstallerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "oss" => Ok(Self::Oss),
            "secure" => Ok(Self::Secure),
            other => Err(InstallerError::UnknownArgument {
                argument: other.to_owned(),
                reason: "expected edition `oss` or `secure`".to_owned(),
            }),
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
