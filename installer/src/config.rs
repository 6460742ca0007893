//! Immutable run configuration.
//!
//! [`InstallConfig`] is assembled once from parsed CLI arguments and the
//! process environment, then passed by reference to every stage. Nothing
//! downstream reads flags or environment variables directly.

use crate::artefact::sha256_digest::Sha256Digest;
use crate::cli::Cli;
use crate::error::{InstallerError, Result};
use crate::release::edition::Edition;
use crate::release::version::{LATEST, VersionSelector};
use std::path::PathBuf;

/// Environment variable that enables verbose output.
pub const VERBOSE_ENV: &str = "VERBOSE";
/// Environment variable that enables dry-run mode.
pub const DRY_RUN_ENV: &str = "DRY_RUN";
/// Environment variable holding the release index API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Everything a run needs to know, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Which release to install.
    pub selector: VersionSelector,
    /// Which edition to install.
    pub edition: Edition,
    /// Diagnostic verbosity: 0 quiet, 1 debug, 2 trace.
    pub verbosity: u8,
    /// Resolve and report only.
    pub dry_run: bool,
    /// Token for release index queries.
    pub github_token: Option<String>,
    /// Expected archive digest.
    pub checksum: Option<Sha256Digest>,
    /// Explicit install prefix.
    pub prefix: Option<PathBuf>,
    /// Leave shell startup files alone.
    pub skip_path: bool,
    /// Install a Java runtime if none is found.
    pub install_java: bool,
    /// Problems with the environment that did not stop the run.
    pub warnings: Vec<String>,
}

impl InstallConfig {
    /// Build from CLI arguments and the process environment.
    ///
    /// # Errors
    ///
    /// As for [`InstallConfig::from_cli_with_env`].
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::from_cli_with_env(cli, |name| std::env::var(name).ok())
    }

    /// Build from CLI arguments and an environment lookup.
    ///
    /// Flags take precedence over environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnknownArgument`] for an unrecognised or
    /// repeated positional token, and [`InstallerError::InvalidChecksum`] for
    /// a malformed `--checksum`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use liquibase_installer::cli::Cli;
    /// use liquibase_installer::config::InstallConfig;
    /// use liquibase_installer::release::edition::Edition;
    ///
    /// let cli = Cli::parse_from(["liquibase-installer", "secure", "5.0.0"]);
    /// let config = InstallConfig::from_cli_with_env(&cli, |_| None).expect("valid");
    /// assert_eq!(config.edition, Edition::Secure);
    /// assert_eq!(config.selector.to_string(), "5.0.0");
    /// ```
    pub fn from_cli_with_env(
        cli: &Cli,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let (selector, edition) = classify_positionals(&cli.positional)?;
        let mut warnings = Vec::new();

        let env_verbose = env_flag(&env, VERBOSE_ENV, &mut warnings);
        let verbosity = if env_verbose {
            cli.verbosity.max(1)
        } else {
            cli.verbosity
        };
        let dry_run = env_flag(&env, DRY_RUN_ENV, &mut warnings) || cli.dry_run;

        let github_token = cli
            .github_token
            .clone()
            .or_else(|| env(TOKEN_ENV))
            .filter(|token| !token.trim().is_empty());

        let checksum = cli
            .checksum
            .as_deref()
            .map(Sha256Digest::parse_user_input)
            .transpose()?;

        Ok(Self {
            selector,
            edition,
            verbosity,
            dry_run,
            github_token,
            checksum,
            prefix: cli.prefix.clone(),
            skip_path: cli.no_modify_path,
            install_java: cli.install_java,
            warnings,
        })
    }
}

/// Sort positional tokens into a version selector and an edition.
///
/// # Errors
///
/// Returns [`InstallerError::UnknownArgument`] for a token that is neither,
/// and for a second token of the same kind.
pub fn classify_positionals(tokens: &[String]) -> Result<(VersionSelector, Edition)> {
    let mut selector = None;
    let mut edition = None;

    for token in tokens {
        if let Ok(parsed) = token.parse::<Edition>() {
            set_once(&mut edition, parsed, token, "edition")?;
        } else if looks_like_version(token) {
            let parsed = VersionSelector::parse(token).map_err(|_| unknown(
                token,
                "version must be `latest` or X.Y.Z with an optional -suffix",
            ))?;
            set_once(&mut selector, parsed, token, "version")?;
        } else {
            return Err(unknown(
                token,
                "expected `latest`, a version X.Y.Z, `oss`, or `secure`",
            ));
        }
    }

    Ok((selector.unwrap_or_default(), edition.unwrap_or_default()))
}

fn looks_like_version(token: &str) -> bool {
    token == LATEST
        || token
            .strip_prefix(['v', 'V'])
            .unwrap_or(token)
            .starts_with(|c: char| c.is_ascii_digit())
}

fn set_once<T>(slot: &mut Option<T>, value: T, token: &str, kind: &str) -> Result<()> {
    if slot.is_some() {
        return Err(unknown(token, &format!("{kind} given more than once")));
    }
    *slot = Some(value);
    Ok(())
}

fn unknown(token: &str, reason: &str) -> InstallerError {
    InstallerError::UnknownArgument {
        argument: token.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Read a boolean-string environment variable.
///
/// `1`, `true`, `yes`, and `on` are true; `0`, `false`, `no`, `off`, and the
/// empty string are false. Anything else is treated as false and recorded
/// in `warnings`.
fn env_flag(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
    warnings: &mut Vec<String>,
) -> bool {
    let Some(raw) = env(name) else {
        return false;
    };
    parse_bool(&raw).unwrap_or_else(|| {
        warnings.push(format!(
            "ignoring {name}={raw:?}; expected true/false, yes/no, on/off, or 1/0"
        ));
        false
    })
}

/// Parse a boolean string, case-insensitively.
///
/// # Examples
///
/// ```
/// use liquibase_installer::config::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool(""), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
