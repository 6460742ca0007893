//! CLI argument definitions for the Liquibase installer.
//!
//! This module defines the command-line interface using clap. Positional
//! tokens are collected raw and classified by [`crate::config`], because the
//! version selector and the edition may appear in either order.

use clap::Parser;
use std::path::PathBuf;

/// Install the Liquibase database migration tool.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "liquibase-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the Liquibase database migration tool.\n\n",
    "Detects the host platform, resolves the requested release, downloads and ",
    "unpacks the distribution, and places it under /usr/local when writable or ",
    "~/.local otherwise, with a `liquibase` launcher in the prefix's bin ",
    "directory.\n\n",
    "Positional arguments may be given in any order: a version selector ",
    "(`latest` or X.Y.Z) and an edition (`oss` or `secure`).",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  VERBOSE        Boolean; same as --verbose\n",
    "  DRY_RUN        Boolean; same as --dry-run\n",
    "  GITHUB_TOKEN   Token for authenticated release index queries\n",
    "  NO_COLOR       Disable coloured output\n\n",
    "EXAMPLES:\n",
    "  Install the latest open-source release:\n",
    "    $ liquibase-installer\n\n",
    "  Install a specific Secure release:\n",
    "    $ liquibase-installer secure 5.0.1\n\n",
    "  Preview without downloading:\n",
    "    $ liquibase-installer 4.33.0 --dry-run\n\n",
    "  Install into your home directory:\n",
    "    $ liquibase-installer --prefix ~/.local\n\n",
    "For more information, see: https://github.com/leynos/liquibase-installer",
))]
pub struct Cli {
    /// Version selector (`latest` or X.Y.Z) and edition (`oss` or `secure`), in any order.
    #[arg(value_name = "VERSION|EDITION", num_args = 0..=2)]
    pub positional: Vec<String>,

    /// Show what would be installed and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase diagnostic output (repeatable: -v, -vv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Install under DIR instead of /usr/local or ~/.local.
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<PathBuf>,

    /// Expected SHA-256 of the downloaded archive.
    #[arg(long, value_name = "SHA256")]
    pub checksum: Option<String>,

    /// Token for authenticated release index queries [env: GITHUB_TOKEN].
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Do not modify shell startup files; print instructions instead.
    #[arg(long)]
    pub no_modify_path: bool,

    /// Install a Java runtime with the system package manager if missing.
    #[arg(long)]
    pub install_java: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
