//! Environment configuration after install.
//!
//! Makes the launcher reachable on future shells' search path by appending
//! an export to a shell startup file, then proves the install by invoking
//! the launcher with `--version`.

use crate::artefact::payload::PRODUCT;
use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use crate::platform::Os;
use crate::target::SYSTEM_PREFIX;
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Shell startup files, in preference order, relative to the home directory.
pub const STARTUP_FILES: [&str; 4] = [".bashrc", ".bash_profile", ".zshrc", ".profile"];

/// What [`ensure_on_path`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathUpdate {
    /// The directory is already on this process's search path.
    AlreadyOnPath,
    /// An export line was appended to a startup file.
    Appended {
        /// The startup file that was modified.
        file: PathBuf,
    },
    /// The startup file already carries the export line.
    AlreadyPersisted {
        /// The startup file that was inspected.
        file: PathBuf,
    },
    /// None of the known startup files exist.
    NoStartupFile,
    /// The user opted out of startup file changes.
    Skipped,
}

impl PathUpdate {
    /// Whether a new shell is needed for `liquibase` to resolve by name.
    #[must_use]
    pub const fn needs_new_shell(&self) -> bool {
        !matches!(self, Self::AlreadyOnPath)
    }
}

impl fmt::Display for PathUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOnPath => f.write_str("already on PATH"),
            Self::Appended { file } => write!(f, "added to {}", file.display()),
            Self::AlreadyPersisted { file } => {
                write!(f, "already configured in {}", file.display())
            }
            Self::NoStartupFile => f.write_str("no shell startup file found; not modified"),
            Self::Skipped => f.write_str("not modified (--no-modify-path)"),
        }
    }
}

/// The line appended to a startup file for `dir`.
///
/// # Examples
///
/// ```
/// use liquibase_installer::environment::export_line;
/// use std::path::Path;
///
/// assert_eq!(
///     export_line(Path::new("/home/me/.local/bin")),
///     "export PATH=\"/home/me/.local/bin:$PATH\""
/// );
/// ```
#[must_use]
pub fn export_line(dir: &Path) -> String {
    format!("export PATH=\"{}:$PATH\"", dir.display())
}

/// Instructions for adding `dir` to the search path by hand.
#[must_use]
pub fn path_instructions(dir: &Path) -> String {
    format!(
        concat!(
            "Add the following to your shell profile (~/.bashrc or ~/.zshrc):\n",
            "  {}"
        ),
        export_line(dir)
    )
}

/// Whether `dir` is one of the entries of `search_path`.
#[must_use]
pub fn is_on_search_path(dir: &Path, search_path: Option<&OsStr>) -> bool {
    search_path.is_some_and(|path| std::env::split_paths(path).any(|entry| entry == dir))
}

/// Ensure `dir` will be on the search path of future shells.
///
/// Does nothing when `dir` is already on `search_path`. Otherwise appends an
/// export to the first existing file of [`STARTUP_FILES`] under `home`,
/// unless that file already has it. The running process's environment is
/// never changed.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] if the startup file cannot be read or
/// appended to.
pub fn ensure_on_path(
    dir: &Path,
    home: &Path,
    search_path: Option<&OsStr>,
) -> Result<PathUpdate> {
    if is_on_search_path(dir, search_path) {
        log::debug!("{} is already on PATH", dir.display());
        return Ok(PathUpdate::AlreadyOnPath);
    }

    let Some(file) = STARTUP_FILES
        .iter()
        .map(|name| home.join(name))
        .find(|candidate| candidate.is_file())
    else {
        return Ok(PathUpdate::NoStartupFile);
    };

    let line = export_line(dir);
    let existing = fs::read_to_string(&file)?;
    if existing.lines().any(|l| l.trim() == line) {
        log::debug!("{} already exports {}", file.display(), dir.display());
        return Ok(PathUpdate::AlreadyPersisted { file });
    }

    let mut handle = OpenOptions::new().append(true).open(&file)?;
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    write!(handle, "{separator}\n# Added by liquibase-installer\n{line}\n")?;
    log::debug!("appended PATH export to {}", file.display());
    Ok(PathUpdate::Appended { file })
}

/// A launcher that answered `--version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// The executable that was invoked.
    pub executable: PathBuf,
    /// The version it reported.
    pub version: String,
}

/// Where to look for the installed launcher.
#[derive(Debug, Clone)]
pub struct VerifyProbe<'a> {
    /// Host operating system.
    pub os: Os,
    /// The launcher that was just written.
    pub bin_link: &'a Path,
    /// The user-scoped prefix, if a home directory is known.
    pub user_prefix: Option<PathBuf>,
    /// The live search path.
    pub search_path: Option<OsString>,
}

impl VerifyProbe<'_> {
    /// Candidate executables in probe order, without duplicates.
    ///
    /// The live search path comes first, then the well-known system and
    /// user locations, then the launcher that was just written.
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        let on_path = self.on_path();
        let well_known = [
            Some(Path::new(SYSTEM_PREFIX).join("bin").join(PRODUCT)),
            self.user_prefix
                .as_ref()
                .map(|prefix| prefix.join("bin").join(PRODUCT)),
            Some(self.bin_link.to_path_buf()),
        ];

        let mut candidates: Vec<PathBuf> = Vec::new();
        for path in on_path.into_iter().chain(well_known.into_iter().flatten()) {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        candidates
    }

    /// The `liquibase` the live search path resolves to, when it is some
    /// other executable than the launcher just written.
    ///
    /// Verification still runs that executable first, so its version is the
    /// one reported.
    #[must_use]
    pub fn shadowing_launcher(&self) -> Option<PathBuf> {
        let found = self.on_path()?;
        if same_file(&found, self.bin_link) {
            return None;
        }
        log::debug!(
            "{PRODUCT} on PATH resolves to {}, not {}",
            found.display(),
            self.bin_link.display()
        );
        Some(found)
    }

    fn on_path(&self) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(PRODUCT, self.search_path.as_ref(), cwd).ok()
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Invoke the installed launcher and parse its version.
///
/// # Errors
///
/// Returns [`InstallerError::VerificationFailed`] when no candidate exists
/// or none answers with a parseable version.
pub fn verify(executor: &dyn CommandExecutor, probe: &VerifyProbe<'_>) -> Result<Verification> {
    let mut attempts = Vec::new();
    for candidate in probe.candidates() {
        if !candidate.is_file() {
            log::trace!("{} does not exist", candidate.display());
            continue;
        }
        match invoke_version(executor, probe.os, &candidate) {
            Ok(version) => {
                log::debug!("{} reports version {version}", candidate.display());
                return Ok(Verification {
                    executable: candidate,
                    version,
                });
            }
            Err(reason) => attempts.push(format!("{}: {reason}", candidate.display())),
        }
    }

    let reason = if attempts.is_empty() {
        format!("no {PRODUCT} executable found on PATH or in the standard locations")
    } else {
        attempts.join("; ")
    };
    Err(InstallerError::VerificationFailed { reason })
}

fn invoke_version(
    executor: &dyn CommandExecutor,
    os: Os,
    executable: &Path,
) -> std::result::Result<String, String> {
    let Some(path) = executable.to_str() else {
        return Err("path is not valid UTF-8".to_owned());
    };
    let output = match os {
        // The Windows launcher is a shell wrapper; run it through `sh`.
        Os::Windows => executor.run("sh", &[path, "--version"]),
        Os::Darwin | Os::Linux => executor.run(path, &["--version"]),
    }
    .map_err(|e| e.to_string())?;

    if !output.status.success() {
        return Err(format!("exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_reported_version(&stdout).ok_or_else(|| "no version in output".to_owned())
}

/// Extract the version from `liquibase --version` output.
///
/// # Examples
///
/// ```
/// use liquibase_installer::environment::parse_reported_version;
///
/// let banner = "Starting Liquibase\nLiquibase Version: 4.33.0\nJava Version: 17.0.2\n";
/// assert_eq!(parse_reported_version(banner).as_deref(), Some("4.33.0"));
/// ```
#[must_use]
pub fn parse_reported_version(output: &str) -> Option<String> {
    static LABELLED: OnceLock<Regex> = OnceLock::new();
    static BARE: OnceLock<Regex> = OnceLock::new();
    let labelled = LABELLED.get_or_init(|| {
        Regex::new(r"(?i)liquibase\s+version:?\s*v?(\d+\.\d+\.\d+(?:-[\w.-]+)?)")
            .expect("labelled version pattern is valid")
    });
    let bare = BARE.get_or_init(|| {
        Regex::new(r"\b(\d+\.\d+\.\d+(?:-[\w.-]+)?)\b").expect("bare version pattern is valid")
    });

    labelled
        .captures(output)
        .or_else(|| bare.captures(output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
