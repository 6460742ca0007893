//! Output formatting for the installer CLI.
//!
//! User-facing progress goes through [`Reporter`], which prefixes each line
//! with a level tag and colours it when writing to a terminal. Diagnostic
//! tracing goes through the `log` facade instead; see [`crate::logging`].

use crate::artefact::sha256_digest::Sha256Digest;
use crate::environment::{PathUpdate, Verification};
use crate::platform::PlatformTag;
use crate::release::naming::ResolvedRelease;
use crate::target::InstallTarget;
use std::fmt::Display;
use std::io::{IsTerminal, Write};

/// Write a line to `stderr`, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Progress.
    Info,
    /// A step completed.
    Success,
    /// Something the user should know but that does not stop the run.
    Warn,
    /// The run failed.
    Error,
    /// Remediation advice.
    Hint,
}

impl Level {
    const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Hint => "hint",
        }
    }

    const fn ansi(self) -> &'static str {
        match self {
            Self::Info => "\x1b[34m",
            Self::Success => "\x1b[32m",
            Self::Warn => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Hint => "\x1b[36m",
        }
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// Leveled writer for user-facing messages.
pub struct Reporter<'a> {
    out: &'a mut dyn Write,
    colour: bool,
}

impl<'a> Reporter<'a> {
    /// Create a reporter with explicit colour control.
    pub fn new(out: &'a mut dyn Write, colour: bool) -> Self {
        Self { out, colour }
    }

    /// Create a reporter that colours only when stderr is a terminal and
    /// `NO_COLOR` is unset.
    pub fn for_stderr(out: &'a mut dyn Write) -> Self {
        let colour = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::new(out, colour)
    }

    /// Write a message at `level`.
    pub fn emit(&mut self, level: Level, message: impl Display) {
        let label = level.label();
        if self.colour {
            write_stderr_line(
                self.out,
                format!("{}[{label}]{ANSI_RESET} {message}", level.ansi()),
            );
        } else {
            write_stderr_line(self.out, format!("[{label}] {message}"));
        }
    }

    /// Write a progress message.
    pub fn info(&mut self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    /// Write a completion message.
    pub fn success(&mut self, message: impl Display) {
        self.emit(Level::Success, message);
    }

    /// Write a warning.
    pub fn warn(&mut self, message: impl Display) {
        self.emit(Level::Warn, message);
    }

    /// Write an error.
    pub fn error(&mut self, message: impl Display) {
        self.emit(Level::Error, message);
    }

    /// Write remediation advice.
    pub fn hint(&mut self, message: impl Display) {
        self.emit(Level::Hint, message);
    }

    /// Write untagged text, such as a multi-line report.
    pub fn plain(&mut self, text: impl Display) {
        write_stderr_line(self.out, text);
    }
}

/// What a dry run would do.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use liquibase_installer::output::DryRunInfo;
/// use liquibase_installer::platform::{Arch, Os, PlatformTag};
/// use liquibase_installer::release::edition::Edition;
/// use liquibase_installer::release::naming::ResolvedRelease;
/// use liquibase_installer::release::version::Version;
/// use liquibase_installer::target::{InstallScope, InstallTarget};
///
/// let release = ResolvedRelease::new(
///     Version::parse("5.0.0").expect("valid"),
///     Edition::Secure,
///     Os::Linux,
/// );
/// let target = InstallTarget::under(Utf8PathBuf::from("/usr/local"), InstallScope::System);
/// let info = DryRunInfo {
///     platform: PlatformTag { os: Os::Linux, arch: Arch::X64 },
///     release: &release,
///     target: &target,
///     checksum: None,
///     modify_path: true,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("/releases/secure/5.0.0/"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Detected platform.
    pub platform: PlatformTag,
    /// The release that would be installed.
    pub release: &'a ResolvedRelease,
    /// Where it would be installed.
    pub target: &'a InstallTarget,
    /// Checksum that would be enforced.
    pub checksum: Option<&'a Sha256Digest>,
    /// Whether a shell startup file might be updated.
    pub modify_path: bool,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let checksum = self
            .checksum
            .map_or_else(|| "none supplied".to_owned(), ToString::to_string);
        [
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Platform: {}", self.platform),
            format!("Release: {}", self.release),
            format!("Archive: {}", self.release.archive_name),
            format!("Download URL: {}", self.release.download_url),
            format!("Checksum: {checksum}"),
            format!("Install prefix: {}", self.target),
            format!("Library directory: {}", self.target.lib_dir),
            format!("Launcher: {}", self.target.bin_link),
            format!("Update shell startup file: {}", self.modify_path),
        ]
        .join("\n")
    }
}

/// Report printed after a successful install.
#[derive(Debug)]
pub struct InstallSummary<'a> {
    /// The installed release.
    pub release: &'a ResolvedRelease,
    /// Where it was installed.
    pub target: &'a InstallTarget,
    /// What happened to the search path.
    pub path_update: &'a PathUpdate,
    /// Result of invoking the launcher.
    pub verification: &'a Verification,
}

impl InstallSummary<'_> {
    /// Format the summary for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        [
            format!("Installed {}", self.release),
            format!("  payload:  {}", self.target.lib_dir),
            format!("  launcher: {}", self.target.bin_link),
            format!("  PATH:     {}", self.path_update),
            format!(
                "  verified: {} reports {}",
                self.verification.executable.display(),
                self.verification.version
            ),
        ]
        .join("\n")
    }
}
