//! Stderr backend for the `log` facade.
//!
//! Library code traces through `log::debug!` and friends. The binary installs
//! [`StderrLogger`] once at startup; the verbosity count picks the maximum
//! level, and warnings are always shown.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

static LOGGER: StderrLogger = StderrLogger;

/// Writes enabled log records to stderr as `[level] target: message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        // Nowhere left to report a failed write to stderr.
        if writeln!(stderr, "{}", format_record(record)).is_err() {}
    }

    fn flush(&self) {
        if std::io::stderr().flush().is_err() {}
    }
}

/// Map a `-v` count to the maximum enabled level.
///
/// # Examples
///
/// ```
/// use liquibase_installer::logging::level_for;
/// use log::LevelFilter;
///
/// assert_eq!(level_for(0), LevelFilter::Warn);
/// assert_eq!(level_for(1), LevelFilter::Debug);
/// assert_eq!(level_for(5), LevelFilter::Trace);
/// ```
#[must_use]
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install [`StderrLogger`] as the global logger.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger was already installed. The maximum
/// level is updated either way.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    log::set_max_level(level_for(verbosity));
    log::set_logger(&LOGGER)
}

/// Render a record the way [`StderrLogger`] prints it.
#[must_use]
pub fn format_record(record: &Record<'_>) -> String {
    let level = record.level().as_str().to_ascii_lowercase();
    match record.level() {
        log::Level::Warn | log::Level::Error => format!("[{level}] {}", record.args()),
        _ => format!("[{level}] {}: {}", record.target(), record.args()),
    }
}
