//! Shared test utilities for the installer crate.

use crate::artefact::extraction::ArchiveFormat;
use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout text.
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "java").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected command invocation: {cmd} {}", args.join(" ")),
            });
        };

        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Shapes of distribution archive used as fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// Payload files at the archive root, as upstream ships them.
    Flat,
    /// Payload inside a single top-level directory.
    Nested {
        /// Name of the wrapping directory, e.g. `liquibase-4.33.0`.
        root: String,
    },
    /// Only documentation; no executable, batch file, or jar.
    NoPayload,
    /// Library jars under a `liquibase-<version>` directory, without either
    /// launcher script.
    JarsOnly,
    /// No entries at all.
    Empty,
}

/// Entries of a fixture distribution, relative to the payload root.
const PAYLOAD_FILES: &[(&str, &[u8], u32)] = &[
    ("liquibase", b"#!/bin/sh\necho 'Liquibase Version: 4.33.0'\n", 0o755),
    ("liquibase.bat", b"@echo off\r\necho Liquibase Version: 4.33.0\r\n", 0o644),
    ("internal/lib/liquibase-core.jar", b"PK\x03\x04jar", 0o644),
    ("LICENSE.txt", b"Apache License 2.0\n", 0o644),
];

fn layout_entries(layout: &ArchiveLayout) -> Vec<(String, &'static [u8], u32)> {
    match layout {
        ArchiveLayout::Flat => PAYLOAD_FILES
            .iter()
            .map(|(name, body, mode)| ((*name).to_owned(), *body, *mode))
            .collect(),
        ArchiveLayout::Nested { root } => PAYLOAD_FILES
            .iter()
            .map(|(name, body, mode)| (format!("{root}/{name}"), *body, *mode))
            .collect(),
        ArchiveLayout::NoPayload => vec![("README.md".to_owned(), b"# docs\n".as_slice(), 0o644)],
        ArchiveLayout::JarsOnly => PAYLOAD_FILES
            .iter()
            .filter(|(name, _, _)| name.ends_with(".jar"))
            .map(|(name, body, mode)| (format!("liquibase-4.33.0/{name}"), *body, *mode))
            .collect(),
        ArchiveLayout::Empty => Vec::new(),
    }
}

/// Write a fixture Liquibase distribution archive to `path`.
///
/// # Errors
///
/// Returns any I/O error raised while writing the archive.
pub fn write_distribution_archive(
    path: &Path,
    format: ArchiveFormat,
    layout: &ArchiveLayout,
) -> io::Result<()> {
    let entries = layout_entries(layout);
    let file = File::create(path)?;
    match format {
        ArchiveFormat::TarGz => write_tar_gz(file, &entries),
        ArchiveFormat::Zip => write_zip(file, &entries),
    }
}

fn write_tar_gz(file: File, entries: &[(String, &[u8], u32)]) -> io::Result<()> {
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (name, body, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder.append_data(&mut header, name, *body)?;
    }
    builder.into_inner()?.finish()?.flush()
}

fn write_zip(file: File, entries: &[(String, &[u8], u32)]) -> io::Result<()> {
    let mut writer = zip::ZipWriter::new(file);
    for (name, body, mode) in entries {
        let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
        writer.start_file(name.as_str(), options).map_err(io::Error::other)?;
        writer.write_all(body)?;
    }
    writer.finish().map_err(io::Error::other)?;
    Ok(())
}

/// Run `f` with `HOME` and `PATH` pinned, restoring them afterwards.
pub fn with_home_and_path<R>(home: &Path, path: &str, f: impl FnOnce() -> R) -> R {
    temp_env::with_vars(
        [
            ("HOME", Some(home.as_os_str().to_owned())),
            ("PATH", Some(path.into())),
        ],
        f,
    )
}
