//! Payload root discovery inside an extracted archive.
//!
//! Liquibase archives come in two shapes: flat, with the launcher at the top
//! of the archive, and nested, with everything under a version-named
//! directory. [`locate_payload`] runs an ordered list of search strategies and
//! accepts the first candidate that also passes [`is_valid_payload`].

use crate::error::{InstallerError, Result};
use crate::platform::Os;
use std::fs;
use std::path::{Path, PathBuf};

/// Product name shared by executables and distribution directories.
pub const PRODUCT: &str = "liquibase";

/// Unix launcher shipped in the distribution.
pub const UNIX_EXECUTABLE: &str = "liquibase";

/// Windows batch launcher shipped in the distribution.
pub const WINDOWS_EXECUTABLE: &str = "liquibase.bat";

/// Subdirectories of a payload that hold library jars.
const LIBRARY_DIRS: &[&str] = &["", "lib", "internal/lib"];

/// Deepest level searched for executables and product directories. Depth 1 is
/// the extraction root itself, depth 2 is one level of nesting.
const MAX_SEARCH_DEPTH: usize = 2;

/// A strategy for proposing a payload root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// The directory containing a file named like the product launcher.
    ContainsExecutable,
    /// Any directory whose name contains the product name.
    ProductNamedDirectory,
    /// The first top-level directory, in lexical order.
    FirstTopLevelDirectory,
}

impl SearchStrategy {
    /// Strategies in the order they are tried. A directory that looks like the
    /// payload always beats a blind first-subdirectory guess.
    pub const ORDER: [Self; 3] = [
        Self::ContainsExecutable,
        Self::ProductNamedDirectory,
        Self::FirstTopLevelDirectory,
    ];

    /// Propose a candidate under `root`, if this strategy finds one.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] if a directory cannot be read.
    pub fn candidate(self, root: &Path) -> Result<Option<PathBuf>> {
        match self {
            Self::ContainsExecutable => find_executable_dir(root, 1),
            Self::ProductNamedDirectory => find_product_dir(root, 1),
            Self::FirstTopLevelDirectory => Ok(sorted_entries(root)?
                .into_iter()
                .find(|path| path.is_dir())),
        }
    }
}

/// A validated payload root and the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRoot {
    /// Directory holding the distribution files.
    pub path: PathBuf,
    /// Which strategy proposed it.
    pub strategy: SearchStrategy,
}

/// Locate the payload root under `extracted`.
///
/// # Errors
///
/// Returns [`InstallerError::PayloadNotFound`] when no strategy yields a
/// directory that passes validation, or [`InstallerError::Io`] on read errors.
pub fn locate_payload(extracted: &Path) -> Result<PayloadRoot> {
    for strategy in SearchStrategy::ORDER {
        let Some(path) = strategy.candidate(extracted)? else {
            log::trace!("{strategy:?}: no candidate");
            continue;
        };
        if is_valid_payload(&path) {
            log::debug!("payload root {} found by {strategy:?}", path.display());
            return Ok(PayloadRoot { path, strategy });
        }
        log::debug!(
            "{strategy:?}: candidate {} is not a Liquibase payload",
            path.display()
        );
    }
    Err(InstallerError::PayloadNotFound {
        searched: extracted.to_path_buf(),
    })
}

/// Whether `dir` looks like a Liquibase distribution: it contains the unix
/// launcher, the Windows batch launcher, or at least one library jar.
#[must_use]
pub fn is_valid_payload(dir: &Path) -> bool {
    if dir.join(UNIX_EXECUTABLE).is_file() || dir.join(WINDOWS_EXECUTABLE).is_file() {
        return true;
    }
    LIBRARY_DIRS.iter().any(|sub| contains_jar(&dir.join(sub)))
}

/// The payload file the launcher for `os` invokes.
#[must_use]
pub const fn launcher_executable(os: Os) -> &'static str {
    match os {
        Os::Windows => WINDOWS_EXECUTABLE,
        Os::Darwin | Os::Linux => UNIX_EXECUTABLE,
    }
}

/// Check that `payload` ships the executable the launcher for `os` needs.
///
/// A payload can pass [`is_valid_payload`] on its jars alone; installing it
/// would leave a launcher pointing at nothing.
///
/// # Errors
///
/// Returns [`InstallerError::PayloadNotFound`] when the executable is absent.
pub fn require_executable(payload: &Path, os: Os) -> Result<()> {
    let executable = payload.join(launcher_executable(os));
    if executable.is_file() {
        return Ok(());
    }
    log::debug!("payload has no {}", executable.display());
    Err(InstallerError::PayloadNotFound {
        searched: payload.to_path_buf(),
    })
}

fn contains_jar(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        path.is_file() && path.extension().is_some_and(|ext| ext == "jar")
    })
}

fn is_executable_name(name: &str) -> bool {
    name == UNIX_EXECUTABLE || name == WINDOWS_EXECUTABLE
}

fn find_executable_dir(dir: &Path, depth: usize) -> Result<Option<PathBuf>> {
    let entries = sorted_entries(dir)?;
    let has_executable = entries.iter().any(|path| {
        path.is_file()
            && path
                .file_name()
                .is_some_and(|name| is_executable_name(&name.to_string_lossy()))
    });
    if has_executable {
        return Ok(Some(dir.to_path_buf()));
    }
    if depth >= MAX_SEARCH_DEPTH {
        return Ok(None);
    }
    for path in entries.into_iter().filter(|p| p.is_dir()) {
        if let Some(found) = find_executable_dir(&path, depth + 1)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn find_product_dir(dir: &Path, depth: usize) -> Result<Option<PathBuf>> {
    let subdirs: Vec<PathBuf> = sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    if let Some(named) = subdirs.iter().find(|path| {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().to_lowercase().contains(PRODUCT))
    }) {
        return Ok(Some(named.clone()));
    }
    if depth >= MAX_SEARCH_DEPTH {
        return Ok(None);
    }
    for path in subdirs {
        if let Some(found) = find_product_dir(&path, depth + 1)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Directory entries sorted by name so discovery is deterministic.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
