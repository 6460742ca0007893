//! Launcher creation for the installed payload.
//!
//! Unix targets get a symbolic link at `<prefix>/bin/liquibase` pointing at
//! the payload's executable. Windows shells resolve a link's relative paths
//! from the link's own directory, which would stop the batch launcher from
//! finding its jars, so that target gets small wrapper scripts instead.

use crate::artefact::payload::{UNIX_EXECUTABLE, WINDOWS_EXECUTABLE};
use crate::error::{InstallerError, Result};
use crate::platform::Os;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// How the launcher reaches the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    /// A symbolic link to the payload executable.
    Symlink,
    /// Wrapper scripts that exec the payload by absolute path.
    Wrapper,
}

/// Result of launcher creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    /// Launcher kind.
    pub kind: LauncherKind,
    /// Path on the search path.
    pub path: Utf8PathBuf,
    /// The payload executable it invokes.
    pub target: Utf8PathBuf,
}

/// Create the launcher at `bin_link` for the payload in `lib_dir`.
///
/// Any existing file or link at `bin_link` is replaced. The launcher and the
/// payload executable are made executable.
///
/// # Errors
///
/// Returns [`InstallerError::InstallWrite`] if the bin directory, the link,
/// or a wrapper script cannot be written.
pub fn create_launcher(os: Os, lib_dir: &Utf8Path, bin_link: &Utf8Path) -> Result<Launcher> {
    if let Some(bin_dir) = bin_link.parent() {
        fs::create_dir_all(bin_dir).map_err(|e| write_error(bin_dir, &e))?;
    }
    remove_existing(bin_link)?;

    let launcher = write_launcher(os, lib_dir, bin_link).inspect_err(|_| {
        discard_partial(bin_link);
    })?;
    log::debug!("launcher {} -> {}", launcher.path, launcher.target);
    Ok(launcher)
}

fn write_launcher(os: Os, lib_dir: &Utf8Path, bin_link: &Utf8Path) -> Result<Launcher> {
    let launcher = match os {
        Os::Windows => write_windows_wrappers(lib_dir, bin_link)?,
        Os::Darwin | Os::Linux => link_unix_launcher(lib_dir, bin_link)?,
    };

    make_executable(&launcher.target)?;
    if launcher.kind == LauncherKind::Wrapper {
        make_executable(&launcher.path)?;
    }
    Ok(launcher)
}

/// Remove whatever a failed launcher write left at `bin_link`.
fn discard_partial(bin_link: &Utf8Path) {
    for path in [bin_link.to_owned(), bin_link.with_extension("cmd")] {
        if fs::symlink_metadata(&path).is_ok() && fs::remove_file(&path).is_err() {
            log::warn!("could not remove incomplete launcher {path}");
        }
    }
}

fn remove_existing(path: &Utf8Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
    .map_err(|e| write_error(path, &e))
}

#[cfg(unix)]
fn link_unix_launcher(lib_dir: &Utf8Path, bin_link: &Utf8Path) -> Result<Launcher> {
    let target = lib_dir.join(UNIX_EXECUTABLE);
    std::os::unix::fs::symlink(&target, bin_link).map_err(|e| write_error(bin_link, &e))?;
    Ok(Launcher {
        kind: LauncherKind::Symlink,
        path: bin_link.to_owned(),
        target,
    })
}

#[cfg(not(unix))]
fn link_unix_launcher(lib_dir: &Utf8Path, bin_link: &Utf8Path) -> Result<Launcher> {
    write_windows_wrappers(lib_dir, bin_link)
}

/// Write a POSIX shell wrapper at `bin_link` and a `.cmd` sibling.
///
/// Both exec the payload by absolute path, so the payload's own launcher
/// resolves its support files relative to its real location.
fn write_windows_wrappers(lib_dir: &Utf8Path, bin_link: &Utf8Path) -> Result<Launcher> {
    let target = lib_dir.join(WINDOWS_EXECUTABLE);
    let shell_script = format!(
        r#"#!/usr/bin/env sh
exec "{lib_dir}/{WINDOWS_EXECUTABLE}" "$@"
"#
    );
    fs::write(bin_link, shell_script).map_err(|e| write_error(bin_link, &e))?;

    let cmd_path = bin_link.with_extension("cmd");
    let windows_lib_dir = lib_dir.as_str().replace('/', "\\");
    let cmd_script = format!("@echo off\r\ncall \"{windows_lib_dir}\\{WINDOWS_EXECUTABLE}\" %*\r\n");
    fs::write(&cmd_path, cmd_script).map_err(|e| write_error(&cmd_path, &e))?;

    Ok(Launcher {
        kind: LauncherKind::Wrapper,
        path: bin_link.to_owned(),
        target,
    })
}

/// Set rwxr-xr-x on `path` where the platform has permission bits.
#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| write_error(path, &e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms).map_err(|e| write_error(path, &e))
}

#[cfg(not(unix))]
fn make_executable(path: &Utf8Path) -> Result<()> {
    fs::metadata(path)
        .map(|_| ())
        .map_err(|e| write_error(path, &e))
}

fn write_error(path: &Utf8Path, err: &io::Error) -> InstallerError {
    InstallerError::InstallWrite {
        path: path.to_owned(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Prefix {
        _temp: TempDir,
        lib_dir: Utf8PathBuf,
        bin_link: Utf8PathBuf,
    }

    #[fixture]
    fn prefix() -> Prefix {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let lib_dir = root.join("lib/liquibase");
        fs::create_dir_all(&lib_dir).expect("lib dir");
        fs::write(lib_dir.join(UNIX_EXECUTABLE), "#!/bin/sh\necho 'Liquibase Version: 4.33.0'\n")
            .expect("executable");
        fs::write(lib_dir.join(WINDOWS_EXECUTABLE), "@echo off\r\n").expect("batch");
        Prefix {
            _temp: temp,
            lib_dir,
            bin_link: root.join("bin/liquibase"),
        }
    }

    #[cfg(unix)]
    #[rstest]
    fn unix_launcher_is_a_symlink(prefix: Prefix) {
        use std::os::unix::fs::PermissionsExt;

        let launcher = create_launcher(Os::Linux, &prefix.lib_dir, &prefix.bin_link)
            .expect("launcher");

        assert_eq!(launcher.kind, LauncherKind::Symlink);
        let link = fs::read_link(&prefix.bin_link).expect("symlink");
        assert_eq!(link, prefix.lib_dir.join("liquibase").as_std_path());
        let mode = fs::metadata(&prefix.bin_link)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[cfg(unix)]
    #[rstest]
    fn existing_launcher_is_replaced(prefix: Prefix) {
        fs::create_dir_all(prefix.bin_link.parent().expect("bin dir")).expect("bin dir");
        fs::write(&prefix.bin_link, "stale").expect("stale launcher");

        create_launcher(Os::Darwin, &prefix.lib_dir, &prefix.bin_link).expect("launcher");

        assert!(fs::symlink_metadata(&prefix.bin_link)
            .expect("metadata")
            .file_type()
            .is_symlink());
    }

    #[rstest]
    fn windows_launcher_is_a_wrapper(prefix: Prefix) {
        let launcher = create_launcher(Os::Windows, &prefix.lib_dir, &prefix.bin_link)
            .expect("launcher");

        assert_eq!(launcher.kind, LauncherKind::Wrapper);
        assert!(!fs::symlink_metadata(&prefix.bin_link)
            .expect("metadata")
            .file_type()
            .is_symlink());
        let script = fs::read_to_string(&prefix.bin_link).expect("wrapper");
        assert!(script.contains(&format!("{}/liquibase.bat", prefix.lib_dir)));
        assert!(script.contains("\"$@\""));
        let cmd = fs::read_to_string(prefix.bin_link.with_extension("cmd")).expect("cmd wrapper");
        assert!(cmd.contains("liquibase.bat"));
        assert!(cmd.contains("%*"));
    }

    #[rstest]
    #[case::windows(Os::Windows)]
    #[case::linux(Os::Linux)]
    fn missing_payload_executable_leaves_no_launcher(#[case] os: Os) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let lib_dir = root.join("lib/liquibase");
        fs::create_dir_all(lib_dir.join("internal/lib")).expect("lib dir");
        fs::write(lib_dir.join("internal/lib/liquibase-core.jar"), "jar").expect("jar");
        let bin_link = root.join("bin/liquibase");
        fs::create_dir_all(root.join("bin")).expect("bin dir");
        fs::write(&bin_link, "previous launcher").expect("previous launcher");

        let err = create_launcher(os, &lib_dir, &bin_link).expect_err("missing executable");

        assert!(matches!(err, InstallerError::InstallWrite { .. }));
        assert!(fs::symlink_metadata(&bin_link).is_err(), "launcher left at {bin_link}");
        assert!(!bin_link.with_extension("cmd").exists());
    }
}
