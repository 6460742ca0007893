//! Replace-in-place staging of the payload tree.
//!
//! Installs are not merged: any existing `lib/liquibase` is removed before
//! the new payload is copied in, so no file from a previous version survives.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::path::Path;

/// Copies a validated payload into an install target's library directory.
pub struct Stager {
    lib_dir: Utf8PathBuf,
}

impl Stager {
    /// Create a stager for `lib_dir`.
    #[must_use]
    pub fn new(lib_dir: Utf8PathBuf) -> Self {
        Self { lib_dir }
    }

    /// Ensure the parent of the library directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InstallWrite`] if the directory cannot be
    /// created or written.
    pub fn prepare(&self) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|e| write_error(parent, &e))?;

        let test_path = parent.join(".liquibase-installer-test");
        match fs::write(&test_path, b"test") {
            Ok(()) => {
                if fs::remove_file(&test_path).is_err() {
                    log::debug!("could not remove {test_path}");
                }
                Ok(())
            }
            Err(e) => Err(write_error(parent, &e)),
        }
    }

    /// Replace the library directory with a copy of `payload`.
    ///
    /// Returns the number of files copied.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InstallWrite`] if the old installation
    /// cannot be removed or the copy fails part-way. A partial copy is left
    /// in place and is removed by the next run.
    pub fn replace(&self, payload: &Path) -> Result<usize> {
        self.remove_existing()?;
        log::debug!("copying {} into {}", payload.display(), self.lib_dir);
        copy_tree(payload, self.lib_dir.as_std_path()).map_err(|e| write_error(&self.lib_dir, &e))
    }

    /// Remove any existing installation at the library directory.
    fn remove_existing(&self) -> Result<()> {
        let path = self.lib_dir.as_std_path();
        let Ok(meta) = fs::symlink_metadata(path) else {
            return Ok(());
        };
        log::debug!("removing existing installation at {}", self.lib_dir);
        let removed = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| write_error(&self.lib_dir, &e))
    }

    fn parent_dir(&self) -> &Utf8Path {
        self.lib_dir.parent().unwrap_or(&self.lib_dir)
    }
}

/// Recursively copy `src` into `dest`, preserving permissions.
fn copy_tree(src: &Path, dest: &Path) -> io::Result<usize> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
            copied += 1;
        } else {
            fs::copy(&from, &to)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
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

    struct Layout {
        _temp: TempDir,
        payload: Utf8PathBuf,
        lib_dir: Utf8PathBuf,
    }

    #[fixture]
    fn layout() -> Layout {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let payload = root.join("payload");
        fs::create_dir_all(payload.join("internal/lib")).expect("payload dirs");
        fs::write(payload.join("liquibase"), "#!/bin/sh\n").expect("executable");
        fs::write(payload.join("internal/lib/liquibase-core.jar"), "jar").expect("jar");
        Layout {
            _temp: temp,
            payload,
            lib_dir: root.join("prefix/lib/liquibase"),
        }
    }

    #[rstest]
    fn replace_copies_whole_tree(layout: Layout) {
        let stager = Stager::new(layout.lib_dir.clone());
        stager.prepare().expect("prepare");

        let copied = stager.replace(layout.payload.as_std_path()).expect("replace");

        assert_eq!(copied, 2);
        assert!(layout.lib_dir.join("liquibase").is_file());
        assert!(layout.lib_dir.join("internal/lib/liquibase-core.jar").is_file());
    }

    #[rstest]
    fn prepare_leaves_only_the_parent_directory(layout: Layout) {
        let stager = Stager::new(layout.lib_dir.clone());

        stager.prepare().expect("prepare");

        let parent = layout.lib_dir.parent().expect("parent");
        assert!(parent.is_dir());
        assert_eq!(fs::read_dir(parent).expect("read parent").count(), 0);
    }

    #[rstest]
    fn replace_removes_stale_files(layout: Layout) {
        fs::create_dir_all(layout.lib_dir.join("internal/lib")).expect("old install");
        fs::write(layout.lib_dir.join("internal/lib/liquibase-core-4.20.jar"), "old")
            .expect("stale jar");
        let stager = Stager::new(layout.lib_dir.clone());

        stager.replace(layout.payload.as_std_path()).expect("replace");

        assert!(!layout.lib_dir.join("internal/lib/liquibase-core-4.20.jar").exists());
        assert!(layout.lib_dir.join("internal/lib/liquibase-core.jar").is_file());
    }

    #[rstest]
    fn replace_over_a_stray_file(layout: Layout) {
        fs::create_dir_all(layout.lib_dir.parent().expect("parent")).expect("lib dir");
        fs::write(&layout.lib_dir, "not a directory").expect("stray file");
        let stager = Stager::new(layout.lib_dir.clone());

        stager.replace(layout.payload.as_std_path()).expect("replace");

        assert!(layout.lib_dir.is_dir());
    }

    #[cfg(unix)]
    #[rstest]
    fn replace_preserves_executable_bit(layout: Layout) {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(
            layout.payload.join("liquibase"),
            fs::Permissions::from_mode(0o755),
        )
        .expect("chmod");
        let stager = Stager::new(layout.lib_dir.clone());

        stager.replace(layout.payload.as_std_path()).expect("replace");

        let mode = fs::metadata(layout.lib_dir.join("liquibase"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn missing_payload_is_an_install_write_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let lib_dir = Utf8PathBuf::from_path_buf(temp.path().join("lib/liquibase"))
            .expect("utf8 temp dir");
        let stager = Stager::new(lib_dir);

        let err = stager
            .replace(&temp.path().join("missing"))
            .expect_err("copy should fail");
        assert!(matches!(err, InstallerError::InstallWrite { .. }));
    }
}
