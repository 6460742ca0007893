//! Directory resolution abstraction for platform-specific paths.
//!
//! Wraps `directories-next` behind a trait so that target selection and
//! shell startup file discovery can be tested against temporary directories.

use std::path::PathBuf;

/// Well-known directories the installer consults.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The user-scoped install prefix, typically `~/.local`.
///
/// Derived from [`BaseDirs::home_dir`] because Liquibase installs into
/// `<prefix>/lib` and `<prefix>/bin` rather than XDG data directories.
#[must_use]
pub fn user_prefix(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.home_dir().map(|home| home.join(".local"))
}

/// [`BaseDirs`] backed by the host environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prefix_is_dot_local_under_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/test")));

        assert_eq!(user_prefix(&dirs), Some(PathBuf::from("/home/test/.local")));
    }

    #[test]
    fn user_prefix_absent_without_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(|| None);

        assert_eq!(user_prefix(&dirs), None);
    }

    #[cfg(unix)]
    #[test]
    fn system_dirs_follow_home_variable() {
        let temp = tempfile::tempdir().expect("temp dir");
        let prefix = crate::test_utils::with_home_and_path(temp.path(), "/usr/bin", || {
            user_prefix(&SystemBaseDirs)
        });

        assert_eq!(prefix, Some(temp.path().join(".local")));
    }
}
