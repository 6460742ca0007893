//! Install target selection.
//!
//! The payload lands in `<prefix>/lib/liquibase` and the launcher in
//! `<prefix>/bin/liquibase`. The prefix is the system-wide `/usr/local` when
//! this process may write there, otherwise `~/.local`. An explicit prefix
//! skips the probe entirely.

use crate::artefact::payload::PRODUCT;
use crate::dirs::{BaseDirs, user_prefix};
use crate::error::{InstallerError, Result};
use camino::Utf8PathBuf;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The system-wide install prefix.
pub const SYSTEM_PREFIX: &str = "/usr/local";

/// How the install prefix was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    /// The system-wide prefix was writable.
    System,
    /// Fell back to the user's `~/.local`.
    User,
    /// Supplied with `--prefix`.
    Custom,
}

impl fmt::Display for InstallScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Custom => "custom",
        })
    }
}

/// Where an installation is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// How the prefix was chosen.
    pub scope: InstallScope,
    /// Base directory holding `lib/` and `bin/`.
    pub prefix: Utf8PathBuf,
    /// Payload directory, `<prefix>/lib/liquibase`.
    pub lib_dir: Utf8PathBuf,
    /// Launcher path, `<prefix>/bin/liquibase`.
    pub bin_link: Utf8PathBuf,
}

impl InstallTarget {
    /// Lay out a target under `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use liquibase_installer::target::{InstallScope, InstallTarget};
    ///
    /// let target = InstallTarget::under(Utf8PathBuf::from("/opt/tools"), InstallScope::Custom);
    /// assert_eq!(target.lib_dir, "/opt/tools/lib/liquibase");
    /// assert_eq!(target.bin_link, "/opt/tools/bin/liquibase");
    /// ```
    #[must_use]
    pub fn under(prefix: Utf8PathBuf, scope: InstallScope) -> Self {
        Self {
            scope,
            lib_dir: prefix.join("lib").join(PRODUCT),
            bin_link: prefix.join("bin").join(PRODUCT),
            prefix,
        }
    }

    /// Directory holding the launcher.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.prefix.join("bin")
    }
}

/// Choose the install target for this run.
///
/// Never creates or modifies anything; writability is probed without
/// writing so the same selection serves dry runs.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] if no home directory can be found when one
/// is needed, or if a path is not valid UTF-8.
pub fn select_target(prefix: Option<&Path>, dirs: &dyn BaseDirs) -> Result<InstallTarget> {
    select_target_with(Path::new(SYSTEM_PREFIX), prefix, dirs)
}

/// Choose the install target with an explicit system prefix.
///
/// # Errors
///
/// As for [`select_target`].
pub fn select_target_with(
    system_prefix: &Path,
    prefix: Option<&Path>,
    dirs: &dyn BaseDirs,
) -> Result<InstallTarget> {
    if let Some(custom) = prefix {
        let expanded = expand_home(custom, dirs)?;
        log::debug!("using requested prefix {}", expanded.display());
        return Ok(InstallTarget::under(utf8(expanded)?, InstallScope::Custom));
    }

    if prefix_is_usable(system_prefix) {
        log::debug!("{} is writable", system_prefix.display());
        return Ok(InstallTarget::under(
            utf8(system_prefix.to_path_buf())?,
            InstallScope::System,
        ));
    }

    let user = user_prefix(dirs).ok_or_else(|| no_home("a user-scoped prefix"))?;
    log::debug!(
        "{} is not writable; using {}",
        system_prefix.display(),
        user.display()
    );
    Ok(InstallTarget::under(utf8(user)?, InstallScope::User))
}

/// Whether `lib/` and `bin/` under `prefix` can be written or created.
fn prefix_is_usable(prefix: &Path) -> bool {
    prefix.is_dir()
        && writable_or_creatable(&prefix.join("lib"))
        && writable_or_creatable(&prefix.join("bin"))
}

fn writable_or_creatable(dir: &Path) -> bool {
    if dir.exists() {
        return is_writable(dir);
    }
    dir.parent().is_some_and(is_writable)
}

/// Probe write permission without touching the filesystem.
#[cfg(unix)]
pub fn is_writable(path: &Path) -> bool {
    rustix::fs::access(path, rustix::fs::Access::WRITE_OK).is_ok()
}

/// Probe write permission without touching the filesystem.
#[cfg(not(unix))]
pub fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| !meta.permissions().readonly())
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path, dirs: &dyn BaseDirs) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs.home_dir().ok_or_else(|| no_home("`~` in --prefix"))?;
    Ok(home.join(rest))
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| {
        InstallerError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("install prefix is not valid UTF-8: {}", path.display()),
        ))
    })
}

fn no_home(purpose: &str) -> InstallerError {
    InstallerError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("could not determine the home directory for {purpose}"),
    ))
}

impl fmt::Display for InstallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} scope)", self.prefix, self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn home() -> TempDir {
        tempfile::tempdir().expect("temp home")
    }

    fn dirs_for(home: &Path) -> MockBaseDirs {
        let home = home.to_path_buf();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(move || Some(home.clone()));
        dirs
    }

    #[rstest]
    fn custom_prefix_wins(home: TempDir) {
        let dirs = MockBaseDirs::new();
        let custom = home.path().join("opt");

        let target = select_target_with(Path::new("/nonexistent"), Some(&custom), &dirs)
            .expect("target");

        assert_eq!(target.scope, InstallScope::Custom);
        assert_eq!(target.lib_dir.as_std_path(), custom.join("lib/liquibase"));
        assert_eq!(target.bin_link.as_std_path(), custom.join("bin/liquibase"));
    }

    #[rstest]
    fn tilde_prefix_expands_to_home(home: TempDir) {
        let dirs = dirs_for(home.path());

        let target = select_target_with(Path::new("/nonexistent"), Some(Path::new("~/.local")), &dirs)
            .expect("target");

        assert_eq!(target.prefix.as_std_path(), home.path().join(".local"));
    }

    #[test]
    fn writable_system_prefix_is_preferred() {
        let system = tempfile::tempdir().expect("system prefix");
        let dirs = MockBaseDirs::new();

        let target = select_target_with(system.path(), None, &dirs).expect("target");

        assert_eq!(target.scope, InstallScope::System);
        assert_eq!(target.prefix.as_std_path(), system.path());
    }

    #[rstest]
    fn missing_system_prefix_falls_back_to_user(home: TempDir) {
        let dirs = dirs_for(home.path());

        let target = select_target_with(Path::new("/nonexistent/usr/local"), None, &dirs)
            .expect("target");

        assert_eq!(target.scope, InstallScope::User);
        assert_eq!(target.bin_link.as_std_path(), home.path().join(".local/bin/liquibase"));
    }

    #[test]
    fn user_fallback_without_home_is_an_error() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(|| None);

        let err = select_target_with(Path::new("/nonexistent"), None, &dirs)
            .expect_err("no home");
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[test]
    fn selection_creates_nothing() {
        let system = tempfile::tempdir().expect("system prefix");
        let dirs = MockBaseDirs::new();

        select_target_with(system.path(), None, &dirs).expect("target");

        let entries = std::fs::read_dir(system.path()).expect("read dir").count();
        assert_eq!(entries, 0);
    }

    #[cfg(unix)]
    #[test]
    fn writable_directory_is_writable() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(is_writable(dir.path()));
        assert!(!is_writable(&dir.path().join("missing")));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        // root bypasses permission bits, so only assert for ordinary users.
        if rustix::process::geteuid().is_root() {
            return;
        }
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555))
            .expect("chmod");

        assert!(!is_writable(dir.path()));

        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755))
            .expect("restore");
    }
}
