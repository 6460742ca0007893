//! External command execution and the Java runtime prerequisite.
//!
//! Liquibase runs on the JVM. The installer checks for `java` and, when it is
//! missing, points at (or invokes) the host package manager. Package-manager
//! support is deliberately thin: one install command per manager.

use crate::error::{InstallerError, Result};
use crate::platform::Os;
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use liquibase_installer::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("java", &["-version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), liquibase_installer::error::InstallerError>(())
    /// ```
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        log::trace!("exec {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(InstallerError::from)
    }
}

/// Package managers the installer knows how to ask for a Java runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Homebrew (macOS, Linuxbrew).
    Brew,
    /// Debian and Ubuntu.
    Apt,
    /// Fedora and RHEL 8+.
    Dnf,
    /// Older RHEL and CentOS.
    Yum,
    /// Alpine.
    Apk,
    /// Arch Linux.
    Pacman,
    /// openSUSE.
    Zypper,
}

impl PackageManager {
    /// Probe order on Linux; Homebrew is only probed first on macOS.
    const LINUX_ORDER: [Self; 7] = [
        Self::Apt,
        Self::Dnf,
        Self::Yum,
        Self::Apk,
        Self::Pacman,
        Self::Zypper,
        Self::Brew,
    ];

    /// The executable that identifies this manager.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Brew => "brew",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Apk => "apk",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
        }
    }

    /// The Java runtime package name for this manager.
    #[must_use]
    pub const fn java_package(self) -> &'static str {
        match self {
            Self::Brew => "openjdk@17",
            Self::Apt => "openjdk-17-jre-headless",
            Self::Dnf | Self::Yum | Self::Zypper => "java-17-openjdk-headless",
            Self::Apk => "openjdk17-jre-headless",
            Self::Pacman => "jre17-openjdk-headless",
        }
    }

    /// Arguments that install the Java runtime non-interactively.
    #[must_use]
    pub fn install_args(self) -> Vec<&'static str> {
        let package = self.java_package();
        match self {
            Self::Brew => vec!["install", package],
            Self::Apt | Self::Dnf | Self::Yum | Self::Zypper => vec!["install", "-y", package],
            Self::Apk => vec!["add", "--no-cache", package],
            Self::Pacman => vec!["-S", "--noconfirm", package],
        }
    }

    /// The full command line, for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::deps::PackageManager;
    ///
    /// assert_eq!(
    ///     PackageManager::Apt.install_hint(),
    ///     "apt-get install -y openjdk-17-jre-headless"
    /// );
    /// ```
    #[must_use]
    pub fn install_hint(self) -> String {
        format!("{} {}", self.program(), self.install_args().join(" "))
    }

    /// Find the first available manager for `os`.
    #[must_use]
    pub fn detect(executor: &dyn CommandExecutor, os: Os) -> Option<Self> {
        match os {
            Os::Windows => None,
            Os::Darwin => command_succeeds(executor, Self::Brew.program(), &["--version"])
                .then_some(Self::Brew),
            Os::Linux => Self::LINUX_ORDER
                .into_iter()
                .find(|manager| command_succeeds(executor, manager.program(), &["--version"])),
        }
    }
}

/// Whether a Java runtime answers `java -version`.
#[must_use]
pub fn java_available(executor: &dyn CommandExecutor) -> bool {
    command_succeeds(executor, "java", &["-version"])
}

/// Install a Java runtime with `manager`.
///
/// # Errors
///
/// Returns [`InstallerError::DependencyInstall`] if the manager exits
/// unsuccessfully, or [`InstallerError::Io`] if it cannot be spawned.
pub fn install_java(executor: &dyn CommandExecutor, manager: PackageManager) -> Result<()> {
    let args = manager.install_args();
    let output = executor.run(manager.program(), &args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallerError::DependencyInstall {
            manager: manager.program(),
            package: manager.java_package(),
            message: stderr.trim().to_owned(),
        });
    }
    Ok(())
}

/// Returns true if the given command executes successfully.
fn command_succeeds(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> bool {
    executor.run(cmd, args).is_ok_and(|o| o.status.success())
}
