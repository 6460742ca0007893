//! Host platform detection.
//!
//! Maps the kernel name and machine type reported by `uname` onto closed
//! [`Os`] and [`Arch`] enums. Unknown operating systems abort the run; unknown
//! architectures fall back to x64 because the published archives are Java
//! distributions and carry no native code.

use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use std::fmt;

/// Operating systems the installer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Linux.
    Linux,
    /// Windows via a POSIX emulation layer (Git Bash, MSYS2, Cygwin).
    Windows,
}

impl Os {
    /// Map a kernel name such as `uname -s` prints.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::platform::Os;
    ///
    /// assert_eq!(Os::from_kernel_name("MINGW64_NT-10.0-19045"), Some(Os::Windows));
    /// assert_eq!(Os::from_kernel_name("FreeBSD"), None);
    /// ```
    #[must_use]
    pub fn from_kernel_name(kernel: &str) -> Option<Self> {
        let upper = kernel.trim().to_ascii_uppercase();
        match upper.as_str() {
            "DARWIN" => Some(Self::Darwin),
            "LINUX" => Some(Self::Linux),
            _ if is_windows_kernel(&upper) => Some(Self::Windows),
            _ => None,
        }
    }

    /// Return the normalised tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

fn is_windows_kernel(upper: &str) -> bool {
    const PREFIXES: &[&str] = &["MINGW", "MSYS", "CYGWIN", "WINDOWS"];
    PREFIXES.iter().any(|prefix| upper.starts_with(prefix)) || upper.contains("_NT")
}

/// CPU architectures the installer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86, also used for 32-bit x86 and unrecognised machines.
    X64,
    /// 64-bit ARM.
    Arm64,
}

impl Arch {
    /// Map a machine type such as `uname -m` prints, if it is recognised.
    #[must_use]
    pub fn from_machine(machine: &str) -> Option<Self> {
        match machine.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" | "i386" | "i686" | "x86" => Some(Self::X64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Return the normalised tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

/// The normalised platform for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformTag {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

/// Result of platform detection, including any architecture fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDetection {
    /// The resolved platform.
    pub tag: PlatformTag,
    /// The machine string that was not recognised, when x64 was assumed.
    pub unrecognised_arch: Option<String>,
}

impl PlatformDetection {
    /// Resolve from raw `uname -s` and `uname -m` values.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] for unknown kernels.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquibase_installer::platform::{Arch, PlatformDetection};
    ///
    /// let detected = PlatformDetection::from_uname("Linux", "riscv64").expect("linux");
    /// assert_eq!(detected.tag.arch, Arch::X64);
    /// assert_eq!(detected.unrecognised_arch.as_deref(), Some("riscv64"));
    /// ```
    pub fn from_uname(kernel: &str, machine: &str) -> Result<Self> {
        let os = Os::from_kernel_name(kernel).ok_or_else(|| InstallerError::UnsupportedPlatform {
            os: kernel.trim().to_owned(),
        })?;
        let (arch, unrecognised_arch) = match Arch::from_machine(machine) {
            Some(arch) => (arch, None),
            None => {
                log::warn!("unrecognised architecture \"{}\"; assuming x64", machine.trim());
                (Arch::X64, Some(machine.trim().to_owned()))
            }
        };
        Ok(Self {
            tag: PlatformTag { os, arch },
            unrecognised_arch,
        })
    }
}

/// Detect the host platform.
///
/// Asks `uname` first, as the distributed shell tooling does, so that
/// emulation layers on Windows report themselves. Hosts without `uname` fall
/// back to the compile-time target.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] for unknown kernels.
pub fn detect(executor: &dyn CommandExecutor) -> Result<PlatformDetection> {
    let kernel = uname(executor, "-s").unwrap_or_else(|| fallback_kernel_name().to_owned());
    let machine = uname(executor, "-m").unwrap_or_else(|| std::env::consts::ARCH.to_owned());
    log::debug!("detected kernel \"{kernel}\", machine \"{machine}\"");
    PlatformDetection::from_uname(&kernel, &machine)
}

fn uname(executor: &dyn CommandExecutor, flag: &str) -> Option<String> {
    let output = executor.run("uname", &[flag]).ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    (!value.is_empty()).then_some(value)
}

fn fallback_kernel_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "Darwin",
        "linux" => "Linux",
        "windows" => "Windows_NT",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, stdout_output};
    use rstest::rstest;

    #[rstest]
    #[case::darwin("Darwin", Os::Darwin)]
    #[case::linux("Linux", Os::Linux)]
    #[case::mingw("MINGW64_NT-10.0-19045", Os::Windows)]
    #[case::msys("MSYS_NT-10.0-22631", Os::Windows)]
    #[case::cygwin("CYGWIN_NT-10.0", Os::Windows)]
    #[case::generic_nt("Windows_NT", Os::Windows)]
    fn maps_kernel_names(#[case] kernel: &str, #[case] expected: Os) {
        assert_eq!(Os::from_kernel_name(kernel), Some(expected));
    }

    #[rstest]
    #[case::x86_64("x86_64", Arch::X64)]
    #[case::amd64("amd64", Arch::X64)]
    #[case::aarch64("aarch64", Arch::Arm64)]
    #[case::arm64("arm64", Arch::Arm64)]
    #[case::i386("i386", Arch::X64)]
    #[case::i686("i686", Arch::X64)]
    fn maps_machine_types(#[case] machine: &str, #[case] expected: Arch) {
        let detected = PlatformDetection::from_uname("Linux", machine).expect("linux");
        assert_eq!(detected.tag.arch, expected);
        assert_eq!(detected.unrecognised_arch, None);
    }

    #[test]
    fn unknown_architecture_defaults_to_x64_with_warning() {
        let detected = PlatformDetection::from_uname("Darwin", "ppc64le").expect("darwin");
        assert_eq!(detected.tag, PlatformTag { os: Os::Darwin, arch: Arch::X64 });
        assert_eq!(detected.unrecognised_arch.as_deref(), Some("ppc64le"));
    }

    #[rstest]
    #[case::bsd("FreeBSD")]
    #[case::solaris("SunOS")]
    #[case::empty("")]
    fn unknown_kernel_is_fatal(#[case] kernel: &str) {
        let err = PlatformDetection::from_uname(kernel, "x86_64").expect_err("unsupported");
        assert!(matches!(err, InstallerError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn detect_uses_uname_output() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "uname",
                args: vec!["-s"],
                result: Ok(stdout_output("Linux\n")),
            },
            ExpectedCall {
                cmd: "uname",
                args: vec!["-m"],
                result: Ok(stdout_output("aarch64\n")),
            },
        ]);

        let detected = detect(&executor).expect("detected");
        assert_eq!(detected.tag.to_string(), "linux-arm64");
        executor.assert_finished();
    }

    #[test]
    fn detect_falls_back_to_build_target_without_uname() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "uname",
                args: vec!["-s"],
                result: Ok(failure_output("uname: not found")),
            },
            ExpectedCall {
                cmd: "uname",
                args: vec!["-m"],
                result: Err(std::io::Error::other("not found").into()),
            },
        ]);

        let detected = detect(&executor);
        if cfg!(any(target_os = "linux", target_os = "macos", windows)) {
            assert!(detected.is_ok(), "got {detected:?}");
        }
        executor.assert_finished();
    }
}
