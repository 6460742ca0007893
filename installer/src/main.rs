//! Liquibase installer CLI entrypoint.
//!
//! This binary detects the host platform, resolves the requested Liquibase
//! release, installs it under a system or user prefix, and makes the
//! `liquibase` launcher reachable from new shells.

use clap::Parser;
use liquibase_installer::cli::Cli;
use liquibase_installer::config::InstallConfig;
use liquibase_installer::deps::{
    CommandExecutor, PackageManager, SystemCommandExecutor, install_java, java_available,
};
use liquibase_installer::dirs::{BaseDirs, SystemBaseDirs, user_prefix};
use liquibase_installer::environment::{
    PathUpdate, VerifyProbe, ensure_on_path, path_instructions, verify,
};
use liquibase_installer::error::Result;
use liquibase_installer::logging;
use liquibase_installer::output::{DryRunInfo, InstallSummary, Reporter};
use liquibase_installer::pipeline::{self, InstallRequest};
use liquibase_installer::platform::{self, Os};
use liquibase_installer::release::index::GitHubReleaseIndex;
use liquibase_installer::release::naming::ResolvedRelease;
use liquibase_installer::release::resolver::resolve_version;
use liquibase_installer::target::{InstallTarget, select_target};
use std::ffi::OsStr;
use std::path::Path;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and are not failures.
            let code = i32::from(err.use_stderr());
            if err.print().is_err() {}
            std::process::exit(code);
        }
    };

    let mut stderr = std::io::stderr();
    let mut reporter = Reporter::for_stderr(&mut stderr);
    let run_result = InstallConfig::from_cli(&cli).and_then(|config| {
        if logging::init(config.verbosity).is_err() {
            log::debug!("logger already installed");
        }
        report_config_warnings(&config, &mut reporter);
        run(&config, &mut reporter)
    });
    let exit_code = exit_code_for_run_result(run_result, &mut reporter);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn report_config_warnings(config: &InstallConfig, reporter: &mut Reporter<'_>) {
    for warning in &config.warnings {
        reporter.warn(warning);
    }
}

fn run(config: &InstallConfig, reporter: &mut Reporter<'_>) -> Result<()> {
    let executor = SystemCommandExecutor;
    let dirs = SystemBaseDirs;

    // Stage 1: Platform.
    let detection = platform::detect(&executor)?;
    let os = detection.tag.os;
    reporter.info(format!("Detected platform {}", detection.tag));

    // Stage 2: Release.
    let index = GitHubReleaseIndex::new(config.github_token.clone());
    reporter.info(format!("Resolving {} ({})", config.selector, config.edition.as_str()));
    let version = resolve_version(&config.selector, config.edition, &index)?;
    let release = ResolvedRelease::new(version, config.edition, os);
    let target = select_target(config.prefix.as_deref(), &dirs)?;
    log::debug!("install target {target}");

    if config.dry_run {
        check_java(&executor, os, false, reporter)?;
        let info = DryRunInfo {
            platform: detection.tag,
            release: &release,
            target: &target,
            checksum: config.checksum.as_ref(),
            modify_path: !config.skip_path,
        };
        reporter.plain("");
        reporter.plain(info.display_text());
        return Ok(());
    }

    check_java(&executor, os, config.install_java, reporter)?;

    // Stage 3: Artifact.
    reporter.info(format!("Installing {release} to {target}"));
    let request = InstallRequest {
        release: &release,
        target: &target,
        os,
        checksum: config.checksum.as_ref(),
    };
    pipeline::install(&request, reporter)?;

    // Stage 4: Environment.
    let search_path = std::env::var_os("PATH");
    let home = dirs.home_dir();
    let path_update = configure_path(
        config.skip_path,
        &target,
        home.as_deref(),
        search_path.as_deref(),
        reporter,
    )?;
    let probe = VerifyProbe {
        os,
        bin_link: target.bin_link.as_std_path(),
        user_prefix: user_prefix(&dirs),
        search_path,
    };
    let verification = verify(&executor, &probe)?;
    if let Some(other) = probe.shadowing_launcher() {
        reporter.warn(format!(
            "{} comes first on PATH and shadows {}",
            other.display(),
            target.bin_link
        ));
    }

    let summary = InstallSummary {
        release: &release,
        target: &target,
        path_update: &path_update,
        verification: &verification,
    };
    reporter.plain("");
    reporter.plain(summary.display_text());
    if path_update.needs_new_shell() {
        reporter.plain("");
        reporter.info("Open a new shell, then run: liquibase --version");
    }
    Ok(())
}

/// Warns about a missing Java runtime and optionally installs one.
fn check_java(
    executor: &dyn CommandExecutor,
    os: Os,
    install: bool,
    reporter: &mut Reporter<'_>,
) -> Result<()> {
    if java_available(executor) {
        log::debug!("java runtime found");
        return Ok(());
    }
    reporter.warn("no Java runtime found; Liquibase needs Java 11 or newer to run");

    let Some(manager) = PackageManager::detect(executor, os) else {
        reporter.hint("install a Java runtime from https://adoptium.net");
        return Ok(());
    };
    if !install {
        reporter.hint(format!(
            "install one with: {} (or re-run with --install-java)",
            manager.install_hint()
        ));
        return Ok(());
    }

    reporter.info(format!("Installing Java with: {}", manager.install_hint()));
    install_java(executor, manager)?;
    reporter.success("Java runtime installed");
    Ok(())
}

/// Makes the launcher directory reachable from future shells, or explains how.
fn configure_path(
    skip: bool,
    target: &InstallTarget,
    home: Option<&Path>,
    search_path: Option<&OsStr>,
    reporter: &mut Reporter<'_>,
) -> Result<PathUpdate> {
    let bin_dir = target.bin_dir();
    let bin_dir = bin_dir.as_std_path();

    let update = match home {
        _ if skip => PathUpdate::Skipped,
        Some(home) => ensure_on_path(bin_dir, home, search_path)?,
        None => PathUpdate::NoStartupFile,
    };

    match &update {
        PathUpdate::Appended { file } => {
            reporter.success(format!("Added {} to PATH in {}", bin_dir.display(), file.display()));
        }
        PathUpdate::Skipped | PathUpdate::NoStartupFile => {
            reporter.plain(path_instructions(bin_dir));
        }
        PathUpdate::AlreadyOnPath | PathUpdate::AlreadyPersisted { .. } => {}
    }
    Ok(update)
}

fn exit_code_for_run_result(result: Result<()>, reporter: &mut Reporter<'_>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            reporter.error(&err);
            if let Some(hint) = err.remediation() {
                reporter.hint(hint);
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use liquibase_installer::error::InstallerError;
    use liquibase_installer::target::InstallScope;
    use liquibase_installer::test_utils::{
        ExpectedCall, StubExecutor, failure_output, stdout_output, success_output,
    };
    use std::fs;

    fn capture(f: impl FnOnce(&mut Reporter<'_>)) -> String {
        let mut buffer = Vec::new();
        {
            let mut reporter = Reporter::new(&mut buffer, false);
            f(&mut reporter);
        }
        String::from_utf8(buffer).expect("stderr was not UTF-8")
    }

    fn target_in(dir: &Path) -> InstallTarget {
        let prefix = Utf8PathBuf::from_path_buf(dir.join("prefix")).expect("utf8 temp dir");
        InstallTarget::under(prefix, InstallScope::Custom)
    }

    #[test]
    fn config_warnings_are_printed() {
        let cli = Cli::parse_from(["liquibase-installer"]);
        let config = InstallConfig::from_cli_with_env(&cli, |name| {
            (name == "DRY_RUN").then(|| "perhaps".to_owned())
        })
        .expect("config");

        let text = capture(|reporter| report_config_warnings(&config, reporter));
        assert!(text.contains("ignoring DRY_RUN=\"perhaps\""), "stderr: {text}");
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut code = None;
        let text = capture(|reporter| code = Some(exit_code_for_run_result(Ok(()), reporter)));
        assert_eq!(code, Some(0));
        assert!(text.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_hint() {
        let err = InstallerError::VersionNotFound {
            version: "9.9.9".to_owned(),
        };
        let mut code = None;
        let text = capture(|reporter| code = Some(exit_code_for_run_result(Err(err), reporter)));

        assert_eq!(code, Some(1));
        assert!(text.contains("[error] version 9.9.9 not found"));
        assert!(text.contains("[hint] see https://github.com/liquibase/liquibase/releases"));
    }

    #[test]
    fn present_java_needs_no_action() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "java",
            args: vec!["-version"],
            result: Ok(stdout_output("openjdk version \"17.0.2\"")),
        }]);

        let text = capture(|reporter| {
            check_java(&executor, Os::Linux, true, reporter).expect("java present");
        });

        executor.assert_finished();
        assert!(text.is_empty());
    }

    #[test]
    fn missing_java_prints_install_hint() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "java",
                args: vec!["-version"],
                result: Ok(failure_output("java: not found")),
            },
            ExpectedCall {
                cmd: "apt-get",
                args: vec!["--version"],
                result: Ok(success_output()),
            },
        ]);

        let text = capture(|reporter| {
            check_java(&executor, Os::Linux, false, reporter).expect("warning only");
        });

        executor.assert_finished();
        assert!(text.contains("[warn] no Java runtime found"));
        assert!(text.contains("apt-get install -y openjdk-17-jre-headless"));
    }

    #[test]
    fn missing_java_is_installed_on_request() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "java",
                args: vec!["-version"],
                result: Ok(failure_output("java: not found")),
            },
            ExpectedCall {
                cmd: "brew",
                args: vec!["--version"],
                result: Ok(success_output()),
            },
            ExpectedCall {
                cmd: "brew",
                args: vec!["install", "openjdk@17"],
                result: Ok(success_output()),
            },
        ]);

        let text = capture(|reporter| {
            check_java(&executor, Os::Darwin, true, reporter).expect("installed");
        });

        executor.assert_finished();
        assert!(text.contains("[ok] Java runtime installed"));
    }

    #[test]
    fn skipped_path_update_prints_instructions() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(temp.path().join(".bashrc"), "").expect("bashrc");
        let target = target_in(temp.path());

        let mut update = None;
        let text = capture(|reporter| {
            update = Some(
                configure_path(true, &target, Some(temp.path()), None, reporter).expect("skipped"),
            );
        });

        assert_eq!(update, Some(PathUpdate::Skipped));
        assert!(text.contains("export PATH="));
        let bashrc = fs::read_to_string(temp.path().join(".bashrc")).expect("read bashrc");
        assert!(bashrc.is_empty());
    }

    #[test]
    fn path_update_appends_to_startup_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(temp.path().join(".profile"), "# profile\n").expect("profile");
        let target = target_in(temp.path());

        let mut update = None;
        let text = capture(|reporter| {
            let search_path = Some(OsStr::new("/usr/bin"));
            update = Some(
                configure_path(false, &target, Some(temp.path()), search_path, reporter)
                    .expect("appended"),
            );
        });

        assert!(matches!(update, Some(PathUpdate::Appended { .. })));
        assert!(text.contains("[ok] Added"));
    }

    #[test]
    fn unknown_home_falls_back_to_instructions() {
        let temp = tempfile::tempdir().expect("temp dir");
        let target = target_in(temp.path());

        let mut update = None;
        let text = capture(|reporter| {
            update = Some(configure_path(false, &target, None, None, reporter).expect("no home"));
        });

        assert_eq!(update, Some(PathUpdate::NoStartupFile));
        assert!(text.contains(target.bin_dir().as_str()));
    }
}
