//! Tests for command execution helpers and dependency installation.

use super::*;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
use rstest::rstest;
use std::fs;

fn utf8_tempdir() -> (tempfile::TempDir, camino::Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = camino::Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8 temp dir");
    (dir, path)
}

#[test]
fn command_line_display_omits_environment() {
    let command = CommandLine::new("gh")
        .args(["release", "upload", "v1.0.0"])
        .env("GITHUB_TOKEN", "secret");
    assert_eq!(command.to_string(), "gh release upload v1.0.0");
    assert_eq!(command.env_value("GITHUB_TOKEN"), Some("secret"));
}

#[test]
fn env_value_prefers_latest_override() {
    let command = CommandLine::new("cargo")
        .env("RUSTFLAGS", "-C opt-level=3")
        .env("RUSTFLAGS", "-C target-feature=-crt-static");
    assert_eq!(
        command.env_value("RUSTFLAGS"),
        Some("-C target-feature=-crt-static")
    );
    assert_eq!(command.env_value("SDKROOT"), None);
}

#[test]
fn run_checked_reports_stderr_on_failure() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "cargo",
        &["metadata"],
        Ok(failure_output("could not find Cargo.toml")),
    )]);

    let err = run_checked(&executor, &CommandLine::new("cargo").arg("metadata"))
        .expect_err("non-zero exit must fail");
    assert!(matches!(
        &err,
        ReleaseError::ExternalTool { command, reason }
            if command == "cargo metadata" && reason.contains("could not find Cargo.toml")
    ));
    executor.assert_finished();
}

#[test]
fn run_checked_maps_spawn_errors_to_external_tool() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "gh",
        &["--version"],
        Err(ReleaseError::Io(std::io::Error::other("not found"))),
    )]);

    let err = run_checked(&executor, &CommandLine::new("gh").arg("--version"))
        .expect_err("spawn failure must fail");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("not found"));
}

#[rstest]
#[case::binstall_available(true)]
#[case::binstall_missing(false)]
fn install_cargo_tool_prefers_binstall(#[case] binstall: bool) {
    let probe = if binstall {
        Ok(success_output())
    } else {
        Ok(failure_output("no such command: binstall"))
    };
    let install = if binstall {
        ExpectedCall::new(
            "cargo",
            &["binstall", "-y", "--no-symlinks", "cargo-zigbuild"],
            Ok(success_output()),
        )
    } else {
        ExpectedCall::new(
            "cargo",
            &["install", "cargo-zigbuild"],
            Ok(success_output()),
        )
    };
    let executor = StubExecutor::new(vec![
        ExpectedCall::new("cargo", &["binstall", "--version"], probe),
        install,
    ]);

    install_cargo_tool(&executor, "cargo-zigbuild").expect("install succeeds");
    executor.assert_finished();
}

#[test]
fn install_cargo_tool_failure_names_the_tool() {
    let executor = StubExecutor::new(vec![
        ExpectedCall::new(
            "cargo",
            &["binstall", "--version"],
            Ok(failure_output("missing")),
        ),
        ExpectedCall::new(
            "cargo",
            &["install", "cargo-zigbuild"],
            Ok(failure_output("network error")),
        ),
    ]);

    let err = install_cargo_tool(&executor, "cargo-zigbuild").expect_err("install fails");
    assert!(matches!(
        &err,
        ReleaseError::DependencyInstall { tool, message }
            if tool == "cargo-zigbuild" && message.contains("network error")
    ));
}

#[rstest]
#[case::apt(PackageManager::Apt, "sudo apt install -y -q pkg-config libssl-dev")]
#[case::brew(PackageManager::Brew, "brew install pkg-config libssl-dev")]
#[case::choco(PackageManager::Choco, "choco install -y pkg-config libssl-dev")]
fn package_manager_install_commands(#[case] manager: PackageManager, #[case] expected: &str) {
    let command = manager.install_command(&["pkg-config", "libssl-dev"]);
    assert_eq!(command.to_string(), expected);
}

#[test]
fn detect_falls_through_to_choco() {
    let executor = StubExecutor::new(vec![
        ExpectedCall::new("apt", &["--version"], Ok(failure_output(""))),
        ExpectedCall::new(
            "brew",
            &["--version"],
            Err(ReleaseError::Io(std::io::Error::other("not found"))),
        ),
    ]);
    assert_eq!(PackageManager::detect(&executor), PackageManager::Choco);
    executor.assert_finished();
}

#[test]
fn openssl_detected_in_lockfile() {
    let (_guard, root) = utf8_tempdir();
    fs::write(root.join("Cargo.lock"), "name = \"openssl-sys\"\n").expect("write lock");
    assert!(workspace_uses_openssl(&root).expect("scan succeeds"));
}

#[test]
fn openssl_detected_in_nested_manifest_but_not_in_target() {
    let (_guard, root) = utf8_tempdir();
    fs::write(root.join("Cargo.toml"), "[package]\nname = \"app\"\n").expect("write");
    fs::create_dir_all(root.join("target/debug")).expect("mkdir target");
    fs::write(
        root.join("target/debug/Cargo.toml"),
        "openssl = \"0.10\"\n",
    )
    .expect("write ignored manifest");
    assert!(!workspace_uses_openssl(&root).expect("scan succeeds"));

    fs::create_dir_all(root.join("crates/net")).expect("mkdir crate");
    fs::write(
        root.join("crates/net/Cargo.toml"),
        "[dependencies]\nopenssl = \"0.10\"\n",
    )
    .expect("write manifest");
    assert!(workspace_uses_openssl(&root).expect("scan succeeds"));
}

#[test]
fn ensure_openssl_is_a_noop_without_openssl() {
    let (_guard, root) = utf8_tempdir();
    fs::write(root.join("Cargo.toml"), "[package]\nname = \"app\"\n").expect("write");
    let executor = StubExecutor::new(Vec::new());

    ensure_openssl(&executor, &root).expect("nothing to install");
    executor.assert_finished();
}

#[test]
fn ensure_openssl_installs_with_apt() {
    let (_guard, root) = utf8_tempdir();
    fs::write(root.join("Cargo.lock"), "openssl").expect("write lock");
    let executor = StubExecutor::new(vec![
        ExpectedCall::new("apt", &["--version"], Ok(success_output())),
        ExpectedCall::new(
            "sudo",
            &["apt", "install", "-y", "-q", "pkg-config", "libssl-dev"],
            Ok(success_output()),
        ),
    ]);

    ensure_openssl(&executor, &root).expect("install succeeds");
    executor.assert_finished();
}

#[test]
fn mock_executor_sees_environment_overrides() {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .withf(|command| command.env_value("GITHUB_TOKEN") == Some("t0ken"))
        .times(1)
        .returning(|_| Ok(success_output()));

    let command = CommandLine::new("gh").env("GITHUB_TOKEN", "t0ken");
    assert!(command_succeeds(&executor, &command));
}

#[cfg(unix)]
#[test]
fn manifest_scan_does_not_follow_directory_symlinks() {
    let (_guard, root) = utf8_tempdir();
    fs::create_dir_all(root.join("crates/app")).expect("mkdir crate");
    fs::write(root.join("crates/app/Cargo.toml"), "[package]\nname = \"app\"\n")
        .expect("write manifest");
    std::os::unix::fs::symlink(&root, root.join("crates/app/workspace")).expect("create cycle");

    assert!(!workspace_uses_openssl(&root).expect("scan terminates"));
}
