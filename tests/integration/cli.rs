#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use predicates::{boolean::PredicateBooleanExt, str::contains};
use tempfile::tempdir;

#[test]
fn controls_lists_stop_and_pre_shutdown() {
    let temp = tempdir().expect("failed to create tempdir");

    Command::new(assert_cmd::cargo::cargo_bin!("lifeline"))
        .current_dir(temp.path())
        .arg("controls")
        .assert()
        .success()
        .stdout(contains("0x0101 (STOP | PRESHUTDOWN)"));
}

#[test]
fn invalid_config_fails_before_running() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path(), "tick_interval: 0s\n");

    Command::new(assert_cmd::cargo::cargo_bin!("lifeline"))
        .arg("console")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stdout(contains("has started").not());
}

#[test]
fn missing_config_path_is_reported() {
    let temp = tempdir().expect("failed to create tempdir");
    let missing = temp.path().join("nope.yaml");

    Command::new(assert_cmd::cargo::cargo_bin!("lifeline"))
        .arg("controls")
        .arg("--config")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(contains("nope.yaml"));
}

#[cfg(unix)]
#[test]
fn console_stops_on_sigterm() {
    use std::process::{Command as StdCommand, Stdio};

    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(
        temp.path(),
        r#"service:
  name: ConsoleTest
  display_name: Console Test
  description: Integration test service.
tick_interval: 100ms
"#,
    );

    let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin!("lifeline"))
        .arg("console")
        .arg("--config")
        .arg(&config)
        .arg("--log-level")
        .arg("info")
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn lifeline");

    let lines = common::stream_lines(child.stdout.take().expect("stdout"));
    common::wait_for_line(&lines, "The ConsoleTest service has started.");
    common::wait_for_line(&lines, "The ConsoleTest service is running.");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).expect("failed to signal");

    let tail = common::wait_for_line(&lines, "The ConsoleTest service has stopped.");
    assert!(
        tail.iter()
            .any(|line| line.contains("The ConsoleTest service is stopping.")),
        "missing stop line in {tail:#?}"
    );

    let status = child.wait().expect("failed to wait");
    assert!(status.success());
}
