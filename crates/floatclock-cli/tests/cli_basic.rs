//! Basic CLI E2E tests.
//!
//! Each test points `FLOATCLOCK_HOME` at its own temp dir and invokes the
//! built binary.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command against `home` and return (stdout, stderr, code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_floatclock-cli"))
        .args(args)
        .env("FLOATCLOCK_HOME", home)
        .env_remove("FLOATCLOCK_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "pomodoro.work_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1500");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope"), "stderr: {stderr}");
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "mode", "pomodoro"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "mode = pomodoro");

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "mode"]);
    assert_eq!(stdout.trim(), "pomodoro");
    assert!(home.path().join("settings.toml").exists());
}

#[test]
fn test_config_set_repairs_threshold() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["config", "set", "pomodoro.sessions_before_long", "1"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "pomodoro.sessions_before_long = 2");
}

#[test]
fn test_config_set_rejects_garbage() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "sound.enabled", "loud"]);
    assert_eq!(code, 1);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "sound.enabled"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_config_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["mode"], "clock");
    assert_eq!(parsed["pomodoro"]["sessions_before_long"], 4);
}

#[test]
fn test_config_list_lines() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().count(), 12);
    assert!(stdout.contains("countdown.total_secs = 1500"));
}

#[test]
fn test_config_reset() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "countdown.total_secs", "90"]);
    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "countdown.total_secs"]);
    assert_eq!(stdout.trim(), "1500");
}

#[test]
fn test_status_json() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "mode", "countdown"]);
    let (stdout, _, code) = run_cli(home.path(), &["status"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["mode"], "countdown");
    assert_eq!(parsed["running"], false);
    assert_eq!(parsed["countdown"]["remaining_text"], "25:00");
}

#[test]
fn test_status_survives_corrupt_settings() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("settings.toml"), "not = [valid").unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["status"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["mode"], "clock");
}

#[test]
fn test_run_applies_flags_and_quits_on_eof() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["run", "--mode", "countdown", "--preset", "5"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().next(), Some("05:00"));

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "countdown.total_secs"]);
    assert_eq!(stdout.trim(), "300");
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "mode"]);
    assert_eq!(stdout.trim(), "countdown");
}

#[test]
fn test_run_rejects_unknown_mode() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["run", "--mode", "stopwatch"]);
    assert_ne!(code, 0);
}

#[test]
fn test_unusable_home_keeps_timer_running() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let home = blocker.join("sub");

    let (stdout, _, code) = run_cli(&home, &["run", "--mode", "countdown", "--start"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().next(), Some("25:00"));

    let (stdout, _, code) = run_cli(&home, &["status"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["mode"], "clock");

    // Explicit config writes still report the failure.
    let (_, _, code) = run_cli(&home, &["config", "set", "mode", "pomodoro"]);
    assert_eq!(code, 1);
}
