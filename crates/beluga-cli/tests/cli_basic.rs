//! End-to-end tests against the built `beluga` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn beluga(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_beluga"));
    cmd.env("BELUGA_CONFIG_DIR", config_dir).env_remove("RUST_LOG");
    cmd
}

fn run(config_dir: &Path, args: &[&str]) -> Output {
    beluga(config_dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn config_path_points_into_override_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "path"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        dir.path().join("config.toml").display().to_string()
    );
}

#[test]
fn config_list_shows_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "list"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("focus_minutes = 30"));
    assert!(text.contains("cycles_before_long_break = 3"));
    assert!(text.contains("bind = \"127.0.0.1:5000\""));
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let set = run(dir.path(), &["config", "set", "timer.focus_minutes", "25"]);
    assert!(set.status.success());

    let get = run(dir.path(), &["config", "get", "timer.focus_minutes"]);
    assert_eq!(stdout(&get).trim(), "25");
}

#[test]
fn seed_can_be_set_and_cleared() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run(dir.path(), &["config", "set", "timer.seed", "7"]).status.success());
    let get = run(dir.path(), &["config", "get", "timer.seed"]);
    assert_eq!(stdout(&get).trim(), "7");

    let clear = run(dir.path(), &["config", "set", "timer.seed", "none"]);
    assert!(clear.status.success());
    let get = run(dir.path(), &["config", "get", "timer.seed"]);
    assert_eq!(stdout(&get).trim(), "null");
}

#[test]
fn invalid_config_value_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "set", "timer.focus_minutes", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error:"));

    let get = run(dir.path(), &["config", "get", "timer.focus_minutes"]);
    assert_eq!(stdout(&get).trim(), "30");
}

#[test]
fn unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn chat_script_runs_commands() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = beluga(dir.path())
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start essay\nstatus\npause\npause\ncomplete\nstats\nstop\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("Welcome to Beluga Focus Timer!"));
    assert!(text.contains("Beluga: Focus session started! Focus for 30 minutes"));
    assert!(text.contains("Current task: essay"));
    assert!(text.contains("Beluga: Timer paused"));
    assert!(text.contains("Beluga: No active timer to pause"));
    assert!(text.contains("Beluga: Good job! Take a short break (7 minutes)"));
    assert!(text.contains("• Completed Cycles: 1"));
    assert!(text.contains("Beluga: Timer stopped"));
}

#[test]
fn chat_ends_at_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = beluga(dir.path())
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"help\n").unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("start [task]"));
}

#[test]
fn completions_are_generated() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("beluga"));
}
