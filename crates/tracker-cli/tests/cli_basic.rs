//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway data directory and verify
//! its JSON output.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tracker-cli"))
        .args(args)
        .env("TRACKER_DATA_DIR", data_dir)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn add_habit(data_dir: &Path, name: &str, days: &str) -> String {
    let habit = run_json(data_dir, &["habit", "add", name, "--days", days]);
    habit["id"].as_str().unwrap().to_string()
}

#[test]
fn test_habit_add_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_habit(dir.path(), "Read", "daily");

    let habit = run_json(dir.path(), &["habit", "get", &id]);
    assert_eq!(habit["name"], "Read");
    assert_eq!(habit["streak"], 0);
    assert_eq!(habit["active_days"].as_array().unwrap().len(), 7);
}

#[test]
fn test_habit_add_rejects_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["habit", "add", "  "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("name must not be empty"));

    let (_, stderr, code) = run_cli(dir.path(), &["habit", "add", "Read", "--days", "funday"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown weekday"));
}

#[test]
fn test_habit_done_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_habit(dir.path(), "Stretch", "daily");

    let first = run_json(dir.path(), &["habit", "done", &id]);
    assert_eq!(first["result"], "SUCCESS");
    let second = run_json(dir.path(), &["habit", "done", &id]);
    assert_eq!(second["result"], "NO_UPDATE_NEEDED");

    let habit = run_json(dir.path(), &["habit", "get", &id]);
    assert_eq!(habit["streak"], 1);
}

#[test]
fn test_habit_done_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["habit", "done", "no-such-habit"]);
    assert_ne!(code, 0);
    assert!(stdout.contains("NOT_FOUND"));
}

#[test]
fn test_habit_list_orders_due_first() {
    let dir = tempfile::tempdir().unwrap();
    let done = add_habit(dir.path(), "Alpha", "daily");
    let due = add_habit(dir.path(), "Beta", "daily");
    run_json(dir.path(), &["habit", "done", &done]);

    let list = run_json(dir.path(), &["habit", "list"]);
    let ids: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![due.clone(), done.clone()]);

    let grouped = run_json(dir.path(), &["habit", "list", "--grouped"]);
    assert_eq!(grouped["due"][0]["id"], due.as_str());
    assert_eq!(grouped["done"][0]["id"], done.as_str());
}

#[test]
fn test_habit_edit_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_habit(dir.path(), "Run", "weekdays");

    let edited = run_json(
        dir.path(),
        &["habit", "edit", &id, "--name", "Run 5k", "--days", "sat,sun"],
    );
    assert_eq!(edited["name"], "Run 5k");
    assert_eq!(
        edited["active_days"],
        serde_json::json!([false, false, false, false, false, true, true])
    );

    let (stdout, _, code) = run_cli(dir.path(), &["habit", "delete", &id]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Habit deleted"));
    let (_, _, code) = run_cli(dir.path(), &["habit", "get", &id]);
    assert_ne!(code, 0);
}

#[test]
fn test_users_are_scoped() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["--user", "alice", "habit", "add", "Read"]);

    let bob = run_json(dir.path(), &["--user", "bob", "habit", "list"]);
    assert!(bob.as_array().unwrap().is_empty());
    let alice = run_json(dir.path(), &["--user", "alice", "habit", "list"]);
    assert_eq!(alice.as_array().unwrap().len(), 1);
}

#[test]
fn test_remind_check_and_disable() {
    let dir = tempfile::tempdir().unwrap();
    add_habit(dir.path(), "Read", "daily");

    let plan = run_json(dir.path(), &["remind", "check"]);
    assert_eq!(plan["status"], "scheduled");
    assert_eq!(
        plan["notification"]["body"],
        "Don't forget to complete your habit: Read"
    );

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "reminders.enabled", "false"]);
    assert_eq!(code, 0);
    let plan = run_json(dir.path(), &["remind", "check"]);
    assert_eq!(plan["status"], "disabled");
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "reminders.hour"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "9");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "reminders.hour", "21"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "reminders.hour = 21");
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "reminders.hour"]);
    assert_eq!(stdout.trim(), "21");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "reminders.hour", "99"]);
    assert_ne!(code, 0);
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown configuration key: nope"));
}

#[test]
fn test_config_set_offset_reports_day_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["config", "set", "engine.utc_offset_minutes", "120"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("engine.utc_offset_minutes = 120"));
    assert!(stdout.contains("UTC+02:00"));
}
