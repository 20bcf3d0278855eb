//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own config directory.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_aayra-cli"))
        .args(args)
        .env("AAYRA_CONFIG_DIR", dir.path())
        .env_remove("AAYRA_USER_ID")
        .env_remove("AAYRA_ACCESS_TOKEN")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).expect("event line is JSON"))
        .collect()
}

#[test]
fn test_config_get_default() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["config", "get", "reminders.lead_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "15");
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "reminders.weekly_goal", "6"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&dir, &["config", "get", "reminders.weekly_goal"]);
    assert_eq!(out.trim(), "6");

    let (_, _, code) = run_cli(&dir, &["config", "set", "backend.url", "https://db.example.test"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(&dir, &["config", "set", "backend.url", "none"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&dir, &["config", "get", "backend.url"]);
    assert_eq!(out.trim(), "none");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, err, code) = run_cli(&dir, &["config", "get", "reminders.nope"]);
    assert_eq!(code, 1);
    assert!(err.contains("unknown key"));
}

#[test]
fn test_config_list_and_path() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    let config: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(config["notifications"]["icon"], "/favicon.ico");

    let (out, _, code) = run_cli(&dir, &["config", "path"]);
    assert_eq!(code, 0);
    assert!(out.trim().starts_with(&*dir.path().to_string_lossy()));
}

#[test]
fn test_reminders_plan_json() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        &dir,
        &["reminders", "plan", "--days", "Monday,Thursday", "--time", "18:30", "--json"],
    );
    assert_eq!(code, 0);
    let armed: Vec<Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(armed.len(), 2);
    let tags: Vec<&str> = armed.iter().filter_map(|r| r["dedupe_tag"].as_str()).collect();
    assert!(tags.contains(&"study-reminder-monday-15m"));
    assert!(tags.contains(&"study-reminder-thursday-15m"));
}

#[test]
fn test_reminders_plan_with_follow_up() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        &dir,
        &["reminders", "plan", "--days", "Sat", "--time", "09:00", "--follow-up", "5", "--json"],
    );
    assert_eq!(code, 0);
    let armed: Vec<Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(armed.len(), 2);
}

#[test]
fn test_reminders_plan_rejects_bad_time() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["reminders", "plan", "--days", "Monday", "--time", "25:99"]);
    assert_eq!(code, 1);
}

#[test]
fn test_reminders_run_requires_sign_in() {
    let dir = TempDir::new().unwrap();
    let (_, err, code) = run_cli(&dir, &["reminders", "run", "--once"]);
    assert_eq!(code, 1);
    assert!(err.starts_with("error:"));
}

#[test]
fn test_notify_payload_defaults() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["notify", "payload"]);
    assert_eq!(code, 0);
    let payload: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(payload["title"], "Aayra Study Reminder");
    assert_eq!(payload["requireInteraction"], true);
    assert_eq!(payload["actions"].as_array().unwrap().len(), 2);
}

#[test]
fn test_notify_payload_merges_and_tolerates_garbage() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["notify", "payload", "--data", r#"{"title":"Review"}"#]);
    assert_eq!(code, 0);
    let payload: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(payload["title"], "Review");
    assert_eq!(payload["body"], "Time for your study session!");

    let (out, _, code) = run_cli(&dir, &["notify", "payload", "--data", "not json"]);
    assert_eq!(code, 0);
    let payload: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(payload["title"], "Aayra Study Reminder");
}

#[test]
fn test_notify_test_respects_disabled_notifications() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "notifications.enabled", "false"]);
    let (out, _, code) = run_cli(&dir, &["notify", "test"]);
    assert_eq!(code, 0);
    let line: Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(line["permission"], "denied");
    assert_eq!(line["result"]["outcome"], "suppressed");
}

#[test]
fn test_timer_simulate_warns_once() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        &dir,
        &["timer", "simulate", "--minutes", "10", "--step-secs", "60"],
    );
    assert_eq!(code, 0);
    let events = json_lines(&out);
    let warnings = events
        .iter()
        .filter(|e| e["type"] == "FiveMinuteWarning")
        .count();
    assert_eq!(warnings, 1);
    assert_eq!(events.first().unwrap()["type"], "CountdownStarted");
    assert_eq!(events.last().unwrap()["type"], "CountdownCompleted");
}

#[test]
fn test_timer_simulate_short_break_never_warns() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["timer", "simulate", "--kind", "break"]);
    assert_eq!(code, 0);
    let events = json_lines(&out);
    assert!(events.iter().all(|e| e["type"] != "FiveMinuteWarning"));
    assert_eq!(events.last().unwrap()["type"], "CountdownCompleted");
}

#[test]
fn test_worker_simulate_push_and_click() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        &dir,
        &[
            "worker",
            "simulate",
            "--data",
            r#"{"body":"Review now","data":{"url":"/reviews"}}"#,
            "--click",
            "open",
        ],
    );
    assert_eq!(code, 0);
    assert!(out.contains("🔔 Aayra Study Reminder: Review now"));
    assert!(out.contains("open window http://localhost:8080/reviews"));
    let kinds: Vec<String> = json_lines(&out)
        .iter()
        .filter_map(|m| m["type"].as_str().map(str::to_string))
        .collect();
    assert!(kinds.contains(&"NOTIFICATION_DELIVERED".to_string()));
    assert!(kinds.contains(&"NOTIFICATION_CLICKED".to_string()));
}

#[test]
fn test_worker_waiting_update_ignores_push() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["worker", "simulate", "--replacing"]);
    assert_eq!(code, 0);
    assert!(!out.contains("🔔"));
}

#[test]
fn test_auth_status_from_env() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_aayra-cli"))
        .args(["auth", "status"])
        .env("AAYRA_CONFIG_DIR", dir.path())
        .env("AAYRA_USER_ID", "user-42")
        .env("AAYRA_ACCESS_TOKEN", "token")
        .output()
        .expect("Failed to execute CLI command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("signed in as user-42"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&dir, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(out.contains("aayra-cli"));
}
