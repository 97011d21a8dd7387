//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory.

use std::path::Path;
use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_resttimer-cli"))
        .args(args)
        .env("RESTTIMER_DATA_DIR", data_dir)
        .env_remove("RESTTIMER_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run a CLI command, expect success and parse each stdout line as JSON.
fn run_json_lines(data_dir: &Path, args: &[&str]) -> Vec<serde_json::Value> {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command {:?} failed: {}", args, stderr);
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("Failed to parse JSON line"))
        .collect()
}

fn last_event(events: &[serde_json::Value]) -> &serde_json::Value {
    events.last().expect("no output")
}

#[test]
fn test_status_on_fresh_dir() {
    let dir = tempfile::tempdir().unwrap();
    let events = run_json_lines(dir.path(), &["timer", "status"]);
    let snap = last_event(&events);
    assert_eq!(snap["type"], "state_snapshot");
    assert_eq!(snap["state"], "idle");
    assert_eq!(snap["target_secs"], 90);
}

#[test]
fn test_start_pause_resume_reset() {
    let dir = tempfile::tempdir().unwrap();

    let started = run_json_lines(
        dir.path(),
        &["timer", "start", "--target", "600", "--exercise", "Squat", "--set", "1", "--sets", "3"],
    );
    let ev = last_event(&started);
    assert_eq!(ev["type"], "rest_started");
    assert_eq!(ev["exercise_label"], "Squat");
    assert_eq!(ev["target_secs"], 600);

    let paused = run_json_lines(dir.path(), &["timer", "pause"]);
    assert_eq!(last_event(&paused)["type"], "rest_paused");

    let status = run_json_lines(dir.path(), &["timer", "status"]);
    assert_eq!(last_event(&status)["state"], "paused");

    let resumed = run_json_lines(dir.path(), &["timer", "resume"]);
    assert_eq!(last_event(&resumed)["type"], "rest_resumed");

    let reset = run_json_lines(dir.path(), &["timer", "reset"]);
    assert_eq!(last_event(&reset)["type"], "rest_reset");
    let status = run_json_lines(dir.path(), &["timer", "status"]);
    assert_eq!(last_event(&status)["state"], "idle");
}

#[test]
fn test_invalid_transition_prints_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let events = run_json_lines(dir.path(), &["timer", "pause"]);
    let snap = last_event(&events);
    assert_eq!(snap["type"], "state_snapshot");
    assert_eq!(snap["state"], "idle");
}

#[test]
fn test_preset_and_adjust() {
    let dir = tempfile::tempdir().unwrap();
    let events = run_json_lines(dir.path(), &["timer", "preset", "strength"]);
    let ev = last_event(&events);
    assert_eq!(ev["type"], "target_changed");
    assert_eq!(ev["target_secs"], 180);

    let events = run_json_lines(dir.path(), &["timer", "adjust", "-200", "--min", "30"]);
    assert_eq!(last_event(&events)["target_secs"], 30);
}

#[test]
fn test_unknown_preset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "preset", "nap"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown preset"));
}

#[test]
fn test_presets_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["presets"]);
    assert_eq!(code, 0);
    let presets: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<_> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"Hypertrophy".to_string()));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "adjust.floor_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "15");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "adjust.floor_secs", "30"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "adjust.floor_secs"]);
    assert_eq!(stdout.trim(), "30");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_history_and_stats_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["history", "list"]);
    assert_eq!(code, 0);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 0);

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_rests"], 0);
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command {:?} failed: {}", args, stderr);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn has_event(events: &[serde_json::Value], kind: &str) -> bool {
    events.iter().any(|e| e["type"] == kind)
}

#[test]
fn test_time_between_invocations_completes_rest() {
    let dir = tempfile::tempdir().unwrap();
    run_json_lines(
        dir.path(),
        &["timer", "start", "--target", "1", "--exercise", "Squat", "--set", "1", "--sets", "3"],
    );
    sleep(Duration::from_millis(1500));

    let events = run_json_lines(dir.path(), &["timer", "status"]);
    assert!(has_event(&events, "gap_reconciled"));
    assert!(has_event(&events, "rest_completed"));
    let snap = last_event(&events);
    assert_eq!(snap["state"], "completed");
    assert_eq!(snap["elapsed_secs"], 1);

    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["exercise_label"], "Squat");

    let stats = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(stats["total_rests"], 1);

    let advanced = run_json_lines(dir.path(), &["timer", "next"]);
    let ev = last_event(&advanced);
    assert_eq!(ev["type"], "set_advanced");
    assert_eq!(ev["set_index"], 2);
    let status = run_json_lines(dir.path(), &["timer", "status"]);
    assert_eq!(last_event(&status)["state"], "idle");
}

#[test]
fn test_history_list_reconciles_finished_rest() {
    let dir = tempfile::tempdir().unwrap();
    run_json_lines(dir.path(), &["timer", "start", "--target", "1", "--exercise", "Dip"]);
    sleep(Duration::from_millis(1500));

    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    let logged = run_json(dir.path(), &["history", "list", "--all"]);
    assert_eq!(logged.as_array().unwrap().len(), 1);

    let status = run_json_lines(dir.path(), &["timer", "status"]);
    assert_eq!(status.len(), 1);
    assert_eq!(last_event(&status)["state"], "completed");
}

#[test]
fn test_history_clear_keeps_rest_log() {
    let dir = tempfile::tempdir().unwrap();
    run_json_lines(dir.path(), &["timer", "start", "--target", "1"]);
    sleep(Duration::from_millis(1500));
    run_json_lines(dir.path(), &["timer", "status"]);

    let (stdout, _, code) = run_cli(dir.path(), &["history", "clear"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "history cleared");

    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().unwrap().len(), 0);
    let logged = run_json(dir.path(), &["history", "list", "--all"]);
    assert_eq!(logged.as_array().unwrap().len(), 1);
}

#[test]
fn test_frequent_status_still_advances() {
    let dir = tempfile::tempdir().unwrap();
    run_json_lines(dir.path(), &["timer", "start", "--target", "60"]);
    for _ in 0..4 {
        sleep(Duration::from_millis(700));
        run_json_lines(dir.path(), &["timer", "status"]);
    }
    let status = run_json_lines(dir.path(), &["timer", "status"]);
    let elapsed = last_event(&status)["elapsed_secs"].as_u64().unwrap();
    assert!(elapsed >= 2, "elapsed_secs = {elapsed}");
    assert!(elapsed < 60);
}

#[test]
fn test_run_counts_down_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let events = run_json_lines(dir.path(), &["timer", "run", "--target", "1", "--exercise", "Row"]);
    assert_eq!(events.first().unwrap()["type"], "rest_started");
    assert!(has_event(&events, "tick"));
    let done = last_event(&events);
    assert_eq!(done["type"], "rest_completed");
    assert_eq!(done["entry"]["exercise_label"], "Row");
    assert_eq!(done["session"]["state"], "completed");

    let stats = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(stats["total_rests"], 1);
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("resttimer-cli"));
}
