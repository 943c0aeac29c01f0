//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with `PRAJNA_DATA_DIR` pointing at a fresh
//! temporary directory and verify outputs.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use chrono::Utc;
use prajna_core::timer::{PersistedTimerState, TIMER_STATE_KEY};
use prajna_core::{Database, TimerMode};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_prajna");

fn command(dir: &Path) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env("PRAJNA_DATA_DIR", dir)
        .env_remove("PRAJNA_LOG")
        .stdin(Stdio::null());
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = command(dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let stdout = run_cli_success(dir, args);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_tag_add_and_list() {
    let dir = TempDir::new().unwrap();
    let tag = run_json(dir.path(), &["tag", "add", "  Breath  "]);
    assert_eq!(tag["name"], "Breath");

    run_cli_success(dir.path(), &["tag", "add", "metta"]);
    let tags = run_json(dir.path(), &["tag", "list", "--json"]);
    let names: Vec<_> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Breath", "metta"]);
}

#[test]
fn test_duplicate_tag_fails() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["tag", "add", "Breath"]);
    let (_, stderr, code) = run_cli(dir.path(), &["tag", "add", "breath"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
    assert!(stderr.contains("already exists"), "{stderr}");
}

#[test]
fn test_session_add_list_and_delete() {
    let dir = TempDir::new().unwrap();
    let session = run_json(
        dir.path(),
        &["session", "add", "--minutes", "20", "--date", "2024-03-01", "--tag", "walking"],
    );
    assert_eq!(session["duration_seconds"], 1200);
    assert_eq!(session["source"], "manual");
    assert_eq!(session["date"], "2024-03-01");
    assert_eq!(session["tags"][0]["name"], "walking");

    let id = session["id"].as_i64().unwrap().to_string();
    let listed = run_json(dir.path(), &["session", "list", "--json"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let human = run_cli_success(dir.path(), &["session", "list"]);
    assert!(human.contains("2024-03-01"), "{human}");
    assert!(human.contains("20m"), "{human}");

    run_cli_success(dir.path(), &["session", "delete", &id]);
    let listed = run_json(dir.path(), &["session", "list", "--json"]);
    assert!(listed.as_array().unwrap().is_empty());

    let (_, stderr, code) = run_cli(dir.path(), &["session", "show", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn test_zero_minute_session_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["session", "add", "--minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("greater than 0"), "{stderr}");
}

#[test]
fn test_goal_progress_from_sessions() {
    let dir = TempDir::new().unwrap();
    run_cli_success(
        dir.path(),
        &["session", "add", "--minutes", "90", "--date", "2020-01-10"],
    );
    let goal = run_json(
        dir.path(),
        &[
            "goal", "add", "--hours", "3", "--period", "custom", "--start", "2020-01-01", "--end",
            "2020-01-31",
        ],
    );
    assert_eq!(goal["progress_seconds"], 5400);
    assert_eq!(goal["progress_percent"], 50.0);
    assert_eq!(goal["is_expired"], true);
    assert_eq!(goal["expected_hours"], 3.0);

    let (_, _, code) = run_cli(
        dir.path(),
        &["goal", "add", "--hours", "3", "--period", "custom", "--start", "2020-01-01"],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_stats_summary_json() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["session", "add", "--minutes", "10"]);
    run_cli_success(dir.path(), &["session", "add", "--minutes", "20"]);

    let stats = run_json(dir.path(), &["stats", "summary", "--json"]);
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["total_seconds_all_time"], 1800);
    assert_eq!(stats["average_session_seconds"], 900);
    assert_eq!(stats["current_streak"], 1);
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["config", "get", "recovery.max_hours"]);
    assert_eq!(stdout.trim(), "24");

    run_cli_success(dir.path(), &["config", "set", "stats.week_starts_on", "sunday"]);
    let stdout = run_cli_success(dir.path(), &["config", "get", "stats.week_starts_on"]);
    assert_eq!(stdout.trim(), "sunday");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.nope", "1"]);
    assert_eq!(code, 1);
    assert!(dir.path().join("config.toml").exists());

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "recovery.max_hours", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 1 and 24"), "{stderr}");
}

#[test]
fn test_config_list_matches_file() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "timer.default_duration_min", "20"]);

    let listed = run_cli_success(dir.path(), &["config", "list"]);
    let on_disk = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert_eq!(listed, on_disk);
    assert!(listed.contains("default_duration_min = 20"), "{listed}");

    let json = run_json(dir.path(), &["config", "list", "--json"]);
    assert_eq!(json["timer"]["default_duration_min"], 20);

    let path = run_cli_success(dir.path(), &["config", "path"]);
    assert_eq!(path.trim(), dir.path().join("config.toml").display().to_string());
}

#[test]
fn test_countdown_out_of_range_fails_before_starting() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--minutes", "1441"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 1 and 1440"), "{stderr}");
}

#[test]
fn test_recover_with_nothing_pending() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["timer", "recover", "--accept"]);
    assert!(stdout.contains("no unfinished session"));
}

#[test]
fn test_killed_run_is_recovered() {
    let dir = TempDir::new().unwrap();
    let mut child = command(dir.path())
        .args(["timer", "run", "--tag", "sitting"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn timer run");

    // Wait for the running snapshot to land, then let a second pass.
    let db_path = dir.path().join("prajna.db");
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let persisted = db_path.exists()
            && Database::open_at(&db_path)
                .and_then(|db| db.kv_get(TIMER_STATE_KEY))
                .ok()
                .flatten()
                .is_some();
        if persisted {
            break;
        }
        assert!(Instant::now() < deadline, "timer never persisted its state");
        std::thread::sleep(Duration::from_millis(50));
    }
    std::thread::sleep(Duration::from_millis(1500));
    child.kill().unwrap();
    child.wait().unwrap();

    let saved = run_json(dir.path(), &["timer", "recover", "--accept", "--tag", "sitting"]);
    assert_eq!(saved["source"], "timer");
    assert!(saved["duration_seconds"].as_i64().unwrap() >= 1);
    assert_eq!(saved["tags"][0]["name"], "sitting");

    let stdout = run_cli_success(dir.path(), &["timer", "recover", "--discard"]);
    assert!(stdout.contains("no unfinished session"));
}

/// Leave behind the snapshot of a run that was killed `minutes` ago.
fn plant_abandoned_run(dir: &Path, minutes: i64) {
    let db = Database::open_at(&dir.join("prajna.db")).unwrap();
    let state = PersistedTimerState {
        start_time: Some(Utc::now().timestamp_millis() - minutes * 60 * 1000),
        accumulated_ms: 0,
        is_running: true,
        duration_ms: None,
        mode: Some(TimerMode::OpenEnded),
    };
    db.kv_set(TIMER_STATE_KEY, &state.to_json().unwrap()).unwrap();
}

#[test]
fn test_rejected_arguments_keep_unfinished_session() {
    let dir = TempDir::new().unwrap();
    plant_abandoned_run(dir.path(), 30);

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 1 and 1440"), "{stderr}");

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--tag", "  "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot be empty"), "{stderr}");

    let (_, _, code) = run_cli(dir.path(), &["timer", "recover", "--accept", "--tag", "  "]);
    assert_eq!(code, 1);

    let saved = run_json(dir.path(), &["timer", "recover", "--accept"]);
    assert_eq!(saved["source"], "timer");
    let seconds = saved["duration_seconds"].as_i64().unwrap();
    assert!((1800..1900).contains(&seconds), "{seconds}");
}

#[test]
fn test_exit_at_recovery_prompt_keeps_unfinished_session() {
    let dir = TempDir::new().unwrap();
    plant_abandoned_run(dir.path(), 10);

    let mut child = command(dir.path())
        .args(["timer", "run"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn timer run");

    // Wait for the question, then leave without answering.
    let mut stderr = child.stderr.take().unwrap();
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while !String::from_utf8_lossy(&seen).contains("Save it?") {
        let n = stderr.read(&mut buf).unwrap();
        assert!(n > 0, "prompt never shown: {}", String::from_utf8_lossy(&seen));
        seen.extend_from_slice(&buf[..n]);
    }
    child.kill().unwrap();
    child.wait().unwrap();

    let saved = run_json(dir.path(), &["timer", "recover", "--accept"]);
    assert!(saved["duration_seconds"].as_i64().unwrap() >= 600);
}
