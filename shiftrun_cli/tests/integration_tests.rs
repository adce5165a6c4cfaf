//! Integration tests for the shiftrun binary.
//!
//! These tests verify end-to-end behavior including:
//! - Plan generation from workday files
//! - Plan persistence and statistics
//! - CSV export
//! - Rejection of bad inputs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory with an isolated config file
fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[athlete]\nvo2max = 50.0\nstarting_load = 25.0\npeak_load = 55.0\n",
    )
    .expect("Failed to write config");
    temp_dir
}

/// Helper to get the path to the CLI binary, pointed at the test directory
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("shiftrun"));
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir);
    cmd
}

fn write_scenario_workdays(dir: &Path) -> PathBuf {
    let path = dir.join("workdays.json");
    fs::write(
        &path,
        r#"{ "2026-01-01": true, "2026-01-02": true, "2026-01-05": true, "2026-01-06": true }"#,
    )
    .expect("Failed to write workdays");
    path
}

fn load_plan_json(path: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(path).expect("plan file missing");
    serde_json::from_str(&contents).expect("plan file is not JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("shiftrun"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shift-aware running plan generator"));
}

#[test]
fn test_generate_scenario_writes_plan() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let workdays = write_scenario_workdays(dir);

    cli(dir)
        .args(["generate", "--start", "2026-01-01", "--goal", "2026-01-08"])
        .arg("--workdays")
        .arg(&workdays)
        .args(["--event-distance", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan saved to"))
        .stdout(predicate::str::contains("TAPER"));

    let plan = load_plan_json(&dir.join("plan.json"));
    let days = plan["days"].as_array().expect("days array");
    assert_eq!(days.len(), 8);

    for day in days {
        if day["is_workday"].as_bool() == Some(true) {
            assert_ne!(day["category"], "run", "run on workday {}", day["date"]);
        }
    }

    let rest_days = days.iter().filter(|d| d["category"] == "rest").count();
    assert_eq!(rest_days, 1);

    let goal = &days[7];
    assert_eq!(goal["date"], "2026-01-08");
    assert_eq!(goal["category"], "run");
    assert_eq!(goal["run_distance"].as_f64(), Some(8.0));
}

#[test]
fn test_generate_with_shift_file() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let shifts = dir.join("shifts.json");
    fs::write(
        &shifts,
        r#"[
            { "start": "2026-02-03T19:00:00", "end": "2026-02-04T07:00:00" },
            { "start": "2026-02-06T07:00:00", "end": "2026-02-06T19:00:00" }
        ]"#,
    )
    .unwrap();

    cli(dir)
        .args(["generate", "--start", "2026-02-02", "--goal", "2026-02-22", "--quiet"])
        .arg("--workdays")
        .arg(&shifts)
        .assert()
        .success();

    let plan = load_plan_json(&dir.join("plan.json"));
    let days = plan["days"].as_array().unwrap();
    assert_eq!(days.len(), 21);
    for index in [1, 2, 4] {
        assert_eq!(days[index]["is_workday"], true);
        assert_ne!(days[index]["category"], "run");
    }
}

#[test]
fn test_invalid_range_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["generate", "--start", "2026-01-08", "--goal", "2026-01-08"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidInput"));

    cli(dir)
        .args(["generate", "--start", "2026-01-08", "--goal", "2026-01-01"])
        .assert()
        .failure();

    assert!(!dir.join("plan.json").exists());
}

#[test]
fn test_malformed_date_rejected() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["generate", "--start", "01/02/2026", "--goal", "2026-03-01"])
        .assert()
        .failure();
}

#[test]
fn test_stats_on_saved_plan() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["generate", "--start", "2026-03-02", "--goal", "2026-04-26", "--quiet"])
        .assert()
        .success();

    cli(dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan 2026-03-02 → 2026-04-26 (56 days)"))
        .stdout(predicate::str::contains("Long efforts"))
        .stdout(predicate::str::contains("No rule violations"));
}

#[test]
fn test_stats_missing_plan_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .arg("stats")
        .arg("--plan")
        .arg(dir.join("missing.json"))
        .assert()
        .failure();
}

#[test]
fn test_csv_export() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let csv_path = dir.join("export/plan.csv");
    let out = dir.join("custom.json");

    cli(dir)
        .args(["generate", "--start", "2026-01-01", "--goal", "2026-01-14", "--quiet"])
        .arg("--out")
        .arg(&out)
        .arg("--csv")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV:"));

    assert!(out.exists());
    let contents = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 15);
    assert!(lines[0].starts_with("date,phase,category"));
    assert!(lines[1].starts_with("2026-01-01,BASE"));
}

#[test]
fn test_paces_output() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["paces", "--vo2max", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Threshold: 7:50 / mi–8:02 / mi"));
}

#[test]
fn test_corrupted_workday_file_fails_gracefully() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let workdays = dir.join("workdays.json");
    fs::write(&workdays, "{ invalid json }}}}").unwrap();

    cli(dir)
        .args(["generate", "--start", "2026-01-01", "--goal", "2026-02-01"])
        .arg("--workdays")
        .arg(&workdays)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workdays"));

    assert!(!dir.join("plan.json").exists());
}
