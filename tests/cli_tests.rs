
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;
use test_helpers::{analysis_reply, daybook_command, daybook_command_with_api, today_key};

#[test]
fn test_write_then_history_and_show() {
    let dir = tempdir().unwrap();

    daybook_command(dir.path())
        .args(["write", "Walked", "along", "the", "harbor"])
        .assert()
        .success();

    daybook_command(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains(today_key()))
        .stdout(predicate::str::contains("Walked along the harbor"));

    daybook_command(dir.path())
        .args(["show", &today_key()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Walked along the harbor"));
}

#[test]
fn test_write_rejects_blank_text() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["write", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to write"));
}

#[test]
fn test_show_invalid_and_missing_dates() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["show", "not-a-date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date format"));

    daybook_command(dir.path())
        .args(["show", "19990101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry for 1999-01-01"));
}

#[test]
fn test_history_search_and_empty() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet."));

    daybook_command(dir.path())
        .args(["write", "Lunch with Maria"])
        .assert()
        .success();

    daybook_command(dir.path())
        .args(["history", "--search", "maria"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lunch with Maria"));

    daybook_command(dir.path())
        .args(["history", "--search", "volcano"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet."));
}

#[test]
fn test_analyze_without_key_is_not_an_error() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["write", "Something happened"])
        .assert()
        .success();

    daybook_command(dir.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("An API key is required"));
}

#[test]
fn test_key_set_status_and_clear() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["key", "set", "--value", "sk-abcdefghijklmnop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-abcdefg..."))
        .stdout(predicate::str::contains("klmnop").not());

    daybook_command(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: sk-abcdefg..."));

    daybook_command(dir.path())
        .args(["key", "clear"])
        .assert()
        .success();

    daybook_command(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: not configured"));
}

#[test]
fn test_settings_validation() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["settings", "--chars", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));

    daybook_command(dir.path())
        .args(["settings", "--chars", "1200", "--time", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1200 new characters or 120 seconds"));

    daybook_command(dir.path())
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("1200 new characters"))
        .stdout(predicate::str::contains("Test mode: off"));
}

#[test]
fn test_clear_requires_test_mode_and_confirmation() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["write", "Keep me"])
        .assert()
        .success();

    daybook_command(dir.path())
        .args(["clear", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires test mode"));

    daybook_command(dir.path())
        .args(["settings", "--test-mode", "true"])
        .assert()
        .success();

    daybook_command(dir.path())
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    daybook_command(dir.path())
        .args(["clear", "--yes"])
        .assert()
        .success();

    daybook_command(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet."));
}

#[test]
fn test_export_debug_masks_key() {
    let dir = tempdir().unwrap();
    let export_dir = tempdir().unwrap();
    daybook_command(dir.path())
        .args(["key", "set", "--value", "sk-secretsecretsecret"])
        .assert()
        .success();
    daybook_command(dir.path())
        .args(["write", "Exporting state"])
        .assert()
        .success();

    daybook_command(dir.path())
        .args(["export-debug", "--dir"])
        .arg(export_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("daybook-debug-"));

    let path = export_dir
        .path()
        .join(format!("daybook-debug-{}.json", today_key()));
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("sk-secrets..."));
    assert!(!contents.contains("sk-secretsecretsecret"));
    assert!(contents.contains("Exporting state"));
}

#[test]
fn test_insights_and_suggest_without_data() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .arg("insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("Active days:        0"))
        .stdout(predicate::str::contains("No data for today"));

    daybook_command(dir.path())
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configure your API key"));
}

#[test]
fn test_write_triggers_remote_analysis() {
    let dir = tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(analysis_reply("Beach afternoon"))
        .expect(1)
        .create();

    daybook_command(dir.path())
        .args(["key", "set", "--value", "sk-test-key"])
        .assert()
        .success();
    daybook_command(dir.path())
        .args(["settings", "--chars", "10"])
        .assert()
        .success();

    daybook_command_with_api(dir.path(), &server.url())
        .args(["write", "Spent the afternoon at the beach"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beach afternoon"))
        .stdout(predicate::str::contains("Emotions: happy, relaxed"));

    mock.assert();

    daybook_command(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Beach afternoon"));
}

#[test]
fn test_analyze_falls_back_when_api_fails() {
    let dir = tempdir().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .create();

    daybook_command(dir.path())
        .args(["key", "set", "--value", "sk-test-key"])
        .assert()
        .success();
    daybook_command(dir.path())
        .args(["write", "I feel anxious about work tomorrow"])
        .assert()
        .success();

    daybook_command_with_api(dir.path(), &server.url())
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("(offline analysis)"))
        .stdout(predicate::str::contains("anxious"));
}

#[test]
fn test_key_check_against_api() {
    let dir = tempdir().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/v1/models")
        .with_status(401)
        .create();

    daybook_command(dir.path())
        .args(["key", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key configured"));

    daybook_command(dir.path())
        .args(["key", "set", "--value", "sk-wrong"])
        .assert()
        .success();

    daybook_command_with_api(dir.path(), &server.url())
        .args(["key", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected"));
}

#[test]
fn test_session_reads_stdin_until_quit() {
    let dir = tempdir().unwrap();

    daybook_command(dir.path())
        .arg("session")
        .write_stdin("Morning pages\n/status\n/quit\nnot recorded\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Writing in"))
        .stdout(predicate::str::contains("no API key configured"))
        .stdout(predicate::str::contains("Saved."));

    daybook_command(dir.path())
        .args(["show", &today_key()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morning pages"))
        .stdout(predicate::str::contains("not recorded").not());
}

#[test]
fn test_invalid_log_format_fails() {
    let dir = tempdir().unwrap();
    daybook_command(dir.path())
        .env("DAYBOOK_LOG_FORMAT", "xml")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown log format"));
}
