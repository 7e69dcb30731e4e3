//! CLI smoke tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn cartprobe() -> Command {
    Command::cargo_bin("cartprobe").unwrap()
}

#[test]
fn help_lists_commands() {
    cartprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("content"))
        .stdout(predicate::str::contains("check-baseline"));
}

#[test]
fn list_shows_builtin_sites() {
    cartprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("SingaPrinting"))
        .stdout(predicate::str::contains("button-badges"));
}

#[test]
fn check_baseline_accepts_valid_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prices.json");
    std::fs::write(
        &path,
        r#"{ "Button Badges": { "Circle": [ { "width": 32, "height": 32, "5": 4.4 } ] } }"#,
    )
    .expect("write fixture");

    cartprobe()
        .arg("check-baseline")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("well-formed"));
}

#[test]
fn check_baseline_rejects_malformed_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write fixture");

    cartprobe()
        .arg("check-baseline")
        .arg("--file")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn run_rejects_unknown_site() {
    cartprobe()
        .args(["run", "--site", "unknown-shop", "--product", "button-badges"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown site"));
}
