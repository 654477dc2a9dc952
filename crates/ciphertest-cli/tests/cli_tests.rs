//! CLI integration tests using assert_cmd.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use ciphertest_core::cipher;
use ciphertest_core::model::{CompletionReason, CompletionRecord, EncryptedPayload, KeyGrid};
use ciphertest_core::progress::TestProgress;

fn ciphertest(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("ciphertest").unwrap();
    cmd.current_dir(dir.path()).env("HOME", dir.path());
    cmd
}

fn small_key() -> KeyGrid {
    KeyGrid::new(vec![vec![1, 2, 3], vec![4, 5, 6]])
}

fn write_payload(dir: &Path, key: &KeyGrid, mask: &[u8]) -> PathBuf {
    let path = dir.join("payload.json");
    cipher::encode(key, mask).unwrap().save_json(&path).unwrap();
    path
}

fn write_small_config(dir: &Path) -> PathBuf {
    write_config(dir, "small.toml", 60)
}

fn write_config(dir: &Path, name: &str, duration_secs: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        format!("first_scored_cell = 3\nlast_cell = 6\nduration_secs = {duration_secs}\n"),
    )
    .unwrap();
    path
}

fn only_record(results: &Path) -> CompletionRecord {
    let records: Vec<PathBuf> = std::fs::read_dir(results)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("record-"))
        })
        .collect();
    assert_eq!(records.len(), 1, "expected one record in {}", results.display());
    CompletionRecord::load_json(&records[0]).unwrap()
}

#[test]
fn decrypt_prints_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("payload.json"),
        r#"{"data": [[5, 6]], "mask": [1, 2]}"#,
    )
    .unwrap();

    ciphertest(&dir)
        .args(["decrypt", "--payload", "payload.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"))
        .stdout(predicate::str::contains("2 cells, mask length 2"));
}

#[test]
fn decrypt_rejects_empty_mask() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("payload.json"),
        r#"{"data": [[5, 6]], "mask": []}"#,
    )
    .unwrap();

    ciphertest(&dir)
        .args(["decrypt", "--payload", "payload.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mask is empty"));
}

#[test]
fn encode_output_decrypts_to_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("key.json"), "[[1,2,3],[4,5,6]]").unwrap();

    ciphertest(&dir)
        .args(["encode", "--key", "key.json", "--mask", "9,4", "--output", "out.json"])
        .assert()
        .success();

    let payload = EncryptedPayload::load_json(&dir.path().join("out.json")).unwrap();
    assert_eq!(payload.mask, vec![9, 4]);
    assert_eq!(cipher::decrypt(&payload).unwrap(), small_key());
}

#[test]
fn encode_rejects_bad_mask() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("key.json"), "[[1]]").unwrap();

    ciphertest(&dir)
        .args(["encode", "--key", "key.json", "--mask", "1,nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid mask value"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    ciphertest(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ciphertest.toml"))
        .stdout(predicate::str::contains("Created payload.json"));

    assert!(dir.path().join("ciphertest.toml").exists());
    assert!(dir.path().join("payload.json").exists());

    ciphertest(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_sample_payload() {
    let dir = TempDir::new().unwrap();
    ciphertest(&dir).arg("init").assert().success();

    ciphertest(&dir)
        .args(["validate", "--payload", "payload.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("120 cells in 12 rows"))
        .stdout(predicate::str::contains("scored cells 11-120"))
        .stdout(predicate::str::contains("Payload valid"));
}

#[test]
fn validate_rejects_short_payload() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[3]);

    ciphertest(&dir)
        .args(["validate", "--payload", "payload.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("payload has 6 cells"));
}

#[test]
fn validate_reads_layout_from_env() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[3]);

    ciphertest(&dir)
        .args(["validate", "--payload", "payload.json"])
        .env("CIPHERTEST_FIRST_SCORED_CELL", "3")
        .env("CIPHERTEST_LAST_CELL", "6")
        .assert()
        .success()
        .stdout(predicate::str::contains("Practice cells 1-2, scored cells 3-6"))
        .stdout(predicate::str::contains("90s on the clock"))
        .stdout(predicate::str::contains("Payload valid"));
}

#[test]
fn env_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[3]);
    write_small_config(dir.path());

    ciphertest(&dir)
        .args(["validate", "--payload", "payload.json", "--config", "small.toml"])
        .env("CIPHERTEST_DURATION_SECS", "45")
        .assert()
        .success()
        .stdout(predicate::str::contains("scored cells 3-6, 45s on the clock"));
}

#[test]
fn malformed_env_override_fails() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[3]);

    ciphertest(&dir)
        .args(["validate", "--payload", "payload.json"])
        .env("CIPHERTEST_FIRST_SCORED_CELL", "3")
        .env("CIPHERTEST_LAST_CELL", "six")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "CIPHERTEST_LAST_CELL must be a non-negative integer, got 'six'",
        ));
}

#[test]
fn validate_nonexistent_payload() {
    let dir = TempDir::new().unwrap();

    ciphertest(&dir)
        .args(["validate", "--payload", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn run_completes_through_keypad() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[2, 7, 1]);
    write_small_config(dir.path());

    ciphertest(&dir)
        .args([
            "run",
            "--payload",
            "payload.json",
            "--config",
            "small.toml",
            "--progress",
            "progress.json",
            "--output",
            "results",
        ])
        .write_stdin("12\n3 4 5 6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 4"));

    let progress = TestProgress::load_json(&dir.path().join("progress.json")).unwrap();
    assert_eq!(progress.score, Some(4));
    assert!(progress.server_data.is_some());

    let record = only_record(&dir.path().join("results"));
    assert_eq!(record.reason, CompletionReason::AllAnswered);
    assert_eq!(record.last_answered_cell, 6);
    assert_eq!(record.score, 4);
}

#[test]
fn run_scores_only_correct_answers() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[5]);
    write_small_config(dir.path());

    ciphertest(&dir)
        .args(["run", "--payload", "payload.json", "--config", "small.toml"])
        .write_stdin("99\n3 9 9 9\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 1"));

    assert!(dir
        .path()
        .join("ciphertest-results")
        .join("progress.json")
        .exists());
}

#[test]
fn run_resumes_from_saved_progress() {
    let dir = TempDir::new().unwrap();
    let progress = TestProgress {
        server_data: Some(cipher::encode(&small_key(), &[8, 8]).unwrap()),
        score: None,
    };
    progress.save_json(&dir.path().join("progress.json")).unwrap();
    write_small_config(dir.path());

    ciphertest(&dir)
        .args(["run", "--config", "small.toml", "--progress", "progress.json"])
        .write_stdin("00\n3456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 4"));

    let saved = TestProgress::load_json(&dir.path().join("progress.json")).unwrap();
    assert_eq!(saved.server_data, progress.server_data);
    assert_eq!(saved.score, Some(4));
}

#[test]
fn run_ends_when_countdown_expires() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[4, 1]);
    write_config(dir.path(), "quick.toml", 1);

    // Stdin stays open so only the countdown can end the run.
    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_ciphertest"))
        .args([
            "run",
            "--payload",
            "payload.json",
            "--config",
            "quick.toml",
            "--output",
            "results",
        ])
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"00\n3\n").unwrap();
    stdin.flush().unwrap();

    let give_up = Instant::now() + Duration::from_secs(20);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > give_up {
            child.kill().ok();
            panic!("run did not end after the countdown expired");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    drop(stdin);
    assert!(status.success());

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();
    assert!(stdout.contains("Score: 1"), "stdout: {stdout}");

    let record = only_record(&dir.path().join("results"));
    assert_eq!(record.reason, CompletionReason::TimerExpired);
    assert_eq!(record.last_answered_cell, 3);
    assert_eq!(record.score, 1);

    let progress =
        TestProgress::load_json(&dir.path().join("results").join("progress.json")).unwrap();
    assert_eq!(progress.score, Some(1));
}

#[test]
fn run_abandoned_when_input_closes() {
    let dir = TempDir::new().unwrap();
    write_payload(dir.path(), &small_key(), &[1, 2]);
    write_small_config(dir.path());

    ciphertest(&dir)
        .args(["run", "--payload", "payload.json", "--config", "small.toml"])
        .write_stdin("1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score").not())
        .stderr(predicate::str::contains("abandoned"));

    assert!(!dir.path().join("ciphertest-results").exists());
}

#[test]
fn run_without_payload_fails() {
    let dir = TempDir::new().unwrap();
    write_small_config(dir.path());

    ciphertest(&dir)
        .args(["run", "--config", "small.toml"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no payload"));
}
