use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;

use waste_sorter::{Frame, NewLogEntry, SqliteWasteLogStore, WasteCategory, WasteLogStore};

fn waste_sorter(db: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_waste_sorter"));
    for key in [
        "WASTE_SORTER_CONFIG",
        "WASTE_SORTER_DB",
        "WASTE_SORTER_MODEL",
        "WASTE_SORTER_CAMERA",
        "WASTE_SORTER_UPLOAD_CONF",
    ] {
        cmd.env_remove(key);
    }
    cmd.arg("--db")
        .arg(db)
        .args(["--model", "stub://plastic", "--no-animations", "--ui", "plain"])
        .args(args)
        .output()
        .expect("run waste_sorter")
}

#[test]
fn upload_prints_verdict_when_log_cannot_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let image = dir.path().join("item.png");
    Frame::filled(32, 32, [120, 120, 120]).save(&image)?;
    let db = Path::new("/nonexistent-dir/for/sure/waste.db");

    let output = waste_sorter(db, &["upload", image.to_str().expect("utf-8 temp path")]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stdout.contains("NON-BIODEGRADABLE"), "stdout: {}", stdout);
    assert!(stdout.contains("PLASTIC"), "stdout: {}", stdout);
    assert!(stderr.contains("Waste log unavailable"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn history_reads_fail_when_log_cannot_open() {
    let db = Path::new("/nonexistent-dir/for/sure/waste.db");
    let output = waste_sorter(db, &["history"]);
    assert!(!output.status.success());
}

#[test]
fn history_limit_zero_lists_nothing_for_a_populated_log() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("waste_data.db");
    {
        let mut store = SqliteWasteLogStore::open(db.to_str().expect("utf-8 temp path"))?;
        store.append(&NewLogEntry::new("paper", WasteCategory::Biodegradable, 0.9))?;
        store.append(&NewLogEntry::new("glass", WasteCategory::NonBiodegradable, 0.7))?;
    }

    let output = waste_sorter(&db, &["history", "--limit", "0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(!stdout.contains("No data yet"), "stdout: {}", stdout);
    assert!(!stdout.contains("paper"), "stdout: {}", stdout);

    let output = waste_sorter(&db, &["history", "--limit", "1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("glass"), "stdout: {}", stdout);
    assert!(!stdout.contains("paper"), "stdout: {}", stdout);
    Ok(())
}

#[test]
fn history_of_an_empty_log_says_so() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = waste_sorter(&dir.path().join("waste_data.db"), &["history"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("No data yet"), "stdout: {}", stdout);
    Ok(())
}
