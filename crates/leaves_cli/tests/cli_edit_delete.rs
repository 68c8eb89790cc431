use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("leaves-{nanos}-{name}"))
}

fn write_store(store_dir: &Path) {
    let tasks = serde_json::json!([
        {
            "id": 1,
            "description": "Buy milk",
            "status": "pending",
            "created_at": "2025-12-20T08:00:00Z",
            "deadline": null
        },
        {
            "id": 2,
            "description": "Walk dog",
            "status": "pending",
            "created_at": "2025-12-20T09:00:00Z",
            "deadline": null
        }
    ]);
    std::fs::create_dir_all(store_dir).unwrap();
    std::fs::write(
        store_dir.join("autumn_leaves_notes.json"),
        serde_json::to_string_pretty(&tasks).unwrap(),
    )
    .unwrap();
}

fn read_store(store_dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(store_dir.join("autumn_leaves_notes.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn run_with_input(store_dir: &Path, args: &[&str], input: &str) -> Output {
    let exe = env!("CARGO_BIN_EXE_leaves");
    let mut child = Command::new(exe)
        .args(args)
        .env("LEAVES_STORE_DIR", store_dir)
        .env("LEAVES_CONFIG_PATH", store_dir.join("missing-config.json"))
        .env("LEAVES_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn leaves");

    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("failed to write to stdin");

    child.wait_with_output().expect("failed to read output")
}

fn run(store_dir: &Path, args: &[&str]) -> Output {
    run_with_input(store_dir, args, "")
}

#[test]
fn edit_command_updates_description() {
    let store_dir = temp_path("edit");
    write_store(&store_dir);

    let output = run(&store_dir, &["edit", "1", "  Buy oat milk "]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated note: Buy oat milk (1)"));
    assert_eq!(stored[0]["description"], "Buy oat milk");
    assert_eq!(stored[1]["description"], "Walk dog");
}

#[test]
fn edit_command_reports_missing_id() {
    let store_dir = temp_path("edit-missing");
    write_store(&store_dir);

    let output = run(&store_dir, &["edit", "9", "Anything"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not_found"));
}

#[test]
fn edit_command_rejects_short_text() {
    let store_dir = temp_path("edit-short");
    write_store(&store_dir);

    let output = run(&store_dir, &["edit", "1", "no"]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation_error"));
    assert_eq!(stored[0]["description"], "Buy milk");
}

#[test]
fn toggle_flips_status_and_ignores_missing_id() {
    let store_dir = temp_path("toggle");
    write_store(&store_dir);

    let toggled = run(&store_dir, &["toggle", "2"]);
    let missing = run(&store_dir, &["toggle", "9"]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(toggled.status.success());
    assert!(String::from_utf8_lossy(&toggled.stdout).contains("Marked note 2 as completed"));
    assert!(missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stdout).contains("No note with id 9"));
    assert_eq!(stored[0]["status"], "pending");
    assert_eq!(stored[1]["status"], "completed");
}

#[test]
fn toggle_rejects_non_numeric_id() {
    let store_dir = temp_path("toggle-bad-id");
    write_store(&store_dir);

    let output = run(&store_dir, &["toggle", "abc"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid_input"));
}

#[test]
fn delete_with_yes_removes_note() {
    let store_dir = temp_path("delete");
    write_store(&store_dir);

    let output = run(&store_dir, &["delete", "1", "--yes"]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("» Note deleted"));
    assert!(stdout.contains("Deleted note: Buy milk (1)"));
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["id"], 2);
}

#[test]
fn delete_asks_for_confirmation() {
    let store_dir = temp_path("delete-confirm");
    write_store(&store_dir);

    let declined = run_with_input(&store_dir, &["delete", "1"], "n\n");
    let after_decline = read_store(&store_dir);
    let accepted = run_with_input(&store_dir, &["delete", "1"], "y\n");
    let after_accept = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(declined.status.success());
    assert!(String::from_utf8_lossy(&declined.stdout).contains("Cancelled"));
    assert_eq!(after_decline.as_array().unwrap().len(), 2);
    assert!(accepted.status.success());
    assert_eq!(after_accept.as_array().unwrap().len(), 1);
}

#[test]
fn delete_missing_id_is_not_an_error() {
    let store_dir = temp_path("delete-missing");
    write_store(&store_dir);

    let output = run(&store_dir, &["delete", "9", "--yes"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No note with id 9"));
}

#[test]
fn clear_removes_everything_once_confirmed() {
    let store_dir = temp_path("clear");
    write_store(&store_dir);

    let declined = run_with_input(&store_dir, &["clear"], "\n");
    let after_decline = read_store(&store_dir);
    let cleared = run(&store_dir, &["clear", "--yes"]);
    let after_clear = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(declined.status.success());
    assert_eq!(after_decline.as_array().unwrap().len(), 2);
    assert!(cleared.status.success());
    assert!(String::from_utf8_lossy(&cleared.stdout).contains("Cleared all notes"));
    assert!(after_clear.as_array().unwrap().is_empty());
}
