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

fn write_config(store_dir: &Path) -> PathBuf {
    std::fs::create_dir_all(store_dir).unwrap();
    let path = store_dir.join("config.json");
    let config = serde_json::json!({
        "create_delay_ms": 0,
        "aliases": { "p": "list --filter pending" }
    });
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

fn run_interactive(name: &str, input: &str) -> (Output, serde_json::Value) {
    let exe = env!("CARGO_BIN_EXE_leaves");
    let store_dir = temp_path(name);
    let config_path = write_config(&store_dir);

    let mut child = Command::new(exe)
        .env("LEAVES_STORE_DIR", &store_dir)
        .env("LEAVES_CONFIG_PATH", &config_path)
        .env("LEAVES_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("failed to write to stdin");

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");

    let stored = std::fs::read_to_string(store_dir.join("autumn_leaves_notes.json"))
        .map(|content| serde_json::from_str(&content).unwrap())
        .unwrap_or(serde_json::Value::Null);
    std::fs::remove_dir_all(&store_dir).ok();
    (output, stored)
}

#[test]
fn interactive_starts_with_empty_state() {
    let (output, _) = run_interactive("repl-empty", "exit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No notes yet. Add one to get started."));
}

#[test]
fn interactive_help_shows_usage() {
    let (output, _) = run_interactive("repl-help", "help\n?\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("begin-edit"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let (output, _) = run_interactive("repl-invalid", "nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_edit_flow_updates_note() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "begin-edit 1\n",
        "save no\n",
        "save \"Buy oat milk\"\n",
        "exit\n"
    );
    let (output, stored) = run_interactive("repl-edit", input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("* Buy milk"));
    assert!(stdout.contains("» Note updated"));
    assert!(stderr.contains("validation_error"));
    assert_eq!(stored[0]["description"], "Buy oat milk");
}

#[test]
fn interactive_refuses_second_edit() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "add \"Walk dog\"\n",
        "begin-edit 1\n",
        "begin-edit 2\n",
        "cancel\n",
        "begin-edit 2\n",
        "exit\n"
    );
    let (output, stored) = run_interactive("repl-second-edit", input);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("cannot edit note 2 now").count(), 1);
    assert_eq!(stored[0]["description"], "Buy milk");
}

#[test]
fn interactive_search_and_filter_persist_between_commands() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "add \"Walk dog\"\n",
        "toggle 2\n",
        "filter completed\n",
        "search --json walk\n",
        "search --json\n",
        "exit\n"
    );
    let (output, _) = run_interactive("repl-search", input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_lines: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|line| line.starts_with('['))
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[0][0]["description"], "Walk dog");
    assert_eq!(json_lines[1].as_array().unwrap().len(), 1);
}

#[test]
fn interactive_alias_expands() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "add \"Walk dog\"\n",
        "toggle 1\n",
        "p --json\n",
        "exit\n"
    );
    let (output, _) = run_interactive("repl-alias", input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let listed: serde_json::Value = stdout
        .lines()
        .find(|line| line.starts_with('['))
        .map(|line| serde_json::from_str(line).unwrap())
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["description"], "Walk dog");
}

#[test]
fn interactive_delete_reads_confirmation_from_session_input() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "delete 1\n",
        "n\n",
        "delete 1\n",
        "yes\n",
        "exit\n"
    );
    let (output, stored) = run_interactive("repl-delete", input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cancelled"));
    assert!(stdout.contains("Deleted note: Buy milk (1)"));
    assert!(stored.as_array().unwrap().is_empty());
}

#[test]
fn interactive_bare_list_keeps_session_view() {
    let input = concat!(
        "add \"Buy milk\"\n",
        "add \"Walk dog\"\n",
        "toggle 2\n",
        "filter completed\n",
        "list --json\n",
        "list --filter all --json\n",
        "exit\n"
    );
    let (output, _) = run_interactive("repl-bare-list", input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let listed: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|line| line.starts_with('['))
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].as_array().unwrap().len(), 1);
    assert_eq!(listed[0][0]["description"], "Walk dog");
    assert_eq!(listed[1].as_array().unwrap().len(), 2);
}
