//! Integration tests for the `pivot` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_jsonl(path: &Path, lines: &[Value]) {
    let mut content = String::new();
    for line in lines {
        content.push_str(&serde_json::to_string(line).unwrap());
        content.push('\n');
    }
    fs::write(path, content).unwrap();
}

fn user(id: &str, parent: Option<&str>, text: &str) -> Value {
    json!({
        "type": "message",
        "id": id,
        "parentId": parent,
        "timestamp": "2025-01-01T00:00:00Z",
        "message": {"role": "user", "content": text}
    })
}

fn assistant(id: &str, parent: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "id": id,
        "parentId": parent,
        "timestamp": "2025-01-01T00:00:01Z",
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    })
}

/// start -> hello -> { left , right }, last entry `u3`.
fn write_forked_session(dir: &Path) -> PathBuf {
    let path = dir.join("forked.jsonl");
    write_jsonl(
        &path,
        &[
            json!({"type": "session", "id": "s1", "cwd": "/work/demo"}),
            user("u1", None, "start"),
            assistant("a1", "u1", "hello"),
            user("u2", Some("a1"), "left"),
            user("u3", Some("a1"), "right"),
        ],
    );
    path
}

fn pivot(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pivot");
    cmd.env("PIVOT_HOME", home.path()).env_remove("PIVOT_LOG");
    cmd
}

#[test]
fn test_help_shows_all_commands() {
    let home = TempDir::new().unwrap();
    pivot(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("fold"));
}

#[test]
fn test_sessions_lists_files_with_titles() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("sessions");
    fs::create_dir_all(&dir).unwrap();
    write_forked_session(&dir);

    pivot(&home)
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("4 messages"))
        .stdout(predicate::str::contains("forked.jsonl"));
}

#[test]
fn test_sessions_empty_dir() {
    let home = TempDir::new().unwrap();
    pivot(&home)
        .args(["sessions", "--dir"])
        .arg(home.path().join("missing"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions found"));
}

#[test]
fn test_tree_draws_fork_with_active_branch_first() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    pivot(&home)
        .arg("tree")
        .arg(&path)
        .assert()
        .success()
        .stdout("  • start\n  • hello\n  ├─ • right\n  └─ left\n");
}

#[test]
fn test_tree_with_leaf_moves_active_branch() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    pivot(&home)
        .arg("tree")
        .arg(&path)
        .args(["--leaf", "u2"])
        .assert()
        .success()
        .stdout("  • start\n  • hello\n  ├─ • left\n  └─ right\n");
}

#[test]
fn test_tree_user_only_filter() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    pivot(&home)
        .arg("tree")
        .arg(&path)
        .args(["--filter", "user-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello").not())
        .stdout(predicate::str::contains("start"));
}

#[test]
fn test_tree_rejects_unknown_leaf_and_filter() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    pivot(&home)
        .arg("tree")
        .arg(&path)
        .args(["--leaf", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entry id: nope"));

    pivot(&home)
        .arg("tree")
        .arg(&path)
        .args(["--filter", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown filter 'bogus'"));
}

#[test]
fn test_tree_json_rows() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    let output = pivot(&home)
        .arg("tree")
        .arg(&path)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["u1", "a1", "u3", "u2"]);
    assert_eq!(rows[2]["is_leaf"], json!(true));
    assert_eq!(rows[3]["on_active_path"], json!(false));
}

#[test]
fn test_show_prints_active_branch() {
    let home = TempDir::new().unwrap();
    let path = write_forked_session(home.path());

    pivot(&home)
        .arg("show")
        .arg(&path)
        .args(["--leaf", "u2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("demo\n"))
        .stdout(predicate::str::contains("> start"))
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("> left"))
        .stdout(predicate::str::contains("right").not());
}

#[test]
fn test_show_missing_file_fails_with_path() {
    let home = TempDir::new().unwrap();
    pivot(&home)
        .arg("show")
        .arg(home.path().join("absent.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.jsonl"));
}

#[test]
fn test_fold_event_stream() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("events.jsonl");
    let mut lines: Vec<String> = [
        json!({"type": "user_message", "text": "list files"}),
        json!({"type": "agent_start"}),
        json!({"type": "message_start", "role": "assistant"}),
        json!({"type": "message_update", "role": "assistant", "deltaType": "text_delta", "delta": "Hel"}),
        json!({"type": "message_update", "role": "assistant", "deltaType": "text_delta", "delta": "lo"}),
        json!({"type": "tool_execution_start", "callId": "c1", "toolName": "bash", "args": {"command": "ls"}}),
        json!({"type": "tool_execution_end", "callId": "c1", "toolName": "bash", "result": "a.txt", "isError": false}),
        json!({"type": "message_end", "role": "assistant"}),
        json!({"type": "agent_end"}),
    ]
    .iter()
    .map(|v| serde_json::to_string(v).unwrap())
    .collect();
    lines.insert(3, "{not json".to_string());
    fs::write(&path, lines.join("\n")).unwrap();

    pivot(&home)
        .arg("fold")
        .arg(&path)
        .assert()
        .success()
        .stdout("> list files\n\nHello\n✓ [bash: ls]\n")
        .stderr(predicate::str::contains("Skipped 1 malformed event line(s)."));
}

#[test]
fn test_fold_json_output() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("events.jsonl");
    write_jsonl(
        &path,
        &[
            json!({"type": "auto_compaction_start"}),
            json!({"type": "auto_compaction_end", "tokensBefore": 12000}),
        ],
    );

    let output = pivot(&home).arg("fold").arg(&path).arg("--json").output().unwrap();
    assert!(output.status.success());
    let messages: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(messages[0]["role"], json!("system"));
    assert_eq!(
        messages[0]["text"],
        json!("Context compacted (12k tokens summarized)")
    );
    assert_eq!(messages[0]["done"], json!(true));
}
