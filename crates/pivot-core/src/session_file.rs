//! Persisted session files (read path only).
//!
//! A session file is newline-delimited JSON. The first record is usually a
//! `session` header carrying the working directory; every other record is an
//! [`Entry`]. Malformed lines are skipped individually.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use pivot_types::{Entry, EntryKind, Role, SessionSummary};
use serde::Deserialize;
use serde_json::Value;

use crate::tree;

const HEADER_TYPE: &str = "session";

#[derive(Debug, Deserialize)]
struct SessionHeader {
    #[serde(default)]
    cwd: Option<String>,
}

/// A parsed session file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFile {
    pub path: PathBuf,
    /// Working directory from the `session` header.
    pub cwd: Option<String>,
    /// Display name from the last `session_info` entry.
    pub name: Option<String>,
    /// Entries in log order.
    pub entries: Vec<Entry>,
    /// Number of lines that could not be parsed.
    pub skipped_lines: usize,
}

impl SessionFile {
    /// Reads and parses a session file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        Ok(Self::parse(path, &contents))
    }

    /// Parses session file contents. Never fails: bad lines are skipped.
    pub fn parse(path: &Path, contents: &str) -> Self {
        let mut file = SessionFile {
            path: path.to_path_buf(),
            ..SessionFile::default()
        };

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(e) = file.push_line(line) {
                tracing::warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    "skipping malformed session line: {e}"
                );
                file.skipped_lines += 1;
            }
        }

        file
    }

    fn push_line(&mut self, line: &str) -> Result<()> {
        let value: Value = serde_json::from_str(line).context("invalid JSON")?;

        if value.get("type").and_then(Value::as_str) == Some(HEADER_TYPE) {
            let header: SessionHeader =
                serde_json::from_value(value).context("invalid session header")?;
            if header.cwd.is_some() {
                self.cwd = header.cwd;
            }
            return Ok(());
        }

        let entry: Entry = serde_json::from_value(value).context("unrecognized entry")?;
        if let EntryKind::SessionInfo { name } = &entry.kind {
            self.name = name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Leaf the session resumes at: the last entry written.
    pub fn default_leaf(&self) -> Option<&str> {
        tree::default_leaf(&self.entries)
    }

    /// The requested leaf if it names an entry, else the default leaf.
    pub fn resolve_leaf<'a>(&'a self, requested: Option<&'a str>) -> Result<Option<&'a str>> {
        match requested {
            Some(id) if self.entries.iter().any(|e| e.id == id) => Ok(Some(id)),
            Some(id) => bail!("Unknown entry id: {id}"),
            None => Ok(self.default_leaf()),
        }
    }

    /// Picker summary of this file.
    pub fn summary(&self, modified: Option<SystemTime>) -> SessionSummary {
        let mut message_count = 0;
        let mut first_message = None;
        for entry in &self.entries {
            match entry.role() {
                Some(Role::User) => {
                    message_count += 1;
                    if first_message.is_none() {
                        first_message = entry.message().map(|m| m.text());
                    }
                }
                Some(Role::Assistant) => message_count += 1,
                _ => {}
            }
        }

        SessionSummary {
            path: self.path.clone(),
            cwd: self.cwd.clone(),
            name: self.name.clone(),
            modified,
            message_count,
            first_message,
        }
    }
}

/// Lists session files under `dir` (and its direct subdirectories).
///
/// Returns summaries sorted by modification time, newest first. A missing
/// directory yields an empty list.
pub fn list_sessions(dir: &Path) -> Result<Vec<SessionSummary>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_session_files(dir, &mut files)?;
    for entry in fs::read_dir(dir).context("Failed to read sessions directory")? {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_dir() {
            collect_session_files(&path, &mut files)?;
        }
    }

    let mut sessions = Vec::with_capacity(files.len());
    for path in files {
        let modified = fs::metadata(&path).ok().and_then(|m| m.modified().ok());
        match SessionFile::load(&path) {
            Ok(file) => sessions.push(file.summary(modified)),
            Err(e) => tracing::warn!("skipping unreadable session {}: {e:#}", path.display()),
        }
    }

    // Sort by modification time (newest first)
    sessions.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

    Ok(sessions)
}

fn collect_session_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;

    const SAMPLE: &str = r#"{"type":"session","id":"s1","cwd":"/work/pivot","timestamp":"2025-01-01T00:00:00Z"}
{"type":"message","id":"u1","parentId":null,"message":{"role":"user","content":"add a parser"}}
not json at all
{"type":"message","id":"a1","parentId":"u1","message":{"role":"assistant","content":[{"type":"text","text":"Sure."}]}}
{"type":"session_info","id":"i1","parentId":"a1","name":"first name"}
{"type":"mystery","id":"x"}

{"type":"session_info","id":"i2","parentId":"i1","name":"Parser work"}
"#;

    #[test]
    fn test_parse_skips_bad_lines_and_keeps_last_name() {
        let file = SessionFile::parse(Path::new("s.jsonl"), SAMPLE);

        assert_eq!(file.cwd.as_deref(), Some("/work/pivot"));
        assert_eq!(file.name.as_deref(), Some("Parser work"));
        assert_eq!(file.entries.len(), 4);
        assert_eq!(file.skipped_lines, 2);
        assert_eq!(file.default_leaf(), Some("i2"));
    }

    #[test]
    fn test_summary_counts_messages() {
        let file = SessionFile::parse(Path::new("s.jsonl"), SAMPLE);
        let summary = file.summary(None);
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.first_message.as_deref(), Some("add a parser"));
        assert_eq!(summary.display_title(), "Parser work");
    }

    #[test]
    fn test_resolve_leaf() {
        let file = SessionFile::parse(Path::new("s.jsonl"), SAMPLE);
        assert_eq!(file.resolve_leaf(None).unwrap(), Some("i2"));
        assert_eq!(file.resolve_leaf(Some("u1")).unwrap(), Some("u1"));
        let err = file.resolve_leaf(Some("zz")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown entry id: zz");
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let err = SessionFile::load(&dir.path().join("nope.jsonl")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.jsonl"));
    }

    #[test]
    fn test_list_sessions_newest_first() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("--work-pivot--");
        fs::create_dir_all(&nested).unwrap();

        let old = dir.path().join("old.jsonl");
        let new = nested.join("new.jsonl");
        fs::write(&old, SAMPLE).unwrap();
        fs::write(&new, SAMPLE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let sessions = list_sessions(dir.path()).unwrap();
        let paths: Vec<&Path> = sessions.iter().map(|s| s.path.as_path()).collect();
        assert_eq!(paths, [new.as_path(), old.as_path()]);
    }

    #[test]
    fn test_list_sessions_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(list_sessions(&dir.path().join("missing")).unwrap().is_empty());
    }
}
