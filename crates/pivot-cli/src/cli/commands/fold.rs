//! Folding a recorded event stream.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pivot_core::transcript::{Action, MessageIdSeq, TranscriptState, reduce};
use pivot_types::AgentEvent;
use pivot_view::render::{PlainMarkup, transcript_lines};

pub fn run(path: &Path, json: bool) -> Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read event stream {}", path.display()))?;

    let mut state = TranscriptState::new();
    let mut seq = MessageIdSeq::default();
    let mut skipped = 0usize;

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<AgentEvent>(line) {
            Ok(event) => {
                reduce(&mut state, Action::Event(event), &mut seq);
            }
            Err(e) => {
                tracing::warn!(line = line_no + 1, "skipping malformed event: {e}");
                skipped += 1;
            }
        }
    }

    if json {
        let out = serde_json::to_string_pretty(state.messages()).context("serialize transcript")?;
        println!("{out}");
    } else {
        for line in transcript_lines(state.messages(), &PlainMarkup) {
            println!("{line}");
        }
    }
    if skipped > 0 {
        eprintln!("Skipped {skipped} malformed event line(s).");
    }
    Ok(())
}
