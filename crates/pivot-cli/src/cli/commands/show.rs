//! Transcript of a session's active branch.

use std::path::Path;

use anyhow::{Context, Result};
use pivot_core::transcript::{MessageIdSeq, messages_from_entries};
use pivot_view::AgentBackend;
use pivot_view::render::{PlainMarkup, transcript_lines};
use pivot_view::replay::ReplayBackend;
use pivot_view::statusline::status_line;

pub async fn run(path: &Path, leaf: Option<&str>) -> Result<()> {
    let backend = ReplayBackend::open(path)?;
    if let Some(leaf) = leaf {
        backend.set_leaf(leaf)?;
    }

    let state = backend.get_state().await.context("read session state")?;
    let history = backend.get_history().await.context("read branch history")?;
    let messages = messages_from_entries(&history, &mut MessageIdSeq::default());

    let status = status_line(&state);
    if !status.is_empty() {
        println!("{status}");
        println!();
    }
    if messages.is_empty() {
        println!("(empty branch)");
        return Ok(());
    }
    for line in transcript_lines(&messages, &PlainMarkup) {
        println!("{line}");
    }
    Ok(())
}
