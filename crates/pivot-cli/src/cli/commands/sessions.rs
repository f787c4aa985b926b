//! Session listing.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use pivot_core::config::Config;
use pivot_core::list_sessions;

pub fn list(dir: Option<PathBuf>, config: &Config) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.effective_sessions_dir());
    let sessions = list_sessions(&dir)
        .with_context(|| format!("list sessions in {}", dir.display()))?;

    if sessions.is_empty() {
        println!("No sessions found in {}.", dir.display());
        return Ok(());
    }

    for session in sessions {
        let modified = session
            .modified
            .map_or_else(|| "unknown".to_string(), format_timestamp);
        println!(
            "{}  {}  {} messages  {}",
            modified,
            session.display_title(),
            session.message_count,
            session.path.display()
        );
    }
    Ok(())
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
