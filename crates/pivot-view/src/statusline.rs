//! Status line projection of the session snapshot.

use pivot_types::{SessionState, ThinkingLevel};

const SEPARATOR: &str = " · ";

/// `count` with a k/M suffix at `decimals` precision; below 1000 as is.
fn compact(count: u64, decimals: usize) -> String {
    let (scaled, suffix) = match count {
        1_000_000.. => (count as f64 / 1_000_000.0, 'M'),
        1_000.. => (count as f64 / 1_000.0, 'k'),
        _ => return count.to_string(),
    };
    format!("{scaled:.decimals$}{suffix}")
}

/// Token counts keep one decimal: `1.2k`, `3.4M`.
pub fn compact_tokens(count: u64) -> String {
    compact(count, 1)
}

/// Context windows are round numbers: `200k`, `1M`.
pub fn compact_window(size: u64) -> String {
    compact(size, 0)
}

/// Dollar amount; sub-tenth-of-a-cent costs get a fourth digit.
pub fn format_cost(cost: f64) -> String {
    if cost < 0.001 {
        format!("${cost:.4}")
    } else {
        format!("${cost:.3}")
    }
}

/// Status line segments in display order. Absent fields are skipped.
pub fn status_segments(session: &SessionState) -> Vec<String> {
    let mut segments = Vec::new();

    if let Some(folder) = &session.folder_name {
        match &session.git_branch {
            Some(branch) => segments.push(format!("{folder} ({branch})")),
            None => segments.push(folder.clone()),
        }
    }
    if let Some(name) = &session.session_name {
        segments.push(name.clone());
    }

    let model = session.model_name.as_ref().or(session.model_id.as_ref());
    if let Some(model) = model {
        if session.thinking_level == ThinkingLevel::Off {
            segments.push(model.clone());
        } else {
            segments.push(format!(
                "{model} [{}]",
                session.thinking_level.display_name()
            ));
        }
    }

    if let Some(tokens) = session.tokens {
        let mut usage = format!(
            "↑{} ↓{}",
            compact_tokens(tokens.input),
            compact_tokens(tokens.output)
        );
        if tokens.cache_read > 0 {
            usage.push_str(&format!(" R{}", compact_tokens(tokens.cache_read)));
        }
        segments.push(usage);
    }
    if let Some(cost) = session.cost {
        segments.push(format_cost(cost));
    }
    if let Some(percent) = session.context_percent {
        match session.context_window {
            Some(window) => segments.push(format!(
                "{percent:.1}%/{}",
                compact_window(window)
            )),
            None => segments.push(format!("{percent:.1}%")),
        }
    }

    segments
}

/// The status line as one string.
pub fn status_line(session: &SessionState) -> String {
    status_segments(session).join(SEPARATOR)
}
