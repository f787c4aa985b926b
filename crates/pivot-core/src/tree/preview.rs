//! One-line previews for tree rows.

use pivot_types::{AgentMessage, ContentBlock, Entry, EntryKind};
use serde_json::Value;

use crate::correlate::{FALLBACK_TOOL_LABEL, ToolCallIndex, describe_tool_call, truncate_chars};

/// Builds the preview of `entry`, at most `max_chars` chars long.
pub(crate) fn entry_preview(entry: &Entry, calls: &ToolCallIndex, max_chars: usize) -> String {
    let raw = match &entry.kind {
        EntryKind::Message { message } => message_preview(entry, message, calls),
        EntryKind::Compaction { tokens_before, .. } => {
            format!("[compaction: {}k tokens]", tokens_before / 1000)
        }
        EntryKind::BranchSummary { summary, .. } => {
            format!("[branch summary] {}", first_line(summary))
        }
        EntryKind::ModelChange { provider, model_id } => format!("[model: {provider}/{model_id}]"),
        EntryKind::ThinkingLevelChange { thinking_level } => {
            format!("[thinking: {thinking_level}]")
        }
        EntryKind::Label { target_id, label } => format!(
            "[label: {target_id} -> {}]",
            label.as_deref().unwrap_or("(cleared)")
        ),
        EntryKind::CustomMessage {
            custom_type,
            content,
            ..
        } => format!("[{custom_type}] {}", first_line(&value_text(content))),
        EntryKind::SessionInfo { name } => {
            format!("[session: {}]", name.as_deref().unwrap_or("(unnamed)"))
        }
        EntryKind::Custom { custom_type, .. } => format!("[custom: {custom_type}]"),
    };
    truncate_chars(raw.trim_end(), max_chars)
}

fn message_preview(entry: &Entry, message: &AgentMessage, calls: &ToolCallIndex) -> String {
    match message {
        AgentMessage::User { .. } => first_line(&message.text()).to_string(),
        AgentMessage::Assistant {
            content,
            stop_reason,
        } => {
            let text = message.text();
            if !text.trim().is_empty() {
                return first_line(&text).to_string();
            }
            match stop_reason.as_deref() {
                Some("aborted") => return "(aborted)".to_string(),
                Some("error") => return "(error)".to_string(),
                _ => {}
            }
            let tools: Vec<String> = content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolCall {
                        name, arguments, ..
                    } => Some(describe_tool_call(name, arguments)),
                    _ => None,
                })
                .collect();
            if tools.is_empty() {
                "(no content)".to_string()
            } else {
                tools.join(" ")
            }
        }
        AgentMessage::ToolResult { tool_call_id, .. } => match calls.resolve(tool_call_id) {
            Some(call) => describe_tool_call(&call.name, &call.arguments),
            None => {
                tracing::debug!(entry = %entry.id, call_id = %tool_call_id, "tool result without a known call");
                FALLBACK_TOOL_LABEL.to_string()
            }
        },
        AgentMessage::Other => "(message)".to_string(),
    }
}

/// First non-empty line, trimmed.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) => serde_json::from_value::<Vec<ContentBlock>>(value.clone())
            .map(|blocks| pivot_types::join_text(&blocks))
            .unwrap_or_default(),
        _ => String::new(),
    }
}
