//! Rebuilding display messages from persisted entries.

use pivot_types::{
    AgentMessage, ContentBlock, DisplayMessage, DisplayRole, Entry, EntryKind, ToolCallState,
    join_text, join_thinking,
};
use serde_json::{Value, json};

use super::MessageIdSeq;
use crate::correlate::locate_tool_call;

/// Human-readable label of a finished compaction.
pub fn compaction_label(tokens_before: Option<u64>) -> String {
    match tokens_before {
        Some(tokens) if tokens > 0 => {
            format!("Context compacted ({}k tokens summarized)", tokens / 1000)
        }
        _ => "Context compacted".to_string(),
    }
}

/// Result payload stored on a tool slot for a persisted tool result.
pub fn tool_result_value(content: &[ContentBlock], details: Option<&Value>) -> Value {
    let mut value = json!({ "content": content });
    if let Some(details) = details {
        value["details"] = details.clone();
    }
    value
}

/// Builds finished display messages from entries in branch order.
///
/// User and assistant messages map one to one; tool results are folded into
/// the slot with the same call id in the nearest preceding assistant message
/// and dropped (with a warning) when no such slot exists. Compactions and
/// branch summaries become system messages carrying the summary as thinking.
pub fn messages_from_entries<'a>(
    entries: impl IntoIterator<Item = &'a Entry>,
    seq: &mut MessageIdSeq,
) -> Vec<DisplayMessage> {
    let mut messages: Vec<DisplayMessage> = Vec::new();

    for entry in entries {
        match &entry.kind {
            EntryKind::Message { message } => match message {
                AgentMessage::User { .. } => {
                    messages.push(
                        DisplayMessage::new(seq.next_id(), DisplayRole::User)
                            .with_text(message.text())
                            .finished(),
                    );
                }
                AgentMessage::Assistant { content, .. } => {
                    let mut display = DisplayMessage::new(seq.next_id(), DisplayRole::Assistant)
                        .with_text(join_text(content))
                        .with_thinking(join_thinking(content))
                        .finished();
                    display.tool_calls = tool_slots(content);
                    messages.push(display);
                }
                AgentMessage::ToolResult {
                    tool_call_id,
                    content,
                    is_error,
                    details,
                    ..
                } => {
                    let Some((msg_idx, slot_idx)) = locate_tool_call(&messages, tool_call_id)
                    else {
                        tracing::warn!(
                            entry = %entry.id,
                            call_id = %tool_call_id,
                            "dropping tool result without a matching call"
                        );
                        continue;
                    };
                    let slot = &mut messages[msg_idx].tool_calls[slot_idx];
                    slot.result = Some(tool_result_value(content, details.as_ref()));
                    slot.is_error = *is_error;
                    slot.done = true;
                }
                AgentMessage::Other => {}
            },
            EntryKind::Compaction {
                summary,
                tokens_before,
            } => messages.push(
                DisplayMessage::new(seq.next_id(), DisplayRole::System)
                    .with_text(compaction_label(Some(*tokens_before)))
                    .with_thinking(summary.clone())
                    .finished(),
            ),
            EntryKind::BranchSummary { summary, .. } => messages.push(
                DisplayMessage::new(seq.next_id(), DisplayRole::System)
                    .with_text("Branch summary")
                    .with_thinking(summary.clone())
                    .finished(),
            ),
            _ => {}
        }
    }

    messages
}

/// Slots for the tool calls of an assistant message, in content order.
pub(crate) fn tool_slots(content: &[ContentBlock]) -> Vec<ToolCallState> {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolCall {
                id,
                name,
                arguments,
            } => Some(ToolCallState::pending(id.clone(), name.clone(), arguments.clone())),
            _ => None,
        })
        .collect()
}
