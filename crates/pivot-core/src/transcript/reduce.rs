//! Transcript reducer.
//!
//! A strictly ordered fold of [`Action`]s over [`TranscriptState`]. The fold
//! is total: events that reference an unknown call id or arrive without an
//! in-progress message are logged and ignored.

use pivot_types::{
    AgentEvent, ContentBlock, DeltaType, DisplayMessage, DisplayRole, Entry, Role, SessionState,
    ToolCallState, join_text, join_thinking,
};
use serde_json::Value;

use super::history::{compaction_label, messages_from_entries, tool_slots};
use super::{MessageIdSeq, TranscriptState};
use crate::correlate::locate_tool_call;

/// Text of the system message shown while a compaction runs.
pub const COMPACTION_PLACEHOLDER: &str = "Compacting context…";

/// Prefix of the system message shown while a request is retried.
pub const RETRY_PLACEHOLDER: &str = "Retrying…";

/// Input of the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// New backend snapshot. Leaves the messages untouched.
    SessionReplace(Box<SessionState>),
    /// Active-branch entries, root first. Rebuilds the message list.
    HistoryReplace(Vec<Entry>),
    /// New session: empties the transcript.
    Clear,
    Event(AgentEvent),
}

/// Work the reducer asks its owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEffect {
    /// The entry forest or leaf may have changed: flatten it again.
    RefreshTree,
}

/// Applies one action.
pub fn reduce(
    state: &mut TranscriptState,
    action: Action,
    seq: &mut MessageIdSeq,
) -> Vec<TranscriptEffect> {
    match action {
        Action::SessionReplace(session) => {
            state.session = *session;
            vec![TranscriptEffect::RefreshTree]
        }
        Action::HistoryReplace(entries) => {
            // Every old id goes away with the list, so numbering restarts and
            // the same history always yields the same messages.
            seq.restart();
            state.messages = messages_from_entries(&entries, seq);
            state.in_progress = None;
            vec![]
        }
        Action::Clear => {
            seq.restart();
            state.messages.clear();
            state.in_progress = None;
            vec![]
        }
        Action::Event(event) => {
            handle_event(state, event, seq);
            vec![]
        }
    }
}

// ============================================================================
// Agent Event Handler
// ============================================================================

fn handle_event(state: &mut TranscriptState, event: AgentEvent, seq: &mut MessageIdSeq) {
    tracing::trace!(kind = event.kind(), "agent event");
    match event {
        AgentEvent::UserMessage { text } => {
            state.messages.push(
                DisplayMessage::new(seq.next_id(), DisplayRole::User)
                    .with_text(text)
                    .finished(),
            );
        }
        AgentEvent::AgentStart => state.session.is_streaming = true,
        AgentEvent::AgentEnd => handle_agent_end(state),
        AgentEvent::TurnStart | AgentEvent::TurnEnd => {}
        AgentEvent::MessageStart { role } => {
            if role != Role::Assistant {
                tracing::debug!(role = role.as_str(), "ignoring non-assistant message_start");
                return;
            }
            let id = seq.next_id();
            state
                .messages
                .push(DisplayMessage::new(id, DisplayRole::Assistant));
            state.in_progress = Some(id);
        }
        AgentEvent::MessageUpdate {
            role,
            delta_type,
            delta,
        } => handle_message_update(state, role, delta_type, &delta),
        AgentEvent::MessageEnd { role, content } => handle_message_end(state, role, content),
        AgentEvent::ToolExecutionStart {
            call_id,
            tool_name,
            args,
        } => handle_tool_start(state, seq, call_id, tool_name, args),
        AgentEvent::ToolExecutionUpdate {
            call_id,
            partial_result,
        } => {
            if let Some(slot) = find_slot(state, &call_id) {
                slot.partial_output = Some(partial_result);
            } else {
                tracing::debug!(%call_id, "tool update for unknown call");
            }
        }
        AgentEvent::ToolExecutionEnd {
            call_id,
            tool_name,
            result,
            is_error,
        } => {
            let Some(slot) = find_slot(state, &call_id) else {
                tracing::debug!(%call_id, "tool end for unknown call");
                return;
            };
            if slot.tool_name.is_empty()
                && let Some(name) = tool_name
            {
                slot.tool_name = name;
            }
            slot.result = Some(result);
            slot.partial_output = None;
            slot.is_error = is_error;
            slot.done = true;
        }
        AgentEvent::AutoCompactionStart => {
            state.messages.push(
                DisplayMessage::new(seq.next_id(), DisplayRole::System)
                    .with_text(COMPACTION_PLACEHOLDER),
            );
        }
        AgentEvent::AutoCompactionEnd {
            summary,
            tokens_before,
        } => handle_compaction_end(state, seq, summary, tokens_before),
        AgentEvent::AutoRetryStart {
            attempt,
            max_attempts,
        } => {
            state.messages.push(
                DisplayMessage::new(seq.next_id(), DisplayRole::System)
                    .with_text(format!("{RETRY_PLACEHOLDER} (attempt {attempt}/{max_attempts})")),
            );
        }
        AgentEvent::AutoRetryEnd { success } => {
            let Some(message) = state.messages.iter_mut().rev().find(|m| {
                m.role == DisplayRole::System && !m.done && m.text.starts_with(RETRY_PLACEHOLDER)
            }) else {
                tracing::debug!("auto_retry_end without a pending retry");
                return;
            };
            let outcome = if success { "Retry succeeded" } else { "Retry failed" };
            message.text = message.text.replacen(RETRY_PLACEHOLDER, outcome, 1);
            message.done = true;
        }
    }
}

// ============================================================================
// Private Agent Event Helpers
// ============================================================================

fn handle_agent_end(state: &mut TranscriptState) {
    state.session.is_streaming = false;
    state.in_progress = None;
    // An abort can end the run before message_end arrives.
    for message in &mut state.messages {
        if message.role == DisplayRole::Assistant && !message.done {
            message.done = true;
        }
    }
}

fn handle_message_update(
    state: &mut TranscriptState,
    role: Role,
    delta_type: DeltaType,
    delta: &str,
) {
    if role != Role::Assistant {
        return;
    }
    let Some(id) = state.in_progress else {
        tracing::debug!("message_update without an in-progress message");
        return;
    };
    let Some(message) = state.message_mut(id) else {
        return;
    };
    match delta_type {
        DeltaType::TextDelta => message.text.push_str(delta),
        DeltaType::ThinkingDelta => message.thinking.push_str(delta),
        DeltaType::Other => {}
    }
}

fn handle_message_end(
    state: &mut TranscriptState,
    role: Role,
    content: Option<Vec<ContentBlock>>,
) {
    if role != Role::Assistant {
        return;
    }
    let Some(id) = state.in_progress.take() else {
        tracing::debug!("message_end without an in-progress message");
        return;
    };
    let Some(message) = state.message_mut(id) else {
        return;
    };

    if let Some(content) = content {
        message.text = join_text(&content);
        message.thinking = join_thinking(&content);
        message.tool_calls = merge_slots(std::mem::take(&mut message.tool_calls), &content);
    }
    message.done = true;
}

/// Final content decides which calls exist and in what order; execution
/// progress already recorded on a slot survives. Slots for calls missing
/// from the content are kept after the listed ones.
fn merge_slots(mut existing: Vec<ToolCallState>, content: &[ContentBlock]) -> Vec<ToolCallState> {
    let mut merged: Vec<ToolCallState> = tool_slots(content)
        .into_iter()
        .map(|fresh| {
            match existing.iter().position(|slot| slot.call_id == fresh.call_id) {
                Some(pos) => {
                    let mut kept = existing.remove(pos);
                    kept.tool_name = fresh.tool_name;
                    kept.args = fresh.args;
                    kept
                }
                None => fresh,
            }
        })
        .collect();
    merged.extend(existing);
    merged
}

fn handle_tool_start(
    state: &mut TranscriptState,
    seq: &mut MessageIdSeq,
    call_id: String,
    tool_name: String,
    args: Value,
) {
    if let Some(slot) = find_slot(state, &call_id) {
        slot.tool_name = tool_name;
        if !args.is_null() {
            slot.args = args;
        }
        slot.result = None;
        slot.is_error = false;
        slot.done = false;
        return;
    }

    let slot = ToolCallState::pending(call_id, tool_name, args);

    // Most recent assistant message of the current turn: a user message
    // closes the search.
    let target = state
        .messages
        .iter_mut()
        .rev()
        .take_while(|message| message.role != DisplayRole::User)
        .find(|message| message.role == DisplayRole::Assistant);

    if let Some(message) = target {
        message.tool_calls.push(slot);
    } else {
        let mut message = DisplayMessage::new(seq.next_id(), DisplayRole::Assistant);
        message.tool_calls.push(slot);
        state.messages.push(message);
    }
}

fn handle_compaction_end(
    state: &mut TranscriptState,
    seq: &mut MessageIdSeq,
    summary: Option<String>,
    tokens_before: Option<u64>,
) {
    let label = compaction_label(tokens_before);
    let summary = summary.unwrap_or_default();

    let placeholder = state.messages.iter_mut().rev().find(|m| {
        m.role == DisplayRole::System && !m.done && m.text == COMPACTION_PLACEHOLDER
    });
    match placeholder {
        Some(message) => {
            message.text = label;
            message.thinking = summary;
            message.done = true;
        }
        None => state.messages.push(
            DisplayMessage::new(seq.next_id(), DisplayRole::System)
                .with_text(label)
                .with_thinking(summary)
                .finished(),
        ),
    }
}

fn find_slot<'a>(state: &'a mut TranscriptState, call_id: &str) -> Option<&'a mut ToolCallState> {
    let (msg_idx, slot_idx) = locate_tool_call(&state.messages, call_id)?;
    Some(&mut state.messages[msg_idx].tool_calls[slot_idx])
}
