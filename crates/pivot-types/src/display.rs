//! Renderable transcript messages.
//!
//! A `DisplayMessage` is the projection of one conversation turn. It is
//! mutable while streaming (`done == false`) and finalized on `message_end`
//! or when replayed from history.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a display message, unique within one view session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Assistant,
    /// Synthetic messages: compaction summaries, branch summaries, retries.
    System,
}

/// Tool-call slot inside an assistant message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolCallState {
    pub call_id: String,
    pub tool_name: String,
    pub args: Value,
    pub result: Option<Value>,
    /// Latest partial output while the tool runs. Never marks the slot done.
    pub partial_output: Option<Value>,
    pub is_error: bool,
    pub done: bool,
}

impl ToolCallState {
    /// A slot announced but not yet finished.
    pub fn pending(call_id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            args,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub id: MessageId,
    pub role: DisplayRole,
    pub text: String,
    pub thinking: String,
    pub tool_calls: Vec<ToolCallState>,
    pub done: bool,
}

impl DisplayMessage {
    pub fn new(id: MessageId, role: DisplayRole) -> Self {
        Self {
            id,
            role,
            text: String::new(),
            thinking: String::new(),
            tool_calls: Vec::new(),
            done: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_thinking(mut self, thinking: impl Into<String>) -> Self {
        self.thinking = thinking.into();
        self
    }

    pub fn finished(mut self) -> Self {
        self.done = true;
        self
    }

    pub fn tool_call(&self, call_id: &str) -> Option<&ToolCallState> {
        self.tool_calls.iter().find(|slot| slot.call_id == call_id)
    }
}
