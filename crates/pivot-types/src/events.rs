//! Agent event types streamed from the backend.
//!
//! This module defines the inbound event vocabulary. Events cross a process
//! boundary, so every optional field has a serde default and unknown roles or
//! delta kinds deserialize into catch-all variants instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::{ContentBlock, Role};

/// Events emitted by the agent backend (plus `UserMessage`, synthesized locally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AgentEvent {
    /// The agent started working on a prompt.
    AgentStart,

    /// The agent finished (normally, on error, or after an abort).
    AgentEnd,

    TurnStart,

    TurnEnd,

    /// A message started streaming.
    MessageStart { role: Role },

    /// Incremental text or thinking chunk.
    MessageUpdate {
        role: Role,
        delta_type: DeltaType,
        #[serde(default)]
        delta: String,
    },

    /// A message finished. `content`, when present, is authoritative.
    MessageEnd {
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Vec<ContentBlock>>,
    },

    /// A tool invocation has started execution.
    ToolExecutionStart {
        call_id: String,
        tool_name: String,
        #[serde(default)]
        args: Value,
    },

    /// Partial output from a running tool.
    ToolExecutionUpdate {
        call_id: String,
        #[serde(default)]
        partial_result: Value,
    },

    /// A tool invocation has completed.
    ToolExecutionEnd {
        call_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        is_error: bool,
    },

    AutoCompactionStart,

    AutoCompactionEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tokens_before: Option<u64>,
    },

    AutoRetryStart { attempt: u32, max_attempts: u32 },

    AutoRetryEnd {
        #[serde(default)]
        success: bool,
    },

    /// A prompt typed by the user (never sent by the backend).
    UserMessage { text: String },
}

impl AgentEvent {
    /// Wire name of the event, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::AgentStart => "agent_start",
            AgentEvent::AgentEnd => "agent_end",
            AgentEvent::TurnStart => "turn_start",
            AgentEvent::TurnEnd => "turn_end",
            AgentEvent::MessageStart { .. } => "message_start",
            AgentEvent::MessageUpdate { .. } => "message_update",
            AgentEvent::MessageEnd { .. } => "message_end",
            AgentEvent::ToolExecutionStart { .. } => "tool_execution_start",
            AgentEvent::ToolExecutionUpdate { .. } => "tool_execution_update",
            AgentEvent::ToolExecutionEnd { .. } => "tool_execution_end",
            AgentEvent::AutoCompactionStart => "auto_compaction_start",
            AgentEvent::AutoCompactionEnd { .. } => "auto_compaction_end",
            AgentEvent::AutoRetryStart { .. } => "auto_retry_start",
            AgentEvent::AutoRetryEnd { .. } => "auto_retry_end",
            AgentEvent::UserMessage { .. } => "user_message",
        }
    }
}

/// Kind of incremental chunk carried by `message_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaType {
    TextDelta,
    ThinkingDelta,
    /// Tool-call argument streaming and future kinds; ignored by the reducer.
    #[serde(other)]
    Other,
}
