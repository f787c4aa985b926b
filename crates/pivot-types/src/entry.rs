//! Conversation-log entries.
//!
//! Entries are immutable once written. Each one names its parent, so the log
//! forms a forest; the active conversation is the path from a root to the
//! current leaf. The wire format mirrors the session JSONL records: a `type`
//! discriminator flattened next to `id`, `parentId` and `timestamp`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted node in the branching conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>, kind: EntryKind) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            timestamp: None,
            kind,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.kind.entry_type()
    }

    /// Message payload, if this is a `message` entry.
    pub fn message(&self) -> Option<&AgentMessage> {
        match &self.kind {
            EntryKind::Message { message } => Some(message),
            _ => None,
        }
    }

    /// Role of the message, if this is a `message` entry.
    pub fn role(&self) -> Option<Role> {
        self.message().map(AgentMessage::role)
    }
}

/// Entry payload, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EntryKind {
    Message {
        message: AgentMessage,
    },
    /// Older history was summarized to reduce context size.
    Compaction {
        summary: String,
        #[serde(default)]
        tokens_before: u64,
    },
    /// Summary generated when branching away from a point in history.
    BranchSummary {
        summary: String,
        #[serde(default)]
        from_id: Option<String>,
    },
    ModelChange {
        provider: String,
        model_id: String,
    },
    ThinkingLevelChange {
        thinking_level: String,
    },
    /// Attaches (or clears, when `label` is null) a label on another entry.
    Label {
        target_id: String,
        #[serde(default)]
        label: Option<String>,
    },
    CustomMessage {
        custom_type: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        display: bool,
    },
    SessionInfo {
        #[serde(default)]
        name: Option<String>,
    },
    Custom {
        custom_type: String,
        #[serde(default)]
        data: Value,
    },
}

impl EntryKind {
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Message { .. } => EntryType::Message,
            EntryKind::Compaction { .. } => EntryType::Compaction,
            EntryKind::BranchSummary { .. } => EntryType::BranchSummary,
            EntryKind::ModelChange { .. } => EntryType::ModelChange,
            EntryKind::ThinkingLevelChange { .. } => EntryType::ThinkingLevelChange,
            EntryKind::Label { .. } => EntryType::Label,
            EntryKind::CustomMessage { .. } => EntryType::CustomMessage,
            EntryKind::SessionInfo { .. } => EntryType::SessionInfo,
            EntryKind::Custom { .. } => EntryType::Custom,
        }
    }
}

/// Field-less discriminator of [`EntryKind`], carried on tree rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Message,
    Compaction,
    BranchSummary,
    ModelChange,
    ThinkingLevelChange,
    Label,
    CustomMessage,
    SessionInfo,
    Custom,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Message => "message",
            EntryType::Compaction => "compaction",
            EntryType::BranchSummary => "branch_summary",
            EntryType::ModelChange => "model_change",
            EntryType::ThinkingLevelChange => "thinking_level_change",
            EntryType::Label => "label",
            EntryType::CustomMessage => "custom_message",
            EntryType::SessionInfo => "session_info",
            EntryType::Custom => "custom",
        }
    }

    /// Structural/metadata records that carry no conversation content.
    pub fn is_metadata(self) -> bool {
        matches!(
            self,
            EntryType::ModelChange
                | EntryType::ThinkingLevelChange
                | EntryType::Label
                | EntryType::Custom
                | EntryType::SessionInfo
        )
    }
}

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "toolResult",
            Role::Other => "other",
        }
    }
}

/// Message payload of a `message` entry, discriminated by `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AgentMessage {
    User {
        content: UserContent,
    },
    Assistant {
        #[serde(default)]
        content: Vec<ContentBlock>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
    ToolResult {
        tool_call_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        #[serde(default)]
        content: Vec<ContentBlock>,
        #[serde(default)]
        is_error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    /// Roles this layer does not render (bash executions, custom roles).
    #[serde(other)]
    Other,
}

impl AgentMessage {
    pub fn role(&self) -> Role {
        match self {
            AgentMessage::User { .. } => Role::User,
            AgentMessage::Assistant { .. } => Role::Assistant,
            AgentMessage::ToolResult { .. } => Role::ToolResult,
            AgentMessage::Other => Role::Other,
        }
    }

    /// Concatenated text content of the message.
    pub fn text(&self) -> String {
        match self {
            AgentMessage::User { content } => content.text(),
            AgentMessage::Assistant { content, .. } | AgentMessage::ToolResult { content, .. } => {
                join_text(content)
            }
            AgentMessage::Other => String::new(),
        }
    }

    /// True for assistant messages that call tools but carry no visible text.
    pub fn is_tool_calls_only(&self) -> bool {
        match self {
            AgentMessage::Assistant { content, .. } => {
                let has_text = content.iter().any(
                    |block| matches!(block, ContentBlock::Text { text } if !text.trim().is_empty()),
                );
                let has_calls = content
                    .iter()
                    .any(|block| matches!(block, ContentBlock::ToolCall { .. }));
                has_calls && !has_text
            }
            _ => false,
        }
    }
}

/// User content is either a bare string or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl UserContent {
    pub fn text(&self) -> String {
        match self {
            UserContent::Text(text) => text.clone(),
            UserContent::Blocks(blocks) => join_text(blocks),
        }
    }
}

/// A block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolCall {
        id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Concatenates the text blocks in order.
pub fn join_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Concatenates the thinking blocks in order.
pub fn join_thinking(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Thinking { thinking } => Some(thinking.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_user_message_entry() {
        let line = json!({
            "type": "message",
            "id": "a1",
            "parentId": null,
            "timestamp": "2025-01-01T00:00:00Z",
            "message": {"role": "user", "content": "hello\nworld"}
        });
        let entry: Entry = serde_json::from_value(line).unwrap();
        assert_eq!(entry.id, "a1");
        assert_eq!(entry.parent_id, None);
        assert_eq!(entry.entry_type(), EntryType::Message);
        assert_eq!(entry.role(), Some(Role::User));
        assert_eq!(entry.message().unwrap().text(), "hello\nworld");
    }

    #[test]
    fn test_parse_assistant_with_tool_call() {
        let line = json!({
            "type": "message",
            "id": "b",
            "parentId": "a",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "thinking", "thinking": "hmm"},
                    {"type": "toolCall", "id": "call_1", "name": "bash", "arguments": {"command": "ls"}}
                ]
            }
        });
        let entry: Entry = serde_json::from_value(line).unwrap();
        let message = entry.message().unwrap();
        assert!(message.is_tool_calls_only());
        let AgentMessage::Assistant { content, .. } = message else {
            panic!("expected assistant");
        };
        assert_eq!(
            content[1],
            ContentBlock::ToolCall {
                id: "call_1".to_string(),
                name: "bash".to_string(),
                arguments: json!({"command": "ls"}),
            }
        );
        assert_eq!(join_thinking(content), "hmm");
    }

    #[test]
    fn test_parse_tool_result_entry() {
        let line = json!({
            "type": "message",
            "id": "c",
            "parentId": "b",
            "message": {
                "role": "toolResult",
                "toolCallId": "call_1",
                "toolName": "bash",
                "content": [{"type": "text", "text": "file.txt"}],
                "isError": false
            }
        });
        let entry: Entry = serde_json::from_value(line).unwrap();
        assert_eq!(entry.role(), Some(Role::ToolResult));
        let AgentMessage::ToolResult { tool_call_id, .. } = entry.message().unwrap() else {
            panic!("expected tool result");
        };
        assert_eq!(tool_call_id, "call_1");
    }

    #[test]
    fn test_parse_metadata_entries() {
        let compaction: Entry = serde_json::from_value(json!({
            "type": "compaction", "id": "x", "parentId": "w",
            "summary": "older turns", "tokensBefore": 48000
        }))
        .unwrap();
        assert_eq!(
            compaction.kind,
            EntryKind::Compaction {
                summary: "older turns".to_string(),
                tokens_before: 48000
            }
        );

        let label: Entry = serde_json::from_value(json!({
            "type": "label", "id": "l", "parentId": "x", "targetId": "w", "label": "checkpoint"
        }))
        .unwrap();
        assert!(label.entry_type().is_metadata());
    }

    #[test]
    fn test_unknown_role_and_block_are_tolerated() {
        let entry: Entry = serde_json::from_value(json!({
            "type": "message", "id": "z", "parentId": null,
            "message": {"role": "bashExecution", "command": "ls"}
        }))
        .unwrap();
        assert_eq!(entry.role(), Some(Role::Other));

        let blocks: Vec<ContentBlock> =
            serde_json::from_value(json!([{"type": "redacted"}, {"type": "text", "text": "ok"}]))
                .unwrap();
        assert_eq!(blocks[0], ContentBlock::Unknown);
        assert_eq!(join_text(&blocks), "ok");
    }
}
