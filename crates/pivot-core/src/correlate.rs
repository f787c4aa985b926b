//! Tool-call correlation.
//!
//! Tool results only carry the id of the call that produced them. Two lookups
//! recover the originating tool name and arguments:
//!
//! - [`ToolCallIndex`]: forward-built table over the persisted tree. A result
//!   may reference a call anywhere earlier in traversal order.
//! - [`locate_tool_call`]: backward scan over live display messages, most
//!   recent assistant message first.
//!
//! The two are intentionally separate: the tree sees every branch while the
//! transcript only sees the streaming window. Neither fails on an unknown id.

use std::collections::HashMap;
use std::path::Path;

use pivot_types::{AgentMessage, ContentBlock, DisplayMessage, DisplayRole, Entry};
use serde_json::Value;

/// Label used when a tool result cannot be matched to its call.
pub const FALLBACK_TOOL_LABEL: &str = "[tool result]";

const COMMAND_PREVIEW_CHARS: usize = 50;
const ARGS_PREVIEW_CHARS: usize = 40;

/// Name and arguments of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallInfo {
    pub name: String,
    pub arguments: Value,
}

/// Call-id table built by a forward scan over entries.
#[derive(Debug, Default, Clone)]
pub struct ToolCallIndex {
    calls: HashMap<String, ToolCallInfo>,
}

impl ToolCallIndex {
    /// Indexes every tool call of every assistant entry in the given order.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.record(entry);
        }
        index
    }

    /// Records the tool calls of an assistant entry. Later calls with the
    /// same id overwrite earlier ones.
    pub fn record(&mut self, entry: &Entry) {
        let Some(AgentMessage::Assistant { content, .. }) = entry.message() else {
            return;
        };
        for block in content {
            if let ContentBlock::ToolCall {
                id,
                name,
                arguments,
            } = block
            {
                self.calls.insert(
                    id.clone(),
                    ToolCallInfo {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    },
                );
            }
        }
    }

    pub fn resolve(&self, call_id: &str) -> Option<&ToolCallInfo> {
        self.calls.get(call_id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Finds the slot holding `call_id`, scanning assistant messages from the
/// most recent backward. Returns `(message index, slot index)`.
pub fn locate_tool_call(messages: &[DisplayMessage], call_id: &str) -> Option<(usize, usize)> {
    messages
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, message)| message.role == DisplayRole::Assistant)
        .find_map(|(msg_idx, message)| {
            message
                .tool_calls
                .iter()
                .position(|slot| slot.call_id == call_id)
                .map(|slot_idx| (msg_idx, slot_idx))
        })
}

/// Short bracketed description of a tool call, e.g. `[bash: ls -la]`.
pub fn describe_tool_call(name: &str, args: &Value) -> String {
    describe_tool_call_with_home(name, args, dirs::home_dir().as_deref())
}

pub(crate) fn describe_tool_call_with_home(
    name: &str,
    args: &Value,
    home: Option<&Path>,
) -> String {
    let path = || {
        arg_str(args, "path")
            .or_else(|| arg_str(args, "file_path"))
            .map_or_else(|| ".".to_string(), |p| shorten_path(p, home))
    };

    match name {
        "read" => {
            let offset = args.get("offset").and_then(Value::as_u64);
            let limit = args.get("limit").and_then(Value::as_u64);
            let range = match (offset, limit) {
                (None, None) => String::new(),
                (offset, Some(limit)) => {
                    let start = offset.unwrap_or(1);
                    format!(":{start}-{}", start + limit.saturating_sub(1))
                }
                (Some(offset), None) => format!(":{offset}-"),
            };
            format!("[read: {}{range}]", path())
        }
        "write" | "edit" | "ls" => format!("[{name}: {}]", path()),
        "bash" => {
            let command = arg_str(args, "command").unwrap_or_default();
            let command = truncate_chars(&command.replace('\n', " "), COMMAND_PREVIEW_CHARS);
            format!("[bash: {command}]")
        }
        "grep" => {
            let pattern = arg_str(args, "pattern").unwrap_or_default();
            format!("[grep: /{pattern}/ in {}]", path())
        }
        "find" => {
            let pattern = arg_str(args, "pattern").unwrap_or_default();
            format!("[find: {pattern} in {}]", path())
        }
        _ => {
            let raw = serde_json::to_string(args).unwrap_or_default();
            format!("[{name}: {}]", truncate_chars(&raw, ARGS_PREVIEW_CHARS))
        }
    }
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    let value = args.get(key)?.as_str()?.trim();
    (!value.is_empty()).then_some(value)
}

/// Replaces the home directory prefix with `~`.
pub fn shorten_path(path: &str, home: Option<&Path>) -> String {
    if let Some(home) = home.and_then(Path::to_str).filter(|h| !h.is_empty() && *h != "/")
        && let Some(rest) = path.strip_prefix(home)
        && (rest.is_empty() || rest.starts_with('/'))
    {
        return format!("~{rest}");
    }
    path.to_string()
}

/// Truncates to at most `max` chars, ending with an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
