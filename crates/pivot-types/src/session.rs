//! Backend state snapshot and request/response types.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// Thinking level for extended reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    #[default]
    Off,
    Minimal,
    Low,
    Medium,
    High,
    XHigh,
}

impl ThinkingLevel {
    /// Returns the short display name for this level.
    pub fn display_name(self) -> &'static str {
        match self {
            ThinkingLevel::Off => "off",
            ThinkingLevel::Minimal => "minimal",
            ThinkingLevel::Low => "low",
            ThinkingLevel::Medium => "medium",
            ThinkingLevel::High => "high",
            ThinkingLevel::XHigh => "xhigh",
        }
    }

    /// Parses a display name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Some(ThinkingLevel::Off),
            "minimal" => Some(ThinkingLevel::Minimal),
            "low" => Some(ThinkingLevel::Low),
            "medium" => Some(ThinkingLevel::Medium),
            "high" => Some(ThinkingLevel::High),
            "xhigh" => Some(ThinkingLevel::XHigh),
            _ => None,
        }
    }
}

/// Token counters reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub total: u64,
}

/// A model the backend can switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: String,
    pub id: String,
    pub name: String,
}

/// Snapshot of the backend session, replaced wholesale on every push.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub model_name: Option<String>,
    pub model_id: Option<String>,
    pub provider_name: Option<String>,
    pub thinking_level: ThinkingLevel,
    pub is_streaming: bool,
    pub cwd: Option<String>,
    pub folder_name: Option<String>,
    pub git_branch: Option<String>,
    pub session_name: Option<String>,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<f64>,
    pub context_percent: Option<f64>,
    pub context_window: Option<u64>,
    pub available_models: Vec<ModelInfo>,
    /// Full entry forest, in log order.
    pub tree: Vec<Entry>,
    /// Head of the active branch.
    pub leaf_id: Option<String>,
}

/// Options for switching the active leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigateOptions {
    /// Summarize the abandoned branch into a `branch_summary` entry.
    pub summarize: bool,
    pub custom_instructions: Option<String>,
    /// Use `custom_instructions` instead of the default summary prompt.
    pub replace_instructions: bool,
}

/// Result of a branch navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigateOutcome {
    /// Text to put back into the input box (navigating to a user message).
    pub editor_text: Option<String>,
    pub cancelled: bool,
    pub aborted: Option<bool>,
}

/// A persisted session file, as listed for the session picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub path: PathBuf,
    pub cwd: Option<String>,
    pub name: Option<String>,
    pub modified: Option<SystemTime>,
    pub message_count: usize,
    pub first_message: Option<String>,
}

impl SessionSummary {
    /// Session name, falling back to the first user message, then the file stem.
    pub fn display_title(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        if let Some(first) = self.first_message.as_deref()
            && let Some(line) = first.lines().map(str::trim).find(|l| !l.is_empty())
        {
            return line.to_string();
        }
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
