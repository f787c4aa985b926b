//! Plain-text projections of the view state.
//!
//! Hosts draw these lines however they like. Markdown in message text goes
//! through a [`Markup`] implementation; the default passes text through.

use pivot_core::TreeView;
use pivot_core::correlate::describe_tool_call;
use pivot_types::{DisplayMessage, DisplayRole, ToolCallState};
use serde_json::Value;

/// Columns per indent level.
const LEVEL_WIDTH: usize = 3;

/// Turns message text into display lines.
pub trait Markup {
    fn render(&self, text: &str) -> Vec<String>;
}

/// Identity markup: one output line per input line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainMarkup;

impl Markup for PlainMarkup {
    fn render(&self, text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }
}

// ============================================================================
// Tree
// ============================================================================

/// One line per tree row: gutters, connector, active marker, preview and
/// label.
pub fn tree_lines(view: &TreeView, show_labels: bool, selected: Option<&str>) -> Vec<String> {
    view.rows
        .iter()
        .map(|row| {
            let indent = row.display_indent(view.multiple_roots);
            let connector_level = (row.draws_connector() && indent > 0).then(|| indent - 1);

            let mut line = String::new();
            line.push_str(if selected == Some(row.id.as_str()) {
                "› "
            } else {
                "  "
            });
            for level in 0..indent {
                let gutter = row.gutters.iter().find(|g| g.position == level);
                let cell = match (gutter, connector_level) {
                    (Some(g), _) if g.show => "│  ",
                    (Some(_), _) => "   ",
                    (None, Some(at)) if at == level && row.is_last => "└─ ",
                    (None, Some(at)) if at == level => "├─ ",
                    _ => "   ",
                };
                line.push_str(cell);
            }
            if row.on_active_path {
                line.push_str("• ");
            }
            line.push_str(&row.preview);
            if show_labels && let Some(label) = &row.label {
                line.push_str(&format!(" [{label}]"));
            }
            line
        })
        .collect()
}

// ============================================================================
// Transcript
// ============================================================================

/// Display lines for the transcript, one blank line between messages.
pub fn transcript_lines(messages: &[DisplayMessage], markup: &dyn Markup) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        message_lines(message, markup, &mut lines);
    }
    lines
}

fn message_lines(message: &DisplayMessage, markup: &dyn Markup, out: &mut Vec<String>) {
    match message.role {
        DisplayRole::User => {
            out.extend(message.text.lines().map(|line| format!("> {line}")));
        }
        DisplayRole::Assistant => {
            out.extend(message.thinking.lines().map(|line| format!("~ {line}")));
            out.extend(markup.render(&message.text));
            for call in &message.tool_calls {
                tool_lines(call, out);
            }
            if !message.done && message.text.is_empty() && message.tool_calls.is_empty() {
                out.push("…".to_string());
            }
        }
        DisplayRole::System => {
            out.extend(message.text.lines().map(|line| format!("· {line}")));
        }
    }
}

fn tool_lines(call: &ToolCallState, out: &mut Vec<String>) {
    let status = match (call.done, call.is_error) {
        (true, false) => "✓",
        (true, true) => "✗",
        (false, _) => "…",
    };
    out.push(format!(
        "{status} {}",
        describe_tool_call(&call.tool_name, &call.args)
    ));

    // Running tools show the tail of their latest output.
    if !call.done
        && let Some(partial) = call.partial_output.as_ref().and_then(output_text)
        && let Some(last) = partial.lines().rev().find(|l| !l.trim().is_empty())
    {
        out.push(format!("  {last}"));
    }
}

/// Text of a tool output payload: a bare string or `{content: [{text}]}`.
fn output_text(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    let blocks = value.get("content")?.as_array()?;
    let text: Vec<&str> = blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then(|| text.join("\n"))
}
