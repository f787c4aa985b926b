//! Shared data contract for Pivot.
//!
//! - `entry`: persisted conversation-log entries (the branching tree)
//! - `events`: streamed agent events consumed by the transcript reducer
//! - `session`: backend state snapshot and request/response types
//! - `display`: renderable transcript messages derived from entries and events

pub mod display;
pub mod entry;
pub mod events;
pub mod session;

pub use display::{DisplayMessage, DisplayRole, MessageId, ToolCallState};
pub use entry::{
    AgentMessage, ContentBlock, Entry, EntryKind, EntryType, Role, UserContent, join_text,
    join_thinking,
};
pub use events::{AgentEvent, DeltaType};
pub use session::{
    ModelInfo, NavigateOptions, NavigateOutcome, SessionState, SessionSummary, ThinkingLevel,
    TokenUsage,
};
