//! UI event types.
//!
//! Everything that reaches the reducer: backend pushes, user intents and the
//! results of commands the runtime ran on the reducer's behalf.

use std::path::PathBuf;

use pivot_core::TreeFilter;
use pivot_types::{Entry, NavigateOptions, NavigateOutcome, SessionState, SessionSummary, ThinkingLevel};

use crate::backend::BackendEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Event or snapshot pushed by the backend subscription.
    Backend(BackendEvent),

    // User intents
    /// Text typed into the input: a prompt when idle, steering while streaming.
    Submit { text: String },
    FollowUp { text: String },
    Abort,
    NewSession,
    SetThinkingLevel(ThinkingLevel),
    SetModel { provider: String, model_id: String },
    LoadSession { path: PathBuf },
    /// Branch to a tree entry.
    NavigateTo { target_id: String, options: NavigateOptions },
    SelectEntry { id: String },
    SetTreeFilter(TreeFilter),
    CycleTreeFilter,
    ListSessions,
    DismissNotifications,

    // Results
    CommandFinished {
        command: Command,
        result: Result<(), String>,
    },
    NavigateFinished {
        target_id: String,
        result: Result<NavigateOutcome, String>,
    },
    StateLoaded(Result<Box<SessionState>, String>),
    HistoryLoaded(Result<Vec<Entry>, String>),
    SessionsListed(Result<Vec<SessionSummary>, String>),
}

/// Backend command kinds, for result routing and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Prompt,
    Steer,
    FollowUp,
    Abort,
    NewSession,
    SetThinkingLevel,
    SetModel,
    LoadSession,
}

impl Command {
    pub fn label(self) -> &'static str {
        match self {
            Command::Prompt => "Prompt",
            Command::Steer => "Steer",
            Command::FollowUp => "Follow-up",
            Command::Abort => "Abort",
            Command::NewSession => "New session",
            Command::SetThinkingLevel => "Thinking level change",
            Command::SetModel => "Model switch",
            Command::LoadSession => "Session load",
        }
    }
}
