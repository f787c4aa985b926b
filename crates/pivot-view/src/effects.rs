//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent backend calls only; the reducer never awaits anything.

use std::path::PathBuf;

use pivot_types::{NavigateOptions, ThinkingLevel};

use crate::events::Command;

/// Effects returned by [`crate::update::update`] for the runtime to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    /// Fire a backend command; its outcome comes back as
    /// `UiEvent::CommandFinished`.
    Run(CommandRequest),

    /// Switch the active leaf.
    Navigate {
        target_id: String,
        options: NavigateOptions,
    },

    /// Pull a fresh session snapshot.
    FetchState,

    /// Pull the active-branch entries for transcript replay.
    FetchHistory,

    ListSessions,
}

/// A backend command with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandRequest {
    Prompt { text: String },
    Steer { text: String },
    FollowUp { text: String },
    Abort,
    NewSession,
    SetThinkingLevel { level: ThinkingLevel },
    SetModel { provider: String, model_id: String },
    LoadSession { path: PathBuf },
}

impl CommandRequest {
    pub fn command(&self) -> Command {
        match self {
            CommandRequest::Prompt { .. } => Command::Prompt,
            CommandRequest::Steer { .. } => Command::Steer,
            CommandRequest::FollowUp { .. } => Command::FollowUp,
            CommandRequest::Abort => Command::Abort,
            CommandRequest::NewSession => Command::NewSession,
            CommandRequest::SetThinkingLevel { .. } => Command::SetThinkingLevel,
            CommandRequest::SetModel { .. } => Command::SetModel,
            CommandRequest::LoadSession { .. } => Command::LoadSession,
        }
    }
}
