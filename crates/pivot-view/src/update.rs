//! View reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event,
//! seq)` and executes the returned effects. Transcript changes are delegated
//! to the core transcript reducer.

use pivot_core::transcript::{Action, MessageIdSeq, TranscriptEffect, reduce};
use pivot_types::{AgentEvent, SessionState};

use crate::backend::BackendEvent;
use crate::effects::{CommandRequest, UiEffect};
use crate::events::{Command, UiEvent};
use crate::state::{Notification, ViewState};

/// The main reducer function.
pub fn update(state: &mut ViewState, event: UiEvent, seq: &mut MessageIdSeq) -> Vec<UiEffect> {
    match event {
        UiEvent::Backend(BackendEvent::Agent(event)) => handle_agent_event(state, event, seq),
        UiEvent::Backend(BackendEvent::State(session)) => apply_session(state, session, seq),

        UiEvent::Submit { text } => {
            let text = text.trim().to_string();
            if text.is_empty() {
                return vec![];
            }
            if state.is_streaming() {
                vec![UiEffect::Run(CommandRequest::Steer { text })]
            } else {
                apply(
                    state,
                    Action::Event(AgentEvent::UserMessage { text: text.clone() }),
                    seq,
                );
                vec![UiEffect::Run(CommandRequest::Prompt { text })]
            }
        }
        UiEvent::FollowUp { text } => vec![UiEffect::Run(CommandRequest::FollowUp { text })],
        UiEvent::Abort => vec![UiEffect::Run(CommandRequest::Abort)],
        UiEvent::NewSession => vec![UiEffect::Run(CommandRequest::NewSession)],
        UiEvent::SetThinkingLevel(level) => {
            vec![UiEffect::Run(CommandRequest::SetThinkingLevel { level })]
        }
        UiEvent::SetModel { provider, model_id } => {
            vec![UiEffect::Run(CommandRequest::SetModel { provider, model_id })]
        }
        UiEvent::LoadSession { path } => vec![UiEffect::Run(CommandRequest::LoadSession { path })],
        UiEvent::NavigateTo { target_id, options } => {
            if let Some(pending) = &state.pending_navigation {
                tracing::debug!(%pending, %target_id, "navigation already in flight");
                return vec![];
            }
            state.pending_navigation = Some(target_id.clone());
            vec![UiEffect::Navigate { target_id, options }]
        }
        UiEvent::SelectEntry { id } => {
            state.selected = state
                .tree
                .nearest_visible_index(&id)
                .map(|idx| state.tree.rows[idx].id.clone());
            vec![]
        }
        UiEvent::SetTreeFilter(filter) => {
            state.tree_options.filter = filter;
            state.refresh_tree();
            vec![]
        }
        UiEvent::CycleTreeFilter => {
            state.tree_options.filter = state.tree_options.filter.cycle();
            state.refresh_tree();
            vec![]
        }
        UiEvent::ListSessions => vec![UiEffect::ListSessions],
        UiEvent::DismissNotifications => {
            state.notifications.clear();
            vec![]
        }

        UiEvent::CommandFinished { command, result } => {
            handle_command_finished(state, command, result, seq)
        }
        UiEvent::NavigateFinished { target_id, result } => {
            state.pending_navigation = None;
            match result {
                Ok(outcome) if outcome.cancelled => {
                    state.notify(Notification::info("Navigation cancelled"));
                    vec![]
                }
                Ok(outcome) => {
                    tracing::debug!(%target_id, "navigation finished");
                    state.editor_text = outcome.editor_text;
                    state.selected = Some(target_id);
                    state.history_stale = true;
                    vec![UiEffect::FetchState]
                }
                Err(e) => {
                    state.notify(Notification::error(format!("Navigation failed: {e}")));
                    vec![]
                }
            }
        }
        UiEvent::StateLoaded(Ok(session)) => apply_session(state, session, seq),
        UiEvent::StateLoaded(Err(e)) => {
            state.notify(Notification::error(format!("Failed to load state: {e}")));
            vec![]
        }
        UiEvent::HistoryLoaded(Ok(entries)) => {
            state.history_stale = false;
            apply(state, Action::HistoryReplace(entries), seq);
            vec![]
        }
        UiEvent::HistoryLoaded(Err(e)) => {
            state.notify(Notification::error(format!("Failed to load history: {e}")));
            vec![]
        }
        UiEvent::SessionsListed(Ok(sessions)) => {
            state.sessions = sessions;
            vec![]
        }
        UiEvent::SessionsListed(Err(e)) => {
            state.notify(Notification::error(format!("Failed to list sessions: {e}")));
            vec![]
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn handle_agent_event(
    state: &mut ViewState,
    event: AgentEvent,
    seq: &mut MessageIdSeq,
) -> Vec<UiEffect> {
    let run_finished = matches!(event, AgentEvent::AgentEnd);
    apply(state, Action::Event(event), seq);
    // The run appended entries: the tree needs a new snapshot.
    if run_finished {
        vec![UiEffect::FetchState]
    } else {
        vec![]
    }
}

/// Mirrors a snapshot, refreshes the tree and decides whether the transcript
/// must be rebuilt from history.
fn apply_session(
    state: &mut ViewState,
    session: Box<SessionState>,
    seq: &mut MessageIdSeq,
) -> Vec<UiEffect> {
    let leaf_changed = state.session().leaf_id != session.leaf_id;
    let streaming = session.is_streaming;
    apply(state, Action::SessionReplace(session), seq);

    // While streaming the leaf moves with every appended entry and the
    // transcript is already live.
    if !streaming && (leaf_changed || state.history_stale) {
        state.history_stale = true;
        vec![UiEffect::FetchHistory]
    } else {
        vec![]
    }
}

fn handle_command_finished(
    state: &mut ViewState,
    command: Command,
    result: Result<(), String>,
    seq: &mut MessageIdSeq,
) -> Vec<UiEffect> {
    if let Err(e) = result {
        state.notify(Notification::error(format!("{} failed: {e}", command.label())));
        return vec![];
    }
    match command {
        Command::NewSession | Command::LoadSession => {
            apply(state, Action::Clear, seq);
            state.history_stale = true;
            state.selected = None;
            vec![UiEffect::FetchState]
        }
        Command::SetModel | Command::SetThinkingLevel => vec![UiEffect::FetchState],
        Command::Prompt | Command::Steer | Command::FollowUp | Command::Abort => vec![],
    }
}

fn apply(state: &mut ViewState, action: Action, seq: &mut MessageIdSeq) {
    for effect in reduce(&mut state.transcript, action, seq) {
        match effect {
            TranscriptEffect::RefreshTree => state.refresh_tree(),
        }
    }
}
