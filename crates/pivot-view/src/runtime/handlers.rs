//! Effect handlers.
//!
//! Pure async functions: each performs one backend call and turns the
//! outcome into the `UiEvent` the reducer expects. The runtime spawns them and
//! sends the result to the inbox.

use std::sync::Arc;

use anyhow::{Context, Result};
use pivot_types::NavigateOptions;

use crate::backend::AgentBackend;
use crate::effects::CommandRequest;
use crate::events::UiEvent;

/// Error text shown to the user: the full context chain on one line.
fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

pub async fn run_command(backend: Arc<dyn AgentBackend>, request: CommandRequest) -> UiEvent {
    let command = request.command();
    let result = match request {
        CommandRequest::Prompt { text } => backend.prompt(&text).await,
        CommandRequest::Steer { text } => backend.steer(&text).await,
        CommandRequest::FollowUp { text } => backend.follow_up(&text).await,
        CommandRequest::Abort => backend.abort().await,
        CommandRequest::NewSession => backend.new_session().await,
        CommandRequest::SetThinkingLevel { level } => backend.set_thinking_level(level).await,
        CommandRequest::SetModel { provider, model_id } => {
            backend.set_model(&provider, &model_id).await
        }
        CommandRequest::LoadSession { path } => backend
            .load_session_file(&path)
            .await
            .with_context(|| format!("Failed to load {}", path.display())),
    };
    if let Err(e) = &result {
        tracing::warn!(command = command.label(), error = %describe(e), "backend command failed");
    }
    UiEvent::CommandFinished {
        command,
        result: result.map_err(|e| describe(&e)),
    }
}

pub async fn navigate(
    backend: Arc<dyn AgentBackend>,
    target_id: String,
    options: NavigateOptions,
) -> UiEvent {
    let result = backend
        .navigate_tree(&target_id, options)
        .await
        .map_err(|e| describe(&e));
    UiEvent::NavigateFinished { target_id, result }
}

pub async fn fetch_state(backend: Arc<dyn AgentBackend>) -> UiEvent {
    let result: Result<_> = backend.get_state().await.context("get_state");
    UiEvent::StateLoaded(result.map(Box::new).map_err(|e| describe(&e)))
}

pub async fn fetch_history(backend: Arc<dyn AgentBackend>) -> UiEvent {
    let result = backend.get_history().await.context("get_history");
    UiEvent::HistoryLoaded(result.map_err(|e| describe(&e)))
}

pub async fn list_sessions(backend: Arc<dyn AgentBackend>) -> UiEvent {
    let result = backend.list_sessions().await.context("list_sessions");
    UiEvent::SessionsListed(result.map_err(|e| describe(&e)))
}
