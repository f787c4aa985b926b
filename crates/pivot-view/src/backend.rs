//! Agent backend seam.
//!
//! The backend runs the model and tools; this layer only queries its state,
//! sends commands and consumes its event stream.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use pivot_types::{
    AgentEvent, Entry, NavigateOptions, NavigateOutcome, SessionState, SessionSummary,
    ThinkingLevel,
};
use tokio::sync::mpsc;

/// Something the backend pushes without being asked.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Agent(AgentEvent),
    /// Fresh session snapshot.
    State(Box<SessionState>),
}

pub type BackendEventTx = mpsc::UnboundedSender<BackendEvent>;
pub type BackendEventRx = mpsc::UnboundedReceiver<BackendEvent>;

#[async_trait]
pub trait AgentBackend: Send + Sync {
    // Queries

    async fn get_state(&self) -> Result<SessionState>;

    /// Entries of the active branch, root first.
    async fn get_history(&self) -> Result<Vec<Entry>>;

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    async fn load_session_file(&self, path: &Path) -> Result<()>;

    /// Moves the active leaf to `target_id`.
    async fn navigate_tree(
        &self,
        target_id: &str,
        options: NavigateOptions,
    ) -> Result<NavigateOutcome>;

    // Commands

    async fn prompt(&self, text: &str) -> Result<()>;

    /// Injects guidance into the running turn.
    async fn steer(&self, text: &str) -> Result<()>;

    /// Queues a prompt for after the running turn.
    async fn follow_up(&self, text: &str) -> Result<()>;

    async fn abort(&self) -> Result<()>;

    async fn new_session(&self) -> Result<()>;

    async fn set_thinking_level(&self, level: ThinkingLevel) -> Result<()>;

    async fn set_model(&self, provider: &str, model_id: &str) -> Result<()>;

    /// Opens a new event stream. Each call gets its own receiver; dropping
    /// it unsubscribes.
    fn subscribe(&self) -> BackendEventRx;
}

/// Fan-out of backend events to every live subscriber.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Mutex<Vec<BackendEventTx>>,
}

impl Subscribers {
    pub fn subscribe(&self) -> BackendEventRx {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Sends `event` to every subscriber, forgetting closed ones.
    pub fn broadcast(&self, event: &BackendEvent) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        let mut senders = self.lock();
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BackendEventTx>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
