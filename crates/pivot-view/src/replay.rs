//! Offline backend over a persisted session file.
//!
//! State, history and branch navigation work locally against the parsed
//! log. Anything that would need a live agent fails with a read-only error.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use async_trait::async_trait;
use pivot_core::session_file::{SessionFile, list_sessions};
use pivot_core::tree::path_to_leaf;
use pivot_types::{
    AgentMessage, Entry, EntryKind, NavigateOptions, NavigateOutcome, SessionState,
    SessionSummary, ThinkingLevel,
};

use crate::backend::{AgentBackend, BackendEvent, BackendEventRx, Subscribers};

const READ_ONLY: &str = "Session replay is read-only";

struct Loaded {
    file: SessionFile,
    leaf_id: Option<String>,
}

pub struct ReplayBackend {
    loaded: Mutex<Loaded>,
    sessions_dir: Option<PathBuf>,
    subscribers: Subscribers,
}

impl ReplayBackend {
    pub fn new(file: SessionFile) -> Self {
        let leaf_id = file.default_leaf().map(str::to_string);
        Self {
            loaded: Mutex::new(Loaded { file, leaf_id }),
            sessions_dir: None,
            subscribers: Subscribers::default(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(SessionFile::load(path)?))
    }

    /// Directory listed by [`AgentBackend::list_sessions`].
    #[must_use]
    pub fn with_sessions_dir(mut self, dir: PathBuf) -> Self {
        self.sessions_dir = Some(dir);
        self
    }

    /// Starts at `leaf_id` instead of the last entry.
    pub fn set_leaf(&self, leaf_id: &str) -> Result<()> {
        let mut loaded = self.lock();
        if !loaded.file.entries.iter().any(|e| e.id == leaf_id) {
            bail!("Unknown entry id: {leaf_id}");
        }
        loaded.leaf_id = Some(leaf_id.to_string());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Loaded> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> SessionState {
        let loaded = self.lock();
        let file = &loaded.file;
        let mut state = SessionState {
            cwd: file.cwd.clone(),
            folder_name: file.cwd.as_deref().and_then(|cwd| {
                Path::new(cwd)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            }),
            session_name: file.name.clone(),
            tree: file.entries.clone(),
            leaf_id: loaded.leaf_id.clone(),
            ..SessionState::default()
        };

        // Model and thinking level in effect at the leaf.
        if let Some(leaf) = loaded.leaf_id.as_deref() {
            for entry in path_to_leaf(&file.entries, leaf) {
                match &entry.kind {
                    EntryKind::ModelChange { provider, model_id } => {
                        state.provider_name = Some(provider.clone());
                        state.model_id = Some(model_id.clone());
                        state.model_name = Some(model_id.clone());
                    }
                    EntryKind::ThinkingLevelChange { thinking_level } => {
                        state.thinking_level =
                            ThinkingLevel::parse(thinking_level).unwrap_or_default();
                    }
                    _ => {}
                }
            }
        }
        state
    }

    fn publish_state(&self) {
        self.subscribers
            .broadcast(&BackendEvent::State(Box::new(self.snapshot())));
    }
}

#[async_trait]
impl AgentBackend for ReplayBackend {
    async fn get_state(&self) -> Result<SessionState> {
        Ok(self.snapshot())
    }

    async fn get_history(&self) -> Result<Vec<Entry>> {
        let loaded = self.lock();
        let Some(leaf) = loaded.leaf_id.as_deref() else {
            return Ok(Vec::new());
        };
        Ok(path_to_leaf(&loaded.file.entries, leaf)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        match &self.sessions_dir {
            Some(dir) => list_sessions(dir),
            None => Ok(Vec::new()),
        }
    }

    async fn load_session_file(&self, path: &Path) -> Result<()> {
        let file = SessionFile::load(path)?;
        {
            let mut loaded = self.lock();
            loaded.leaf_id = file.default_leaf().map(str::to_string);
            loaded.file = file;
        }
        self.publish_state();
        Ok(())
    }

    async fn navigate_tree(
        &self,
        target_id: &str,
        options: NavigateOptions,
    ) -> Result<NavigateOutcome> {
        if options.summarize {
            bail!("{READ_ONLY}: cannot summarize a branch");
        }

        let outcome = {
            let mut loaded = self.lock();
            let Some(target) = loaded.file.entries.iter().find(|e| e.id == target_id) else {
                bail!("Unknown entry id: {target_id}");
            };

            // Selecting a user message resumes from its parent and hands the
            // text back for editing.
            let (leaf_id, editor_text) = match target.message() {
                Some(message @ AgentMessage::User { .. }) => {
                    (target.parent_id.clone(), Some(message.text()))
                }
                _ => (Some(target.id.clone()), None),
            };
            loaded.leaf_id = leaf_id;
            NavigateOutcome {
                editor_text,
                cancelled: false,
                aborted: None,
            }
        };

        self.publish_state();
        Ok(outcome)
    }

    async fn prompt(&self, _text: &str) -> Result<()> {
        bail!(READ_ONLY)
    }

    async fn steer(&self, _text: &str) -> Result<()> {
        bail!(READ_ONLY)
    }

    async fn follow_up(&self, _text: &str) -> Result<()> {
        bail!(READ_ONLY)
    }

    async fn abort(&self) -> Result<()> {
        // Nothing is ever running.
        Ok(())
    }

    async fn new_session(&self) -> Result<()> {
        bail!(READ_ONLY)
    }

    async fn set_thinking_level(&self, _level: ThinkingLevel) -> Result<()> {
        bail!(READ_ONLY)
    }

    async fn set_model(&self, _provider: &str, _model_id: &str) -> Result<()> {
        bail!(READ_ONLY)
    }

    fn subscribe(&self) -> BackendEventRx {
        self.subscribers.subscribe()
    }
}
