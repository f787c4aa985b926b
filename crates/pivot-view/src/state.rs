//! View state.
//!
//! One `ViewState` per view session. The runtime owns it; renderers get a
//! shared reference only.

use pivot_core::config::Config;
use pivot_core::{FlattenOptions, TranscriptState, TreeFilter, TreeView, flatten_with};
use pivot_types::{DisplayMessage, SessionState, SessionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A user-visible message outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub transcript: TranscriptState,
    pub tree: TreeView,
    pub tree_options: FlattenOptions,
    pub show_labels: bool,
    /// Selected tree entry id. Survives refilters through its nearest
    /// visible ancestor.
    pub selected: Option<String>,
    /// Target of the navigation request in flight, if any.
    pub pending_navigation: Option<String>,
    /// Text handed back by the last navigation, for the input box.
    pub editor_text: Option<String>,
    pub notifications: Vec<Notification>,
    pub sessions: Vec<SessionSummary>,
    /// The transcript must be rebuilt from the next snapshot's history.
    pub history_stale: bool,
}

impl ViewState {
    pub fn new(config: &Config) -> Self {
        Self {
            transcript: TranscriptState::new(),
            tree: TreeView::default(),
            tree_options: FlattenOptions {
                filter: config.tree.filter,
                preview_max_chars: config.preview_max_chars,
            },
            show_labels: config.tree.show_labels,
            selected: None,
            pending_navigation: None,
            editor_text: None,
            notifications: Vec::new(),
            sessions: Vec::new(),
            history_stale: true,
        }
    }

    pub fn session(&self) -> &SessionState {
        self.transcript.session()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        self.transcript.messages()
    }

    pub fn tree_filter(&self) -> TreeFilter {
        self.tree_options.filter
    }

    pub fn is_streaming(&self) -> bool {
        self.transcript.is_streaming()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
            .as_deref()
            .and_then(|id| self.tree.index_of(id))
    }

    /// Re-flattens the tree from the session mirror.
    ///
    /// The selection moves to its nearest visible ancestor, or to the active
    /// leaf when nothing was selected.
    pub fn refresh_tree(&mut self) {
        let session = self.transcript.session();
        self.tree = flatten_with(
            &session.tree,
            session.leaf_id.as_deref(),
            &self.tree_options,
        );

        let index = match self.selected.as_deref() {
            Some(id) => self.tree.nearest_visible_index(id),
            None => None,
        }
        .or_else(|| self.tree.leaf_index())
        .or_else(|| self.tree.rows.len().checked_sub(1));
        self.selected = index.map(|idx| self.tree.rows[idx].id.clone());
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
