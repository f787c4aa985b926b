//! Linear transcript of the active branch.
//!
//! The transcript is a list of [`DisplayMessage`]s folded from streamed agent
//! events (see [`reduce`]) or rebuilt wholesale from persisted entries (see
//! [`messages_from_entries`]). All mutation goes through [`reduce`].

mod history;
mod reduce;

use pivot_types::{DisplayMessage, MessageId, SessionState};

pub use self::history::{compaction_label, messages_from_entries, tool_result_value};
pub use self::reduce::{
    Action, COMPACTION_PLACEHOLDER, RETRY_PLACEHOLDER, TranscriptEffect, reduce,
};

/// Monotonic message id generator.
///
/// Owned by whoever drives the reducer, one per view session, so that
/// independent sessions never share counter state.
#[derive(Debug, Default)]
pub struct MessageIdSeq {
    next: u64,
}

impl MessageIdSeq {
    pub fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Starts over from zero. Only valid once no message holds an old id.
    pub(crate) fn restart(&mut self) {
        self.next = 0;
    }
}

/// Reducer state: messages, the streaming pointer and the session mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptState {
    pub(crate) messages: Vec<DisplayMessage>,
    pub(crate) in_progress: Option<MessageId>,
    pub(crate) session: SessionState,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    /// The assistant message currently receiving deltas.
    pub fn in_progress(&self) -> Option<MessageId> {
        self.in_progress
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn message(&self, id: MessageId) -> Option<&DisplayMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub(crate) fn message_mut(&mut self, id: MessageId) -> Option<&mut DisplayMessage> {
        self.messages.iter_mut().find(|message| message.id == id)
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming
    }
}
