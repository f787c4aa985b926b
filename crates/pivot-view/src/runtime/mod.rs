//! View runtime: owns the state, runs the fold loop, executes effects.
//!
//! This is the boundary where side effects happen. `update` stays pure and
//! returns effects; this module executes them against the backend.
//!
//! ## Inbox Pattern
//!
//! Every input arrives through one inbox channel:
//! - the subscription task forwards backend pushes as `UiEvent::Backend`
//! - hosts send user intents through [`ViewController::sender`]
//! - spawned effect handlers send their results when the call completes
//!
//! Each frame drains the inbox, folds the events in arrival order and renders
//! once. Streaming deltas that land within one frame interval share a render.

mod handlers;

use std::future::Future;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use pivot_core::config::Config;
use pivot_core::transcript::MessageIdSeq;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::AgentBackend;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::ViewState;
use crate::update;

pub type UiEventSender = mpsc::UnboundedSender<UiEvent>;
pub type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Receives one call per frame with the folded state.
pub trait FrameSink: Send {
    fn render(&mut self, state: &ViewState);
}

impl<F> FrameSink for F
where
    F: FnMut(&ViewState) + Send,
{
    fn render(&mut self, state: &ViewState) {
        self(state);
    }
}

/// Backend event forwarding, live until dropped.
struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    fn start(backend: &dyn AgentBackend, inbox: UiEventSender) -> Self {
        let mut events = backend.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        if inbox.send(UiEvent::Backend(event)).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { cancel, task }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Single writer for one view session.
///
/// Owns the view state and the message id sequence; nothing else mutates
/// them. Renderers only ever see `&ViewState`.
pub struct ViewController {
    backend: Arc<dyn AgentBackend>,
    state: ViewState,
    seq: MessageIdSeq,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    /// Received but not yet folded.
    queued: Vec<UiEvent>,
    subscription: Option<Subscription>,
    shutdown: CancellationToken,
    sink: Box<dyn FrameSink>,
    frame_interval: Duration,
    last_render: Option<Instant>,
}

impl ViewController {
    /// Subscribes to `backend` and requests the initial snapshot.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        backend: Arc<dyn AgentBackend>,
        config: &Config,
        sink: impl FrameSink + 'static,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let subscription = Subscription::start(backend.as_ref(), inbox_tx.clone());

        let controller = Self {
            backend,
            state: ViewState::new(config),
            seq: MessageIdSeq::default(),
            inbox_tx,
            inbox_rx,
            queued: Vec::new(),
            subscription: Some(subscription),
            shutdown: CancellationToken::new(),
            sink: Box::new(sink),
            frame_interval: config.frame_interval(),
            last_render: None,
        };
        controller.execute_effect(UiEffect::FetchState);
        controller
    }

    /// Inbox handle for user intents.
    pub fn sender(&self) -> UiEventSender {
        self.inbox_tx.clone()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits for input, folds everything queued by the end of the frame
    /// interval, and renders once.
    ///
    /// Returns `false` once disposed; no event is folded after that.
    /// Cancel safe: events received before cancellation fold in the next
    /// call.
    pub async fn next_frame(&mut self) -> bool {
        if self.queued.is_empty() {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return false,
                event = self.inbox_rx.recv() => match event {
                    Some(event) => self.queued.push(event),
                    None => return false,
                },
            }
        }

        if let Some(last) = self.last_render {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return false,
                () = tokio::time::sleep_until(last + self.frame_interval) => {}
            }
        }

        while let Ok(event) = self.inbox_rx.try_recv() {
            self.queued.push(event);
        }
        let events = mem::take(&mut self.queued);
        tracing::trace!(count = events.len(), "folding frame");

        for event in events {
            self.dispatch_event(event);
        }

        self.sink.render(&self.state);
        self.last_render = Some(Instant::now());
        true
    }

    /// Runs frames until disposed or the shutdown token is cancelled.
    pub async fn run(&mut self) {
        while self.next_frame().await {}
        self.dispose();
    }

    /// Releases the backend subscription. Nothing is delivered afterwards.
    pub fn dispose(&mut self) {
        if self.subscription.take().is_some() {
            tracing::debug!("view controller disposed");
        }
        self.shutdown.cancel();
        self.queued.clear();
        while self.inbox_rx.try_recv().is_ok() {}
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event, &mut self.seq);
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns a backend call and sends its result event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<dyn AgentBackend>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let _ = tx.send(f(backend).await);
        });
    }

    fn execute_effect(&self, effect: UiEffect) {
        match effect {
            UiEffect::Run(request) => {
                self.spawn_effect(move |backend| handlers::run_command(backend, request));
            }
            UiEffect::Navigate { target_id, options } => {
                self.spawn_effect(move |backend| handlers::navigate(backend, target_id, options));
            }
            UiEffect::FetchState => self.spawn_effect(handlers::fetch_state),
            UiEffect::FetchHistory => self.spawn_effect(handlers::fetch_history),
            UiEffect::ListSessions => self.spawn_effect(handlers::list_sessions),
        }
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
