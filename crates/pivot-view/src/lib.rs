//! View controller for Pivot.
//!
//! Bridges an agent backend to a host display using an Elm-like split:
//! - `events`/`effects`: what flows in and out of the reducer
//! - `update`: the pure reducer over [`state::ViewState`]
//! - `runtime`: the single writer that folds events, runs effects and
//!   coalesces renders per frame
//! - `render`/`statusline`: read-only projections for hosts
//! - `backend`/`replay`: the backend seam and an offline session-file backend

pub mod backend;
pub mod effects;
pub mod events;
pub mod render;
pub mod replay;
pub mod runtime;
pub mod state;
pub mod statusline;
pub mod update;

pub use backend::{AgentBackend, BackendEvent, Subscribers};
pub use events::{Command, UiEvent};
pub use replay::ReplayBackend;
pub use runtime::{FrameSink, ViewController};
pub use state::{Notification, NotificationLevel, ViewState};
