//! Pivot core: conversation tree flattening and transcript reduction.
//!
//! Everything here is synchronous and free of UI concerns. The view layer
//! (`pivot-view`) drives these functions from a backend event stream.

pub mod config;
pub mod correlate;
pub mod logging;
pub mod session_file;
pub mod transcript;
pub mod tree;

pub use config::Config;
pub use session_file::{SessionFile, list_sessions};
pub use transcript::{Action, MessageIdSeq, TranscriptEffect, TranscriptState, reduce};
pub use tree::{FlattenOptions, TreeFilter, TreeRow, TreeView, flatten, flatten_with};
