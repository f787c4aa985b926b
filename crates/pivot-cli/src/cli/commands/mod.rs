//! CLI command handlers.

pub mod fold;
pub mod sessions;
pub mod show;
pub mod tree;
