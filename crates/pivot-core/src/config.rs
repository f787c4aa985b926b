//! Configuration management for Pivot.
//!
//! Loads configuration from ${PIVOT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tree::TreeFilter;

pub mod paths {
    //! Path resolution for Pivot configuration and data directories.
    //!
    //! PIVOT_HOME resolution order:
    //! 1. PIVOT_HOME environment variable (if set)
    //! 2. ~/.config/pivot (default)
    //! 3. ./.pivot when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the Pivot home directory.
    pub fn pivot_home() -> PathBuf {
        if let Ok(home) = std::env::var("PIVOT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".pivot"),
            |h| h.join(".config").join("pivot"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        pivot_home().join("config.toml")
    }

    /// Returns the default sessions directory.
    pub fn sessions_dir() -> PathBuf {
        pivot_home().join("sessions")
    }
}

/// Tree view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Which entries the tree view shows.
    pub filter: TreeFilter,
    /// Append `[label]` to labeled rows.
    pub show_labels: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            filter: TreeFilter::Default,
            show_labels: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive (overridden by the PIVOT_LOG env var).
    pub level: String,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum characters of a tree row preview before the ellipsis.
    pub preview_max_chars: usize,

    /// Minimum time between two renders while events stream in.
    pub frame_interval_ms: u64,

    /// Directory scanned by `pivot sessions` (defaults to ${PIVOT_HOME}/sessions).
    pub sessions_dir: Option<PathBuf>,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 140;
    /// ~60fps
    const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn effective_sessions_dir(&self) -> PathBuf {
        self.sessions_dir.clone().unwrap_or_else(paths::sessions_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_max_chars: Self::DEFAULT_PREVIEW_MAX_CHARS,
            frame_interval_ms: Self::DEFAULT_FRAME_INTERVAL_MS,
            sessions_dir: None,
            tree: TreeConfig::default(),
            log: LogConfig::default(),
        }
    }
}
