//! Storage layout for directive persistence.
//!
//! Everything lives under one root, `~/.directives/` unless overridden:
//! - `config.yaml` - Optional configuration
//! - `events.jsonl` - Event log shared by all directives
//! - `snapshots/<id>.json` - Per-directive aggregate snapshots
//! - `logs/events.jsonl` - Structured audit log

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DIRECTIVES_DIR: &str = ".directives";

/// Resolved locations under a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectivePaths {
    root: PathBuf,
}

impl DirectivePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.directives/`.
    pub fn home() -> Result<Self> {
        Ok(Self::new(home_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn event_log(&self) -> PathBuf {
        self.root.join("events.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates the root and its subdirectories if they don't exist.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.root.clone(), self.snapshots_dir(), self.logs_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Returns the home-based storage root without creating it.
pub fn home_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for directive storage")?;
    Ok(home.join(DIRECTIVES_DIR))
}

/// Default config location: `~/.directives/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(home_root()?.join("config.yaml"))
}
