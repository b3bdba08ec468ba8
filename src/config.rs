use crate::domain::types::ContentLimits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the directive store and CLI, read from `config.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DirectivesConfig {
    /// Storage root override. Defaults to `~/.directives`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Events between aggregate snapshots (0 disables snapshots).
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub limits: ContentLimits,
}

fn default_snapshot_every() -> u64 {
    50
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DirectivesConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_every: default_snapshot_every(),
            log_level: default_log_level(),
            limits: ContentLimits::default(),
        }
    }
}

impl DirectivesConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given; otherwise the default location if it exists,
    /// else built-in defaults.
    pub fn resolve(path: Option<&Path>, default_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("log_level must not be empty");
        }

        let limits = [
            ("name_max", self.limits.name_max),
            ("description_max", self.limits.description_max),
            ("content_max", self.limits.content_max),
            ("step_max", self.limits.step_max),
            ("example_field_max", self.limits.example_field_max),
        ];
        for (field, value) in limits {
            if value == 0 {
                anyhow::bail!("limits.{} must be greater than zero", field);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
