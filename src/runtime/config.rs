use std::path::Path;
use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};

use crate::runtime::engine::RunMode;

/// Pacing categories a node handler can ask for; the engine maps them to
/// durations through [`PacingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// After a bot message.
    Message,
    /// After an action-like or silent node.
    Action,
    /// A `delay` node; `None` uses the configured default.
    Delay(Option<u64>),
}

/// Pacing in milliseconds. Scheduling hints only, never correctness barriers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub start: u64,
    pub message: u64,
    pub action: u64,
    pub transition: u64,
    pub response: u64,
    pub default_delay: u64,
}

impl PacingConfig {
    pub fn preview() -> Self {
        Self {
            start: 1000,
            message: 1500,
            action: 2000,
            transition: 500,
            response: 1000,
            default_delay: 2000,
        }
    }

    pub fn public() -> Self {
        Self {
            start: 0,
            message: 1500,
            action: 100,
            transition: 500,
            response: 1000,
            default_delay: 1000,
        }
    }

    pub fn instant() -> Self {
        Self {
            start: 0,
            message: 0,
            action: 0,
            transition: 0,
            response: 0,
            default_delay: 0,
        }
    }

    pub fn resolve(&self, pace: Pace) -> Duration {
        let millis = match pace {
            Pace::Message => self.message,
            Pace::Action => self.action,
            Pace::Delay(explicit) => explicit.unwrap_or(self.default_delay),
        };
        Duration::from_millis(millis)
    }

    pub fn start(&self) -> Duration {
        Duration::from_millis(self.start)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition)
    }

    pub fn response(&self) -> Duration {
        Duration::from_millis(self.response)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self::preview()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pacing: PacingConfig,
    /// Maximum node visits per run.
    pub step_limit: usize,
}

impl EngineConfig {
    pub const DEFAULT_STEP_LIMIT: usize = 10_000;

    pub fn for_mode(mode: RunMode) -> Self {
        let pacing = match mode {
            RunMode::Preview => PacingConfig::preview(),
            RunMode::Public => PacingConfig::public(),
        };
        Self {
            pacing,
            step_limit: Self::DEFAULT_STEP_LIMIT,
        }
    }

    pub fn instant() -> Self {
        Self {
            pacing: PacingConfig::instant(),
            step_limit: Self::DEFAULT_STEP_LIMIT,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse engine configuration")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine configuration from {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_mode(RunMode::Preview)
    }
}
