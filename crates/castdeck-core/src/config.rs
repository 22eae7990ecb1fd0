//! CastDeck configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CastDeckError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastDeckConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl CastDeckConfig {
    /// Load config from the default path (~/.castdeck/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CastDeckError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CastDeckError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CastDeckError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Reject combinations the scheduler cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the CastDeck home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".castdeck")
    }
}

/// Timing policy for the upcoming-warning poll and simulated broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the clock ticks the stream manager.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// How far ahead of a one-time start the "starts soon" warning fires.
    #[serde(default = "default_lookahead")]
    pub lookahead_secs: u64,
    /// Simulated broadcast length for streams without auto-stop.
    #[serde(default = "default_fallback_live")]
    pub fallback_live_secs: u64,
}

/// Upper bound for every scheduler timing value (one year).
pub const MAX_TIMING_SECS: u64 = 365 * 24 * 60 * 60;

fn default_poll_interval() -> u64 { 30 }
fn default_lookahead() -> u64 { 300 }
fn default_fallback_live() -> u64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            lookahead_secs: default_lookahead(),
            fallback_live_secs: default_fallback_live(),
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    /// Saturates instead of panicking on values `validate` would reject.
    pub fn lookahead(&self) -> chrono::Duration {
        secs_to_duration(self.lookahead_secs)
    }

    /// Saturates instead of panicking on values `validate` would reject.
    pub fn fallback_live(&self) -> chrono::Duration {
        secs_to_duration(self.fallback_live_secs)
    }

    /// The poll must be finer than the lookahead window, otherwise a
    /// stream can cross the whole window between two ticks.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(CastDeckError::Config("poll_interval_secs must be > 0".into()));
        }
        if self.lookahead_secs == 0 {
            return Err(CastDeckError::Config("lookahead_secs must be > 0".into()));
        }
        if self.poll_interval_secs >= self.lookahead_secs {
            return Err(CastDeckError::Config(format!(
                "poll_interval_secs ({}) must be smaller than lookahead_secs ({})",
                self.poll_interval_secs, self.lookahead_secs
            )));
        }
        if self.fallback_live_secs == 0 {
            return Err(CastDeckError::Config("fallback_live_secs must be > 0".into()));
        }
        for (name, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("lookahead_secs", self.lookahead_secs),
            ("fallback_live_secs", self.fallback_live_secs),
        ] {
            if value > MAX_TIMING_SECS {
                return Err(CastDeckError::Config(format!(
                    "{name} ({value}) exceeds the maximum of {MAX_TIMING_SECS}"
                )));
            }
        }
        Ok(())
    }
}

fn secs_to_duration(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Newest notifications kept by the notification center.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize { 100 }

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}
