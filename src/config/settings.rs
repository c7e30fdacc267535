//! Application settings and configuration types.
//!
//! Settings are persisted to `~/.config/sweep/settings.json` (or XDG
//! equivalent) and loaded at startup. Every knob has a default matching
//! the provider's documented limits, so a missing settings file is not
//! an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::providers::mail::MAX_BATCH_MODIFY_IDS;

/// Errors that can occur loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Mailbox scan configuration.
    pub scan: ScanSettings,
    /// Unsubscribe execution configuration.
    pub unsubscribe: UnsubscribeSettings,
}

/// Mailbox scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Search predicate for the scan window.
    pub query: String,
    /// Messages fetched concurrently per metadata batch.
    pub metadata_batch_size: usize,
    /// Identifiers per label-mutation batch. Capped at the provider's
    /// batchModify ceiling.
    pub trash_batch_size: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            query: "label:inbox newer_than:90d".to_string(),
            metadata_batch_size: 50,
            trash_batch_size: MAX_BATCH_MODIFY_IDS,
        }
    }
}

/// Unsubscribe execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsubscribeSettings {
    /// Milliseconds to wait after each unsubscribe dispatch when
    /// processing a multi-sender selection.
    pub throttle_delay_ms: u64,
}

impl Default for UnsubscribeSettings {
    fn default() -> Self {
        Self {
            throttle_delay_ms: 120,
        }
    }
}

impl Settings {
    /// Returns the default settings file path.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let dirs = directories::ProjectDirs::from("io", "sweep", "sweep")
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from the default path, falling back to defaults if
    /// no settings file exists yet.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads settings from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves settings to an explicit path, creating parent directories
    /// as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
