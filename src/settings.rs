//! Persistent settings stored as JSON in `config.json`.
//!
//! Nothing here is written implicitly: callers mutate a [`Settings`] value
//! and call [`Settings::save`] when they want it persisted.

use crate::atomic::atomic_write;
use crate::constants::{DEFAULT_SEG_SIZE_MB, MAX_SEG_SIZE_MB, MIN_SEG_SIZE_MB};
use crate::split::SegmentSize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_seg_size_mb")]
    pub seg_size_mb: u32,
    /// Last file chosen for splitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_split_file: Option<PathBuf>,
    /// Last part-set base chosen for merging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_merge_file: Option<PathBuf>,
}

fn default_seg_size_mb() -> u32 {
    DEFAULT_SEG_SIZE_MB
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seg_size_mb: DEFAULT_SEG_SIZE_MB,
            loaded_split_file: None,
            loaded_merge_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("Config file not found, creating {}", path.display());
            let settings = Settings::default();
            settings.save(path)?;
            return Ok(settings);
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write(path, json.as_bytes())?;
        Ok(())
    }

    /// Configured segment size; out-of-range values fall back to the default.
    pub fn segment_size(&self) -> SegmentSize {
        if !(MIN_SEG_SIZE_MB..=MAX_SEG_SIZE_MB).contains(&self.seg_size_mb) {
            warn!(
                "seg_size_mb {} out of range {MIN_SEG_SIZE_MB}-{MAX_SEG_SIZE_MB}, using {DEFAULT_SEG_SIZE_MB}",
                self.seg_size_mb
            );
            return SegmentSize::default();
        }
        SegmentSize::from_megabytes(self.seg_size_mb).unwrap_or_default()
    }
}

/// Parse segment-size input the way the size stepper does: anything that is
/// not a whole number between 1 and 999 becomes the default.
pub fn parse_seg_size_mb(input: &str) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(mb) if (MIN_SEG_SIZE_MB..=MAX_SEG_SIZE_MB).contains(&mb) => mb,
        _ => DEFAULT_SEG_SIZE_MB,
    }
}
