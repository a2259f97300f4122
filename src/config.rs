//! Runtime configuration for a simulation session.
//!
//! Compile-time tuning lives in [`crate::constants`]; this module covers the
//! knobs a launcher chooses per session. Values load from JSON and any field
//! left out falls back to its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_VERSION_CODE, MAXBUTTONS, MAXCEILINGS, MAXPLATS};

/// Errors raised while reading a [`SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was requested.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The contents were not valid JSON for [`SimConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-session simulation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Capacity of the active-ceiling tracker.
    pub max_ceilings: usize,
    /// Capacity of the active-platform tracker.
    pub max_plats: usize,
    /// Switch buttons that may be timed at once.
    pub max_buttons: usize,
    /// Respawn picked-up items after a delay ("altdeath" rules).
    pub item_respawn: bool,
    /// Exit the level after this many minutes.
    pub level_timer_minutes: Option<u32>,
    /// Networked session; disables menu pausing.
    pub netgame: bool,
    /// Starting offset into the random table.
    pub random_index: u8,
    /// Numeric code written into and expected from save headers.
    pub version_code: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_ceilings: MAXCEILINGS,
            max_plats: MAXPLATS,
            max_buttons: MAXBUTTONS,
            item_respawn: false,
            level_timer_minutes: None,
            netgame: false,
            random_index: 0,
            version_code: DEFAULT_VERSION_CODE,
        }
    }
}

impl SimConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the text is not a valid config.
    ///
    /// # Examples
    /// ```
    /// use gloom::config::SimConfig;
    /// let cfg = SimConfig::from_json_str(r#"{ "max_ceilings": 4 }"#).unwrap();
    /// assert_eq!(cfg.max_ceilings, 4);
    /// assert_eq!(cfg.version_code, 109);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// The version string stamped into save headers.
    #[must_use]
    pub fn version_string(&self) -> String {
        format!("version {}", self.version_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_object_yields_defaults() {
        let cfg = SimConfig::from_json_str("{}").expect("valid config");
        assert_eq!(cfg, SimConfig::default());
    }

    #[rstest]
    fn overrides_apply_field_by_field() {
        let cfg = SimConfig::from_json_str(r#"{ "item_respawn": true, "level_timer_minutes": 2 }"#)
            .expect("valid config");
        assert!(cfg.item_respawn);
        assert_eq!(cfg.level_timer_minutes, Some(2));
        assert_eq!(cfg.max_plats, MAXPLATS);
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        let err = SimConfig::from_json_str("{ nope").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[rstest]
    fn missing_file_is_an_io_error() {
        let err = SimConfig::load("/definitely/not/here.json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[rstest]
    fn version_string_uses_code() {
        assert_eq!(SimConfig::default().version_string(), "version 109");
    }
}
