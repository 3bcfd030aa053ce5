//! User settings persistence.
//!
//! Stores the OCR and polling preferences between sessions. Only preferences
//! are persisted; found codes are never written to disk.

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User-configurable settings persisted between sessions.
///
/// Settings are stored as JSON in the user's config directory
/// (e.g., `~/.config/codeclip/settings.json` on Linux).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// Tesseract page segmentation mode (3 = fully automatic, tesseract's
    /// own default).
    pub page_seg_mode: u8,
    /// Pause after a cycle that found a code.
    pub found_pause_ms: u64,
    /// Pause after a cycle without a code.
    pub idle_pause_ms: u64,
    /// Pause after a failed cycle.
    pub failure_pause_ms: u64,
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "codeclip").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to defaults if not found or
    /// unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| Self::from_json(&content).ok())
            .unwrap_or_default()
    }

    /// Parses settings JSON; missing fields take their default values.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            let json = serde_json::to_string_pretty(self)?;
            fs::write(&path, json)?;
            tracing::debug!("Saved settings to {}", path.display());
        }
        Ok(())
    }
}

impl Settings {
    /// Applies to `self` only the fields that differ between `baseline` and
    /// `edited`.
    /// `baseline` may contain environment or command-line overrides; those
    /// never end up in the result unless the user edited the field.
    pub fn with_edits(mut self, baseline: &Settings, edited: &Settings) -> Self {
        if edited.language != baseline.language {
            self.language = edited.language.clone();
        }
        if edited.page_seg_mode != baseline.page_seg_mode {
            self.page_seg_mode = edited.page_seg_mode;
        }
        if edited.found_pause_ms != baseline.found_pause_ms {
            self.found_pause_ms = edited.found_pause_ms;
        }
        if edited.idle_pause_ms != baseline.idle_pause_ms {
            self.idle_pause_ms = edited.idle_pause_ms;
        }
        if edited.failure_pause_ms != baseline.failure_pause_ms {
            self.failure_pause_ms = edited.failure_pause_ms;
        }
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_seg_mode: 3,
            found_pause_ms: 3_000,
            idle_pause_ms: 1_000,
            failure_pause_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = Settings::from_json(r#"{ "language": "deu", "idle_pause_ms": 250 }"#).unwrap();
        assert_eq!(settings.language, "deu");
        assert_eq!(settings.idle_pause_ms, 250);
        assert_eq!(settings.found_pause_ms, 3_000);
        assert_eq!(settings.page_seg_mode, 3);
    }

    #[test]
    fn only_edited_fields_reach_stored_settings() {
        let stored = Settings::default();
        // effective values: stored settings plus a one-off pause override
        let baseline = Settings {
            found_pause_ms: 9_000,
            ..stored.clone()
        };
        let edited = Settings {
            language: "deu".into(),
            ..baseline.clone()
        };

        let merged = stored.clone().with_edits(&baseline, &edited);

        assert_eq!(merged.language, "deu");
        assert_eq!(merged.found_pause_ms, stored.found_pause_ms);
        assert_eq!(merged.idle_pause_ms, stored.idle_pause_ms);
    }

    #[test]
    fn unedited_panel_changes_nothing() {
        let stored = Settings {
            idle_pause_ms: 400,
            ..Settings::default()
        };
        let effective = Settings {
            language: "jpn".into(),
            ..stored.clone()
        };
        assert_eq!(stored.clone().with_edits(&effective, &effective), stored);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Settings::from_json("{ not json").is_err());
    }
}
