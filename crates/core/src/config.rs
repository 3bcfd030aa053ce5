use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::settings::Settings;
use dotenvy::dotenv;

/// Default bounding box for the preview thumbnail.
pub const DEFAULT_PREVIEW_MAX: (u32, u32) = (400, 300);

/// Pauses between monitor cycles, chosen by cycle outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTimings {
    /// After a code was found; debounces a code that stays on screen.
    pub found: Duration,
    /// After a cycle without a code.
    pub idle: Duration,
    /// After a failed capture or recognition.
    pub failure: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            found: Duration::from_secs(3),
            idle: Duration::from_secs(1),
            failure: Duration::from_secs(5),
        }
    }
}

/// Tesseract options for every recognition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrConfig {
    pub language: String,
    pub page_seg_mode: u8,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub monitor_index: usize,
    pub ocr: OcrConfig,
    pub timings: PollTimings,
    pub preview_max: (u32, u32),
}

impl Config {
    /// Loads persisted settings, then applies `CODECLIP_*` environment
    /// overrides (including those from a `.env` file).
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        Self::from_settings(&Settings::load()).with_overrides(|key| env::var(key).ok())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            monitor_index: 0,
            ocr: OcrConfig {
                language: settings.language.clone(),
                page_seg_mode: settings.page_seg_mode,
            },
            timings: PollTimings {
                found: Duration::from_millis(settings.found_pause_ms),
                idle: Duration::from_millis(settings.idle_pause_ms),
                failure: Duration::from_millis(settings.failure_pause_ms),
            },
            preview_max: DEFAULT_PREVIEW_MAX,
        }
    }

    /// The persistable part of this configuration.
    pub fn to_settings(&self) -> Settings {
        Settings {
            language: self.ocr.language.clone(),
            page_seg_mode: self.ocr.page_seg_mode,
            found_pause_ms: duration_ms(self.timings.found),
            idle_pause_ms: duration_ms(self.timings.idle),
            failure_pause_ms: duration_ms(self.timings.failure),
        }
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("CODECLIP_MONITOR") {
            self.monitor_index = parse_var("CODECLIP_MONITOR", &v)?;
        }
        if let Some(v) = lookup("CODECLIP_LANG") {
            self.ocr.language = v;
        }
        if let Some(v) = lookup("CODECLIP_PSM") {
            self.ocr.page_seg_mode = parse_var("CODECLIP_PSM", &v)?;
        }
        if let Some(v) = lookup("CODECLIP_FOUND_PAUSE_MS") {
            self.timings.found = Duration::from_millis(parse_var("CODECLIP_FOUND_PAUSE_MS", &v)?);
        }
        if let Some(v) = lookup("CODECLIP_IDLE_PAUSE_MS") {
            self.timings.idle = Duration::from_millis(parse_var("CODECLIP_IDLE_PAUSE_MS", &v)?);
        }
        if let Some(v) = lookup("CODECLIP_FAILURE_PAUSE_MS") {
            self.timings.failure =
                Duration::from_millis(parse_var("CODECLIP_FAILURE_PAUSE_MS", &v)?);
        }
        Ok(self)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Programmatic construction of a [`Config`], starting from defaults.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_monitor(mut self, index: usize) -> Self {
        self.config.monitor_index = index;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.config.ocr.language = language.to_string();
        self
    }

    pub fn with_page_seg_mode(mut self, mode: u8) -> Self {
        self.config.ocr.page_seg_mode = mode;
        self
    }

    pub fn with_timings(mut self, timings: PollTimings) -> Self {
        self.config.timings = timings;
        self
    }

    pub fn with_preview_max(mut self, width: u32, height: u32) -> Self {
        self.config.preview_max = (width, height);
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.config.ocr.language.trim().is_empty() {
            return Err(AppError::config("OCR language must not be empty"));
        }
        if self.config.preview_max.0 == 0 || self.config.preview_max.1 == 0 {
            return Err(AppError::config("Preview size must be non-zero"));
        }
        Ok(self.config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("{} has invalid value '{}': {}", key, value, e)))
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
