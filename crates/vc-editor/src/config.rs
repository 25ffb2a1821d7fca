//! Editor configuration.
//!
//! Loaded from JSON; every field is optional and falls back to the
//! values below.

use crate::error::ConfigError;
use crate::history::DEFAULT_MAX_STEPS;
use serde::Deserialize;
use vc_core::{Canvas, Color, SnapshotFormat};

/// Settings for a new editing session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Capacity of the history log. Default: **50**.
    pub max_steps: usize,

    /// Encoding used for history snapshots. Default: **MessagePack**.
    /// `json` is slower and larger but readable when debugging.
    pub snapshot_format: SnapshotFormat,

    /// Initial canvas size in pixels. Default: **800 × 600**.
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Initial background as a hex string. Default: **`#FFFFFF`**.
    pub background: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            snapshot_format: SnapshotFormat::default(),
            canvas_width: vc_core::canvas::DEFAULT_WIDTH,
            canvas_height: vc_core::canvas::DEFAULT_HEIGHT,
            background: "#FFFFFF".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed JSON or mistyped fields,
    /// [`ConfigError::InvalidMaxSteps`] for `max_steps: 0`, and
    /// [`ConfigError::InvalidColor`] for an unparseable background.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        log::debug!(
            "loaded editor config: max_steps={} format={:?}",
            config.max_steps,
            config.snapshot_format
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps);
        }
        self.background_color().map(|_| ())
    }

    pub fn background_color(&self) -> Result<Color, ConfigError> {
        Color::from_hex(&self.background)
            .ok_or_else(|| ConfigError::InvalidColor(self.background.clone()))
    }

    /// Build the blank canvas a new document starts from.
    pub fn new_canvas(&self) -> Result<Canvas, ConfigError> {
        let background = self.background_color()?;
        Ok(Canvas::new(self.canvas_width, self.canvas_height, background)
            .with_format(self.snapshot_format))
    }
}
