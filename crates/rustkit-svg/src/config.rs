//! SVG text layout configuration.

use std::path::Path;

use rustkit_common::ResultExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SvgError;

/// Settings for SVG text-on-path layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    /// Font size used when no `font-size` attribute applies.
    pub default_font_size: f32,

    /// Glyph advance as a fraction of the font size.
    pub glyph_advance_ratio: f32,

    /// Line segments used to flatten each curve or arc.
    pub curve_segments: usize,

    /// Viewport width for percentage lengths.
    pub viewport_width: f32,

    /// Viewport height for percentage lengths.
    pub viewport_height: f32,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            default_font_size: 16.0,
            glyph_advance_ratio: 0.6,
            curve_segments: 20,
            viewport_width: 300.0,
            viewport_height: 150.0,
        }
    }
}

impl SvgConfig {
    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SvgError> {
        let config: SvgConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> rustkit_common::Result<Self> {
        let json = std::fs::read_to_string(path)
            .context(format!("reading SVG config {}", path.display()))?;
        let config = Self::from_json(&json)?;
        debug!(path = %path.display(), "SVG config loaded");
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SvgError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values layout cannot work with.
    pub fn validate(&self) -> Result<(), SvgError> {
        if !(self.default_font_size > 0.0) {
            return Err(SvgError::InvalidConfig(format!(
                "default_font_size must be positive, got {}",
                self.default_font_size
            )));
        }
        if !(self.glyph_advance_ratio > 0.0) {
            return Err(SvgError::InvalidConfig(format!(
                "glyph_advance_ratio must be positive, got {}",
                self.glyph_advance_ratio
            )));
        }
        if self.curve_segments == 0 {
            return Err(SvgError::InvalidConfig(
                "curve_segments must be at least 1".into(),
            ));
        }
        if self.viewport_width < 0.0 || self.viewport_height < 0.0 {
            return Err(SvgError::InvalidConfig(
                "viewport size cannot be negative".into(),
            ));
        }
        Ok(())
    }
}
