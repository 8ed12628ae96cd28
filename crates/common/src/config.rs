//! Viewer configuration, loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the binaries.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Long-sleeve polo shirt used when no model is configured.
pub const DEFAULT_MODEL_URL: &str = "https://cdn.glitch.global/ccd41c2b-7f9e-4723-ac27-7a815914ad6d/t-shirt_polo_lengan_panjang.glb?v=1733598419760";

/// Errors from loading or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Model URL (`http://`, `https://`) or local file path.
    pub model: String,
    /// Directory for downloaded model files.
    pub cache_dir: PathBuf,
    /// Directory for saved painting sessions and PNG exports.
    pub session_dir: PathBuf,
    /// Width and height of the square paint texture in pixels.
    pub canvas_size: u32,
    /// Pencil line width in canvas pixels.
    pub line_width: f32,
    /// Eraser radius in canvas pixels.
    pub eraser_radius: f32,
    /// Initial pencil color as a hex string.
    pub stroke_color: String,
    /// Camera distance change per wheel/pinch pixel.
    pub zoom_speed: f32,
    /// Model yaw change (radians) per horizontal drag pixel.
    pub rotate_speed: f32,
    /// Maximum number of undoable paint edits kept in memory.
    pub history_depth: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_URL.to_string(),
            cache_dir: PathBuf::from("./cache"),
            session_dir: PathBuf::from("./session_data"),
            canvas_size: 1024,
            line_width: 2.0,
            eraser_radius: 10.0,
            stroke_color: "#ffffff".to_string(),
            zoom_speed: 0.01,
            rotate_speed: 0.01,
            history_depth: 64,
        }
    }
}

impl ViewerConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                reason: "must not be empty".into(),
            });
        }
        if !(16..=8192).contains(&self.canvas_size) {
            return Err(ConfigError::Invalid {
                field: "canvas_size",
                reason: format!("{} is outside 16..=8192", self.canvas_size),
            });
        }
        if !(self.line_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "line_width",
                reason: "must be positive".into(),
            });
        }
        if !(self.eraser_radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "eraser_radius",
                reason: "must be positive".into(),
            });
        }
        if let Err(e) = Rgba::from_hex(&self.stroke_color) {
            return Err(ConfigError::Invalid {
                field: "stroke_color",
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// The configured pencil color. Falls back to white for an unvalidated
    /// config with a malformed color.
    pub fn stroke_rgba(&self) -> Rgba {
        Rgba::from_hex(&self.stroke_color).unwrap_or(Rgba::WHITE)
    }
}
