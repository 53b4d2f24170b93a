//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! The `#[derive(Serialize, Deserialize)]` macro generates code to convert
//! structs to/from TOML. `#[serde(default)]` fills missing fields from
//! `Default::default()`, so a config file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use collage_document::{Position, TextStyle};

/// Main editor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing behaviour
    pub editor: EditorConfig,

    /// Defaults for new stickers and text
    pub overlays: OverlayConfig,

    /// Mock collaborator behaviour
    pub services: ServiceConfig,

    /// Keyboard settings
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("collage").join("config.toml"))
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }
}

/// Editing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history limit (0 = unbounded)
    pub history_limit: usize,

    /// Arrow-key nudge distance in pixels
    pub nudge_step_px: f64,

    /// Smallest sticker edge in pixels
    pub min_sticker_size_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            nudge_step_px: 5.0,
            min_sticker_size_px: 20.0,
        }
    }
}

/// Defaults for newly added overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Initial left offset, percent of canvas
    pub default_x: f64,

    /// Initial top offset, percent of canvas
    pub default_y: f64,

    /// Initial sticker width in pixels
    pub sticker_width: f64,

    /// Initial sticker height in pixels
    pub sticker_height: f64,

    /// Initial font size
    pub font_size: f64,

    /// Initial text color
    pub text_color: String,

    /// Available font families; the first is the default
    pub fonts: Vec<String>,
}

impl OverlayConfig {
    /// Where new overlays are placed.
    pub fn default_position(&self) -> Position {
        Position::new(self.default_x, self.default_y)
    }

    /// Styling for new text overlays.
    pub fn default_text_style(&self) -> TextStyle {
        let fallback = TextStyle::default();
        TextStyle {
            font_size: self.font_size,
            color: self.text_color.clone(),
            font_family: self.fonts.first().cloned().unwrap_or(fallback.font_family),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            default_x: 10.0,
            default_y: 10.0,
            sticker_width: 60.0,
            sticker_height: 60.0,
            font_size: 24.0,
            text_color: "#222222".to_string(),
            fonts: vec![
                "Arial".to_string(),
                "Georgia".to_string(),
                "Helvetica".to_string(),
                "Times New Roman".to_string(),
            ],
        }
    }
}

/// Mock collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Simulated AI processing time (ms)
    pub ai_latency_ms: u64,

    /// Simulated cloud round trip (ms)
    pub backup_latency_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ai_latency_ms: 1500,
            backup_latency_ms: 1000,
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Custom key bindings, e.g. `"ctrl+d" = "duplicate_selected"`
    pub bindings: HashMap<String, String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
