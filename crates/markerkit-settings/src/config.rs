//! Configuration for MarkerKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, chosen by file extension.
//!
//! Configuration is organized into:
//! - Manipulation thresholds (click detection, grip size, rotator offset)
//! - History depth
//! - Box and line creation defaults
//! - Default marker style

use std::path::{Path, PathBuf};

use markerkit_markers::{MarkerDefaults, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, SettingsError, SettingsResult};

const CONFIG_DIR_NAME: &str = "markerkit";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Sizes used when a box marker is created by a click
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDefaults {
    pub width: f64,
    pub height: f64,
    /// Text and callout markers
    pub text_width: f64,
    pub text_height: f64,
}

impl Default for BoxDefaults {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 20.0,
            text_width: 100.0,
            text_height: 30.0,
        }
    }
}

/// Linear marker creation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDefaults {
    /// Length a linear marker gets when created by a click
    pub length: f64,
}

impl Default for LineDefaults {
    fn default() -> Self {
        Self { length: 50.0 }
    }
}

/// Default marker style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub fill_color: String,
    pub text_color: String,
    pub font_family: String,
    /// Opacity of highlight markers, 0.0 to 1.0
    pub highlight_opacity: f64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        let defaults = MarkerDefaults::default();
        Self {
            stroke_color: defaults.stroke_color,
            stroke_width: defaults.stroke_width,
            fill_color: defaults.fill_color,
            text_color: defaults.text_color,
            font_family: defaults.font_family,
            highlight_opacity: defaults.highlight_opacity,
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Drags smaller than this in both axes count as a click
    pub min_drag_size: f64,
    /// Grip visual diameter; the hit radius is derived from it
    pub grip_size: f64,
    /// Distance of the rotation grip above a box
    pub rotator_offset: f64,
    /// Maximum undo steps, unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_depth: Option<usize>,
    pub box_defaults: BoxDefaults,
    pub line_defaults: LineDefaults,
    pub style: StyleSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_drag_size: 10.0,
            grip_size: 10.0,
            rotator_offset: 30.0,
            undo_depth: None,
            box_defaults: BoxDefaults::default(),
            line_defaults: LineDefaults::default(),
            style: StyleSettings::default(),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform configuration directory for MarkerKit
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Default config file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("min_drag_size", self.min_drag_size),
            ("grip_size", self.grip_size),
            ("box_defaults.width", self.box_defaults.width),
            ("box_defaults.height", self.box_defaults.height),
            ("box_defaults.text_width", self.box_defaults.text_width),
            ("box_defaults.text_height", self.box_defaults.text_height),
            ("line_defaults.length", self.line_defaults.length),
            ("style.stroke_width", self.style.stroke_width),
        ];
        for (key, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(out_of_range(key, value));
            }
        }

        if self.rotator_offset.is_nan() || self.rotator_offset < 0.0 {
            return Err(out_of_range("rotator_offset", self.rotator_offset));
        }

        if !(0.0..=1.0).contains(&self.style.highlight_opacity) {
            return Err(out_of_range(
                "style.highlight_opacity",
                self.style.highlight_opacity,
            ));
        }

        if self.undo_depth == Some(0) {
            return Err(out_of_range("undo_depth", 0));
        }

        Ok(())
    }

    /// Construction defaults for new markers
    pub fn marker_defaults(&self) -> MarkerDefaults {
        MarkerDefaults {
            box_size: Size::new(self.box_defaults.width, self.box_defaults.height),
            text_box_size: Size::new(self.box_defaults.text_width, self.box_defaults.text_height),
            line_length: self.line_defaults.length,
            min_drag_size: self.min_drag_size,
            grip_size: self.grip_size,
            rotator_offset: self.rotator_offset,
            stroke_color: self.style.stroke_color.clone(),
            stroke_width: self.style.stroke_width,
            fill_color: self.style.fill_color.clone(),
            text_color: self.style.text_color.clone(),
            font_family: self.style.font_family.clone(),
            highlight_opacity: self.style.highlight_opacity,
        }
    }

    pub fn undo_depth(&self) -> Option<usize> {
        self.undo_depth
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_marker_defaults_mirror_config() {
        let mut config = Config::default();
        config.box_defaults.width = 80.0;
        config.grip_size = 14.0;
        let defaults = config.marker_defaults();
        assert_eq!(defaults.box_size, Size::new(80.0, 20.0));
        assert_eq!(defaults.grip_size, 14.0);
        assert_eq!(defaults.text_box_size, Size::new(100.0, 30.0));
    }

    #[test]
    fn test_default_config_matches_marker_defaults() {
        assert_eq!(Config::default().marker_defaults(), MarkerDefaults::default());
    }

    #[test]
    fn test_validate_rejects_zero_undo_depth() {
        let config = Config {
            undo_depth: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { ref key, .. }) if key == "undo_depth"
        ));
    }

    #[test]
    fn test_validate_rejects_nan_size() {
        let mut config = Config::default();
        config.box_defaults.height = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.yaml")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("grip_size = 12.0\n[box_defaults]\nwidth = 64.0\n")
            .unwrap();
        assert_eq!(config.grip_size, 12.0);
        assert_eq!(config.box_defaults.width, 64.0);
        assert_eq!(config.box_defaults.height, 20.0);
        assert_eq!(config.line_defaults.length, 50.0);
    }
}
