//! MarkerKit Settings Crate
//!
//! Editor configuration: creation defaults, manipulation thresholds, undo
//! depth and default style, persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{BoxDefaults, Config, LineDefaults, StyleSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
