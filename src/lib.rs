//! # MarkerKit
//!
//! An annotation editing engine: draw, select, move, resize and rotate
//! geometric markers over an image, with undo/redo and a flat JSON state
//! format.
//!
//! ## Architecture
//!
//! MarkerKit is organized as a workspace with multiple crates:
//!
//! 1. **markerkit-core** - Points, affine transforms, visual ids, errors
//! 2. **markerkit-markers** - Grips, marker geometry, decorations, undo/redo, marker area
//! 3. **markerkit-settings** - Configuration loading, saving and validation
//! 4. **markerkit** - Headless command line tool built on the crates above

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

pub use markerkit_core::{Error, GeometryError, Point, Result, StateError, TransformMatrix, VisualId};
pub use markerkit_markers::{
    Manipulable, Marker, MarkerArea, MarkerAreaState, MarkerDefaults, MarkerEvent,
    MarkerLifecycle, MarkerRegistry, MarkerState, UndoRedoManager,
};
pub use markerkit_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, so command output on stdout stays clean
/// - RUST_LOG environment variable support, `info` when unset
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Loads the config at `path`, or the platform default when it exists.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match Config::default_path() {
        Ok(default) if default.exists() => Config::load_from_file(&default)
            .with_context(|| format!("Failed to load config {}", default.display())),
        _ => {
            debug!("No config file, using defaults");
            Ok(Config::default())
        }
    }
}

/// Reads a saved marker area document.
pub fn read_state(path: &Path) -> anyhow::Result<MarkerAreaState> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    MarkerAreaState::from_json(&json)
        .with_context(|| format!("Invalid marker area state in {}", path.display()))
}

/// Builds a marker area sized like the saved document and restores it.
pub fn open_area(path: &Path, config: &Config) -> anyhow::Result<MarkerArea> {
    let state = read_state(path)?;
    let mut area = MarkerArea::with_options(
        state.width,
        state.height,
        config.marker_defaults(),
        MarkerRegistry::with_builtin(),
        config.undo_depth(),
    );
    let restored = area.restore_state(&state);
    info!("Opened {} with {} markers", path.display(), restored);
    Ok(area)
}

pub fn write_state(state: &MarkerAreaState, path: &Path) -> anyhow::Result<()> {
    let json = state.to_json().context("Failed to serialize marker area")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// One line per marker plus a header line.
pub fn summarize(state: &MarkerAreaState) -> Vec<String> {
    let mut lines = vec![format!(
        "{}x{} area, {} markers",
        state.width,
        state.height,
        state.markers.len()
    )];
    for (index, marker) in state.markers.iter().enumerate() {
        let mut line = format!("{:>3}  {:<18} {}", index, marker.type_name, marker.state);
        let field = |name: &str| marker.field(name).and_then(|v| v.as_f64());
        if let (Some(left), Some(top), Some(width), Some(height)) =
            (field("left"), field("top"), field("width"), field("height"))
        {
            line.push_str(&format!("  {left:.1},{top:.1} {width:.1}x{height:.1}"));
            if let Some(angle) = field("rotationAngle").filter(|a| *a != 0.0) {
                line.push_str(&format!(" @{angle:.1}°"));
            }
        } else if let (Some(x1), Some(y1), Some(x2), Some(y2)) =
            (field("x1"), field("y1"), field("x2"), field("y2"))
        {
            line.push_str(&format!("  {x1:.1},{y1:.1} -> {x2:.1},{y2:.1}"));
        }
        if let Some(notes) = &marker.notes {
            line.push_str(&format!("  \"{notes}\""));
        }
        lines.push(line);
    }
    lines
}
