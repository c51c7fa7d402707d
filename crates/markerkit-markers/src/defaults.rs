//! Construction defaults handed to every marker constructor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Sizes, thresholds and styles used when markers are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDefaults {
    /// Size a box marker snaps to when created by a click
    pub box_size: Size,
    /// Same for text and callout markers
    pub text_box_size: Size,
    /// Length a linear marker is extended to when created by a click
    pub line_length: f64,
    /// Drags smaller than this in both axes count as a click
    pub min_drag_size: f64,
    /// Grip visual diameter
    pub grip_size: f64,
    /// Distance of the rotation grip above the top edge
    pub rotator_offset: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub fill_color: String,
    pub text_color: String,
    pub font_family: String,
    pub highlight_opacity: f64,
}

impl Default for MarkerDefaults {
    fn default() -> Self {
        Self {
            box_size: Size::new(50.0, 20.0),
            text_box_size: Size::new(100.0, 30.0),
            line_length: 50.0,
            min_drag_size: 10.0,
            grip_size: 10.0,
            rotator_offset: 30.0,
            stroke_color: "#EF4444".to_string(),
            stroke_width: 3.0,
            fill_color: "#FFFFFF".to_string(),
            text_color: "#000000".to_string(),
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            highlight_opacity: 0.5,
        }
    }
}
