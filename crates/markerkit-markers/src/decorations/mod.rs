//! Decoration strategies.
//!
//! A decoration is what turns a bare box or segment into a concrete marker
//! type: it names the type, holds the style fields that get persisted, and
//! builds an outline path for renderers. Geometry stays with the marker.

mod box_decoration;
mod line_decoration;

pub use box_decoration::{
    BoxDecoration, CalloutContent, EllipseStyle, FillStyle, RectangleStyle, TextContent,
};
pub use line_decoration::{ArrowType, CurveStyle, LineDecoration, MeasurementStyle, ArrowStyle};

use serde::{Deserialize, Serialize};

use crate::defaults::MarkerDefaults;

/// Box geometry as seen by a decoration, in the marker's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxFrame {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    /// SVG dash pattern, empty for a solid line
    #[serde(default)]
    pub stroke_dasharray: String,
}

impl StrokeStyle {
    pub fn from_defaults(defaults: &MarkerDefaults) -> Self {
        Self {
            stroke_color: defaults.stroke_color.clone(),
            stroke_width: defaults.stroke_width,
            stroke_dasharray: String::new(),
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

fn lyon_point(x: f64, y: f64) -> lyon::math::Point {
    lyon::math::point(x as f32, y as f32)
}
