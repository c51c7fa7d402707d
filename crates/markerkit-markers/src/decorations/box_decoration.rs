use lyon::math::{vector, Angle, Box2D};
use lyon::path::{Path, Winding};
use markerkit_core::{Point, StateError};
use serde::{Deserialize, Serialize};

use super::{default_opacity, lyon_point, BoxFrame, StrokeStyle};
use crate::defaults::{MarkerDefaults, Size};
use crate::grip::GripRole;
use crate::state::MarkerState;

const DEFAULT_TEXT: &str = "Your text here";

/// Gap between a freshly created callout box and its tip.
const CALLOUT_TIP_GAP: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleStyle {
    #[serde(flatten)]
    pub stroke: StrokeStyle,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillStyle {
    pub fill_color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseStyle {
    #[serde(flatten)]
    pub stroke: StrokeStyle,
    pub fill_color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub color: String,
    pub font_family: String,
    #[serde(default)]
    pub padding: f64,
}

impl TextContent {
    fn from_defaults(defaults: &MarkerDefaults) -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            color: defaults.text_color.clone(),
            font_family: defaults.font_family.clone(),
            padding: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalloutContent {
    #[serde(flatten)]
    pub content: TextContent,
    pub bg_color: String,
    /// Tip location relative to the box origin
    pub tip_position: Point,
}

/// The box-based marker types.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxDecoration {
    Frame(RectangleStyle),
    Cover(FillStyle),
    Highlight(FillStyle),
    Ellipse(EllipseStyle),
    Text(TextContent),
    Callout(CalloutContent),
}

impl BoxDecoration {
    pub fn frame(defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Frame(RectangleStyle {
            stroke: StrokeStyle::from_defaults(defaults),
            opacity: 1.0,
        })
    }

    pub fn cover(_defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Cover(FillStyle {
            fill_color: "#000000".to_string(),
            opacity: 1.0,
        })
    }

    pub fn highlight(defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Highlight(FillStyle {
            fill_color: "#FFFF00".to_string(),
            opacity: defaults.highlight_opacity,
        })
    }

    pub fn ellipse(defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Ellipse(EllipseStyle {
            stroke: StrokeStyle::from_defaults(defaults),
            fill_color: "transparent".to_string(),
            opacity: 1.0,
        })
    }

    pub fn text(defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Text(TextContent::from_defaults(defaults))
    }

    pub fn callout(defaults: &MarkerDefaults) -> Self {
        BoxDecoration::Callout(CalloutContent {
            content: TextContent::from_defaults(defaults),
            bg_color: defaults.fill_color.clone(),
            tip_position: Point::default(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BoxDecoration::Frame(_) => "FrameMarker",
            BoxDecoration::Cover(_) => "CoverMarker",
            BoxDecoration::Highlight(_) => "HighlightMarker",
            BoxDecoration::Ellipse(_) => "EllipseMarker",
            BoxDecoration::Text(_) => "TextMarker",
            BoxDecoration::Callout(_) => "CalloutMarker",
        }
    }

    pub fn default_size(&self, defaults: &MarkerDefaults) -> Size {
        match self {
            BoxDecoration::Text(_) | BoxDecoration::Callout(_) => defaults.text_box_size,
            _ => defaults.box_size,
        }
    }

    /// Leaf visuals beyond the body (text runs, callout tip).
    pub fn extra_elements(&self) -> usize {
        match self {
            BoxDecoration::Text(_) => 1,
            BoxDecoration::Callout(_) => 2,
            _ => 0,
        }
    }

    pub fn aux_grip(&self) -> Option<GripRole> {
        match self {
            BoxDecoration::Callout(_) => Some(GripRole::CalloutTip),
            _ => None,
        }
    }

    pub fn aux_grip_position(&self, frame: &BoxFrame) -> Option<Point> {
        match self {
            BoxDecoration::Callout(c) => Some(Point::new(
                frame.left + c.tip_position.x,
                frame.top + c.tip_position.y,
            )),
            _ => None,
        }
    }

    /// `local` is the pointer in the marker's un-rotated frame.
    pub fn drag_aux(&mut self, frame: &BoxFrame, local: Point) {
        if let BoxDecoration::Callout(c) = self {
            c.tip_position = Point::new(local.x - frame.left, local.y - frame.top);
        }
    }

    pub fn on_resized(&mut self, frame: &BoxFrame, creating: bool) {
        if let BoxDecoration::Callout(c) = self {
            if creating {
                c.tip_position = Point::new(frame.width / 4.0, frame.height + CALLOUT_TIP_GAP);
            }
        }
    }

    pub fn scale(&mut self, scale_x: f64, scale_y: f64) {
        if let BoxDecoration::Callout(c) = self {
            c.tip_position = c.tip_position.scaled(scale_x, scale_y);
        }
    }

    pub fn text_content(&self) -> Option<&TextContent> {
        match self {
            BoxDecoration::Text(t) => Some(t),
            BoxDecoration::Callout(c) => Some(&c.content),
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        match self {
            BoxDecoration::Text(t) => t.text = text.into(),
            BoxDecoration::Callout(c) => c.content.text = text.into(),
            _ => {}
        }
    }

    pub fn contains(&self, frame: &BoxFrame, local: Point, tolerance: f64) -> bool {
        match self {
            BoxDecoration::Ellipse(_) => {
                let rx = frame.width / 2.0 + tolerance;
                let ry = frame.height / 2.0 + tolerance;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let nx = (local.x - frame.center_x()) / rx;
                let ny = (local.y - frame.center_y()) / ry;
                nx * nx + ny * ny <= 1.0
            }
            BoxDecoration::Callout(_) => {
                in_box(frame, local, tolerance)
                    || self
                        .aux_grip_position(frame)
                        .is_some_and(|tip| tip.distance_to(&local) <= tolerance)
            }
            _ => in_box(frame, local, tolerance),
        }
    }

    /// Outline in the local frame. Renderers apply the container transform.
    pub fn outline(&self, frame: &BoxFrame) -> Path {
        let mut builder = Path::builder();
        let rect = Box2D::new(
            lyon_point(frame.left, frame.top),
            lyon_point(frame.right(), frame.bottom()),
        );
        match self {
            BoxDecoration::Ellipse(_) => {
                builder.add_ellipse(
                    lyon_point(frame.center_x(), frame.center_y()),
                    vector((frame.width / 2.0) as f32, (frame.height / 2.0) as f32),
                    Angle::radians(0.0),
                    Winding::Positive,
                );
            }
            BoxDecoration::Callout(c) => {
                builder.add_rectangle(&rect, Winding::Positive);
                let (base1, base2) = callout_tip_base(frame, c.tip_position);
                let tip = Point::new(frame.left + c.tip_position.x, frame.top + c.tip_position.y);
                builder.begin(lyon_point(base1.x, base1.y));
                builder.line_to(lyon_point(tip.x, tip.y));
                builder.line_to(lyon_point(base2.x, base2.y));
                builder.end(true);
            }
            _ => {
                builder.add_rectangle(&rect, Winding::Positive);
            }
        }
        builder.build()
    }

    pub fn write_state(&self, state: &mut MarkerState) -> Result<(), StateError> {
        match self {
            BoxDecoration::Frame(s) => state.extend_with(s),
            BoxDecoration::Cover(s) | BoxDecoration::Highlight(s) => state.extend_with(s),
            BoxDecoration::Ellipse(s) => state.extend_with(s),
            BoxDecoration::Text(s) => state.extend_with(s),
            BoxDecoration::Callout(s) => state.extend_with(s),
        }
    }

    /// Decodes a decoration of the same kind from `state`.
    pub fn decode_state(&self, state: &MarkerState) -> Result<Self, StateError> {
        Ok(match self {
            BoxDecoration::Frame(_) => BoxDecoration::Frame(state.decode()?),
            BoxDecoration::Cover(_) => BoxDecoration::Cover(state.decode()?),
            BoxDecoration::Highlight(_) => BoxDecoration::Highlight(state.decode()?),
            BoxDecoration::Ellipse(_) => BoxDecoration::Ellipse(state.decode()?),
            BoxDecoration::Text(_) => BoxDecoration::Text(state.decode()?),
            BoxDecoration::Callout(_) => BoxDecoration::Callout(state.decode()?),
        })
    }
}

fn in_box(frame: &BoxFrame, p: Point, tolerance: f64) -> bool {
    p.x >= frame.left - tolerance
        && p.x <= frame.right() + tolerance
        && p.y >= frame.top - tolerance
        && p.y <= frame.bottom() + tolerance
}

/// Two points on the box edge facing the tip.
fn callout_tip_base(frame: &BoxFrame, tip: Point) -> (Point, Point) {
    let half_x = (frame.width / 8.0).min(15.0);
    let half_y = (frame.height / 8.0).min(15.0);
    let cx = frame.center_x();
    let cy = frame.center_y();
    if tip.y > frame.height {
        (
            Point::new(cx - half_x, frame.bottom()),
            Point::new(cx + half_x, frame.bottom()),
        )
    } else if tip.y < 0.0 {
        (
            Point::new(cx - half_x, frame.top),
            Point::new(cx + half_x, frame.top),
        )
    } else if tip.x < 0.0 {
        (
            Point::new(frame.left, cy - half_y),
            Point::new(frame.left, cy + half_y),
        )
    } else {
        (
            Point::new(frame.right(), cy - half_y),
            Point::new(frame.right(), cy + half_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerLifecycle;

    fn frame() -> BoxFrame {
        BoxFrame {
            left: 10.0,
            top: 20.0,
            width: 100.0,
            height: 40.0,
        }
    }

    #[test]
    fn test_type_names_are_distinct() {
        let d = MarkerDefaults::default();
        let names: Vec<_> = [
            BoxDecoration::frame(&d),
            BoxDecoration::cover(&d),
            BoxDecoration::highlight(&d),
            BoxDecoration::ellipse(&d),
            BoxDecoration::text(&d),
            BoxDecoration::callout(&d),
        ]
        .iter()
        .map(|b| b.type_name())
        .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_ellipse_excludes_box_corners() {
        let d = MarkerDefaults::default();
        let ellipse = BoxDecoration::ellipse(&d);
        assert!(ellipse.contains(&frame(), Point::new(60.0, 40.0), 0.0));
        assert!(!ellipse.contains(&frame(), Point::new(12.0, 22.0), 0.0));
        assert!(BoxDecoration::frame(&d).contains(&frame(), Point::new(12.0, 22.0), 0.0));
    }

    #[test]
    fn test_callout_tip_follows_creation_size() {
        let d = MarkerDefaults::default();
        let mut callout = BoxDecoration::callout(&d);
        callout.on_resized(&frame(), true);
        assert_eq!(
            callout.aux_grip_position(&frame()),
            Some(Point::new(35.0, 80.0))
        );
        callout.on_resized(
            &BoxFrame {
                width: 200.0,
                ..frame()
            },
            false,
        );
        assert_eq!(
            callout.aux_grip_position(&frame()),
            Some(Point::new(35.0, 80.0))
        );
    }

    #[test]
    fn test_style_state_round_trip() {
        let d = MarkerDefaults::default();
        let mut callout = BoxDecoration::callout(&d);
        callout.set_text("Look here");
        callout.drag_aux(&frame(), Point::new(0.0, 100.0));

        let mut state = MarkerState::new("CalloutMarker", MarkerLifecycle::Select);
        callout.write_state(&mut state).unwrap();
        assert_eq!(state.field("text"), Some(&serde_json::json!("Look here")));
        assert_eq!(
            state.field("tipPosition"),
            Some(&serde_json::json!({"x": -10.0, "y": 80.0}))
        );

        let restored = BoxDecoration::callout(&d).decode_state(&state).unwrap();
        assert_eq!(restored, callout);
    }

    #[test]
    fn test_outline_bounds_match_frame() {
        let d = MarkerDefaults::default();
        let path = BoxDecoration::frame(&d).outline(&frame());
        let bb = lyon::algorithms::aabb::bounding_box(path.iter());
        assert!((bb.min.x - 10.0).abs() < 1e-4 && (bb.max.y - 60.0).abs() < 1e-4);
    }
}
