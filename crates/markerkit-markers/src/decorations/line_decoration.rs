use lyon::path::Path;
use markerkit_core::{Point, StateError};
use serde::{Deserialize, Serialize};

use super::{lyon_point, StrokeStyle};
use crate::defaults::MarkerDefaults;
use crate::grip::GripRole;
use crate::state::MarkerState;

/// Segments used to approximate a curve for hit testing.
const CURVE_SAMPLES: usize = 32;

const ARROW_BASE_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    Both,
    Start,
    #[default]
    End,
    None,
}

impl ArrowType {
    pub fn at_start(self) -> bool {
        matches!(self, ArrowType::Both | ArrowType::Start)
    }

    pub fn at_end(self) -> bool {
        matches!(self, ArrowType::Both | ArrowType::End)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowStyle {
    #[serde(flatten)]
    pub stroke: StrokeStyle,
    #[serde(default)]
    pub arrow_type: ArrowType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveStyle {
    #[serde(flatten)]
    pub stroke: StrokeStyle,
    #[serde(default = "no_arrows")]
    pub arrow_type: ArrowType,
    pub curve_x: f64,
    pub curve_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementStyle {
    #[serde(flatten)]
    pub stroke: StrokeStyle,
    pub tip_length: f64,
}

fn no_arrows() -> ArrowType {
    ArrowType::None
}

/// The segment-based marker types.
#[derive(Debug, Clone, PartialEq)]
pub enum LineDecoration {
    Line(StrokeStyle),
    Arrow(ArrowStyle),
    Curve(CurveStyle),
    Measurement(MeasurementStyle),
}

impl LineDecoration {
    pub fn line(defaults: &MarkerDefaults) -> Self {
        LineDecoration::Line(StrokeStyle::from_defaults(defaults))
    }

    pub fn arrow(defaults: &MarkerDefaults) -> Self {
        LineDecoration::Arrow(ArrowStyle {
            stroke: StrokeStyle::from_defaults(defaults),
            arrow_type: ArrowType::End,
        })
    }

    pub fn curve(defaults: &MarkerDefaults) -> Self {
        LineDecoration::Curve(CurveStyle {
            stroke: StrokeStyle::from_defaults(defaults),
            arrow_type: ArrowType::None,
            curve_x: 0.0,
            curve_y: 0.0,
        })
    }

    pub fn measurement(defaults: &MarkerDefaults) -> Self {
        LineDecoration::Measurement(MeasurementStyle {
            stroke: StrokeStyle::from_defaults(defaults),
            tip_length: 10.0,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LineDecoration::Line(_) => "LineMarker",
            LineDecoration::Arrow(_) => "ArrowMarker",
            LineDecoration::Curve(_) => "CurveMarker",
            LineDecoration::Measurement(_) => "MeasurementMarker",
        }
    }

    pub fn stroke(&self) -> &StrokeStyle {
        match self {
            LineDecoration::Line(s) => s,
            LineDecoration::Arrow(a) => &a.stroke,
            LineDecoration::Curve(c) => &c.stroke,
            LineDecoration::Measurement(m) => &m.stroke,
        }
    }

    pub fn aux_grip(&self) -> Option<GripRole> {
        match self {
            LineDecoration::Curve(_) => Some(GripRole::CurveControl),
            _ => None,
        }
    }

    pub fn control(&self) -> Option<Point> {
        match self {
            LineDecoration::Curve(c) => Some(Point::new(c.curve_x, c.curve_y)),
            _ => None,
        }
    }

    pub fn set_control(&mut self, p: Point) {
        if let LineDecoration::Curve(c) = self {
            c.curve_x = p.x;
            c.curve_y = p.y;
        }
    }

    /// While creating, a curve keeps its control point bowed off the
    /// middle of the segment.
    pub fn on_endpoints_changed(&mut self, p1: Point, p2: Point, creating: bool) {
        if creating {
            if let LineDecoration::Curve(_) = self {
                self.set_control(default_control(p1, p2));
            }
        }
    }

    pub fn scale(&mut self, scale_x: f64, scale_y: f64) {
        if let Some(control) = self.control() {
            self.set_control(control.scaled(scale_x, scale_y));
        }
    }

    pub fn contains(&self, p1: Point, p2: Point, point: Point, tolerance: f64) -> bool {
        match self {
            LineDecoration::Curve(c) => {
                let control = Point::new(c.curve_x, c.curve_y);
                let mut prev = p1;
                for i in 1..=CURVE_SAMPLES {
                    let next = quadratic_at(p1, control, p2, i as f64 / CURVE_SAMPLES as f64);
                    if distance_to_segment(point, prev, next) <= tolerance {
                        return true;
                    }
                    prev = next;
                }
                false
            }
            _ => distance_to_segment(point, p1, p2) <= tolerance,
        }
    }

    /// Stroke outline including arrow heads and measurement ticks.
    pub fn outline(&self, p1: Point, p2: Point) -> Path {
        let mut builder = Path::builder();
        match self {
            LineDecoration::Curve(c) => {
                builder.begin(lyon_point(p1.x, p1.y));
                builder.quadratic_bezier_to(
                    lyon_point(c.curve_x, c.curve_y),
                    lyon_point(p2.x, p2.y),
                );
                builder.end(false);
                let control = Point::new(c.curve_x, c.curve_y);
                let size = arrow_size(&c.stroke);
                if c.arrow_type.at_start() {
                    add_arrow_head(&mut builder, control, p1, size);
                }
                if c.arrow_type.at_end() {
                    add_arrow_head(&mut builder, control, p2, size);
                }
            }
            _ => {
                builder.begin(lyon_point(p1.x, p1.y));
                builder.line_to(lyon_point(p2.x, p2.y));
                builder.end(false);
            }
        }
        match self {
            LineDecoration::Arrow(a) => {
                let size = arrow_size(&a.stroke);
                if a.arrow_type.at_start() {
                    add_arrow_head(&mut builder, p2, p1, size);
                }
                if a.arrow_type.at_end() {
                    add_arrow_head(&mut builder, p1, p2, size);
                }
            }
            LineDecoration::Measurement(m) => {
                for end in [p1, p2] {
                    let (a, b) = perpendicular_tick(p1, p2, end, m.tip_length / 2.0);
                    builder.begin(lyon_point(a.x, a.y));
                    builder.line_to(lyon_point(b.x, b.y));
                    builder.end(false);
                }
            }
            _ => {}
        }
        builder.build()
    }

    pub fn write_state(&self, state: &mut MarkerState) -> Result<(), StateError> {
        match self {
            LineDecoration::Line(s) => state.extend_with(s),
            LineDecoration::Arrow(s) => state.extend_with(s),
            LineDecoration::Curve(s) => state.extend_with(s),
            LineDecoration::Measurement(s) => state.extend_with(s),
        }
    }

    /// Decodes a decoration of the same kind from `state`.
    pub fn decode_state(&self, state: &MarkerState) -> Result<Self, StateError> {
        Ok(match self {
            LineDecoration::Line(_) => LineDecoration::Line(state.decode()?),
            LineDecoration::Arrow(_) => LineDecoration::Arrow(state.decode()?),
            LineDecoration::Curve(_) => LineDecoration::Curve(state.decode()?),
            LineDecoration::Measurement(_) => LineDecoration::Measurement(state.decode()?),
        })
    }
}

pub(crate) fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

fn default_control(p1: Point, p2: Point) -> Point {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let length = (dx * dx + dy * dy).sqrt();
    let mid = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
    if length == 0.0 {
        return mid;
    }
    let offset = length / 3.0;
    Point::new(mid.x - dy / length * offset, mid.y + dx / length * offset)
}

fn quadratic_at(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
        u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
    )
}

fn arrow_size(stroke: &StrokeStyle) -> f64 {
    ARROW_BASE_SIZE + stroke.stroke_width * 2.0
}

/// Closed triangle at `tip`, pointing away from `from`.
fn add_arrow_head(
    builder: &mut lyon::path::path::Builder,
    from: Point,
    tip: Point,
    size: f64,
) {
    let dx = tip.x - from.x;
    let dy = tip.y - from.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let base = Point::new(tip.x - ux * size, tip.y - uy * size);
    let half = size / 2.0;
    builder.begin(lyon_point(tip.x, tip.y));
    builder.line_to(lyon_point(base.x - uy * half, base.y + ux * half));
    builder.line_to(lyon_point(base.x + uy * half, base.y - ux * half));
    builder.end(true);
}

fn perpendicular_tick(p1: Point, p2: Point, at: Point, half: f64) -> (Point, Point) {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return (at.offset(0.0, -half), at.offset(0.0, half));
    }
    let (nx, ny) = (-dy / length * half, dx / length * half);
    (at.offset(nx, ny), at.offset(-nx, -ny))
}
