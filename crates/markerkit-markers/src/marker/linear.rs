use lyon::path::Path;
use markerkit_core::{Point, StateError, VisualId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    Manipulable, ManipulationSession, MarkerBase, MarkerEvent, MarkerLifecycle, SessionSnapshot,
};
use crate::control_box::ControlBox;
use crate::decorations::LineDecoration;
use crate::defaults::MarkerDefaults;
use crate::grip::GripRole;
use crate::state::MarkerState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGeometryState {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A marker spanning two free endpoints. Linear markers never rotate,
/// so screen space and local space coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMarker {
    base: MarkerBase,
    p1: Point,
    p2: Point,
    decoration: LineDecoration,
    control_box: ControlBox,
    default_length: f64,
    min_drag_size: f64,
    grip_hit_radius: f64,
}

impl LinearMarker {
    pub fn new(decoration: LineDecoration, defaults: &MarkerDefaults) -> Self {
        let control_box = ControlBox::for_line(defaults.grip_size, decoration.aux_grip());
        let grip_hit_radius = control_box
            .grips()
            .map(|(_, grip)| grip.hit_radius())
            .fold(0.0, f64::max);
        let mut marker = Self {
            base: MarkerBase::new(),
            p1: Point::default(),
            p2: Point::default(),
            decoration,
            control_box,
            default_length: defaults.line_length,
            min_drag_size: defaults.min_drag_size,
            grip_hit_radius,
        };
        marker.adjust_control_box();
        marker
    }

    pub fn base(&self) -> &MarkerBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut MarkerBase {
        &mut self.base
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn set_endpoints(&mut self, p1: Point, p2: Point) {
        self.p1 = p1;
        self.p2 = p2;
        self.adjust_control_box();
    }

    pub fn decoration(&self) -> &LineDecoration {
        &self.decoration
    }

    pub fn decoration_mut(&mut self) -> &mut LineDecoration {
        &mut self.decoration
    }

    pub fn control_box(&self) -> &ControlBox {
        &self.control_box
    }

    pub fn grip_position(&self, role: GripRole) -> Option<Point> {
        match role {
            GripRole::Endpoint1 => Some(self.p1),
            GripRole::Endpoint2 => Some(self.p2),
            GripRole::CurveControl => self.decoration.control(),
            _ => None,
        }
    }

    pub fn outline(&self) -> Path {
        self.decoration.outline(self.p1, self.p2)
    }

    fn adjust_control_box(&mut self) {
        let positions: Vec<(GripRole, Point)> = self
            .control_box
            .grips()
            .filter_map(|(role, _)| self.grip_position(*role).map(|p| (*role, p)))
            .collect();
        for (role, center) in positions {
            self.control_box.set_grip_center(role, center);
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::Linear {
            p1: self.p1,
            p2: self.p2,
            control: self.decoration.control(),
        }
    }

    fn endpoints_changed(&mut self) {
        let creating = self.base.state() == MarkerLifecycle::Creating;
        self.decoration
            .on_endpoints_changed(self.p1, self.p2, creating);
    }
}

impl Manipulable for LinearMarker {
    fn type_name(&self) -> &'static str {
        self.decoration.type_name()
    }

    fn lifecycle(&self) -> MarkerLifecycle {
        self.base.state()
    }

    fn is_selected(&self) -> bool {
        self.base.is_selected()
    }

    fn select(&mut self) {
        self.base.set_selected(true);
        self.control_box.show();
        self.adjust_control_box();
    }

    fn deselect(&mut self) {
        self.base.set_selected(false);
        self.control_box.hide();
    }

    fn owns_target(&self, target: VisualId) -> bool {
        self.base.container().owns(target) || self.control_box.owns_target(target)
    }

    fn body_target(&self) -> VisualId {
        self.base.container().visual()
    }

    fn contains_point(&self, point: Point) -> bool {
        let tolerance = (self.decoration.stroke().stroke_width / 2.0).max(self.grip_hit_radius);
        self.decoration.contains(self.p1, self.p2, point, tolerance)
    }

    fn grip_at(&self, point: Point) -> Option<VisualId> {
        if !self.control_box.is_visible() {
            return None;
        }
        self.control_box.grip_at(point).map(|grip| grip.visual())
    }

    fn pointer_down(&mut self, point: Point, target: Option<VisualId>) -> ManipulationSession {
        if self.base.state() == MarkerLifecycle::New {
            self.p1 = point;
            self.p2 = point;
            self.decoration.set_control(point);
            self.base.transition(MarkerLifecycle::Creating);
            self.adjust_control_box();
            return ManipulationSession {
                start_point: point,
                active_grip: None,
                start: self.snapshot(),
            };
        }

        self.select();
        let active_grip = target.and_then(|t| self.control_box.find_grip(t));
        let next = if active_grip.is_some() {
            MarkerLifecycle::Resize
        } else {
            MarkerLifecycle::Move
        };
        self.base.transition(next);
        debug!("{} pointer down, grip {:?}", self.type_name(), active_grip);

        ManipulationSession {
            start_point: point,
            active_grip,
            start: self.snapshot(),
        }
    }

    fn manipulate(&mut self, session: &ManipulationSession, point: Point) {
        let SessionSnapshot::Linear { p1, p2, control } = session.start else {
            warn!("{} ignoring a box manipulation session", self.type_name());
            return;
        };
        match self.base.state() {
            MarkerLifecycle::Creating => {
                self.p2 = point;
                self.endpoints_changed();
            }
            MarkerLifecycle::Resize => match session.active_grip {
                Some(GripRole::Endpoint1) => self.p1 = point,
                Some(GripRole::CurveControl) => self.decoration.set_control(point),
                _ => self.p2 = point,
            },
            MarkerLifecycle::Move => {
                let dx = point.x - session.start_point.x;
                let dy = point.y - session.start_point.y;
                self.p1 = p1.offset(dx, dy);
                self.p2 = p2.offset(dx, dy);
                if let Some(control) = control {
                    self.decoration.set_control(control.offset(dx, dy));
                }
            }
            MarkerLifecycle::New | MarkerLifecycle::Select | MarkerLifecycle::Rotate => return,
        }
        self.adjust_control_box();
    }

    fn pointer_up(&mut self, session: ManipulationSession, point: Point) -> Option<MarkerEvent> {
        let previous = self.base.state();
        match previous {
            MarkerLifecycle::Creating => {
                let dx = (self.p1.x - self.p2.x).abs();
                let dy = (self.p1.y - self.p2.y).abs();
                if dx < self.min_drag_size && dy < self.min_drag_size {
                    self.p2 = Point::new(self.p1.x + self.default_length, self.p1.y);
                    self.endpoints_changed();
                    self.adjust_control_box();
                } else {
                    self.manipulate(&session, point);
                }
            }
            MarkerLifecycle::Move | MarkerLifecycle::Resize => self.manipulate(&session, point),
            MarkerLifecycle::New | MarkerLifecycle::Select | MarkerLifecycle::Rotate => {
                return None
            }
        }
        self.base.transition(MarkerLifecycle::Select);

        if previous == MarkerLifecycle::Creating {
            self.select();
            Some(MarkerEvent::Created)
        } else {
            Some(MarkerEvent::StateChanged)
        }
    }

    fn scale(&mut self, scale_x: f64, scale_y: f64) {
        self.p1 = self.p1.scaled(scale_x, scale_y);
        self.p2 = self.p2.scaled(scale_x, scale_y);
        self.decoration.scale(scale_x, scale_y);
        self.adjust_control_box();
    }

    fn get_state(&self) -> MarkerState {
        let mut state = self.base.base_state(self.type_name());
        let geometry = LinearGeometryState {
            x1: self.p1.x,
            y1: self.p1.y,
            x2: self.p2.x,
            y2: self.p2.y,
        };
        if let Err(e) = state.extend_with(&geometry) {
            warn!("Failed to write geometry of {}: {}", self.type_name(), e);
        }
        if let Err(e) = self.decoration.write_state(&mut state) {
            warn!("Failed to write style of {}: {}", self.type_name(), e);
        }
        state
    }

    fn restore_state(&mut self, state: &MarkerState) -> Result<(), StateError> {
        if state.type_name != self.type_name() {
            return Err(StateError::InvalidFields {
                type_name: state.type_name.clone(),
                reason: format!("cannot restore into {}", self.type_name()),
            });
        }
        let geometry: LinearGeometryState = state.decode()?;
        let decoration = self.decoration.decode_state(state)?;

        self.decoration = decoration;
        self.base.restore(state);
        self.p1 = Point::new(geometry.x1, geometry.y1);
        self.p2 = Point::new(geometry.x2, geometry.y2);
        self.adjust_control_box();
        Ok(())
    }

    fn visual_ids(&self) -> Vec<VisualId> {
        let container = self.base.container();
        let mut ids = vec![container.root(), container.visual()];
        ids.extend_from_slice(container.elements());
        ids.extend(self.control_box.visual_ids());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> LinearMarker {
        let defaults = MarkerDefaults::default();
        LinearMarker::new(LineDecoration::line(&defaults), &defaults)
    }

    fn created(decoration: LineDecoration, from: Point, to: Point) -> LinearMarker {
        let mut marker = LinearMarker::new(decoration, &MarkerDefaults::default());
        let session = marker.pointer_down(from, None);
        marker.manipulate(&session, to);
        assert_eq!(marker.pointer_up(session, to), Some(MarkerEvent::Created));
        marker
    }

    fn target(marker: &LinearMarker, role: GripRole) -> Option<VisualId> {
        marker.control_box().grip(role).map(|g| g.visual())
    }

    #[test]
    fn test_click_extends_to_default_length() {
        let mut marker = line();
        let session = marker.pointer_down(Point::new(10.0, 10.0), None);
        assert_eq!(marker.p1(), marker.p2());
        let event = marker.pointer_up(session, Point::new(12.0, 11.0));
        assert_eq!(event, Some(MarkerEvent::Created));
        assert_eq!(marker.p1(), Point::new(10.0, 10.0));
        assert_eq!(marker.p2(), Point::new(60.0, 10.0));
        assert_eq!(marker.lifecycle(), MarkerLifecycle::Select);
    }

    #[test]
    fn test_drag_creates_segment() {
        let defaults = MarkerDefaults::default();
        let marker = created(
            LineDecoration::line(&defaults),
            Point::new(0.0, 0.0),
            Point::new(5.0, 40.0),
        );
        assert_eq!(marker.p2(), Point::new(5.0, 40.0));
    }

    #[test]
    fn test_endpoint_grip_resize() {
        let defaults = MarkerDefaults::default();
        let mut marker = created(
            LineDecoration::arrow(&defaults),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        let t = target(&marker, GripRole::Endpoint1);
        let session = marker.pointer_down(Point::new(0.0, 0.0), t);
        assert_eq!(marker.lifecycle(), MarkerLifecycle::Resize);
        marker.manipulate(&session, Point::new(-20.0, 30.0));
        assert_eq!(
            marker.pointer_up(session, Point::new(-20.0, 30.0)),
            Some(MarkerEvent::StateChanged)
        );
        assert_eq!(marker.p1(), Point::new(-20.0, 30.0));
        assert_eq!(marker.p2(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_move_translates_endpoints_and_control() {
        let defaults = MarkerDefaults::default();
        let mut marker = created(
            LineDecoration::curve(&defaults),
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
        );
        let control = marker.decoration().control().unwrap();
        let body = Some(marker.body_target());
        let session = marker.pointer_down(Point::new(15.0, 0.0), body);
        assert_eq!(marker.lifecycle(), MarkerLifecycle::Move);
        marker.pointer_up(session, Point::new(25.0, 5.0));

        assert_eq!(marker.p1(), Point::new(10.0, 5.0));
        assert_eq!(marker.p2(), Point::new(40.0, 5.0));
        assert!(marker
            .decoration()
            .control()
            .unwrap()
            .approx_eq(&control.offset(10.0, 5.0), 1e-9));
    }

    #[test]
    fn test_curve_control_grip_drag() {
        let defaults = MarkerDefaults::default();
        let mut marker = created(
            LineDecoration::curve(&defaults),
            Point::new(0.0, 0.0),
            Point::new(90.0, 0.0),
        );
        let control = marker.grip_position(GripRole::CurveControl).unwrap();
        let t = target(&marker, GripRole::CurveControl);
        let session = marker.pointer_down(control, t);
        marker.pointer_up(session, Point::new(45.0, -60.0));
        assert_eq!(marker.decoration().control(), Some(Point::new(45.0, -60.0)));
        assert_eq!(marker.p2(), Point::new(90.0, 0.0));
    }

    #[test]
    fn test_contains_uses_grip_radius_minimum() {
        let defaults = MarkerDefaults::default();
        let marker = created(
            LineDecoration::line(&defaults),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!(marker.contains_point(Point::new(50.0, 9.0)));
        assert!(!marker.contains_point(Point::new(50.0, 11.0)));
    }

    #[test]
    fn test_scale_multiplies_endpoints() {
        let defaults = MarkerDefaults::default();
        let mut marker = created(
            LineDecoration::line(&defaults),
            Point::new(10.0, 20.0),
            Point::new(30.0, 60.0),
        );
        marker.scale(1.0, 1.0);
        assert_eq!(marker.p1(), Point::new(10.0, 20.0));
        marker.scale(2.0, 0.5);
        assert_eq!(marker.p1(), Point::new(20.0, 10.0));
        assert_eq!(marker.p2(), Point::new(60.0, 30.0));
    }

    #[test]
    fn test_state_round_trip() {
        let defaults = MarkerDefaults::default();
        let marker = created(
            LineDecoration::measurement(&defaults),
            Point::new(1.5, 2.5),
            Point::new(80.0, 40.0),
        );
        let state = marker.get_state();
        assert_eq!(state.type_name, "MeasurementMarker");
        assert_eq!(state.field("x2"), Some(&serde_json::json!(80.0)));

        let mut restored = LinearMarker::new(LineDecoration::measurement(&defaults), &defaults);
        restored.restore_state(&state).unwrap();
        assert_eq!(restored.get_state(), state);
        assert_eq!(restored.p1(), Point::new(1.5, 2.5));
    }

    #[test]
    fn test_failed_restore_leaves_line_untouched() {
        let defaults = MarkerDefaults::default();
        let marker = created(
            LineDecoration::arrow(&defaults),
            Point::new(0.0, 0.0),
            Point::new(50.0, 50.0),
        );
        let before = marker.get_state();

        let mut state = created(
            LineDecoration::arrow(&defaults),
            Point::new(10.0, 10.0),
            Point::new(90.0, 20.0),
        )
        .get_state();
        state
            .fields
            .insert("arrowType".to_string(), serde_json::json!("sideways"));

        let mut target = marker.clone();
        assert!(target.restore_state(&state).is_err());
        assert_eq!(target.get_state(), before);
        assert_eq!(target.p2(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_restore_missing_endpoint_fails() {
        let mut state = line().get_state();
        state.fields.remove("y2");
        assert!(matches!(
            line().restore_state(&state),
            Err(StateError::InvalidFields { .. })
        ));
    }
}
