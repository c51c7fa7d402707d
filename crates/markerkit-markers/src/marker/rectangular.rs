use lyon::path::Path;
use markerkit_core::{Point, StateError, TransformMatrix, VisualId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    Manipulable, ManipulationSession, MarkerBase, MarkerEvent, MarkerLifecycle, SessionSnapshot,
};
use crate::control_box::ControlBox;
use crate::decorations::{BoxDecoration, BoxFrame};
use crate::defaults::{MarkerDefaults, Size};
use crate::grip::{BoxGrip, GripRole, HorizontalEdge, VerticalEdge};
use crate::state::MarkerState;

/// Minimum horizontal pointer offset from the center before a rotate
/// gesture updates the angle.
const ROTATE_DEAD_ZONE: f64 = 0.1;

/// Persisted geometry of a box marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxGeometryState {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_angle: f64,
    pub visual_transform_matrix: TransformMatrix,
    pub container_transform_matrix: TransformMatrix,
}

/// A marker defined by an axis-aligned box in its own frame, rotated
/// about a pivot by the container transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularBoxMarker {
    base: MarkerBase,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    rotation_angle: f64,
    visual_transform: TransformMatrix,
    container_transform: TransformMatrix,
    decoration: BoxDecoration,
    control_box: ControlBox,
    default_size: Size,
    min_drag_size: f64,
    rotator_offset: f64,
}

impl RectangularBoxMarker {
    pub fn new(decoration: BoxDecoration, defaults: &MarkerDefaults) -> Self {
        let mut base = MarkerBase::new();
        for _ in 0..decoration.extra_elements() {
            base.container_mut().add_element();
        }
        let control_box = ControlBox::for_box(defaults.grip_size, decoration.aux_grip());
        let mut marker = Self {
            base,
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            rotation_angle: 0.0,
            visual_transform: TransformMatrix::identity(),
            container_transform: TransformMatrix::identity(),
            default_size: decoration.default_size(defaults),
            decoration,
            control_box,
            min_drag_size: defaults.min_drag_size,
            rotator_offset: defaults.rotator_offset,
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

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn visual_transform(&self) -> TransformMatrix {
        self.visual_transform
    }

    pub fn container_transform(&self) -> TransformMatrix {
        self.container_transform
    }

    pub fn decoration(&self) -> &BoxDecoration {
        &self.decoration
    }

    pub fn decoration_mut(&mut self) -> &mut BoxDecoration {
        &mut self.decoration
    }

    pub fn control_box(&self) -> &ControlBox {
        &self.control_box
    }

    pub fn frame(&self) -> BoxFrame {
        BoxFrame {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }

    /// Places the box directly. Negative sizes are normalized.
    pub fn set_rect(&mut self, left: f64, top: f64, width: f64, height: f64) {
        let (left, width) = normalize_span(left, width);
        let (top, height) = normalize_span(top, height);
        self.left = left;
        self.top = top;
        self.width = width;
        self.height = height;
        self.update_visual();
    }

    /// Rotates about the current box center.
    pub fn set_rotation(&mut self, angle_deg: f64) {
        self.rotation_angle = angle_deg;
        self.container_transform =
            TransformMatrix::rotation(angle_deg, self.center_x(), self.center_y());
        self.adjust_control_box();
    }

    /// Local frame to screen space.
    pub fn rotate_point(&self, p: Point) -> Point {
        if self.rotation_angle == 0.0 {
            return p;
        }
        self.container_transform.apply(p)
    }

    /// Screen space to the local frame.
    pub fn unrotate_point(&self, p: Point) -> Point {
        if self.rotation_angle == 0.0 {
            return p;
        }
        match self.container_transform.inverse() {
            Ok(inverse) => inverse.apply(p),
            Err(e) => {
                warn!("Container transform of {} not invertible: {}", self.type_name(), e);
                p
            }
        }
    }

    /// Grip position in the local frame.
    pub fn grip_local_position(&self, role: GripRole) -> Option<Point> {
        match role {
            GripRole::Resize(grip) => {
                let x = match grip.horizontal() {
                    HorizontalEdge::Left => self.left,
                    HorizontalEdge::Right => self.left + self.width,
                    HorizontalEdge::None => self.center_x(),
                };
                let y = match grip.vertical() {
                    VerticalEdge::Top => self.top,
                    VerticalEdge::Bottom => self.top + self.height,
                    VerticalEdge::None => self.center_y(),
                };
                Some(Point::new(x, y))
            }
            GripRole::Rotate => Some(Point::new(self.center_x(), self.top - self.rotator_offset)),
            GripRole::CalloutTip => self.decoration.aux_grip_position(&self.frame()),
            _ => None,
        }
    }

    pub fn grip_screen_position(&self, role: GripRole) -> Option<Point> {
        self.grip_local_position(role).map(|p| self.rotate_point(p))
    }

    /// Body outline relative to the box origin. Renderers apply the
    /// visual transform and then the container transform.
    pub fn outline(&self) -> Path {
        self.decoration.outline(&BoxFrame {
            left: 0.0,
            top: 0.0,
            width: self.width,
            height: self.height,
        })
    }

    fn update_visual(&mut self) {
        self.visual_transform = TransformMatrix::translation(self.left, self.top);
        self.adjust_control_box();
    }

    fn adjust_control_box(&mut self) {
        let positions: Vec<(GripRole, Point)> = self
            .control_box
            .grips()
            .filter_map(|(role, _)| self.grip_local_position(*role).map(|p| (*role, p)))
            .collect();
        for (role, center) in positions {
            self.control_box.set_grip_center(role, center);
        }
    }

    fn snapshot(&self, grab_offset: Point) -> SessionSnapshot {
        SessionSnapshot::Box {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            grab_offset,
        }
    }

    /// Moves the rotation pivot to the current center without moving the
    /// box on screen.
    fn recenter_pivot(&mut self) {
        if self.rotation_angle == 0.0 {
            return;
        }
        let center = Point::new(self.center_x(), self.center_y());
        let projected = self.container_transform.apply(center);
        self.left += projected.x - center.x;
        self.top += projected.y - center.y;
        self.container_transform =
            TransformMatrix::rotation(self.rotation_angle, self.center_x(), self.center_y());
        self.update_visual();
    }

    fn resize(&mut self, session: &ManipulationSession, grip: Option<BoxGrip>, local: Point) {
        let SessionSnapshot::Box {
            left,
            top,
            width,
            height,
            ..
        } = session.start
        else {
            return;
        };
        let start = session.start_point;
        // no grip means a creating drag, which behaves like bottom-right
        let horizontal = grip.map_or(HorizontalEdge::Right, BoxGrip::horizontal);
        let vertical = grip.map_or(VerticalEdge::Bottom, BoxGrip::vertical);

        let (mut new_x, mut new_width) = (left, width);
        match horizontal {
            HorizontalEdge::Left => {
                new_x = left + local.x - start.x;
                new_width = width + left - new_x;
            }
            HorizontalEdge::Right => new_width = width + local.x - start.x,
            HorizontalEdge::None => {}
        }

        let (mut new_y, mut new_height) = (top, height);
        match vertical {
            VerticalEdge::Top => {
                new_y = top + local.y - start.y;
                new_height = height + top - new_y;
            }
            VerticalEdge::Bottom => new_height = height + local.y - start.y,
            VerticalEdge::None => {}
        }

        (self.left, self.width) = normalize_span(new_x, new_width);
        (self.top, self.height) = normalize_span(new_y, new_height);

        let creating = self.base.state() == MarkerLifecycle::Creating;
        let frame = self.frame();
        self.decoration.on_resized(&frame, creating);
    }

    fn rotate(&mut self, point: Point) {
        let dx = point.x - self.center_x();
        let dy = point.y - self.center_y();
        if dx.abs() <= ROTATE_DEAD_ZONE {
            return;
        }
        self.rotation_angle = (dy / dx).atan().to_degrees() + 90.0 * dx.signum();
        self.container_transform =
            TransformMatrix::rotation(self.rotation_angle, self.center_x(), self.center_y());
    }
}

/// Flips a negative extent so the origin becomes the far edge.
fn normalize_span(origin: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (origin + extent, -extent)
    } else {
        (origin, extent)
    }
}

impl Manipulable for RectangularBoxMarker {
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
        let local = self.unrotate_point(point);
        self.decoration.contains(&self.frame(), local, 0.0)
    }

    fn grip_at(&self, point: Point) -> Option<VisualId> {
        if !self.control_box.is_visible() {
            return None;
        }
        let local = self.unrotate_point(point);
        self.control_box.grip_at(local).map(|grip| grip.visual())
    }

    fn pointer_down(&mut self, point: Point, target: Option<VisualId>) -> ManipulationSession {
        if self.base.state() == MarkerLifecycle::New {
            let local = self.unrotate_point(point);
            self.left = local.x;
            self.top = local.y;
            self.width = 0.0;
            self.height = 0.0;
            self.base.transition(MarkerLifecycle::Creating);
            self.update_visual();
            return ManipulationSession {
                start_point: local,
                active_grip: None,
                start: self.snapshot(Point::default()),
            };
        }

        self.select();
        let active_grip = target.and_then(|t| self.control_box.find_grip(t));
        match active_grip {
            Some(GripRole::Rotate) => {
                self.recenter_pivot();
                self.base.transition(MarkerLifecycle::Rotate);
            }
            Some(_) => {
                self.base.transition(MarkerLifecycle::Resize);
            }
            None => {
                self.base.transition(MarkerLifecycle::Move);
            }
        }
        debug!("{} pointer down, grip {:?}", self.type_name(), active_grip);

        let local = self.unrotate_point(point);
        let grab_offset = Point::new(local.x - self.left, local.y - self.top);
        ManipulationSession {
            start_point: local,
            active_grip,
            start: self.snapshot(grab_offset),
        }
    }

    fn manipulate(&mut self, session: &ManipulationSession, point: Point) {
        let SessionSnapshot::Box { grab_offset, .. } = session.start else {
            warn!("{} ignoring a linear manipulation session", self.type_name());
            return;
        };
        match self.base.state() {
            MarkerLifecycle::Creating => {
                let local = self.unrotate_point(point);
                self.resize(session, None, local);
            }
            MarkerLifecycle::Move => {
                let local = self.unrotate_point(point);
                self.left = local.x - grab_offset.x;
                self.top = local.y - grab_offset.y;
            }
            MarkerLifecycle::Resize => {
                let local = self.unrotate_point(point);
                match session.active_grip {
                    Some(GripRole::CalloutTip) => {
                        let frame = self.frame();
                        self.decoration.drag_aux(&frame, local);
                    }
                    Some(GripRole::Resize(grip)) => self.resize(session, Some(grip), local),
                    _ => self.resize(session, None, local),
                }
            }
            MarkerLifecycle::Rotate => self.rotate(point),
            MarkerLifecycle::New | MarkerLifecycle::Select => return,
        }
        self.update_visual();
    }

    fn pointer_up(&mut self, session: ManipulationSession, point: Point) -> Option<MarkerEvent> {
        let previous = self.base.state();
        match previous {
            MarkerLifecycle::Creating => {
                if self.width < self.min_drag_size && self.height < self.min_drag_size {
                    self.width = self.default_size.width;
                    self.height = self.default_size.height;
                    let frame = self.frame();
                    self.decoration.on_resized(&frame, true);
                    self.update_visual();
                } else {
                    self.manipulate(&session, point);
                }
            }
            MarkerLifecycle::Move | MarkerLifecycle::Resize | MarkerLifecycle::Rotate => {
                self.manipulate(&session, point);
            }
            MarkerLifecycle::New | MarkerLifecycle::Select => return None,
        }
        self.base.transition(MarkerLifecycle::Select);

        if previous == MarkerLifecycle::Creating {
            self.select();
            Some(MarkerEvent::Created)
        } else {
            Some(MarkerEvent::StateChanged)
        }
    }

    fn dbl_click(&mut self, _point: Point, target: Option<VisualId>) -> Option<MarkerEvent> {
        let on_marker = target.is_none_or(|t| self.owns_target(t));
        if on_marker && self.decoration.text_content().is_some() {
            Some(MarkerEvent::EditRequested)
        } else {
            None
        }
    }

    fn scale(&mut self, scale_x: f64, scale_y: f64) {
        let rotated = self.rotate_point(Point::new(self.left, self.top));
        let origin = self.unrotate_point(rotated.scaled(scale_x, scale_y));
        self.left = origin.x;
        self.top = origin.y;
        self.width *= scale_x;
        self.height *= scale_y;
        self.decoration.scale(scale_x, scale_y);
        self.update_visual();
    }

    fn get_state(&self) -> MarkerState {
        let mut state = self.base.base_state(self.type_name());
        let geometry = BoxGeometryState {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            rotation_angle: self.rotation_angle,
            visual_transform_matrix: self.visual_transform,
            container_transform_matrix: self.container_transform,
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
        let geometry: BoxGeometryState = state.decode()?;
        let decoration = self.decoration.decode_state(state)?;

        self.decoration = decoration;
        self.base.restore(state);
        self.left = geometry.left;
        self.top = geometry.top;
        self.width = geometry.width;
        self.height = geometry.height;
        self.rotation_angle = geometry.rotation_angle;
        self.visual_transform = geometry.visual_transform_matrix;
        self.container_transform = geometry.container_transform_matrix;
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
