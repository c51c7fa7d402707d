//! Headless marker area.
//!
//! Owns the marker collection and routes pointer input to the current
//! marker. A host supplies screen-space points and, when it has one, the
//! visual element under the pointer; [`MarkerArea::target_at`] resolves
//! that element for hosts without their own hit testing.
//!
//! Only the first pointer of a multi-touch gesture drives manipulation.

use markerkit_core::{Point, StateError, VisualId};
use tracing::{debug, info, warn};

use crate::defaults::MarkerDefaults;
use crate::marker::{Manipulable, ManipulationSession, Marker, MarkerEvent};
use crate::registry::MarkerRegistry;
use crate::state::MarkerAreaState;
use crate::undo_redo::UndoRedoManager;

#[derive(Debug)]
pub struct MarkerArea {
    width: f64,
    height: f64,
    markers: Vec<Marker>,
    /// Marker being created; joins `markers` once creation finishes
    pending: Option<Marker>,
    current: Option<usize>,
    registry: MarkerRegistry,
    defaults: MarkerDefaults,
    undo_redo: UndoRedoManager<MarkerAreaState>,
    session: Option<ManipulationSession>,
    touch_points: u32,
}

impl MarkerArea {
    /// An empty area with built-in marker types and default settings.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_options(
            width,
            height,
            MarkerDefaults::default(),
            MarkerRegistry::with_builtin(),
            None,
        )
    }

    pub fn with_options(
        width: f64,
        height: f64,
        defaults: MarkerDefaults,
        registry: MarkerRegistry,
        undo_depth: Option<usize>,
    ) -> Self {
        let undo_redo = match undo_depth {
            Some(depth) => UndoRedoManager::with_depth(depth),
            None => UndoRedoManager::new(),
        };
        let mut area = Self {
            width,
            height,
            markers: Vec::new(),
            pending: None,
            current: None,
            registry,
            defaults,
            undo_redo,
            session: None,
            touch_points: 0,
        };
        area.add_undo_step();
        area
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn defaults(&self) -> &MarkerDefaults {
        &self.defaults
    }

    pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.registry
    }

    /// Index of the selected marker in the collection.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The marker receiving input: one being created, or the selection.
    pub fn current_marker(&self) -> Option<&Marker> {
        match &self.pending {
            Some(marker) => Some(marker),
            None => self.current.and_then(|i| self.markers.get(i)),
        }
    }

    pub fn is_creating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_redo.is_undo_possible()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_redo.is_redo_possible()
    }

    pub fn undo_redo(&self) -> &UndoRedoManager<MarkerAreaState> {
        &self.undo_redo
    }

    fn current_marker_mut(&mut self) -> Option<&mut Marker> {
        match self.pending {
            Some(ref mut marker) => Some(marker),
            None => self.current.and_then(|i| self.markers.get_mut(i)),
        }
    }

    /// Starts creating a marker of the given type. The next pointer down
    /// places it.
    pub fn create_marker(&mut self, type_name: &str) -> Result<(), StateError> {
        let marker = self
            .registry
            .instantiate(type_name, &self.defaults)
            .ok_or_else(|| StateError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        self.deselect_current();
        debug!("Creating {} marker", type_name);
        self.pending = Some(marker);
        Ok(())
    }

    pub fn select_marker(&mut self, index: usize) -> bool {
        if index >= self.markers.len() {
            return false;
        }
        if self.current != Some(index) || self.pending.is_some() {
            self.deselect_current();
        }
        self.current = Some(index);
        self.markers[index].select();
        true
    }

    /// Deselects the current marker. A marker that was still being
    /// created is discarded.
    pub fn deselect_current(&mut self) {
        if let Some(marker) = self.pending.take() {
            debug!("Discarding unfinished {} marker", marker.type_name());
            marker.dispose();
            self.session = None;
        }
        if let Some(marker) = self.current.take().and_then(|i| self.markers.get_mut(i)) {
            marker.deselect();
        }
    }

    /// Removes the current marker and returns the visuals a renderer
    /// should drop.
    pub fn delete_selected(&mut self) -> Vec<VisualId> {
        if let Some(marker) = self.pending.take() {
            self.session = None;
            return marker.dispose();
        }
        let Some(index) = self.current.take() else {
            return Vec::new();
        };
        if index >= self.markers.len() {
            return Vec::new();
        }
        self.session = None;
        let marker = self.markers.remove(index);
        debug!("Deleted {} marker at {}", marker.type_name(), index);
        let ids = marker.dispose();
        self.add_undo_step();
        ids
    }

    /// Resolves the visual under a screen point: grips of the current
    /// marker first, then marker bodies from the top down.
    pub fn target_at(&self, point: Point) -> Option<VisualId> {
        if let Some(grip) = self.current_marker().and_then(|m| m.grip_at(point)) {
            return Some(grip);
        }
        self.markers
            .iter()
            .rev()
            .find(|m| m.contains_point(point))
            .map(|m| m.body_target())
    }

    fn owner_of(&self, target: VisualId) -> Option<usize> {
        self.markers.iter().rposition(|m| m.owns_target(target))
    }

    pub fn pointer_down(&mut self, point: Point, target: Option<VisualId>) {
        self.touch_points += 1;
        if self.touch_points > 1 {
            debug!("Ignoring additional touch ({} active)", self.touch_points);
            return;
        }

        if self.session.is_some() {
            debug!("Resuming interrupted gesture");
            return;
        }

        if let Some(marker) = self.pending.as_mut() {
            self.session = Some(marker.pointer_down(point, target));
            return;
        }

        match target.and_then(|t| self.owner_of(t)) {
            Some(index) => {
                if self.current != Some(index) {
                    self.deselect_current();
                }
                self.current = Some(index);
                let session = self.markers[index].pointer_down(point, target);
                self.session = Some(session);
            }
            None => {
                self.session = None;
                self.deselect_current();
            }
        }
    }

    /// Manipulates while a gesture is live. A pointer that left the
    /// surface keeps driving it after it comes back.
    pub fn pointer_move(&mut self, point: Point) {
        if self.touch_points > 1 {
            return;
        }
        let Some(session) = self.session.take() else {
            return;
        };
        if let Some(marker) = self.current_marker_mut() {
            marker.manipulate(&session, point);
        }
        self.session = Some(session);
    }

    pub fn pointer_up(&mut self, point: Point) -> Option<MarkerEvent> {
        self.touch_points = self.touch_points.saturating_sub(1);
        if self.touch_points > 0 {
            return None;
        }
        let session = self.session.take()?;
        let event = self.current_marker_mut()?.pointer_up(session, point);
        match event {
            Some(MarkerEvent::Created) => {
                if let Some(marker) = self.pending.take() {
                    info!("Created {} marker", marker.type_name());
                    self.markers.push(marker);
                    self.current = Some(self.markers.len() - 1);
                }
                self.add_undo_step();
            }
            Some(MarkerEvent::StateChanged) => {
                self.add_undo_step();
            }
            _ => {}
        }
        event
    }

    /// The pointer was cancelled or left the surface. The gesture stays
    /// live with the geometry of the last update; the next `pointer_up`
    /// finalizes it.
    pub fn pointer_cancel(&mut self) {
        self.touch_points = self.touch_points.saturating_sub(1);
    }

    pub fn pointer_out(&mut self) {
        self.pointer_cancel();
    }

    pub fn dbl_click(&mut self, point: Point, target: Option<VisualId>) -> Option<MarkerEvent> {
        let target = target.or_else(|| self.target_at(point));
        let index = target.and_then(|t| self.owner_of(t))?;
        self.select_marker(index);
        self.markers[index].dbl_click(point, target)
    }

    pub fn get_state(&self) -> MarkerAreaState {
        MarkerAreaState {
            width: self.width,
            height: self.height,
            markers: self.markers.iter().map(|m| m.get_state()).collect(),
        }
    }

    /// Replaces all markers with the ones in `state`. Entries of unknown
    /// type or with invalid fields are skipped. Returns how many markers
    /// were restored.
    pub fn restore_state(&mut self, state: &MarkerAreaState) -> usize {
        let restored = self.load_snapshot(state);
        info!(
            "Restored {} of {} markers from a {}x{} area",
            restored,
            state.markers.len(),
            state.width,
            state.height
        );
        self.add_undo_step();
        restored
    }

    /// Parses and restores a JSON document.
    pub fn restore_json(&mut self, json: &str) -> Result<usize, StateError> {
        let state = MarkerAreaState::from_json(json)?;
        Ok(self.restore_state(&state))
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_redo.undo().cloned() {
            Some(step) => {
                self.load_snapshot(&step);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.undo_redo.redo().cloned() {
            Some(step) => {
                self.load_snapshot(&step);
                true
            }
            None => false,
        }
    }

    /// Scales every marker to a new surface size and rewrites the latest
    /// history entry to match.
    pub fn resize_surface(&mut self, width: f64, height: f64) -> bool {
        if width <= 0.0 || height <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            warn!("Ignoring surface resize to {}x{}", width, height);
            return false;
        }
        let scale_x = width / self.width;
        let scale_y = height / self.height;
        for marker in &mut self.markers {
            marker.scale(scale_x, scale_y);
        }
        if let Some(marker) = self.pending.as_mut() {
            marker.scale(scale_x, scale_y);
        }
        self.width = width;
        self.height = height;
        debug!("Surface resized to {}x{}", width, height);
        let state = self.get_state();
        self.undo_redo.replace_last_undo_step(state);
        true
    }

    fn add_undo_step(&mut self) -> bool {
        let state = self.get_state();
        self.undo_redo.add_undo_step(state)
    }

    fn load_snapshot(&mut self, state: &MarkerAreaState) -> usize {
        self.deselect_current();
        self.session = None;
        self.touch_points = 0;

        let mut markers = Vec::with_capacity(state.markers.len());
        for marker_state in &state.markers {
            let Some(mut marker) = self
                .registry
                .instantiate(&marker_state.type_name, &self.defaults)
            else {
                warn!("Skipping marker of unknown type {}", marker_state.type_name);
                continue;
            };
            match marker.restore_state(marker_state) {
                Ok(()) => markers.push(marker),
                Err(e) => warn!("Skipping {} marker: {}", marker_state.type_name, e),
            }
        }

        let rescale = state.width > 0.0
            && state.height > 0.0
            && (state.width != self.width || state.height != self.height);
        if rescale {
            let scale_x = self.width / state.width;
            let scale_y = self.height / state.height;
            for marker in &mut markers {
                marker.scale(scale_x, scale_y);
            }
        }

        let restored = markers.len();
        self.markers = markers;
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grip::{BoxGrip, GripRole};
    use crate::marker::MarkerLifecycle;

    fn click(area: &mut MarkerArea, at: Point) -> Option<MarkerEvent> {
        let target = area.target_at(at);
        area.pointer_down(at, target);
        area.pointer_up(at)
    }

    fn drag(area: &mut MarkerArea, from: Point, to: Point) -> Option<MarkerEvent> {
        let target = area.target_at(from);
        area.pointer_down(from, target);
        area.pointer_move(to);
        area.pointer_up(to)
    }

    #[test]
    fn test_creation_adds_marker_and_undo_step() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        assert!(area.is_creating());
        assert!(area.markers().is_empty());

        let event = drag(&mut area, Point::new(10.0, 10.0), Point::new(60.0, 40.0));
        assert_eq!(event, Some(MarkerEvent::Created));
        assert_eq!(area.markers().len(), 1);
        assert_eq!(area.current_index(), Some(0));
        assert!(area.can_undo());
        assert_eq!(area.undo_redo().undo_len(), 2);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut area = MarkerArea::new(800.0, 600.0);
        let err = area.create_marker("StampMarker").unwrap_err();
        assert!(matches!(err, StateError::UnknownType { .. }));
        assert!(!area.is_creating());
    }

    #[test]
    fn test_click_on_empty_space_deselects() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("EllipseMarker").unwrap();
        drag(&mut area, Point::new(100.0, 100.0), Point::new(200.0, 200.0));
        assert!(area.markers()[0].is_selected());

        assert_eq!(click(&mut area, Point::new(500.0, 500.0)), None);
        assert_eq!(area.current_index(), None);
        assert!(!area.markers()[0].is_selected());
    }

    #[test]
    fn test_move_pushes_state_changed() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));

        let event = drag(&mut area, Point::new(50.0, 25.0), Point::new(150.0, 75.0));
        assert_eq!(event, Some(MarkerEvent::StateChanged));
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.left(), marker.top()), (100.0, 50.0));
        assert_eq!(area.undo_redo().undo_len(), 3);

        assert!(area.undo());
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.left(), marker.top()), (0.0, 0.0));
        assert!(area.redo());
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.left(), marker.top()), (100.0, 50.0));
    }

    #[test]
    fn test_grip_resolves_before_body() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));

        let target = area.target_at(Point::new(100.0, 50.0)).unwrap();
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!(
            marker.control_box().find_grip(target),
            Some(GripRole::Resize(BoxGrip::BottomRight))
        );

        drag(&mut area, Point::new(100.0, 50.0), Point::new(150.0, 80.0));
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.width(), marker.height()), (150.0, 80.0));
    }

    #[test]
    fn test_second_touch_is_ignored() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));

        let body = area.target_at(Point::new(50.0, 25.0));
        area.pointer_down(Point::new(50.0, 25.0), body);
        area.pointer_down(Point::new(300.0, 300.0), None);
        area.pointer_move(Point::new(80.0, 25.0));
        assert_eq!(area.pointer_up(Point::new(80.0, 25.0)), None);
        assert_eq!(area.markers()[0].as_box().unwrap().left(), 0.0);

        assert_eq!(
            area.pointer_up(Point::new(60.0, 25.0)),
            Some(MarkerEvent::StateChanged)
        );
        assert_eq!(area.markers()[0].as_box().unwrap().left(), 10.0);
    }

    #[test]
    fn test_cancel_keeps_gesture_until_pointer_up() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let steps = area.undo_redo().undo_len();

        let body = area.target_at(Point::new(50.0, 25.0));
        area.pointer_down(Point::new(50.0, 25.0), body);
        area.pointer_move(Point::new(70.0, 45.0));
        area.pointer_cancel();

        let marker = &area.markers()[0];
        assert_eq!(marker.lifecycle(), MarkerLifecycle::Move);
        assert_eq!(marker.as_box().unwrap().left(), 20.0);
        assert_eq!(area.undo_redo().undo_len(), steps);

        assert_eq!(
            area.pointer_up(Point::new(70.0, 45.0)),
            Some(MarkerEvent::StateChanged)
        );
        assert_eq!(area.markers()[0].lifecycle(), MarkerLifecycle::Select);
        assert_eq!(area.undo_redo().undo_len(), steps + 1);
    }

    #[test]
    fn test_pointer_out_and_back_continues_move() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let steps = area.undo_redo().undo_len();

        let body = area.target_at(Point::new(50.0, 25.0));
        area.pointer_down(Point::new(50.0, 25.0), body);
        area.pointer_move(Point::new(70.0, 45.0));
        area.pointer_out();
        area.pointer_move(Point::new(90.0, 45.0));
        assert_eq!(area.markers()[0].as_box().unwrap().left(), 40.0);

        assert_eq!(
            area.pointer_up(Point::new(90.0, 45.0)),
            Some(MarkerEvent::StateChanged)
        );
        assert_eq!(area.undo_redo().undo_len(), steps + 1);

        assert!(area.undo());
        assert_eq!(area.markers()[0].as_box().unwrap().left(), 0.0);
        assert!(area.redo());
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.left(), marker.top()), (40.0, 20.0));
    }

    #[test]
    fn test_interrupted_creation_resumes_on_next_down() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("FrameMarker").unwrap();
        area.pointer_down(Point::new(10.0, 10.0), None);
        area.pointer_move(Point::new(40.0, 30.0));
        area.pointer_out();
        assert!(area.is_creating());

        area.pointer_down(Point::new(50.0, 50.0), None);
        area.pointer_move(Point::new(60.0, 40.0));
        assert_eq!(
            area.pointer_up(Point::new(60.0, 40.0)),
            Some(MarkerEvent::Created)
        );
        let marker = area.markers()[0].as_box().unwrap();
        assert_eq!((marker.left(), marker.top()), (10.0, 10.0));
        assert_eq!((marker.width(), marker.height()), (50.0, 30.0));
    }

    #[test]
    fn test_delete_selected() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("ArrowMarker").unwrap();
        drag(&mut area, Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let ids = area.delete_selected();
        assert!(!ids.is_empty());
        assert!(area.markers().is_empty());
        assert!(area.undo());
        assert_eq!(area.markers().len(), 1);
    }

    #[test]
    fn test_resize_surface_replaces_last_step() {
        let mut area = MarkerArea::new(400.0, 300.0);
        area.create_marker("LineMarker").unwrap();
        drag(&mut area, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
        let steps = area.undo_redo().undo_len();

        assert!(area.resize_surface(800.0, 600.0));
        assert_eq!(area.undo_redo().undo_len(), steps);
        let line = area.markers()[0].as_linear().unwrap();
        assert_eq!(line.p2(), Point::new(220.0, 120.0));
        assert_eq!(area.undo_redo().get_last_undo_step(), Some(&area.get_state()));
        assert!(!area.resize_surface(0.0, 600.0));
    }

    #[test]
    fn test_dbl_click_text_requests_edit() {
        let mut area = MarkerArea::new(800.0, 600.0);
        area.create_marker("TextMarker").unwrap();
        click(&mut area, Point::new(10.0, 10.0));
        assert_eq!(
            area.dbl_click(Point::new(20.0, 20.0), None),
            Some(MarkerEvent::EditRequested)
        );
    }
}
