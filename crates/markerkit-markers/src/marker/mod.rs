//! Marker lifecycle and the common manipulation interface.
//!
//! Every marker is one of two geometry variants:
//!
//! ```text
//! Marker
//!   ├── Box(RectangularBoxMarker)   left/top/width/height + rotation
//!   │     └── BoxDecoration         frame, cover, highlight, ellipse, text, callout
//!   └── Linear(LinearMarker)        two endpoints
//!         └── LineDecoration        line, arrow, curve, measurement
//! ```
//!
//! Both implement [`Manipulable`]. Lifecycle:
//!
//! ```text
//! new ──down──▶ creating ──up──▶ select ──down──▶ move | resize | rotate
//!                                  ▲                       │
//!                                  └──────────up───────────┘
//! ```

mod linear;
mod rectangular;
mod session;

pub use linear::{LinearGeometryState, LinearMarker};
pub use rectangular::{BoxGeometryState, RectangularBoxMarker};
pub use session::{ManipulationSession, SessionSnapshot};

use markerkit_core::{Point, StateError, VisualContainer, VisualId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::MarkerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerLifecycle {
    New,
    Creating,
    Select,
    Move,
    Resize,
    Rotate,
}

impl MarkerLifecycle {
    /// True while a pointer gesture is changing geometry.
    pub fn is_manipulating(self) -> bool {
        matches!(
            self,
            MarkerLifecycle::Creating
                | MarkerLifecycle::Move
                | MarkerLifecycle::Resize
                | MarkerLifecycle::Rotate
        )
    }

    pub fn can_transition_to(self, next: MarkerLifecycle) -> bool {
        use MarkerLifecycle::*;
        matches!(
            (self, next),
            (New, Creating)
                | (Creating, Select)
                | (Select, Select)
                | (Select, Move)
                | (Select, Resize)
                | (Select, Rotate)
                | (Move, Select)
                | (Resize, Select)
                | (Rotate, Select)
        )
    }
}

impl std::fmt::Display for MarkerLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Creating => write!(f, "creating"),
            Self::Select => write!(f, "select"),
            Self::Move => write!(f, "move"),
            Self::Resize => write!(f, "resize"),
            Self::Rotate => write!(f, "rotate"),
        }
    }
}

/// Notifications a marker hands back to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEvent {
    /// The `creating` phase finished. Fires once per marker.
    Created,
    /// A move, resize or rotate gesture finished.
    StateChanged,
    /// Double click on a marker with editable text.
    EditRequested,
}

/// Fields and lifecycle shared by both geometry variants.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerBase {
    state: MarkerLifecycle,
    notes: Option<String>,
    container: VisualContainer,
    selected: bool,
}

impl MarkerBase {
    pub fn new() -> Self {
        Self {
            state: MarkerLifecycle::New,
            notes: None,
            container: VisualContainer::new(),
            selected: false,
        }
    }

    pub fn state(&self) -> MarkerLifecycle {
        self.state
    }

    /// Moves along a defined transition. Anything else is logged and
    /// ignored.
    pub fn transition(&mut self, next: MarkerLifecycle) -> bool {
        if self.state.can_transition_to(next) {
            if self.state != next {
                debug!("Marker {} {} -> {}", self.container.root(), self.state, next);
            }
            self.state = next;
            true
        } else {
            warn!(
                "Ignoring transition {} -> {} on marker {}",
                self.state,
                next,
                self.container.root()
            );
            false
        }
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub fn container(&self) -> &VisualContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut VisualContainer {
        &mut self.container
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn base_state(&self, type_name: &str) -> MarkerState {
        let mut state = MarkerState::new(type_name, self.state);
        state.notes = self.notes.clone();
        state
    }

    /// Restoring replaces the lifecycle tag wholesale.
    pub fn restore(&mut self, state: &MarkerState) {
        self.state = state.state;
        self.notes = state.notes.clone();
    }
}

impl Default for MarkerBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Interface every marker geometry exposes to its owner.
pub trait Manipulable {
    /// Name used by the registry to rebuild the marker from state.
    fn type_name(&self) -> &'static str;

    fn lifecycle(&self) -> MarkerLifecycle;

    fn is_selected(&self) -> bool;

    /// Shows the control box. Geometry is untouched.
    fn select(&mut self);

    /// Hides the control box. Geometry is untouched.
    fn deselect(&mut self);

    /// Whether a leaf visual belongs to this marker or one of its grips.
    fn owns_target(&self, target: VisualId) -> bool;

    /// The body visual used as hit target for the marker itself.
    fn body_target(&self) -> VisualId;

    /// Body hit test for a screen-space point.
    fn contains_point(&self, point: Point) -> bool;

    /// Grip under a screen-space point. Only selected markers show grips.
    fn grip_at(&self, point: Point) -> Option<VisualId>;

    fn pointer_down(&mut self, point: Point, target: Option<VisualId>) -> ManipulationSession;

    fn manipulate(&mut self, session: &ManipulationSession, point: Point);

    fn pointer_up(&mut self, session: ManipulationSession, point: Point) -> Option<MarkerEvent>;

    fn dbl_click(&mut self, _point: Point, _target: Option<VisualId>) -> Option<MarkerEvent> {
        None
    }

    /// Called when the underlying surface is resized.
    fn scale(&mut self, scale_x: f64, scale_y: f64);

    fn get_state(&self) -> MarkerState;

    fn restore_state(&mut self, state: &MarkerState) -> Result<(), StateError>;

    /// Every visual id this marker hands out.
    fn visual_ids(&self) -> Vec<VisualId>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Box(RectangularBoxMarker),
    Linear(LinearMarker),
}

impl Marker {
    pub fn as_box(&self) -> Option<&RectangularBoxMarker> {
        match self {
            Marker::Box(m) => Some(m),
            Marker::Linear(_) => None,
        }
    }

    pub fn as_box_mut(&mut self) -> Option<&mut RectangularBoxMarker> {
        match self {
            Marker::Box(m) => Some(m),
            Marker::Linear(_) => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearMarker> {
        match self {
            Marker::Linear(m) => Some(m),
            Marker::Box(_) => None,
        }
    }

    pub fn as_linear_mut(&mut self) -> Option<&mut LinearMarker> {
        match self {
            Marker::Linear(m) => Some(m),
            Marker::Box(_) => None,
        }
    }

    pub fn base(&self) -> &MarkerBase {
        match self {
            Marker::Box(m) => m.base(),
            Marker::Linear(m) => m.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut MarkerBase {
        match self {
            Marker::Box(m) => m.base_mut(),
            Marker::Linear(m) => m.base_mut(),
        }
    }

    pub fn notes(&self) -> Option<&str> {
        self.base().notes()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.base_mut().set_notes(notes);
    }

    /// Severs the marker from its visuals. The returned ids are the
    /// elements a host renderer should remove.
    pub fn dispose(self) -> Vec<VisualId> {
        let ids = self.visual_ids();
        debug!("Disposing {} marker with {} visuals", self.type_name(), ids.len());
        ids
    }
}

impl Manipulable for Marker {
    fn type_name(&self) -> &'static str {
        match self {
            Marker::Box(m) => m.type_name(),
            Marker::Linear(m) => m.type_name(),
        }
    }

    fn lifecycle(&self) -> MarkerLifecycle {
        match self {
            Marker::Box(m) => m.lifecycle(),
            Marker::Linear(m) => m.lifecycle(),
        }
    }

    fn is_selected(&self) -> bool {
        match self {
            Marker::Box(m) => m.is_selected(),
            Marker::Linear(m) => m.is_selected(),
        }
    }

    fn select(&mut self) {
        match self {
            Marker::Box(m) => m.select(),
            Marker::Linear(m) => m.select(),
        }
    }

    fn deselect(&mut self) {
        match self {
            Marker::Box(m) => m.deselect(),
            Marker::Linear(m) => m.deselect(),
        }
    }

    fn owns_target(&self, target: VisualId) -> bool {
        match self {
            Marker::Box(m) => m.owns_target(target),
            Marker::Linear(m) => m.owns_target(target),
        }
    }

    fn body_target(&self) -> VisualId {
        match self {
            Marker::Box(m) => m.body_target(),
            Marker::Linear(m) => m.body_target(),
        }
    }

    fn contains_point(&self, point: Point) -> bool {
        match self {
            Marker::Box(m) => m.contains_point(point),
            Marker::Linear(m) => m.contains_point(point),
        }
    }

    fn grip_at(&self, point: Point) -> Option<VisualId> {
        match self {
            Marker::Box(m) => m.grip_at(point),
            Marker::Linear(m) => m.grip_at(point),
        }
    }

    fn pointer_down(&mut self, point: Point, target: Option<VisualId>) -> ManipulationSession {
        match self {
            Marker::Box(m) => m.pointer_down(point, target),
            Marker::Linear(m) => m.pointer_down(point, target),
        }
    }

    fn manipulate(&mut self, session: &ManipulationSession, point: Point) {
        match self {
            Marker::Box(m) => m.manipulate(session, point),
            Marker::Linear(m) => m.manipulate(session, point),
        }
    }

    fn pointer_up(&mut self, session: ManipulationSession, point: Point) -> Option<MarkerEvent> {
        match self {
            Marker::Box(m) => m.pointer_up(session, point),
            Marker::Linear(m) => m.pointer_up(session, point),
        }
    }

    fn dbl_click(&mut self, point: Point, target: Option<VisualId>) -> Option<MarkerEvent> {
        match self {
            Marker::Box(m) => m.dbl_click(point, target),
            Marker::Linear(m) => m.dbl_click(point, target),
        }
    }

    fn scale(&mut self, scale_x: f64, scale_y: f64) {
        match self {
            Marker::Box(m) => m.scale(scale_x, scale_y),
            Marker::Linear(m) => m.scale(scale_x, scale_y),
        }
    }

    fn get_state(&self) -> MarkerState {
        match self {
            Marker::Box(m) => m.get_state(),
            Marker::Linear(m) => m.get_state(),
        }
    }

    fn restore_state(&mut self, state: &MarkerState) -> Result<(), StateError> {
        match self {
            Marker::Box(m) => m.restore_state(state),
            Marker::Linear(m) => m.restore_state(state),
        }
    }

    fn visual_ids(&self) -> Vec<VisualId> {
        match self {
            Marker::Box(m) => m.visual_ids(),
            Marker::Linear(m) => m.visual_ids(),
        }
    }
}
