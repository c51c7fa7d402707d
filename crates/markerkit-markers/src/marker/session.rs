use markerkit_core::Point;

use crate::grip::GripRole;

/// Everything a marker needs to remember between `pointer_down` and the
/// matching `pointer_up`.
///
/// Created by `pointer_down`, borrowed by every `manipulate` call and
/// consumed by `pointer_up`, so nothing has to be reset afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationSession {
    /// Pointer position at `pointer_down`, in the marker's local frame
    pub start_point: Point,
    /// Grip under the pointer; `None` while creating or moving
    pub active_grip: Option<GripRole>,
    pub start: SessionSnapshot,
}

/// Geometry captured when the gesture started.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSnapshot {
    Box {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        /// Pointer minus box origin, so a move tracks the grabbed sub-point
        grab_offset: Point,
    },
    Linear {
        p1: Point,
        p2: Point,
        control: Option<Point>,
    },
}
