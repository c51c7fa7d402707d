//! # MarkerKit Markers
//!
//! Interactive annotation markers drawn over an image: creation by drag
//! or click, move/resize/rotate through grips, snapshot undo/redo and
//! a flat JSON state format.
//!
//! ## Modules
//!
//! - [`marker`]: lifecycle, the [`Manipulable`] interface and the box and
//!   linear geometry variants
//! - [`decorations`]: the per-type styles that sit on top of a geometry
//! - [`grip`] / [`control_box`]: draggable handles around a selected marker
//! - [`registry`]: `typeName` to constructor lookup used on restore
//! - [`state`]: serializable marker and area state
//! - [`undo_redo`]: generic snapshot history
//! - [`marker_area`]: a headless area that routes pointer input

pub mod control_box;
pub mod decorations;
pub mod defaults;
pub mod grip;
pub mod marker;
pub mod marker_area;
pub mod registry;
pub mod state;
pub mod undo_redo;

pub use control_box::ControlBox;
pub use decorations::{ArrowType, BoxDecoration, LineDecoration};
pub use defaults::{MarkerDefaults, Size};
pub use grip::{BoxGrip, Grip, GripRole, GRIP_SIZE};
pub use marker::{
    LinearMarker, Manipulable, ManipulationSession, Marker, MarkerEvent, MarkerLifecycle,
    RectangularBoxMarker,
};
pub use marker_area::MarkerArea;
pub use registry::MarkerRegistry;
pub use state::{MarkerAreaState, MarkerState};
pub use undo_redo::UndoRedoManager;
