//! Property tests for box manipulation and undo history.

use markerkit_core::Point;
use markerkit_markers::{
    BoxDecoration, BoxGrip, GripRole, Manipulable, MarkerDefaults, RectangularBoxMarker,
    UndoRedoManager,
};
use proptest::prelude::*;

fn created_box(left: f64, top: f64, width: f64, height: f64) -> RectangularBoxMarker {
    let defaults = MarkerDefaults::default();
    let mut marker = RectangularBoxMarker::new(BoxDecoration::frame(&defaults), &defaults);
    let from = Point::new(left, top);
    let to = Point::new(left + width, top + height);
    let session = marker.pointer_down(from, None);
    marker.manipulate(&session, to);
    marker.pointer_up(session, to);
    marker
}

fn any_grip() -> impl Strategy<Value = BoxGrip> {
    prop::sample::select(BoxGrip::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_resize_never_leaves_negative_size(
        width in 10.0f64..300.0,
        height in 10.0f64..300.0,
        angle in prop::sample::select(vec![0.0f64, 30.0, 45.0, 90.0, 200.0]),
        grip in any_grip(),
        dx in -600.0f64..600.0,
        dy in -600.0f64..600.0,
    ) {
        let mut marker = created_box(50.0, 50.0, width, height);
        marker.set_rotation(angle);
        let role = GripRole::Resize(grip);
        let start = marker.grip_screen_position(role).unwrap();
        let target = marker.control_box().grip(role).map(|g| g.hit_area());

        let session = marker.pointer_down(start, target);
        let end = start.offset(dx, dy);
        marker.manipulate(&session, end);
        marker.pointer_up(session, end);

        prop_assert!(marker.width() >= 0.0);
        prop_assert!(marker.height() >= 0.0);
    }

    #[test]
    fn prop_creating_drag_in_any_direction_is_normalized(
        x in -200.0f64..200.0,
        y in -200.0f64..200.0,
        dx in -300.0f64..300.0,
        dy in -300.0f64..300.0,
    ) {
        let marker = created_box(x, y, dx, dy);
        prop_assert!(marker.width() >= 0.0);
        prop_assert!(marker.height() >= 0.0);
        prop_assert!((marker.left() - x.min(x + dx)).abs() < 1e-9);
    }

    #[test]
    fn prop_unit_scale_is_identity(
        left in -100.0f64..400.0,
        top in -100.0f64..400.0,
        angle in -180.0f64..180.0,
    ) {
        let mut marker = created_box(left, top, 80.0, 40.0);
        marker.set_rotation(angle);
        let (l, t) = (marker.left(), marker.top());
        marker.scale(1.0, 1.0);
        prop_assert!((marker.left() - l).abs() < 1e-6);
        prop_assert!((marker.top() - t).abs() < 1e-6);
        prop_assert_eq!((marker.width(), marker.height()), (80.0, 40.0));
    }

    #[test]
    fn prop_distinct_pushes_grow_stack(values in prop::collection::btree_set(0u32..1000, 1..40)) {
        let mut history = UndoRedoManager::new();
        for value in &values {
            prop_assert!(history.add_undo_step(*value));
        }
        prop_assert_eq!(history.undo_len(), values.len());

        let top = *history.get_last_undo_step().unwrap();
        prop_assert!(!history.add_undo_step(top));
        prop_assert_eq!(history.undo_len(), values.len());
    }

    #[test]
    fn prop_undo_then_new_step_drops_redo(
        values in prop::collection::vec(0u32..50, 2..20),
        undos in 1usize..10,
    ) {
        let mut history = UndoRedoManager::new();
        for value in &values {
            history.add_undo_step(*value);
        }
        for _ in 0..undos {
            history.undo();
        }
        if history.is_redo_possible() {
            history.add_undo_step(1000);
            prop_assert!(!history.is_redo_possible());
        }
    }
}
