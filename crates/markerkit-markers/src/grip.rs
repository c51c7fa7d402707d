//! Grips: the small draggable handles of a selected marker.
//!
//! A grip is stateless geometry. It owns two leaf visuals (the drawn dot
//! and a larger transparent hit ring) and knows where it sits in its
//! marker's local frame. Which formula a drag applies is decided by the
//! grip's [`GripRole`], never by how close the pointer is.

use markerkit_core::{Point, VisualId};
use serde::{Deserialize, Serialize};

/// Default grip visual diameter.
pub const GRIP_SIZE: f64 = 10.0;

/// Horizontal edge a box grip drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalEdge {
    Left,
    Right,
    None,
}

/// Vertical edge a box grip drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalEdge {
    Top,
    Bottom,
    None,
}

/// The eight resize grips of a rectangular control box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxGrip {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl BoxGrip {
    pub const ALL: [BoxGrip; 8] = [
        BoxGrip::TopLeft,
        BoxGrip::TopCenter,
        BoxGrip::TopRight,
        BoxGrip::CenterLeft,
        BoxGrip::CenterRight,
        BoxGrip::BottomLeft,
        BoxGrip::BottomCenter,
        BoxGrip::BottomRight,
    ];

    /// Which of `{left, width}` this grip drives.
    pub fn horizontal(self) -> HorizontalEdge {
        match self {
            BoxGrip::TopLeft | BoxGrip::CenterLeft | BoxGrip::BottomLeft => HorizontalEdge::Left,
            BoxGrip::TopRight | BoxGrip::CenterRight | BoxGrip::BottomRight => {
                HorizontalEdge::Right
            }
            BoxGrip::TopCenter | BoxGrip::BottomCenter => HorizontalEdge::None,
        }
    }

    /// Which of `{top, height}` this grip drives.
    pub fn vertical(self) -> VerticalEdge {
        match self {
            BoxGrip::TopLeft | BoxGrip::TopCenter | BoxGrip::TopRight => VerticalEdge::Top,
            BoxGrip::BottomLeft | BoxGrip::BottomCenter | BoxGrip::BottomRight => {
                VerticalEdge::Bottom
            }
            BoxGrip::CenterLeft | BoxGrip::CenterRight => VerticalEdge::None,
        }
    }

    pub fn is_corner(self) -> bool {
        self.horizontal() != HorizontalEdge::None && self.vertical() != VerticalEdge::None
    }
}

/// What dragging a grip does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GripRole {
    Resize(BoxGrip),
    Rotate,
    Endpoint1,
    Endpoint2,
    CurveControl,
    CalloutTip,
}

/// A draggable handle with a fixed visual hit radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Grip {
    visual: VisualId,
    hit_area: VisualId,
    center: Point,
    size: f64,
}

impl Grip {
    pub fn new(size: f64) -> Self {
        Self {
            visual: VisualId::next(),
            hit_area: VisualId::next(),
            center: Point::default(),
            size,
        }
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    pub fn hit_area(&self) -> VisualId {
        self.hit_area
    }

    /// Position in the owning marker's local frame.
    pub fn center(&self) -> Point {
        self.center
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// The hit ring is twice the drawn dot.
    pub fn hit_radius(&self) -> f64 {
        self.size
    }

    pub fn owns_target(&self, target: VisualId) -> bool {
        target == self.visual || target == self.hit_area
    }

    /// `local` must be in the same frame as [`Grip::center`].
    pub fn hit_test(&self, local: Point) -> bool {
        self.center.distance_to(&local) <= self.hit_radius()
    }
}

impl Default for Grip {
    fn default() -> Self {
        Self::new(GRIP_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_grips_affect_both_axes() {
        for grip in BoxGrip::ALL {
            let affects_x = grip.horizontal() != HorizontalEdge::None;
            let affects_y = grip.vertical() != VerticalEdge::None;
            assert_eq!(grip.is_corner(), affects_x && affects_y, "{grip:?}");
            assert!(affects_x || affects_y, "{grip:?} must affect an axis");
        }
    }

    #[test]
    fn test_edge_grips_affect_one_axis() {
        assert_eq!(BoxGrip::TopCenter.horizontal(), HorizontalEdge::None);
        assert_eq!(BoxGrip::TopCenter.vertical(), VerticalEdge::Top);
        assert_eq!(BoxGrip::CenterRight.horizontal(), HorizontalEdge::Right);
        assert_eq!(BoxGrip::CenterRight.vertical(), VerticalEdge::None);
    }

    #[test]
    fn test_grip_ownership() {
        let grip = Grip::default();
        assert!(grip.owns_target(grip.visual()));
        assert!(grip.owns_target(grip.hit_area()));
        assert!(!grip.owns_target(Grip::default().visual()));
    }

    #[test]
    fn test_grip_hit_radius() {
        let mut grip = Grip::new(10.0);
        grip.set_center(Point::new(100.0, 100.0));
        assert!(grip.hit_test(Point::new(106.0, 108.0)));
        assert!(!grip.hit_test(Point::new(111.0, 100.0)));
    }
}
