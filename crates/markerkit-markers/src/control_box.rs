//! The overlay shown around a selected marker: a frame plus its grips.

use markerkit_core::{Point, VisualId};
use smallvec::SmallVec;

use crate::grip::{BoxGrip, Grip, GripRole};

#[derive(Debug, Clone, PartialEq)]
pub struct ControlBox {
    frame: VisualId,
    grips: SmallVec<[(GripRole, Grip); 10]>,
    visible: bool,
}

impl ControlBox {
    /// Eight resize grips and a rotation grip, plus an optional
    /// decoration grip that takes precedence in point hit tests.
    pub fn for_box(grip_size: f64, aux: Option<GripRole>) -> Self {
        let mut grips = SmallVec::new();
        if let Some(role) = aux {
            grips.push((role, Grip::new(grip_size)));
        }
        grips.push((GripRole::Rotate, Grip::new(grip_size)));
        for grip in BoxGrip::ALL {
            grips.push((GripRole::Resize(grip), Grip::new(grip_size)));
        }
        Self {
            frame: VisualId::next(),
            grips,
            visible: false,
        }
    }

    /// Two endpoint grips plus an optional decoration grip.
    pub fn for_line(grip_size: f64, aux: Option<GripRole>) -> Self {
        let mut grips = SmallVec::new();
        if let Some(role) = aux {
            grips.push((role, Grip::new(grip_size)));
        }
        grips.push((GripRole::Endpoint1, Grip::new(grip_size)));
        grips.push((GripRole::Endpoint2, Grip::new(grip_size)));
        Self {
            frame: VisualId::next(),
            grips,
            visible: false,
        }
    }

    pub fn frame(&self) -> VisualId {
        self.frame
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn grips(&self) -> impl Iterator<Item = &(GripRole, Grip)> {
        self.grips.iter()
    }

    pub fn grip(&self, role: GripRole) -> Option<&Grip> {
        self.grips.iter().find(|(r, _)| *r == role).map(|(_, g)| g)
    }

    pub fn set_grip_center(&mut self, role: GripRole, center: Point) {
        if let Some((_, grip)) = self.grips.iter_mut().find(|(r, _)| *r == role) {
            grip.set_center(center);
        }
    }

    /// Resolves a visual target to the role of the grip owning it.
    pub fn find_grip(&self, target: VisualId) -> Option<GripRole> {
        self.grips
            .iter()
            .find(|(_, grip)| grip.owns_target(target))
            .map(|(role, _)| *role)
    }

    /// First grip, in declaration order, whose hit ring contains `local`.
    pub fn grip_at(&self, local: Point) -> Option<&Grip> {
        self.grips
            .iter()
            .find(|(_, grip)| grip.hit_test(local))
            .map(|(_, grip)| grip)
    }

    pub fn owns_target(&self, target: VisualId) -> bool {
        target == self.frame || self.find_grip(target).is_some()
    }

    pub fn visual_ids(&self) -> Vec<VisualId> {
        let mut ids = vec![self.frame];
        for (_, grip) in &self.grips {
            ids.push(grip.visual());
            ids.push(grip.hit_area());
        }
        ids
    }
}
