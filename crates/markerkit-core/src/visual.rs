//! Identity of visual elements.
//!
//! There is no DOM here. A host renderer keeps its own element tree and
//! tags each leaf with the [`VisualId`] handed out by the marker that owns
//! it. Hit testing then only needs to ask who owns an id.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_VISUAL_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualId(u64);

impl VisualId {
    /// Allocates a process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_VISUAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VisualId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The visual subtree owned by a single marker.
///
/// `root` carries the rotation transform, `visual` the translated body.
/// Decorations may register extra leaves (text runs, arrow tips).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualContainer {
    root: VisualId,
    visual: VisualId,
    elements: Vec<VisualId>,
}

impl VisualContainer {
    pub fn new() -> Self {
        Self {
            root: VisualId::next(),
            visual: VisualId::next(),
            elements: Vec::new(),
        }
    }

    pub fn root(&self) -> VisualId {
        self.root
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    /// Registers an extra leaf element and returns its id.
    pub fn add_element(&mut self) -> VisualId {
        let id = VisualId::next();
        self.elements.push(id);
        id
    }

    pub fn elements(&self) -> &[VisualId] {
        &self.elements
    }

    pub fn owns(&self, id: VisualId) -> bool {
        id == self.root || id == self.visual || self.elements.contains(&id)
    }
}

impl Default for VisualContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = VisualId::next();
        let b = VisualId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_container_ownership() {
        let mut container = VisualContainer::new();
        let extra = container.add_element();
        assert!(container.owns(container.root()));
        assert!(container.owns(container.visual()));
        assert!(container.owns(extra));

        let stranger = VisualContainer::new();
        assert!(!container.owns(stranger.visual()));
    }
}
