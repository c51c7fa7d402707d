//! Marker type registry.
//!
//! Maps the `typeName` stored in a marker state back to a constructor,
//! so a saved marker area can be rebuilt without knowing its contents up
//! front.

use std::collections::HashMap;

use tracing::debug;

use crate::decorations::{BoxDecoration, LineDecoration};
use crate::defaults::MarkerDefaults;
use crate::marker::{LinearMarker, Marker, RectangularBoxMarker};

/// Builds a fresh marker in the `new` state.
pub type MarkerConstructor = fn(&MarkerDefaults) -> Marker;

#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    constructors: HashMap<String, MarkerConstructor>,
}

impl MarkerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in marker type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("FrameMarker", |d| boxed(BoxDecoration::frame(d), d));
        registry.register("CoverMarker", |d| boxed(BoxDecoration::cover(d), d));
        registry.register("HighlightMarker", |d| boxed(BoxDecoration::highlight(d), d));
        registry.register("EllipseMarker", |d| boxed(BoxDecoration::ellipse(d), d));
        registry.register("TextMarker", |d| boxed(BoxDecoration::text(d), d));
        registry.register("CalloutMarker", |d| boxed(BoxDecoration::callout(d), d));
        registry.register("LineMarker", |d| linear(LineDecoration::line(d), d));
        registry.register("ArrowMarker", |d| linear(LineDecoration::arrow(d), d));
        registry.register("CurveMarker", |d| linear(LineDecoration::curve(d), d));
        registry.register("MeasurementMarker", |d| {
            linear(LineDecoration::measurement(d), d)
        });
        registry
    }

    /// Registers or replaces a constructor.
    pub fn register(&mut self, type_name: impl Into<String>, constructor: MarkerConstructor) {
        let type_name = type_name.into();
        if self.constructors.insert(type_name.clone(), constructor).is_some() {
            debug!("Replaced marker constructor for {}", type_name);
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn instantiate(&self, type_name: &str, defaults: &MarkerDefaults) -> Option<Marker> {
        self.constructors.get(type_name).map(|ctor| ctor(defaults))
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn boxed(decoration: BoxDecoration, defaults: &MarkerDefaults) -> Marker {
    Marker::Box(RectangularBoxMarker::new(decoration, defaults))
}

fn linear(decoration: LineDecoration, defaults: &MarkerDefaults) -> Marker {
    Marker::Linear(LinearMarker::new(decoration, defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Manipulable, MarkerLifecycle};

    #[test]
    fn test_builtin_names_match_instances() {
        let registry = MarkerRegistry::with_builtin();
        let defaults = MarkerDefaults::default();
        assert_eq!(registry.type_names().len(), 10);
        for name in registry.type_names() {
            let marker = registry.instantiate(name, &defaults).unwrap();
            assert_eq!(marker.type_name(), name);
            assert_eq!(marker.lifecycle(), MarkerLifecycle::New);
        }
    }

    #[test]
    fn test_unknown_type_is_none() {
        let registry = MarkerRegistry::with_builtin();
        assert!(registry
            .instantiate("StampMarker", &MarkerDefaults::default())
            .is_none());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = MarkerRegistry::new();
        registry.register("Redaction", |d| boxed(BoxDecoration::cover(d), d));
        assert!(registry.contains("Redaction"));
        let marker = registry
            .instantiate("Redaction", &MarkerDefaults::default())
            .unwrap();
        assert!(marker.as_box().is_some());
    }
}
