//! Serializable marker and marker area state.
//!
//! A [`MarkerState`] is a flat JSON record: the base fields every marker
//! carries (`typeName`, `state`, `notes`) followed by whatever fields the
//! geometry and decoration of that type add. `MarkerAreaState` is the
//! only wire format and carries no version tag.

use markerkit_core::StateError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::marker::MarkerLifecycle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerState {
    pub type_name: String,
    pub state: MarkerLifecycle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Type-specific fields, flattened into the record.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MarkerState {
    pub fn new(type_name: impl Into<String>, state: MarkerLifecycle) -> Self {
        Self {
            type_name: type_name.into(),
            state,
            notes: None,
            fields: Map::new(),
        }
    }

    /// Merges the fields of `part` into this record. Later parts win on
    /// name clashes.
    pub fn extend_with<T: Serialize>(&mut self, part: &T) -> Result<(), StateError> {
        match serde_json::to_value(part)? {
            Value::Object(map) => {
                self.fields.extend(map);
                Ok(())
            }
            other => Err(StateError::InvalidFields {
                type_name: self.type_name.clone(),
                reason: format!("expected an object, got {other}"),
            }),
        }
    }

    /// Decodes one typed view of the flat field set. Fields that belong to
    /// other parts are ignored.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StateError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            StateError::InvalidFields {
                type_name: self.type_name.clone(),
                reason: e.to_string(),
            }
        })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerAreaState {
    pub width: f64,
    pub height: f64,
    pub markers: Vec<MarkerState>,
}

/// Same shape as [`MarkerAreaState`] but keeps markers undecoded so one bad
/// entry doesn't reject the whole document.
#[derive(Deserialize)]
struct RawMarkerAreaState {
    width: f64,
    height: f64,
    #[serde(default)]
    markers: Vec<Value>,
}

impl MarkerAreaState {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            markers: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document, dropping marker entries that aren't valid
    /// marker records.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let raw: RawMarkerAreaState = serde_json::from_str(json)?;
        let mut markers = Vec::with_capacity(raw.markers.len());
        for (index, value) in raw.markers.into_iter().enumerate() {
            match serde_json::from_value::<MarkerState>(value) {
                Ok(marker) => markers.push(marker),
                Err(e) => warn!("Dropping malformed marker entry {}: {}", index, e),
            }
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            markers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Part {
        left: f64,
    }

    #[test]
    fn test_marker_state_is_flat() {
        let mut state = MarkerState::new("FrameMarker", MarkerLifecycle::Select);
        state.extend_with(&Part { left: 4.0 }).unwrap();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({"typeName": "FrameMarker", "state": "select", "left": 4.0})
        );
        assert_eq!(state.decode::<Part>().unwrap(), Part { left: 4.0 });
    }

    #[test]
    fn test_decode_reports_missing_fields() {
        let state = MarkerState::new("FrameMarker", MarkerLifecycle::Select);
        let err = state.decode::<Part>().unwrap_err();
        assert!(matches!(err, StateError::InvalidFields { .. }));
    }

    #[test]
    fn test_from_json_drops_malformed_entries() {
        let doc = json!({
            "width": 640.0,
            "height": 480.0,
            "markers": [
                {"typeName": "FrameMarker", "state": "select", "left": 1.0},
                {"state": "select"},
                {"typeName": "LineMarker", "state": "bogus"}
            ]
        });
        let state = MarkerAreaState::from_json(&doc.to_string()).unwrap();
        assert_eq!(state.markers.len(), 1);
        assert_eq!(state.markers[0].type_name, "FrameMarker");
    }

    #[test]
    fn test_area_state_round_trip() {
        let mut area = MarkerAreaState::new(800.0, 600.0);
        let mut marker = MarkerState::new("LineMarker", MarkerLifecycle::Select);
        marker.notes = Some("check this".to_string());
        area.markers.push(marker);
        let json = area.to_json().unwrap();
        assert_eq!(MarkerAreaState::from_json(&json).unwrap(), area);
    }
}
