//! Error handling for MarkerKit
//!
//! Provides the error types shared by the marker crates:
//! - Geometry errors (transform math)
//! - State errors (decoding serialized marker state)
//!
//! All error types use `thiserror` for ergonomic error handling. The
//! interactive manipulation code never returns these; they only surface
//! from explicit decoding and matrix APIs.

use thiserror::Error;

/// Geometry error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Matrix cannot be inverted
    #[error("Transform matrix is singular (determinant {determinant})")]
    SingularTransform {
        /// The determinant of the rejected matrix.
        determinant: f64,
    },
}

/// State error type
///
/// Represents failures while decoding a serialized marker or marker area.
#[derive(Error, Debug)]
pub enum StateError {
    /// No constructor is registered for the type name
    #[error("Unknown marker type: {type_name}")]
    UnknownType {
        /// The unresolved type name.
        type_name: String,
    },

    /// Type-specific fields did not match the expected shape
    #[error("Invalid fields for {type_name}: {reason}")]
    InvalidFields {
        /// The marker type being decoded.
        type_name: String,
        /// The reason decoding failed.
        reason: String,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main error type for MarkerKit
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// State error
    #[error(transparent)]
    State(#[from] StateError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a state decoding error
    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::State(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::SingularTransform { determinant: 0.0 };
        assert_eq!(
            err.to_string(),
            "Transform matrix is singular (determinant 0)"
        );
    }

    #[test]
    fn test_state_error_display() {
        let err = StateError::UnknownType {
            type_name: "StarMarker".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown marker type: StarMarker");

        let err = StateError::InvalidFields {
            type_name: "FrameMarker".to_string(),
            reason: "missing field `left`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid fields for FrameMarker: missing field `left`"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = GeometryError::SingularTransform { determinant: 0.0 }.into();
        assert!(err.is_geometry_error());

        let err: Error = StateError::UnknownType {
            type_name: "X".to_string(),
        }
        .into();
        assert!(err.is_state_error());

        let json_err = serde_json::from_str::<u32>("oops").unwrap_err();
        let err: Error = StateError::from(json_err).into();
        assert!(err.is_state_error());
    }
}
