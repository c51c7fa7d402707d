//! # MarkerKit Core
//!
//! Core types shared by the MarkerKit crates: points and affine transforms,
//! visual element identity used for hit testing, and the error types.

pub mod error;
pub mod geometry;
pub mod visual;

pub use error::{Error, GeometryError, Result, StateError};
pub use geometry::{Point, TransformMatrix};
pub use visual::{VisualContainer, VisualId};
