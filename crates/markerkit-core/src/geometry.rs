//! Geometry primitives shared by every marker.
//!
//! [`TransformMatrix`] uses the SVG matrix layout:
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! and converts to and from the host transform types (`nalgebra::Matrix3`
//! for math, `lyon::math::Transform` for path rendering).

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Determinants below this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Point {
        Point::new(self.x * sx, self.y * sy)
    }

    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// 2D affine transform in SVG `matrix(a, b, c, d, e, f)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformMatrix {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Rotation by `angle_deg` around the pivot `(cx, cy)`, the same
    /// matrix SVG produces for `rotate(angle cx cy)`.
    pub fn rotation(angle_deg: f64, cx: f64, cy: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self::new(
            cos,
            sin,
            -sin,
            cos,
            cx - cx * cos + cy * sin,
            cy - cx * sin - cy * cos,
        )
    }

    /// Returns `self × other`, i.e. `other` is applied first.
    pub fn multiply(&self, other: &TransformMatrix) -> TransformMatrix {
        TransformMatrix::new(
            self.a * other.a + self.c * other.b,
            self.b * other.a + self.d * other.b,
            self.a * other.c + self.c * other.d,
            self.b * other.c + self.d * other.d,
            self.a * other.e + self.c * other.f + self.e,
            self.b * other.e + self.d * other.f + self.f,
        )
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Result<TransformMatrix, GeometryError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return Err(GeometryError::SingularTransform { determinant: det });
        }
        Ok(TransformMatrix::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.f - self.d * self.e) / det,
            (self.b * self.e - self.a * self.f) / det,
        ))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Rotation component in degrees, in `(-180, 180]`.
    pub fn rotation_degrees(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }

    pub fn approx_eq(&self, other: &TransformMatrix, tolerance: f64) -> bool {
        [
            self.a - other.a,
            self.b - other.b,
            self.c - other.c,
            self.d - other.d,
            self.e - other.e,
            self.f - other.f,
        ]
        .iter()
        .all(|delta| delta.abs() <= tolerance)
    }
}

impl From<TransformMatrix> for Matrix3<f64> {
    fn from(m: TransformMatrix) -> Self {
        Matrix3::new(m.a, m.c, m.e, m.b, m.d, m.f, 0.0, 0.0, 1.0)
    }
}

impl From<Matrix3<f64>> for TransformMatrix {
    /// Drops any projective row; the host matrix is assumed affine.
    fn from(m: Matrix3<f64>) -> Self {
        TransformMatrix::new(
            m[(0, 0)],
            m[(1, 0)],
            m[(0, 1)],
            m[(1, 1)],
            m[(0, 2)],
            m[(1, 2)],
        )
    }
}

impl From<TransformMatrix> for lyon::math::Transform {
    fn from(m: TransformMatrix) -> Self {
        lyon::math::Transform::new(
            m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
        )
    }
}

impl From<lyon::math::Transform> for TransformMatrix {
    fn from(t: lyon::math::Transform) -> Self {
        TransformMatrix::new(
            t.m11 as f64,
            t.m12 as f64,
            t.m21 as f64,
            t.m22 as f64,
            t.m31 as f64,
            t.m32 as f64,
        )
    }
}
