//! Axis-aligned bounds.

use glam::{DMat4, DVec3};

use crate::mesh::TriangleBuffer;

/// Axis-aligned bounding box in model space.
///
/// The empty box has `min = +inf` and `max = -inf`; its size and center are
/// both zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Min/max reduction over every vertex of `buffer`.
    pub fn from_buffer(buffer: &TriangleBuffer) -> Self {
        Self::from_points(buffer.vertices())
    }

    /// Bounds of `buffer` after transforming each vertex by `matrix`.
    pub fn from_transformed_buffer(buffer: &TriangleBuffer, matrix: &DMat4) -> Self {
        Self::from_points(buffer.vertices().map(|v| matrix.transform_point3(v)))
    }

    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    pub fn expand(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Edge lengths along X, Y, Z.
    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Largest edge length.
    pub fn max_dimension(&self) -> f64 {
        self.size().max_element()
    }
}
