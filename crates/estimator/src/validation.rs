//! Triangle buffer validation utilities.
//!
//! `BufferValidator` checks buffer integrity (stride, normals, finite values)
//! and whether the surface is closed, which the volume computation assumes
//! but never enforces.

use std::collections::HashMap;

use crate::bounds::Bounds;
use crate::mesh::{TriangleBuffer, FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX};

/// Validator for `TriangleBuffer` integrity checks.
pub struct BufferValidator<'a> {
    buffer: &'a TriangleBuffer,
}

impl<'a> BufferValidator<'a> {
    /// Create a new validator for the given buffer.
    pub fn new(buffer: &'a TriangleBuffer) -> Self {
        Self { buffer }
    }

    pub fn vertex_count(&self) -> usize {
        self.buffer.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.buffer.triangle_count()
    }

    /// Position length is a whole number of triangles.
    pub fn is_stride_valid(&self) -> bool {
        self.buffer.positions().len() % FLOATS_PER_TRIANGLE == 0
    }

    /// Normals are absent or exactly as long as positions.
    pub fn normals_match(&self) -> bool {
        self.buffer
            .normals()
            .map_or(true, |n| n.len() == self.buffer.positions().len())
    }

    pub fn all_finite(&self) -> bool {
        self.buffer.positions().iter().all(|c| c.is_finite())
    }

    /// Check that all normals have unit length (within epsilon).
    /// Zero normals from degenerate triangles are accepted.
    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        let Some(normals) = self.buffer.normals() else {
            return true;
        };
        normals.chunks_exact(FLOATS_PER_VERTEX).all(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            len == 0.0 || (len - 1.0).abs() <= epsilon
        })
    }

    /// Width, depth, height of the bounding box.
    pub fn dimensions(&self) -> [f64; 3] {
        Bounds::from_buffer(self.buffer).size().to_array()
    }

    /// Check that the bounding box dimensions are approximately `expected`.
    pub fn assert_dimensions_approx(&self, expected: [f64; 3], tolerance: f64) -> bool {
        let dims = self.dimensions();
        dims.iter()
            .zip(expected.iter())
            .all(|(d, e)| (d - e).abs() < tolerance)
    }

    /// Every directed edge is matched by exactly one opposite edge.
    ///
    /// Vertices are welded by exact coordinate equality. A closed,
    /// consistently wound surface passes; holes, T-junctions and flipped
    /// triangles fail.
    pub fn is_watertight(&self) -> bool {
        if self.triangle_count() == 0 {
            return false;
        }

        let key = |i: usize| {
            let p = &self.buffer.positions()[i * FLOATS_PER_VERTEX..(i + 1) * FLOATS_PER_VERTEX];
            [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()]
        };

        let mut edges: HashMap<([u32; 3], [u32; 3]), u32> = HashMap::new();
        for t in 0..self.triangle_count() {
            let k = [key(t * 3), key(t * 3 + 1), key(t * 3 + 2)];
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                *edges.entry((k[a], k[b])).or_insert(0) += 1;
            }
        }

        edges
            .iter()
            .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
    }

    /// Run all integrity checks and return a list of error messages.
    /// An empty list means the buffer is usable.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Position buffer length {} is not a multiple of {}",
                self.buffer.positions().len(),
                FLOATS_PER_TRIANGLE
            ));
        }

        if !self.normals_match() {
            errors.push(format!(
                "Normal buffer length {} does not match position length {}",
                self.buffer.normals().map_or(0, <[f32]>::len),
                self.buffer.positions().len()
            ));
        }

        if !self.all_finite() {
            errors.push("Some coordinates are not finite".to_string());
        }

        if self.normals_match() && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cube, tetrahedron};
    use glam::DVec3;

    fn simple_triangle() -> TriangleBuffer {
        TriangleBuffer::from_triangles(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]])
    }

    #[test]
    fn test_counts() {
        let t = simple_triangle();
        let v = BufferValidator::new(&t);
        assert_eq!(v.vertex_count(), 3);
        assert_eq!(v.triangle_count(), 1);
    }

    #[test]
    fn test_stride_invalid() {
        let bad = TriangleBuffer::from_positions(vec![0.0; 10]);
        let v = BufferValidator::new(&bad);
        assert!(!v.is_stride_valid());
        assert!(v.validate_all().iter().any(|e| e.contains("multiple of 9")));
    }

    #[test]
    fn test_normals_mismatch() {
        let bad = TriangleBuffer::with_normals(vec![0.0; 9], vec![0.0, 0.0, 1.0]);
        let v = BufferValidator::new(&bad);
        assert!(!v.normals_match());
        assert!(v.validate_all().iter().any(|e| e.contains("does not match")));
    }

    #[test]
    fn test_normals_not_normalized() {
        let bad = TriangleBuffer::with_normals(vec![0.0; 9], vec![0.0, 0.0, 5.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let v = BufferValidator::new(&bad);
        assert!(!v.are_normals_normalized(0.01));
    }

    #[test]
    fn test_computed_normals_are_unit() {
        let t = cube(3.0, DVec3::ZERO).ensure_normals();
        let v = BufferValidator::new(&t);
        assert!(v.are_normals_normalized(1e-5));
        assert!(v.validate_all().is_empty());
    }

    #[test]
    fn test_dimensions() {
        let t = simple_triangle();
        let v = BufferValidator::new(&t);
        assert!(v.assert_dimensions_approx([1.0, 1.0, 0.0], 1e-6));
        assert!(!v.assert_dimensions_approx([2.0, 1.0, 0.0], 1e-6));
    }

    #[test]
    fn test_closed_solids_are_watertight() {
        let c = cube(10.0, DVec3::ZERO);
        assert!(BufferValidator::new(&c).is_watertight());
        let t = tetrahedron();
        assert!(BufferValidator::new(&t).is_watertight());
    }

    #[test]
    fn test_open_surface_is_not_watertight() {
        let t = simple_triangle();
        assert!(!BufferValidator::new(&t).is_watertight());

        let c = cube(10.0, DVec3::ZERO);
        let open = TriangleBuffer::from_positions(c.positions()[9..].to_vec());
        assert!(!BufferValidator::new(&open).is_watertight());
        assert!(!BufferValidator::new(&TriangleBuffer::new()).is_watertight());
    }
}
