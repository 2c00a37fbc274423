//! Flat triangle buffers ("triangle soup").
//!
//! Positions are stored as `f32` triples, three vertices per triangle, with no
//! index buffer. All geometry math widens to `f64` and narrows back on store.

use glam::{DMat3, DMat4, DVec3};

use crate::error::{GeometryError, GeometryResult};

/// Floats per vertex (x, y, z).
pub const FLOATS_PER_VERTEX: usize = 3;
/// Floats per triangle (3 vertices x 3 coordinates).
pub const FLOATS_PER_TRIANGLE: usize = 9;

/// Non-indexed triangle positions with optional per-vertex normals.
///
/// Treated as a value: every transform returns a new buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleBuffer {
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
}

impl TriangleBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw positions without checking the layout.
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            normals: None,
        }
    }

    /// Wrap raw positions and normals without checking the layout.
    pub fn with_normals(positions: Vec<f32>, normals: Vec<f32>) -> Self {
        Self {
            positions,
            normals: Some(normals),
        }
    }

    /// Build from explicit triangles.
    pub fn from_triangles(triangles: &[[[f32; 3]; 3]]) -> Self {
        let mut positions = Vec::with_capacity(triangles.len() * FLOATS_PER_TRIANGLE);
        for tri in triangles {
            for v in tri {
                positions.extend_from_slice(v);
            }
        }
        Self::from_positions(positions)
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Number of complete vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / FLOATS_PER_VERTEX
    }

    /// Number of complete triangles. Trailing partial data is ignored.
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / FLOATS_PER_TRIANGLE
    }

    /// True when the buffer holds no complete triangle.
    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Vertex `i` widened to `f64`.
    pub fn vertex(&self, i: usize) -> DVec3 {
        let base = i * FLOATS_PER_VERTEX;
        DVec3::new(
            f64::from(self.positions[base]),
            f64::from(self.positions[base + 1]),
            f64::from(self.positions[base + 2]),
        )
    }

    /// Iterate over vertex positions.
    pub fn vertices(&self) -> impl Iterator<Item = DVec3> + '_ {
        (0..self.vertex_count()).map(move |i| self.vertex(i))
    }

    /// Iterate over complete triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| {
            let i = t * 3;
            [self.vertex(i), self.vertex(i + 1), self.vertex(i + 2)]
        })
    }

    /// Check the layout: whole triangles, matching normals, finite values.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` describing the first problem found.
    pub fn validate(&self) -> GeometryResult<()> {
        if self.positions.len() % FLOATS_PER_TRIANGLE != 0 {
            return Err(GeometryError::corrupt(format!(
                "position length {} is not a multiple of {}",
                self.positions.len(),
                FLOATS_PER_TRIANGLE
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(GeometryError::corrupt(format!(
                    "normal length {} does not match position length {}",
                    normals.len(),
                    self.positions.len()
                )));
            }
        }
        if let Some(i) = self.positions.iter().position(|c| !c.is_finite()) {
            return Err(GeometryError::corrupt(format!(
                "non-finite coordinate at index {i}"
            )));
        }
        Ok(())
    }

    /// Flat per-face normals, one copy per vertex.
    pub fn compute_flat_normals(&self) -> Vec<f32> {
        let mut normals = Vec::with_capacity(self.triangle_count() * FLOATS_PER_TRIANGLE);
        for [v0, v1, v2] in self.triangles() {
            let n = (v1 - v0).cross(v2 - v0).normalize_or_zero();
            for _ in 0..3 {
                normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
            }
        }
        normals
    }

    /// Same buffer with flat normals attached if it had none.
    pub fn ensure_normals(self) -> Self {
        if self.normals.is_some() {
            return self;
        }
        let normals = self.compute_flat_normals();
        Self {
            positions: self.positions,
            normals: Some(normals),
        }
    }

    /// Apply an affine transform to every vertex.
    ///
    /// Normals, when present, go through the inverse-transpose of the linear
    /// part and are renormalized.
    pub fn transformed(&self, matrix: &DMat4) -> Self {
        let mut positions = Vec::with_capacity(self.positions.len());
        for v in self.vertices() {
            let p = matrix.transform_point3(v);
            positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }

        let normals = self.normals.as_ref().map(|normals| {
            let normal_matrix = DMat3::from_mat4(*matrix).inverse().transpose();
            normals
                .chunks_exact(FLOATS_PER_VERTEX)
                .flat_map(|n| {
                    let n = DVec3::new(f64::from(n[0]), f64::from(n[1]), f64::from(n[2]));
                    let t = (normal_matrix * n).normalize_or_zero();
                    [t.x as f32, t.y as f32, t.z as f32]
                })
                .collect()
        });

        Self { positions, normals }
    }

    /// Translate every vertex by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        self.transformed(&DMat4::from_translation(offset))
    }

    /// Scale every vertex uniformly about the origin.
    pub fn scaled(&self, factor: f64) -> Self {
        self.transformed(&DMat4::from_scale(DVec3::splat(factor)))
    }

    /// Concatenate buffers in order.
    ///
    /// The result carries normals only when every part has them.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = TriangleBuffer>,
    {
        let mut positions = Vec::new();
        let mut normals = Some(Vec::new());
        for part in parts {
            positions.extend_from_slice(&part.positions);
            normals = match (normals, part.normals) {
                (Some(mut acc), Some(n)) => {
                    acc.extend_from_slice(&n);
                    Some(acc)
                }
                _ => None,
            };
        }
        if positions.is_empty() {
            normals = None;
        }
        Self { positions, normals }
    }
}
