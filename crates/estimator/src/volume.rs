//! Enclosed volume by signed-tetrahedron summation.
//!
//! Each triangle and the origin span a tetrahedron with signed volume
//! `v0 · (v1 × v2) / 6`. Summed over a closed, consistently wound surface the
//! terms cancel outside the solid and the total is the enclosed volume,
//! wherever the origin lies. Open or inconsistently wound meshes give an
//! approximation; they are not rejected.

use crate::bounds::Bounds;
use crate::error::{GeometryError, GeometryResult};
use crate::mesh::TriangleBuffer;

/// Signed volume sum. Positive for outward (counter-clockwise) winding.
pub fn signed_volume(buffer: &TriangleBuffer) -> f64 {
    let mut volume = 0.0;
    for [v0, v1, v2] in buffer.triangles() {
        volume += v0.dot(v1.cross(v2)) / 6.0;
    }
    volume
}

/// Absolute enclosed volume in cubic model units. Empty buffers give 0.
pub fn enclosed_volume(buffer: &TriangleBuffer) -> f64 {
    signed_volume(buffer).abs()
}

/// Bounds and volume of one buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub bounds: Bounds,
    pub volume_mm3: f64,
}

/// Measure a buffer that is about to be estimated.
///
/// # Errors
///
/// Returns `DegenerateGeometry` when the buffer has no triangles or encloses
/// no volume.
pub fn measure(buffer: &TriangleBuffer) -> GeometryResult<Measurement> {
    if buffer.is_empty() {
        return Err(GeometryError::DegenerateGeometry);
    }
    let volume_mm3 = enclosed_volume(buffer);
    if !(volume_mm3 > 0.0) || !volume_mm3.is_finite() {
        tracing::debug!(
            "measure: {} triangles enclose no volume",
            buffer.triangle_count()
        );
        return Err(GeometryError::DegenerateGeometry);
    }
    Ok(Measurement {
        bounds: Bounds::from_buffer(buffer),
        volume_mm3,
    })
}
