//! STL (Stereolithography) reading, ASCII and binary.
//!
//! Binary layout: 80-byte header, `u32` triangle count, then 50 bytes per
//! triangle (normal, three vertices as `f32` triples, `u16` attribute).
//! File normals are ignored; flat normals are recomputed after centering.

use crate::error::{GeometryError, GeometryResult};
use crate::mesh::TriangleBuffer;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle record in binary STL.
const TRIANGLE_SIZE: usize = 50;

/// Parse STL bytes, detecting ASCII vs binary.
///
/// # Errors
///
/// Returns `Load` for truncated or malformed content.
pub fn parse_stl(bytes: &[u8]) -> GeometryResult<TriangleBuffer> {
    if is_binary(bytes) {
        parse_binary(bytes)
    } else if starts_with_solid(bytes) {
        parse_ascii(bytes)
    } else {
        parse_binary(bytes)
    }
}

/// A binary file's size is fully determined by its triangle count.
///
/// Checked first because some binary exporters write "solid" into the header.
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_SIZE + 4 {
        return false;
    }
    let count = face_count(bytes) as usize;
    count
        .checked_mul(TRIANGLE_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE + 4))
        == Some(bytes.len())
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    String::from_utf8_lossy(head).trim_start().starts_with("solid")
}

fn face_count(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ])
}

fn parse_binary(bytes: &[u8]) -> GeometryResult<TriangleBuffer> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(GeometryError::load(format!(
            "STL too small: {} bytes",
            bytes.len()
        )));
    }

    let count = face_count(bytes) as usize;
    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < count {
        return Err(GeometryError::load(format!(
            "STL declares {count} triangles but holds {available}"
        )));
    }

    let mut positions = Vec::with_capacity(count * 9);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(count) {
        // Skip normal (12 bytes), read 3 vertices (36 bytes)
        for c in record[12..48].chunks_exact(4) {
            positions.push(f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        }
    }

    Ok(TriangleBuffer::from_positions(positions))
}

fn parse_ascii(bytes: &[u8]) -> GeometryResult<TriangleBuffer> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| GeometryError::load(format!("ASCII STL is not UTF-8: {e}")))?;

    let mut positions = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("vertex") {
            continue;
        }
        for _ in 0..3 {
            let value = parts.next().ok_or_else(|| {
                GeometryError::load(format!("line {}: vertex needs 3 coordinates", line_no + 1))
            })?;
            let c: f32 = value.parse().map_err(|e| {
                GeometryError::load(format!("line {}: invalid coordinate '{value}': {e}", line_no + 1))
            })?;
            positions.push(c);
        }
    }

    if positions.len() % 9 != 0 {
        return Err(GeometryError::load(format!(
            "ASCII STL has {} vertices, not a whole number of triangles",
            positions.len() / 3
        )));
    }

    Ok(TriangleBuffer::from_positions(positions))
}
