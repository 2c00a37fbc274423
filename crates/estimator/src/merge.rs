//! Flattening of a part hierarchy into one calculation buffer.

use glam::DMat4;

use crate::error::{GeometryError, GeometryResult};
use crate::mesh::TriangleBuffer;
use crate::scene::SceneNode;

/// Merge every mesh of the scene into a single world-space buffer.
///
/// Meshes are taken in depth-first order. Each is cloned, given flat normals
/// if it has none, and moved by its world transform. A mesh whose buffer does
/// not validate is skipped; the rest are still merged. Overlapping parts are
/// not detected, so their shared volume is counted twice.
///
/// # Errors
///
/// Returns `EmptyModel` when no mesh survives.
pub fn merge_scene(root: &SceneNode) -> GeometryResult<TriangleBuffer> {
    let meshes = root.world_meshes();
    tracing::debug!("merge_scene: found {} meshes", meshes.len());

    let mut parts = Vec::with_capacity(meshes.len());
    for (index, (node, world)) in meshes.into_iter().enumerate() {
        let Some(mesh) = &node.mesh else { continue };
        match prepare_part(mesh, &world) {
            Ok(part) => parts.push(part),
            Err(e) => {
                tracing::warn!("Skipping mesh {} ('{}') during merge: {}", index, node.name, e);
            }
        }
    }

    if parts.is_empty() {
        return Err(GeometryError::EmptyModel);
    }
    Ok(TriangleBuffer::concat(parts))
}

fn prepare_part(mesh: &TriangleBuffer, world: &DMat4) -> GeometryResult<TriangleBuffer> {
    mesh.validate()?;
    Ok(mesh.clone().ensure_normals().transformed(world))
}
