//! Recentering of freshly parsed geometry on the origin.

use glam::{DMat4, DVec3};

use crate::bounds::Bounds;
use crate::error::{GeometryError, GeometryResult};
use crate::mesh::TriangleBuffer;
use crate::scene::SceneNode;

/// Translate a single buffer so its bounds center sits at the origin.
pub fn center_buffer(buffer: &TriangleBuffer) -> TriangleBuffer {
    let center = Bounds::from_buffer(buffer).center();
    if center == DVec3::ZERO {
        return buffer.clone();
    }
    buffer.translated(-center)
}

/// Union of the world-space bounds of every mesh in the scene.
pub fn scene_bounds(root: &SceneNode) -> Bounds {
    let mut bounds = Bounds::EMPTY;
    root.visit_meshes(&DMat4::IDENTITY, &mut |node, world| {
        if let Some(mesh) = &node.mesh {
            bounds = bounds.union(&Bounds::from_transformed_buffer(mesh, &world));
        }
    });
    bounds
}

/// Recenter a scene by shifting the root transform only.
///
/// Vertex data and part transforms stay as parsed, so the hierarchy can still
/// be rendered part by part.
///
/// # Errors
///
/// Returns `EmptyModel` if no node in the tree carries a mesh.
pub fn center_scene(mut root: SceneNode) -> GeometryResult<SceneNode> {
    if root.mesh_count() == 0 {
        return Err(GeometryError::EmptyModel);
    }
    let center = scene_bounds(&root).center();
    tracing::debug!("center_scene: shifting root by {:?}", -center);
    root.transform = DMat4::from_translation(-center) * root.transform;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cube, two_cube_scene};
    use approx::assert_relative_eq;

    #[test]
    fn test_center_buffer() {
        let src = cube(4.0, DVec3::new(10.0, 20.0, 30.0));
        let centered = center_buffer(&src);
        let b = Bounds::from_buffer(&centered);
        assert_eq!(b.center(), DVec3::ZERO);
        assert_eq!(b.size(), DVec3::splat(4.0));
        // source untouched
        assert_eq!(Bounds::from_buffer(&src).center(), DVec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_center_empty_buffer() {
        assert!(center_buffer(&TriangleBuffer::new()).is_empty());
    }

    #[test]
    fn test_center_scene_moves_root_only() {
        let scene = two_cube_scene();
        let part_transforms: Vec<DMat4> = scene.children.iter().map(|c| c.transform).collect();
        let centered = center_scene(scene.clone()).unwrap();

        let after: Vec<DMat4> = centered.children.iter().map(|c| c.transform).collect();
        assert_eq!(part_transforms, after);
        assert_eq!(centered.children[0].mesh, scene.children[0].mesh);

        let b = scene_bounds(&centered);
        assert_relative_eq!(b.center().x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.center().y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.center().z, 0.0, epsilon = 1e-9);
        assert_eq!(b.size(), scene_bounds(&scene).size());
    }

    #[test]
    fn test_center_scene_without_meshes() {
        let root = SceneNode::group("root").child(SceneNode::group("empty"));
        assert_eq!(center_scene(root), Err(GeometryError::EmptyModel));
    }
}
