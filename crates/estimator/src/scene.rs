//! Multi-part scene hierarchy.

use glam::DMat4;

use crate::mesh::TriangleBuffer;

/// Node of a part hierarchy. Each node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: DMat4,
    pub mesh: Option<TriangleBuffer>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Node without geometry.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: DMat4::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Node carrying a triangle buffer.
    pub fn with_mesh(name: impl Into<String>, mesh: TriangleBuffer) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    #[must_use]
    pub fn transformed(mut self, transform: DMat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first pre-order walk over nodes that carry a mesh.
    ///
    /// `parent` is the accumulated transform above this node; the callback
    /// receives the node and its world transform.
    pub fn visit_meshes<'a, F>(&'a self, parent: &DMat4, f: &mut F)
    where
        F: FnMut(&'a SceneNode, DMat4),
    {
        let world = *parent * self.transform;
        if self.mesh.is_some() {
            f(self, world);
        }
        for child in &self.children {
            child.visit_meshes(&world, f);
        }
    }

    /// Every mesh-carrying node with its world transform, in traversal order.
    pub fn world_meshes(&self) -> Vec<(&SceneNode, DMat4)> {
        let mut out = Vec::new();
        self.visit_meshes(&DMat4::IDENTITY, &mut |node, world| out.push((node, world)));
        out
    }

    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(SceneNode::mesh_count).sum::<usize>()
    }
}
