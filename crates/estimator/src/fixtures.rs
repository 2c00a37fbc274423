//! Factory functions for test geometry and container bytes.
//!
//! Used by unit tests, the integration tests under `tests/`, and the server
//! tests.

use std::io::{Cursor, Write};

use glam::{DMat4, DVec3};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::mesh::TriangleBuffer;
use crate::scene::SceneNode;

// ── Solids ──────────────────────────────────────────────────────

/// Unit-cube corner triangles, wound counter-clockwise seen from outside.
const UNIT_CUBE: [[[f64; 3]; 3]; 12] = [
    // -Z
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
    // +Z
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
    [[0.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    // -Y
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0]],
    [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    // +Y
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
    [[0.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    // -X
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
    [[0.0, 0.0, 0.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    // +X
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
    [[1.0, 0.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
];

/// Axis-aligned box of the given edge lengths centered at `center`.
pub fn box_mesh(size: DVec3, center: DVec3) -> TriangleBuffer {
    let corner = center - size * 0.5;
    let mut positions = Vec::with_capacity(UNIT_CUBE.len() * 9);
    for tri in &UNIT_CUBE {
        for v in tri {
            let p = corner + DVec3::from_array(*v) * size;
            positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
    }
    TriangleBuffer::from_positions(positions)
}

/// Cube with edge `side` centered at `center`.
pub fn cube(side: f64, center: DVec3) -> TriangleBuffer {
    box_mesh(DVec3::splat(side), center)
}

/// Corner tetrahedron (0,0,0), (1,0,0), (0,1,0), (0,0,1). Volume 1/6.
pub fn tetrahedron() -> TriangleBuffer {
    TriangleBuffer::from_triangles(&[
        [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
        [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    ])
}

// ── Scenes ──────────────────────────────────────────────────────

/// Two disjoint 4 mm cubes: one directly under the root at X = -10, one
/// nested under a translated group.
pub fn two_cube_scene() -> SceneNode {
    SceneNode::group("root")
        .child(
            SceneNode::with_mesh("left", cube(4.0, DVec3::ZERO))
                .transformed(DMat4::from_translation(DVec3::new(-10.0, 0.0, 0.0))),
        )
        .child(
            SceneNode::group("assembly")
                .transformed(DMat4::from_translation(DVec3::new(0.0, 6.0, 0.0)))
                .child(
                    SceneNode::with_mesh("right", cube(4.0, DVec3::ZERO))
                        .transformed(DMat4::from_translation(DVec3::new(10.0, 0.0, 2.0))),
                ),
        )
}

// ── Container bytes ─────────────────────────────────────────────

/// Binary STL encoding of `buffer` (normals written as zero).
pub fn binary_stl(buffer: &TriangleBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(84 + buffer.triangle_count() * 50);
    let mut header = [0u8; 80];
    header[..14].copy_from_slice(b"binary fixture");
    out.extend_from_slice(&header);
    out.extend_from_slice(&(buffer.triangle_count() as u32).to_le_bytes());
    for tri in buffer.positions().chunks_exact(9) {
        out.extend_from_slice(&[0u8; 12]);
        for c in tri {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

/// ASCII STL encoding of `buffer`.
pub fn ascii_stl(name: &str, buffer: &TriangleBuffer) -> String {
    let mut out = format!("solid {name}\n");
    for tri in buffer.positions().chunks_exact(9) {
        out.push_str("  facet normal 0 0 0\n    outer loop\n");
        for v in tri.chunks_exact(3) {
            out.push_str(&format!("      vertex {} {} {}\n", v[0], v[1], v[2]));
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// `<object>` element holding `buffer` as an unindexed mesh.
pub fn mesh_object_xml(id: u32, name: &str, buffer: &TriangleBuffer) -> String {
    let mut vertices = String::new();
    let mut triangles = String::new();
    for (i, v) in buffer.positions().chunks_exact(3).enumerate() {
        vertices.push_str(&format!(
            "<vertex x=\"{}\" y=\"{}\" z=\"{}\"/>",
            v[0], v[1], v[2]
        ));
        if i % 3 == 0 {
            triangles.push_str(&format!(
                "<triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>",
                i,
                i + 1,
                i + 2
            ));
        }
    }
    format!(
        "<object id=\"{id}\" name=\"{name}\" type=\"model\"><mesh><vertices>{vertices}</vertices><triangles>{triangles}</triangles></mesh></object>"
    )
}

/// Full 3MF model document around the given resources and build items.
pub fn model_xml(resources: &[String], items: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <model unit=\"millimeter\" xmlns=\"http://schemas.microsoft.com/3dmanufacturing/core/2015/02\">\
         <resources>{}</resources><build>{}</build></model>",
        resources.concat(),
        items.concat()
    )
}

/// Zip a model document into a minimal 3MF package.
pub fn threemf_archive(model: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)
        .expect("zip entry");
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/></Types>"#,
    )
    .expect("zip write");

    zip.start_file("3D/3dmodel.model", options).expect("zip entry");
    zip.write_all(model.as_bytes()).expect("zip write");

    zip.finish().expect("zip finish").into_inner()
}

/// 3MF package with two 4 mm cubes placed 20 mm apart by build items.
pub fn two_cube_threemf() -> Vec<u8> {
    let c = cube(4.0, DVec3::ZERO);
    let model = model_xml(
        &[mesh_object_xml(1, "Cube", &c), mesh_object_xml(2, "Cube", &c)],
        &[
            r#"<item objectid="1" transform="1 0 0 0 1 0 0 0 1 -10 0 0"/>"#.to_string(),
            r#"<item objectid="2" transform="1 0 0 0 1 0 0 0 1 10 0 0"/>"#.to_string(),
        ],
    );
    threemf_archive(&model)
}
