//! 3MF (3D Manufacturing Format) reading.
//!
//! A 3MF package is a ZIP archive holding an XML model document. Objects in
//! `<resources>` are either meshes or assemblies of `<component>` references;
//! `<build>` items place objects on the plate. The document's hierarchy is
//! kept as a `SceneNode` tree so parts stay separate for display.
//!
//! Only the core mesh and component elements are read. Materials, textures
//! and slicer-specific extensions are ignored.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use glam::{DMat4, DVec4};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{GeometryError, GeometryResult};
use crate::mesh::TriangleBuffer;
use crate::scene::SceneNode;

/// Name of the root group every 3MF scene hangs under.
pub const ROOT_NAME: &str = "3mf";

/// Component chains deeper than this are treated as cyclic.
const MAX_COMPONENT_DEPTH: usize = 32;

/// Upper bound on nodes produced by instancing one document.
const MAX_SCENE_NODES: usize = 100_000;

/// Upper bound on triangles across all instanced meshes.
const MAX_SCENE_TRIANGLES: usize = 10_000_000;

/// Parse a 3MF package into a scene hierarchy.
///
/// # Errors
///
/// Returns `Load` for a bad archive, a missing model document, malformed
/// XML, out-of-range indices or unresolved object references.
pub fn parse_3mf(bytes: &[u8]) -> GeometryResult<SceneNode> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| GeometryError::load(format!("invalid ZIP archive: {e}")))?;
    let content = read_model_file(&mut archive)?;
    let document = parse_model(&content)?;
    document.into_scene()
}

fn read_model_file<R: Read + Seek>(archive: &mut ZipArchive<R>) -> GeometryResult<String> {
    if let Ok(mut file) = archive.by_name("3D/3dmodel.model") {
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        return Ok(content);
    }

    let fallback = archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".model"))
        .map(str::to_string);

    match fallback {
        Some(name) => {
            let mut file = archive
                .by_name(&name)
                .map_err(|e| GeometryError::load(format!("failed to read {name}: {e}")))?;
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Ok(content)
        }
        None => Err(GeometryError::load(
            "3MF archive does not contain a model file",
        )),
    }
}

/// One `<object>` resource.
#[derive(Debug, Default)]
struct ObjectDef {
    name: Option<String>,
    mesh: Option<TriangleBuffer>,
    components: Vec<(u32, DMat4)>,
}

/// Parsed `<model>` document before instancing.
#[derive(Debug, Default)]
struct ModelDocument {
    objects: HashMap<u32, ObjectDef>,
    items: Vec<(u32, DMat4)>,
}

/// Running totals while instancing; shared components are expanded once per
/// reference, so a small document can describe a very large scene.
#[derive(Debug, Default)]
struct InstanceBudget {
    nodes: usize,
    triangles: usize,
}

impl InstanceBudget {
    fn charge(&mut self, id: u32, triangles: usize) -> GeometryResult<()> {
        self.nodes += 1;
        self.triangles = self.triangles.saturating_add(triangles);
        if self.nodes > MAX_SCENE_NODES {
            return Err(GeometryError::load(format!(
                "scene expands to more than {MAX_SCENE_NODES} nodes at object {id}"
            )));
        }
        if self.triangles > MAX_SCENE_TRIANGLES {
            return Err(GeometryError::load(format!(
                "scene expands to more than {MAX_SCENE_TRIANGLES} triangles at object {id}"
            )));
        }
        Ok(())
    }
}

impl ModelDocument {
    fn into_scene(self) -> GeometryResult<SceneNode> {
        let mut budget = InstanceBudget::default();
        let mut root = SceneNode::group(ROOT_NAME);
        for (object_id, transform) in &self.items {
            root = root.child(self.instantiate(*object_id, *transform, 0, &mut budget)?);
        }
        Ok(root)
    }

    fn instantiate(
        &self,
        id: u32,
        transform: DMat4,
        depth: usize,
        budget: &mut InstanceBudget,
    ) -> GeometryResult<SceneNode> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(GeometryError::load(format!(
                "component nesting deeper than {MAX_COMPONENT_DEPTH} at object {id}"
            )));
        }
        let object = self
            .objects
            .get(&id)
            .ok_or_else(|| GeometryError::load(format!("reference to unknown object {id}")))?;
        budget.charge(id, object.mesh.as_ref().map_or(0, TriangleBuffer::triangle_count))?;

        let name = object.name.clone().unwrap_or_else(|| format!("object {id}"));
        let mut node = match &object.mesh {
            Some(mesh) => SceneNode::with_mesh(name, mesh.clone()),
            None => SceneNode::group(name),
        }
        .transformed(transform);

        for (child_id, child_transform) in &object.components {
            node = node.child(self.instantiate(*child_id, *child_transform, depth + 1, budget)?);
        }
        Ok(node)
    }
}

/// Vertices and index triples of the `<mesh>` being read.
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<[f32; 3]>,
    triangles: Vec<[u32; 3]>,
}

impl MeshBuilder {
    fn build(self, object_id: u32) -> GeometryResult<TriangleBuffer> {
        let mut positions = Vec::with_capacity(self.triangles.len() * 9);
        for tri in &self.triangles {
            for &index in tri {
                let v = self.vertices.get(index as usize).ok_or_else(|| {
                    GeometryError::load(format!(
                        "object {object_id}: vertex index {index} out of range ({} vertices)",
                        self.vertices.len()
                    ))
                })?;
                positions.extend_from_slice(v);
            }
        }
        Ok(TriangleBuffer::from_positions(positions))
    }
}

fn parse_model(content: &str) -> GeometryResult<ModelDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut document = ModelDocument::default();
    let mut current: Option<(u32, ObjectDef)> = None;
    let mut mesh: Option<MeshBuilder> = None;
    let mut in_build = false;

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| GeometryError::load(format!("XML parse error: {e}")))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"object" => {
                        let id = required_u32(e, b"id")?;
                        let object = ObjectDef {
                            name: attribute(e, b"name")?,
                            ..ObjectDef::default()
                        };
                        if is_empty {
                            document.objects.insert(id, object);
                        } else {
                            current = Some((id, object));
                        }
                    }
                    b"mesh" if current.is_some() => {
                        mesh = Some(MeshBuilder::default());
                    }
                    b"vertex" => {
                        if let Some(builder) = mesh.as_mut() {
                            builder.vertices.push([
                                required_f32(e, b"x")?,
                                required_f32(e, b"y")?,
                                required_f32(e, b"z")?,
                            ]);
                        }
                    }
                    b"triangle" => {
                        if let Some(builder) = mesh.as_mut() {
                            builder.triangles.push([
                                required_u32(e, b"v1")?,
                                required_u32(e, b"v2")?,
                                required_u32(e, b"v3")?,
                            ]);
                        }
                    }
                    b"component" => {
                        if let Some((_, object)) = current.as_mut() {
                            object
                                .components
                                .push((required_u32(e, b"objectid")?, transform_attribute(e)?));
                        }
                    }
                    b"build" => in_build = !is_empty,
                    b"item" if in_build => {
                        document
                            .items
                            .push((required_u32(e, b"objectid")?, transform_attribute(e)?));
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"mesh" => {
                    if let (Some(builder), Some((id, object))) = (mesh.take(), current.as_mut()) {
                        object.mesh = Some(builder.build(*id)?);
                    }
                }
                b"object" => {
                    if let Some((id, object)) = current.take() {
                        document.objects.insert(id, object);
                    }
                }
                b"build" => in_build = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(document)
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> GeometryResult<Option<String>> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| GeometryError::load(format!("invalid attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(element: &BytesStart<'_>, key: &[u8]) -> GeometryResult<String> {
    attribute(element, key)?.ok_or_else(|| {
        GeometryError::load(format!(
            "<{}> is missing attribute '{}'",
            String::from_utf8_lossy(element.local_name().as_ref()),
            String::from_utf8_lossy(key)
        ))
    })
}

fn required_u32(element: &BytesStart<'_>, key: &[u8]) -> GeometryResult<u32> {
    let value = required(element, key)?;
    value.trim().parse().map_err(|e| {
        GeometryError::load(format!(
            "invalid {} '{value}': {e}",
            String::from_utf8_lossy(key)
        ))
    })
}

fn required_f32(element: &BytesStart<'_>, key: &[u8]) -> GeometryResult<f32> {
    let value = required(element, key)?;
    value.trim().parse().map_err(|e| {
        GeometryError::load(format!(
            "invalid {} coordinate '{value}': {e}",
            String::from_utf8_lossy(key)
        ))
    })
}

/// Optional `transform` attribute; identity when absent.
fn transform_attribute(element: &BytesStart<'_>) -> GeometryResult<DMat4> {
    match attribute(element, b"transform")? {
        Some(value) => parse_transform(&value),
        None => Ok(DMat4::IDENTITY),
    }
}

/// Parse a 3MF affine transform: twelve numbers
/// `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32`, row-vector convention.
/// Row `i` of the 3MF matrix is column `i` of the glam matrix.
pub fn parse_transform(value: &str) -> GeometryResult<DMat4> {
    let m: Vec<f64> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|e| GeometryError::load(format!("invalid transform '{value}': {e}")))?;
    if m.len() != 12 {
        return Err(GeometryError::load(format!(
            "transform needs 12 values, got {}",
            m.len()
        )));
    }
    Ok(DMat4::from_cols(
        DVec4::new(m[0], m[1], m[2], 0.0),
        DVec4::new(m[3], m[4], m[5], 0.0),
        DVec4::new(m[6], m[7], m[8], 0.0),
        DVec4::new(m[9], m[10], m[11], 1.0),
    ))
}
