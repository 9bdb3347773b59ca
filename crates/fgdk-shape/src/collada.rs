//! COLLADA 1.4.1 output for decoded LODs.
//!
//! Each mesh becomes a geometry plus a skin controller bound to the LOD's
//! skeleton. The joint tree and one node per mesh live under a single
//! `Armature` node in the visual scene. X is mirrored on positions and
//! normals to match the handedness DCC tools expect.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rustc_hash::FxHashMap;

use crate::mesh::ShapeMesh;
use crate::shape::SkinBuildContext;
use crate::skeleton::Skeleton;
use crate::{Error, Result};

const COLLADA_NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const IDENTITY_MATRIX: &str = "1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1";

/// Writes one LOD as a COLLADA document.
///
/// # Example
///
/// ```no_run
/// use fgdk_common::BinaryReader;
/// use fgdk_shape::{ColladaExporter, ShapeOptions, SkinBuildContext};
///
/// let data = std::fs::read("lod.bin")?;
/// let context = SkinBuildContext::read(&mut BinaryReader::new(&data), &ShapeOptions::default())?;
/// let document = ColladaExporter::new(&context).export()?;
/// std::fs::write("shape_0_lod0.dae", document)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ColladaExporter<'a> {
    context: &'a SkinBuildContext,
    comments: Vec<String>,
}

impl<'a> ColladaExporter<'a> {
    pub fn new(context: &'a SkinBuildContext) -> Self {
        Self {
            context,
            comments: Vec::new(),
        }
    }

    /// Emit `comments` as XML comments right after the `<asset>` block.
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// Render the document to a string.
    pub fn export(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write the document to a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = XmlOut::new(writer);

        xml.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        xml.start(
            "COLLADA",
            &[
                ("xmlns", COLLADA_NAMESPACE),
                ("version", "1.4.1"),
                ("xmlns:xsi", XSI_NAMESPACE),
            ],
        )?;

        xml.start("asset", &[])?;
        xml.empty("unit", &[("name", "meter"), ("meter", "1")])?;
        xml.text_element("up_axis", &[], "Y_UP")?;
        xml.end("asset")?;

        for comment in &self.comments {
            // "--" may not appear inside an XML comment.
            let comment = comment.replace("--", "- -");
            xml.event(Event::Comment(BytesText::from_escaped(format!(" {comment} "))))?;
        }

        xml.start("library_geometries", &[])?;
        for (index, mesh) in self.context.meshes.iter().enumerate() {
            write_geometry(&mut xml, index, mesh)?;
        }
        xml.end("library_geometries")?;

        let skeleton = &self.context.skeleton;
        xml.start("library_controllers", &[])?;
        for (index, mesh) in self.context.meshes.iter().enumerate() {
            write_controller(&mut xml, index, mesh, skeleton)?;
        }
        xml.end("library_controllers")?;

        xml.start("library_visual_scenes", &[])?;
        xml.start("visual_scene", &[("id", "Scene"), ("name", "Scene")])?;
        xml.start(
            "node",
            &[("id", "Armature"), ("name", "Armature"), ("type", "NODE")],
        )?;
        write_joints(&mut xml, skeleton)?;
        for index in 0..self.context.meshes.len() {
            let name = format!("m{index}");
            xml.start("node", &[("id", &name), ("name", &name), ("type", "NODE")])?;
            xml.start(
                "instance_controller",
                &[("url", &format!("#Armature_m{index}-skin"))],
            )?;
            xml.text_element("skeleton", &[], "#Armature_Root")?;
            xml.end("instance_controller")?;
            xml.end("node")?;
        }
        xml.end("node")?;
        xml.end("visual_scene")?;
        xml.end("library_visual_scenes")?;

        xml.start("scene", &[])?;
        xml.empty("instance_visual_scene", &[("url", "#Scene")])?;
        xml.end("scene")?;

        xml.end("COLLADA")?;
        Ok(())
    }
}

fn write_geometry<W: Write>(xml: &mut XmlOut<W>, index: usize, mesh: &ShapeMesh) -> Result<()> {
    let vertex_count = mesh.vertices.len();

    xml.start(
        "geometry",
        &[("id", &format!("m{index}-mesh")), ("name", &format!("m{index}"))],
    )?;
    xml.start("mesh", &[])?;

    let positions = mesh
        .vertices
        .iter()
        .flat_map(|v| [mirror(v.position[0]), v.position[1], v.position[2]]);
    write_float_source(
        xml,
        &format!("mesh-{index}-positions"),
        &format!("mesh-{index}-array-p"),
        &join_floats(positions),
        vertex_count,
        &["X", "Y", "Z"],
    )?;

    let normals = mesh
        .vertices
        .iter()
        .flat_map(|v| [mirror(v.normal[0]), v.normal[1], v.normal[2]]);
    write_float_source(
        xml,
        &format!("mesh-{index}-normals"),
        &format!("mesh-{index}-array-n"),
        &join_floats(normals),
        vertex_count,
        &["X", "Y", "Z"],
    )?;

    let uvs = mesh.vertices.iter().flat_map(|v| v.uv);
    write_float_source(
        xml,
        &format!("mesh-{index}-uvs"),
        &format!("mesh-{index}-array-u"),
        &join_floats(uvs),
        vertex_count,
        &["S", "T"],
    )?;

    xml.start("vertices", &[("id", &format!("mesh-{index}-vertices"))])?;
    xml.empty(
        "input",
        &[
            ("semantic", "POSITION"),
            ("source", &format!("#mesh-{index}-positions")),
        ],
    )?;
    xml.end("vertices")?;

    xml.start("triangles", &[("count", &mesh.faces.len().to_string())])?;
    xml.empty(
        "input",
        &[
            ("semantic", "VERTEX"),
            ("source", &format!("#mesh-{index}-vertices")),
            ("offset", "0"),
        ],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "NORMAL"),
            ("source", &format!("#mesh-{index}-normals")),
            ("offset", "1"),
        ],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "TEXCOORD"),
            ("source", &format!("#mesh-{index}-uvs")),
            ("offset", "2"),
            ("set", "0"),
        ],
    )?;
    // Every corner repeats its vertex index for VERTEX, NORMAL and TEXCOORD.
    let corners = mesh
        .faces
        .iter()
        .flat_map(|f| f.indices)
        .flat_map(|i| [i, i, i]);
    xml.text_element("p", &[], &join_display(corners))?;
    xml.end("triangles")?;

    xml.end("mesh")?;
    xml.end("geometry")?;
    Ok(())
}

fn write_float_source<W: Write>(
    xml: &mut XmlOut<W>,
    source_id: &str,
    array_id: &str,
    values: &(String, usize),
    element_count: usize,
    params: &[&str],
) -> Result<()> {
    let (text, value_count) = values;

    xml.start("source", &[("id", source_id)])?;
    xml.text_element(
        "float_array",
        &[("id", array_id), ("count", &value_count.to_string())],
        text,
    )?;
    xml.start("technique_common", &[])?;
    xml.start(
        "accessor",
        &[
            ("source", &format!("#{array_id}")),
            ("count", &element_count.to_string()),
            ("stride", &params.len().to_string()),
        ],
    )?;
    for &param in params {
        xml.empty("param", &[("name", param), ("type", "float")])?;
    }
    xml.end("accessor")?;
    xml.end("technique_common")?;
    xml.end("source")?;
    Ok(())
}

fn write_controller<W: Write>(
    xml: &mut XmlOut<W>,
    index: usize,
    mesh: &ShapeMesh,
    skeleton: &Skeleton,
) -> Result<()> {
    let skin_id = format!("Armature_m{index}-skin");
    let joints_id = format!("{skin_id}-joints");
    let poses_id = format!("{skin_id}-bind_poses");
    let weights_id = format!("{skin_id}-weights");
    let joint_count = skeleton.bone_count();

    let table = WeightTable::build(mesh, skeleton)?;

    xml.start("controller", &[("id", &skin_id), ("name", "Armature")])?;
    xml.start("skin", &[("source", &format!("#m{index}-mesh"))])?;
    xml.text_element("bind_shape_matrix", &[], IDENTITY_MATRIX)?;

    // Joint names
    let joint_names: Vec<&str> = skeleton.bones().map(|(_, j)| j.name.as_str()).collect();
    xml.start("source", &[("id", &joints_id)])?;
    xml.text_element(
        "Name_array",
        &[
            ("id", &format!("{joints_id}-array")),
            ("count", &joint_count.to_string()),
        ],
        &joint_names.join(" "),
    )?;
    write_accessor(xml, &format!("{joints_id}-array"), joint_count, 1, "JOINT", "name")?;
    xml.end("source")?;

    // Inverse bind matrices
    let poses = vec![IDENTITY_MATRIX; joint_count].join(" ");
    xml.start("source", &[("id", &poses_id)])?;
    xml.text_element(
        "float_array",
        &[
            ("id", &format!("{poses_id}-array")),
            ("count", &(joint_count * 16).to_string()),
        ],
        &poses,
    )?;
    write_accessor(
        xml,
        &format!("{poses_id}-array"),
        joint_count,
        16,
        "TRANSFORM",
        "float4x4",
    )?;
    xml.end("source")?;

    // Weights
    let (weight_text, weight_count) = join_floats(table.weights.iter().copied());
    xml.start("source", &[("id", &weights_id)])?;
    xml.text_element(
        "float_array",
        &[
            ("id", &format!("{weights_id}-array")),
            ("count", &weight_count.to_string()),
        ],
        &weight_text,
    )?;
    write_accessor(
        xml,
        &format!("{weights_id}-array"),
        weight_count,
        1,
        "WEIGHT",
        "float",
    )?;
    xml.end("source")?;

    xml.start("joints", &[])?;
    xml.empty(
        "input",
        &[("semantic", "JOINT"), ("source", &format!("#{joints_id}"))],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "INV_BIND_MATRIX"),
            ("source", &format!("#{poses_id}")),
        ],
    )?;
    xml.end("joints")?;

    xml.start(
        "vertex_weights",
        &[("count", &mesh.vertices.len().to_string())],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "JOINT"),
            ("source", &format!("#{joints_id}")),
            ("offset", "0"),
        ],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "WEIGHT"),
            ("source", &format!("#{weights_id}")),
            ("offset", "1"),
        ],
    )?;
    xml.text_element("vcount", &[], &join_display(table.vcount.iter()))?;
    xml.text_element("v", &[], &join_display(table.pairs.iter()))?;
    xml.end("vertex_weights")?;

    xml.end("skin")?;
    xml.end("controller")?;
    Ok(())
}

fn write_accessor<W: Write>(
    xml: &mut XmlOut<W>,
    array_id: &str,
    count: usize,
    stride: usize,
    param: &str,
    param_type: &str,
) -> Result<()> {
    xml.start("technique_common", &[])?;
    xml.start(
        "accessor",
        &[
            ("source", &format!("#{array_id}")),
            ("count", &count.to_string()),
            ("stride", &stride.to_string()),
        ],
    )?;
    xml.empty("param", &[("name", param), ("type", param_type)])?;
    xml.end("accessor")?;
    xml.end("technique_common")?;
    Ok(())
}

fn write_joints<W: Write>(xml: &mut XmlOut<W>, skeleton: &Skeleton) -> Result<()> {
    let mut open = 0usize;
    for (depth, id) in skeleton.depth_first() {
        while open > depth {
            xml.end("node")?;
            open -= 1;
        }

        let Some(joint) = skeleton.joint(id) else {
            continue;
        };
        let node_id = format!("Armature_{}", joint.name);
        xml.start(
            "node",
            &[
                ("id", &node_id),
                ("name", &joint.name),
                ("sid", &joint.name),
                ("type", "JOINT"),
            ],
        )?;
        open += 1;
    }
    for _ in 0..open {
        xml.end("node")?;
    }
    Ok(())
}

/// Deduplicated weights plus the per-vertex joint/weight index pairs.
///
/// Only nonzero influences are listed, so a `0` weight never appears in the
/// weight array and does not count towards a vertex's `vcount`. Importers
/// treat a missing influence and a zero one the same.
struct WeightTable {
    weights: Vec<f32>,
    vcount: Vec<usize>,
    pairs: Vec<usize>,
}

impl WeightTable {
    fn build(mesh: &ShapeMesh, skeleton: &Skeleton) -> Result<Self> {
        let mut slots: FxHashMap<u32, usize> = FxHashMap::default();
        let mut weights = Vec::new();
        let mut vcount = Vec::with_capacity(mesh.vertices.len());
        let mut pairs = Vec::new();

        for vertex in &mesh.vertices {
            let Some(skin) = &vertex.skin else {
                vcount.push(0);
                continue;
            };

            let mut count = 0;
            for (bone, weight) in skin.nonzero() {
                let joint = skeleton.bone_slot(bone).ok_or(Error::UnknownBone(bone))?;
                let slot = *slots.entry(weight.to_bits()).or_insert_with(|| {
                    weights.push(weight);
                    weights.len() - 1
                });
                pairs.push(joint);
                pairs.push(slot);
                count += 1;
            }
            vcount.push(count);
        }

        Ok(Self {
            weights,
            vcount,
            pairs,
        })
    }
}

/// Mirror an X coordinate without ever producing `-0`.
#[inline]
fn mirror(x: f32) -> f32 {
    0.0 - x
}

/// Join floats with single spaces. Returns the text and the value count.
///
/// COLLADA float arrays have no spelling for NaN or infinity, so those are
/// written through [`finite`].
fn join_floats(values: impl Iterator<Item = f32>) -> (String, usize) {
    let mut text = String::new();
    let mut count = 0;
    for value in values {
        if count > 0 {
            text.push(' ');
        }
        // Display for f32 is the shortest round-trip form and never uses an exponent.
        text.push_str(&finite(value).to_string());
        count += 1;
    }
    (text, count)
}

/// NaN becomes `0`; infinities saturate to `±f32::MAX`.
#[inline]
fn finite(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f32::MIN, f32::MAX)
    }
}

fn join_display<T: std::fmt::Display>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

/// Thin wrapper over the quick-xml writer. Writer failures surface as
/// [`Error::Io`].
struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attributes)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::{quad_mesh, MeshBytes};
    use crate::mesh::WEIGHTED_FORMAT;
    use crate::shape::ShapeOptions;
    use fgdk_common::BinaryReader;

    fn context_from(meshes: &[Vec<u8>]) -> SkinBuildContext {
        let mut skeleton = Skeleton::new();
        let meshes = meshes
            .iter()
            .map(|bytes| {
                ShapeMesh::read(
                    &mut BinaryReader::new(bytes),
                    &mut skeleton,
                    &ShapeOptions::default(),
                )
                .unwrap()
            })
            .collect();
        SkinBuildContext {
            unknown: 0,
            bone_list: Vec::new(),
            meshes,
            skeleton,
        }
    }

    /// Text between `<tag ...>` and `</tag>` for the first occurrence of `tag`
    /// whose start tag contains `marker`.
    fn element_text<'a>(doc: &'a str, tag: &str, marker: &str) -> &'a str {
        let open = format!("<{tag}");
        let mut search = 0;
        while let Some(found) = doc[search..].find(&open) {
            let start = search + found;
            let head_end = start + doc[start..].find('>').unwrap();
            let exact_tag = matches!(doc.as_bytes()[start + open.len()], b' ' | b'>');
            if exact_tag && doc[start..head_end].contains(marker) {
                let close = format!("</{tag}>");
                let end = head_end + doc[head_end..].find(&close).unwrap();
                return &doc[head_end + 1..end];
            }
            search = head_end;
        }
        panic!("no <{tag}> containing {marker:?}");
    }

    #[test]
    fn test_quad_document() {
        let context = context_from(&[quad_mesh().bytes]);
        let doc = ColladaExporter::new(&context).export().unwrap();

        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert_eq!(doc.matches("<geometry ").count(), 1);
        assert!(doc.contains("<triangles count=\"2\">"));
        assert!(doc.contains("<up_axis>Y_UP</up_axis>"));
        assert_eq!(
            element_text(&doc, "p", ""),
            "0 0 0 1 1 1 2 2 2 1 1 1 3 3 3 2 2 2"
        );
        assert_eq!(
            element_text(&doc, "Name_array", "Armature_m0-skin-joints-array"),
            "Root"
        );
        assert_eq!(doc.matches("type=\"JOINT\"").count(), 1);
        assert!(doc.contains("<skeleton>#Armature_Root</skeleton>"));
        assert_eq!(element_text(&doc, "vcount", ""), "0 0 0 0");
        assert_eq!(element_text(&doc, "v", ""), "");
    }

    #[test]
    fn test_x_is_mirrored_without_negative_zero() {
        let context = context_from(&[quad_mesh().bytes]);
        let doc = ColladaExporter::new(&context).export().unwrap();

        assert_eq!(
            element_text(&doc, "float_array", "mesh-0-array-p"),
            "0 0 0 -1 0 0 0 1 0 -1 1 0"
        );
        assert_eq!(
            element_text(&doc, "float_array", "mesh-0-array-n"),
            "0 1 0 0 1 0 0 1 0 0 1 0"
        );
        assert_eq!(
            element_text(&doc, "float_array", "mesh-0-array-u"),
            "0.25 0.75 0.25 0.75 0.25 0.75 0.25 0.75"
        );
    }

    #[test]
    fn test_floats_never_use_exponents() {
        let mesh = MeshBytes::default()
            .header(&[], &[], 2, 0)
            .vertex([1e-7, 3.0e20, -2.5e-12], None)
            .vertex([f32::MIN_POSITIVE, 0.5, 1.0], None)
            .bytes;
        let context = context_from(&[mesh]);
        let doc = ColladaExporter::new(&context).export().unwrap();

        let positions = element_text(&doc, "float_array", "mesh-0-array-p");
        assert!(!positions.contains('e'));
        assert!(!positions.contains('E'));
        assert!(positions.starts_with("-0.0000001 300000000000000000000 "));
    }

    #[test]
    fn test_non_finite_floats_are_written_finite() {
        let mesh = MeshBytes::default()
            .header(&[], &[], 1, 0)
            .vertex([f32::NAN, f32::INFINITY, f32::NEG_INFINITY], None)
            .bytes;
        let context = context_from(&[mesh]);
        let doc = ColladaExporter::new(&context).export().unwrap();

        let positions = element_text(&doc, "float_array", "mesh-0-array-p");
        let values: Vec<f32> = positions.split(' ').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values, vec![0.0, f32::MAX, f32::MIN]);
        assert!(!positions.contains("NaN"));
        assert!(!positions.contains("inf"));
    }

    #[test]
    fn test_weight_pairs_and_dedup() {
        let mesh = MeshBytes::default()
            .header(&[3], &[0, 1, 2], 3, WEIGHTED_FORMAT)
            .vertex([0.0; 3], Some(([0, 4, 0, 0], [0.5, 0.5, 0.0, 0.0])))
            .vertex([0.0; 3], Some(([4, 9, 2, 0], [0.25, 0.5, 0.25, -0.0])))
            .vertex([0.0; 3], Some(([9, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])))
            .bytes;
        let context = context_from(&[mesh]);
        let doc = ColladaExporter::new(&context).export().unwrap();

        // Bones register in order 0, 4, 9, 2.
        assert_eq!(
            element_text(&doc, "Name_array", "joints-array"),
            "Root AutoExporterJoint4 AutoExporterJoint9 AutoExporterJoint2"
        );
        assert_eq!(
            element_text(&doc, "float_array", "skin-weights-array"),
            "0.5 0.25 1"
        );
        assert_eq!(element_text(&doc, "vcount", ""), "2 3 1");
        assert_eq!(element_text(&doc, "v", ""), "0 0 1 0 1 1 2 0 3 1 2 2");
        assert_eq!(doc.matches("type=\"JOINT\"").count(), 4);
        assert_eq!(
            element_text(&doc, "float_array", "bind_poses-array")
                .split(' ')
                .count(),
            64
        );
    }

    #[test]
    fn test_comments_follow_asset() {
        let context = context_from(&[quad_mesh().bytes]);
        let doc = ColladaExporter::new(&context)
            .with_comments(vec!["header.unknown4=5".to_string()])
            .export()
            .unwrap();

        let asset_end = doc.find("</asset>").unwrap();
        let comment = doc.find("<!-- header.unknown4=5 -->").unwrap();
        let geometries = doc.find("<library_geometries>").unwrap();
        assert!(asset_end < comment && comment < geometries);
    }

    #[test]
    fn test_unregistered_bone() {
        let mesh = MeshBytes::default()
            .header(&[], &[], 1, WEIGHTED_FORMAT)
            .vertex([0.0; 3], Some(([7, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])))
            .bytes;
        let mut context = context_from(&[mesh]);
        context.skeleton = Skeleton::new();

        let result = ColladaExporter::new(&context).export();
        assert!(matches!(result, Err(Error::UnknownBone(7))));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_failure_is_io_error() {
        let context = context_from(&[quad_mesh().bytes]);
        let result = ColladaExporter::new(&context).write_to(BrokenPipe);
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
