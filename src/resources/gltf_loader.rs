use std::path::Path;

use cgmath::Matrix4;

use crate::{
    data_structures::scene_graph::{MaterialData, MeshData, SceneDescription, SceneNode, TextureSource},
    resources::texture::load_binary,
};

/// Loads a glTF 2.0 file (`.gltf` with external or embedded buffers, or `.glb`).
///
/// Every primitive becomes its own mesh, so a node lists one mesh index per
/// primitive of its glTF mesh. Primitives that cannot be drawn as an indexed
/// triangle list are skipped and mark the scene incomplete.
pub async fn load_gltf(path: &Path) -> anyhow::Result<SceneDescription> {
    let bytes = load_binary(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let buffer_data = gltf::import_buffers(&gltf.document, Some(base), gltf.blob.clone())?;
    let file_name = path.display().to_string();

    let mut materials: Vec<MaterialData> = gltf
        .materials()
        .map(|material| load_material(&material, &buffer_data, base, &file_name))
        .collect();
    let mut default_material = None;

    let mut incomplete = false;
    let mut meshes = Vec::new();
    let mut primitive_meshes: Vec<Vec<usize>> = Vec::new();
    for mesh in gltf.meshes() {
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            let name = match mesh.name() {
                Some(name) => format!("{}[{}]", name, primitive.index()),
                None => format!("mesh {}[{}]", mesh.index(), primitive.index()),
            };
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping {}: {:?} primitives are not supported", name, primitive.mode());
                incomplete = true;
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffer_data[buffer.index()]));
            let Some(positions) = reader.read_positions() else {
                log::warn!("Skipping {}: primitive has no positions", name);
                incomplete = true;
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let material = match primitive.material().index() {
                Some(index) => index,
                None => *default_material.get_or_insert_with(|| {
                    materials.push(MaterialData::default_material());
                    materials.len() - 1
                }),
            };
            let data = MeshData {
                name,
                tex_coords: reader
                    .read_tex_coords(0)
                    .map(|t| t.into_f32().collect())
                    .unwrap_or_default(),
                normals: reader.read_normals().map(|n| n.collect()).unwrap_or_default(),
                indices: match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                },
                positions,
                material,
            };
            indices.push(meshes.len());
            meshes.push(data);
        }
        primitive_meshes.push(indices);
    }

    let roots: Vec<SceneNode> = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => scene
            .nodes()
            .map(|node| to_scene_node(node, &primitive_meshes))
            .collect(),
        None => Vec::new(),
    };
    let root = match roots.len() {
        0 => None,
        1 => roots.into_iter().next(),
        _ => Some(
            roots
                .into_iter()
                .fold(SceneNode::new("root"), SceneNode::with_child),
        ),
    };

    Ok(SceneDescription {
        root,
        meshes,
        materials,
        incomplete,
    })
}

fn load_material(
    material: &gltf::Material,
    buffer_data: &[gltf::buffer::Data],
    base: &Path,
    file_name: &str,
) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material {}", material.index().unwrap_or_default()));
    let texture = pbr.base_color_texture().and_then(|info| {
        let image = info.texture().source();
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = &buffer_data[view.buffer().index()];
                let bytes = buffer[view.offset()..view.offset() + view.length()].to_vec();
                Some(TextureSource::Embedded {
                    label: format!("{} image {}", file_name, image.index()),
                    bytes,
                    mime_type: Some(mime_type.to_string()),
                })
            }
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                log::warn!("{}: data URI images are not supported", name);
                None
            }
            gltf::image::Source::Uri { uri, .. } => Some(TextureSource::File(base.join(uri))),
        }
    });
    let [r, g, b, _] = pbr.base_color_factor();

    MaterialData {
        diffuse_textures: texture.into_iter().collect(),
        diffuse_color: Some([r, g, b]),
        name,
    }
}

fn to_scene_node(node: gltf::Node, primitive_meshes: &[Vec<usize>]) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node {}", node.index()));
    let meshes = node
        .mesh()
        .map(|mesh| primitive_meshes[mesh.index()].clone())
        .unwrap_or_default();
    node.children().fold(
        SceneNode::new(name)
            .with_transform(Matrix4::from(node.transform().matrix()))
            .with_meshes(meshes),
        |parent, child| parent.with_child(to_scene_node(child, primitive_meshes)),
    )
}
