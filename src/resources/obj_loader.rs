use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::scene_graph::{MaterialData, MeshData, SceneDescription, SceneNode, TextureSource},
    resources::texture::load_string,
};

/// Loads a Wavefront OBJ file and its MTL libraries.
///
/// The result is a two-level hierarchy: an identity root with one child per OBJ
/// object, each child referencing exactly one mesh. Texture paths are resolved
/// relative to the OBJ file's directory.
pub async fn load_obj(path: &Path) -> anyhow::Result<SceneDescription> {
    let obj_text = load_string(path).await?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = base.join(p);
            async move {
                match load_string(&mtl_path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("{:#}", e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!(
            "Materials of {} could not be loaded ({}), using the default material",
            path.display(),
            e
        );
        Vec::new()
    });
    let mut materials: Vec<MaterialData> = obj_materials
        .into_iter()
        .map(|m| MaterialData {
            diffuse_textures: m
                .diffuse_texture
                .map(|tex| TextureSource::File(base.join(tex)))
                .into_iter()
                .collect(),
            diffuse_color: m.diffuse,
            name: m.name,
        })
        .collect();

    let mut default_material = None;
    let mut root = SceneNode::new(
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    let mut meshes = Vec::with_capacity(models.len());
    for (idx, model) in models.into_iter().enumerate() {
        let material = match model.mesh.material_id {
            Some(id) if id < materials.len() => id,
            _ => *default_material.get_or_insert_with(|| {
                materials.push(MaterialData::default_material());
                materials.len() - 1
            }),
        };
        root = root.with_child(SceneNode::new(model.name.clone()).with_meshes([idx]));
        meshes.push(to_mesh_data(model, material));
    }

    Ok(SceneDescription {
        root: Some(root),
        meshes,
        materials,
        incomplete: false,
    })
}

/// Splits tobj's flat arrays into per-vertex entries.
///
/// Channels the file does not provide stay empty, so the importer can reject the
/// mesh instead of drawing it with undefined attributes.
fn to_mesh_data(model: tobj::Model, material: usize) -> MeshData {
    let mesh = model.mesh;
    MeshData {
        name: model.name,
        positions: mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect(),
        // OBJ puts the texture origin bottom-left, wgpu top-left.
        tex_coords: mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect(),
        normals: mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect(),
        indices: mesh.indices,
        material,
    }
}
