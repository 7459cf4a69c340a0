//! Scene graph as delivered by the file loaders.
//!
//! A [`SceneDescription`] is the read-only hierarchy the importer walks: a tree
//! of [`SceneNode`]s plus flat mesh and material tables addressed by index.
//! The importer never mutates it, it only reads transforms and indices while
//! producing GPU resources and the flat draw list.

use std::path::PathBuf;

use cgmath::{Matrix4, SquareMatrix};

/// A parsed scene: node hierarchy plus the mesh and material tables it indexes into.
#[derive(Clone, Debug, Default)]
pub struct SceneDescription {
    /// `None` when the file contained no usable root.
    pub root: Option<SceneNode>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    /// Set by a loader that had to drop parts of the file.
    pub incomplete: bool,
}

/// A point in the hierarchy with a local transform and zero or more mesh references.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub local_transform: Matrix4<f32>,
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node with an identity transform and no meshes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local_transform: Matrix4<f32>) -> Self {
        self.local_transform = local_transform;
        self
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::count).sum::<usize>()
    }
}

/// Raw, decoded vertex data of one mesh.
///
/// `positions`, `tex_coords` and `normals` are parallel arrays; `indices` form a
/// triangle list into them.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: usize,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Where a texture image lives before decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    File(PathBuf),
    /// Bytes embedded in the scene file, with an optional MIME type hint.
    Embedded {
        label: String,
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl TextureSource {
    pub fn label(&self) -> String {
        match self {
            TextureSource::File(path) => path.display().to_string(),
            TextureSource::Embedded { label, .. } => label.clone(),
        }
    }
}

/// Surface description of a material: diffuse textures and/or a diffuse colour.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse_textures: Vec<TextureSource>,
    pub diffuse_color: Option<[f32; 3]>,
}

impl MaterialData {
    /// The material importers assign to meshes that reference none.
    pub fn default_material() -> Self {
        Self {
            name: "DefaultMaterial".to_string(),
            ..Default::default()
        }
    }
}
