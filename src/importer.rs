//! Scene import: from a parsed [`SceneDescription`] to GPU resources and a flat draw list.
//!
//! Import runs once, before the first frame, in four steps:
//!
//! 1. A pre-order depth-first walk accumulates `world = parent_world * local` for
//!    every node and appends one [`DrawEntry`] per referenced mesh. Mesh and
//!    material references are checked here.
//! 2. Every referenced mesh is validated and every pending material's diffuse
//!    image is decoded.
//! 3. Geometry is uploaded once per unique mesh index, in first-encounter order.
//! 4. Materials are created once per unique material index, in ascending order.
//!
//! Every fatal error is raised before step 3, so a failed import never leaves
//! GPU resources behind.

use std::collections::BTreeSet;

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    context::GpuUpload,
    data_structures::{
        geometry::{self, GeometryResource, GpuGeometry},
        material::{DecodedImage, GpuImage, MaterialResource},
        scene_graph::{SceneDescription, SceneNode},
    },
    error::SceneLoadError,
    resources::texture::ImageLoader,
};

/// What to do when a material's diffuse texture cannot be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFailurePolicy {
    /// Fail the import with [`SceneLoadError::Texture`].
    #[default]
    Abort,
    /// Log a warning and give the material its flat colour instead.
    FlatFallback,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImportOptions {
    pub texture_failure: TextureFailurePolicy,
}

/// A scene node with its accumulated world transform.
#[derive(Clone, Debug)]
pub struct ResolvedNode {
    pub name: String,
    /// Position of the parent in [`ImportedScene::nodes`]; `None` for the root.
    pub parent: Option<usize>,
    pub world_transform: Matrix4<f32>,
    pub meshes: Vec<usize>,
}

/// One draw call: a resolved node's transform with one of its meshes and that mesh's material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawEntry {
    pub node: usize,
    pub mesh: usize,
    pub material: usize,
}

/// Resources addressed by their source index.
///
/// A dense index-to-slot table maps mesh or material indices of the scene
/// description to resources stored contiguously in creation order.
#[derive(Debug)]
pub struct ResourceArena<R> {
    resources: Vec<R>,
    slots: Vec<Option<usize>>,
}

impl<R> ResourceArena<R> {
    pub fn with_index_capacity(indices: usize) -> Self {
        Self {
            resources: Vec::new(),
            slots: vec![None; indices],
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_some)
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        let slot = (*self.slots.get(index)?)?;
        self.resources.get(slot)
    }

    /// Stores `resource` under `index`, replacing any previous one.
    pub fn insert(&mut self, index: usize, resource: R) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        match self.slots[index] {
            Some(slot) => self.resources[slot] = resource,
            None => {
                self.slots[index] = Some(self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// `(source index, resource)` pairs in ascending source index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &R)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((index, &self.resources[(*slot)?])))
    }
}

impl<R> Default for ResourceArena<R> {
    fn default() -> Self {
        Self::with_index_capacity(0)
    }
}

/// The immutable result of an import.
#[derive(Debug)]
pub struct ImportedScene<G = GpuGeometry, T = GpuImage> {
    /// Resolved nodes in pre-order; parents always precede their children.
    pub nodes: Vec<ResolvedNode>,
    /// Draw entries in traversal order.
    pub draw_list: Vec<DrawEntry>,
    pub geometries: ResourceArena<GeometryResource<G>>,
    pub materials: ResourceArena<MaterialResource<T>>,
}

impl<G, T> ImportedScene<G, T> {
    pub fn world_transform(&self, entry: &DrawEntry) -> Option<Matrix4<f32>> {
        self.nodes.get(entry.node).map(|node| node.world_transform)
    }
}

/// Output of the traversal step.
#[derive(Default)]
struct Traversal {
    nodes: Vec<ResolvedNode>,
    draw_list: Vec<DrawEntry>,
    mesh_order: Vec<usize>,
    pending_materials: BTreeSet<usize>,
}

/// Turns a scene description into GPU resources through a [`GpuUpload`] implementation.
pub struct SceneImporter<'a, U: GpuUpload + ?Sized> {
    uploader: &'a mut U,
    images: &'a dyn ImageLoader,
    options: ImportOptions,
}

impl<'a, U: GpuUpload + ?Sized> SceneImporter<'a, U> {
    pub fn new(uploader: &'a mut U, images: &'a dyn ImageLoader, options: ImportOptions) -> Self {
        Self {
            uploader,
            images,
            options,
        }
    }

    /// Imports `scene`. `None` stands for a scene the loader could not produce.
    pub fn import_scene(
        &mut self,
        scene: Option<&SceneDescription>,
    ) -> Result<ImportedScene<U::Geometry, U::Image>, SceneLoadError> {
        let scene = scene.ok_or(SceneLoadError::MissingScene)?;
        if scene.incomplete {
            return Err(SceneLoadError::Incomplete);
        }
        let root = scene.root.as_ref().ok_or(SceneLoadError::MissingRoot)?;

        let mut traversal = Traversal::default();
        let mut seen = vec![false; scene.meshes.len()];
        resolve_node(scene, root, None, Matrix4::identity(), &mut seen, &mut traversal)?;

        for &mesh in &traversal.mesh_order {
            geometry::validate(&scene.meshes[mesh])
                .map_err(|source| SceneLoadError::InvalidMesh { mesh, source })?;
        }
        let images = self.decode_materials(scene, &traversal.pending_materials)?;

        let mut geometries = ResourceArena::with_index_capacity(scene.meshes.len());
        for &mesh in &traversal.mesh_order {
            let resource = GeometryResource::create(&mut *self.uploader, &scene.meshes[mesh])
                .map_err(|source| SceneLoadError::InvalidMesh { mesh, source })?;
            geometries.insert(mesh, resource);
        }

        let mut materials = ResourceArena::with_index_capacity(scene.materials.len());
        for (material, image) in images {
            let data = &scene.materials[material];
            let resource = match image {
                Some(image) => {
                    let label = material_label(material, &data.name);
                    MaterialResource::create_from_image(&mut *self.uploader, &label, &image)
                        .map_err(|source| SceneLoadError::Texture { material, source })?
                }
                None => {
                    let [r, g, b] = data.diffuse_color.unwrap_or([0.0; 3]);
                    log::info!(
                        "Material {} ('{}') uses flat colour [{}, {}, {}]",
                        material,
                        data.name,
                        r,
                        g,
                        b
                    );
                    MaterialResource::create_flat([r, g, b, 1.0])
                }
            };
            materials.insert(material, resource);
        }

        log::info!(
            "Imported {} nodes into {} draw entries ({} geometries, {} materials)",
            traversal.nodes.len(),
            traversal.draw_list.len(),
            geometries.len(),
            materials.len()
        );

        Ok(ImportedScene {
            nodes: traversal.nodes,
            draw_list: traversal.draw_list,
            geometries,
            materials,
        })
    }

    /// Decodes the first diffuse texture of every pending material, ascending.
    /// `None` selects the flat colour path.
    fn decode_materials(
        &self,
        scene: &SceneDescription,
        pending: &BTreeSet<usize>,
    ) -> Result<Vec<(usize, Option<DecodedImage>)>, SceneLoadError> {
        let mut decoded = Vec::with_capacity(pending.len());
        for &material in pending {
            let Some(texture) = scene.materials[material].diffuse_textures.first() else {
                decoded.push((material, None));
                continue;
            };
            let image = self
                .images
                .load(texture)
                .and_then(|image| image.validate().map(|_| image));
            match (image, self.options.texture_failure) {
                (Ok(image), _) => decoded.push((material, Some(image))),
                (Err(source), TextureFailurePolicy::Abort) => {
                    return Err(SceneLoadError::Texture { material, source });
                }
                (Err(err), TextureFailurePolicy::FlatFallback) => {
                    log::warn!(
                        "Falling back to a flat colour for material {}: {} ({})",
                        material,
                        err,
                        texture.label()
                    );
                    decoded.push((material, None));
                }
            }
        }
        Ok(decoded)
    }
}

fn resolve_node(
    scene: &SceneDescription,
    node: &SceneNode,
    parent: Option<usize>,
    parent_world: Matrix4<f32>,
    seen: &mut [bool],
    out: &mut Traversal,
) -> Result<(), SceneLoadError> {
    let world_transform = parent_world * node.local_transform;
    let index = out.nodes.len();

    for &mesh in &node.meshes {
        let data = scene.meshes.get(mesh).ok_or_else(|| SceneLoadError::MissingMesh {
            node: node.name.clone(),
            mesh,
        })?;
        if data.material >= scene.materials.len() {
            return Err(SceneLoadError::MissingMaterial {
                mesh,
                material: data.material,
            });
        }
        if !seen[mesh] {
            seen[mesh] = true;
            out.mesh_order.push(mesh);
        }
        out.pending_materials.insert(data.material);
        out.draw_list.push(DrawEntry {
            node: index,
            mesh,
            material: data.material,
        });
    }
    out.nodes.push(ResolvedNode {
        name: node.name.clone(),
        parent,
        world_transform,
        meshes: node.meshes.clone(),
    });

    for child in &node.children {
        resolve_node(scene, child, Some(index), world_transform, seen, out)?;
    }
    Ok(())
}

fn material_label(index: usize, name: &str) -> String {
    if name.is_empty() {
        format!("material {index}")
    } else {
        name.to_string()
    }
}
