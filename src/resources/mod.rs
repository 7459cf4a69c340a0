/**
 * This module contains all logic for loading scenes and images from external files.
 */
use std::path::Path;

use anyhow::bail;

use crate::data_structures::scene_graph::SceneDescription;

pub mod gltf_loader;
pub mod obj_loader;
pub mod texture;

pub use gltf_loader::load_gltf;
pub use obj_loader::load_obj;

/// Loads a scene description, picking the format from the file extension.
pub async fn load_scene(path: &Path) -> anyhow::Result<SceneDescription> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let scene = match extension.as_str() {
        "obj" => load_obj(path).await?,
        "gltf" | "glb" => load_gltf(path).await?,
        _ => bail!("unsupported scene format: {}", path.display()),
    };
    log::info!(
        "Loaded {}: {} nodes, {} meshes, {} materials",
        path.display(),
        scene.root.as_ref().map_or(0, |root| root.count()),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}
