use std::{cell::RefCell, collections::HashMap, path::PathBuf};

use cgmath::{Matrix4, Vector3};
use scene_viewer::{
    context::GpuUpload,
    data_structures::{
        material::DecodedImage,
        scene_graph::{MaterialData, MeshData, SceneDescription, SceneNode, TextureSource},
    },
    error::{ResourceLoadError, SceneLoadError},
    importer::{ImportOptions, ImportedScene, SceneImporter},
    resources::texture::ImageLoader,
};

/// What [`RecordingUploader`] hands out instead of wgpu buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGeometry {
    pub label: String,
    pub vertex_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// A [`GpuUpload`] that remembers every upload in order.
#[derive(Debug, Default)]
pub struct RecordingUploader {
    pub geometry_uploads: Vec<String>,
    pub image_uploads: Vec<String>,
}

impl RecordingUploader {
    pub fn upload_count(&self) -> usize {
        self.geometry_uploads.len() + self.image_uploads.len()
    }
}

impl GpuUpload for RecordingUploader {
    type Geometry = RecordedGeometry;
    type Image = RecordedImage;

    fn upload_geometry(&mut self, label: &str, mesh: &MeshData) -> RecordedGeometry {
        self.geometry_uploads.push(label.to_string());
        RecordedGeometry {
            label: label.to_string(),
            vertex_count: mesh.vertex_count(),
        }
    }

    fn upload_image(&mut self, label: &str, image: &DecodedImage) -> RecordedImage {
        self.image_uploads.push(label.to_string());
        RecordedImage {
            label: label.to_string(),
            width: image.width,
            height: image.height,
        }
    }
}

/// An [`ImageLoader`] serving canned images by texture label. Unknown labels fail.
#[derive(Debug, Default)]
pub struct StubImageLoader {
    images: HashMap<String, DecodedImage>,
    pub requests: RefCell<Vec<String>>,
}

impl StubImageLoader {
    pub fn with_image(mut self, label: &str, width: u32, height: u32) -> Self {
        self.images.insert(label.to_string(), solid_image(width, height));
        self
    }

    pub fn with_decoded(mut self, label: &str, image: DecodedImage) -> Self {
        self.images.insert(label.to_string(), image);
        self
    }
}

impl ImageLoader for StubImageLoader {
    fn load(&self, source: &TextureSource) -> Result<DecodedImage, ResourceLoadError> {
        let label = source.label();
        self.requests.borrow_mut().push(label.clone());
        self.images
            .get(&label)
            .cloned()
            .ok_or(ResourceLoadError::UnsupportedSource(label))
    }
}

pub fn solid_image(width: u32, height: u32) -> DecodedImage {
    DecodedImage {
        pixels: vec![200; DecodedImage::expected_len(width, height)],
        width,
        height,
    }
}

/// A unit quad in the XY plane with every channel present.
pub fn quad_mesh(name: &str, material: usize) -> MeshData {
    MeshData {
        name: name.to_string(),
        positions: vec![
            [-0.5, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 0, 2, 3],
        material,
    }
}

pub fn flat_material(name: &str, color: [f32; 3]) -> MaterialData {
    MaterialData {
        name: name.to_string(),
        diffuse_textures: Vec::new(),
        diffuse_color: Some(color),
    }
}

pub fn textured_material(name: &str, file: &str) -> MaterialData {
    MaterialData {
        name: name.to_string(),
        diffuse_textures: vec![TextureSource::File(PathBuf::from(file))],
        diffuse_color: Some([1.0, 1.0, 1.0]),
    }
}

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

pub fn scene(root: SceneNode, meshes: Vec<MeshData>, materials: Vec<MaterialData>) -> SceneDescription {
    SceneDescription {
        root: Some(root),
        meshes,
        materials,
        incomplete: false,
    }
}

pub type RecordedScene = ImportedScene<RecordedGeometry, RecordedImage>;

/// Imports `scene` with a fresh [`RecordingUploader`] and returns both.
pub fn import(
    scene: Option<&SceneDescription>,
    images: &StubImageLoader,
    options: ImportOptions,
) -> (Result<RecordedScene, SceneLoadError>, RecordingUploader) {
    let mut uploader = RecordingUploader::default();
    let result = SceneImporter::new(&mut uploader, images, options).import_scene(scene);
    (result, uploader)
}

pub fn assert_matrix_eq(actual: Matrix4<f32>, expected: Matrix4<f32>) {
    let actual: [[f32; 4]; 4] = actual.into();
    let expected: [[f32; 4]; 4] = expected.into();
    for (col, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        for row in 0..4 {
            assert!(
                (a[row] - e[row]).abs() < 1e-5,
                "matrix mismatch at column {}, row {}: {:?} != {:?}",
                col,
                row,
                actual,
                expected
            );
        }
    }
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
