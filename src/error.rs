//! Error taxonomy for scene import, resource creation and GPU program setup.
//!
//! Every error here is a startup error: the viewer either aborts with it or,
//! where a [`TextureFailurePolicy`](crate::importer::TextureFailurePolicy) allows
//! it, logs and degrades. Nothing in the render loop produces these.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of [`SceneImporter::import_scene`](crate::importer::SceneImporter::import_scene).
#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("no scene was provided to the importer")]
    MissingScene,
    #[error("the scene is marked incomplete")]
    Incomplete,
    #[error("the scene has no root node")]
    MissingRoot,
    #[error("node '{node}' references mesh {mesh}, which does not exist")]
    MissingMesh { node: String, mesh: usize },
    #[error("mesh {mesh} references material {material}, which does not exist")]
    MissingMaterial { mesh: usize, material: usize },
    #[error("mesh {mesh} cannot be uploaded")]
    InvalidMesh {
        mesh: usize,
        #[source]
        source: GeometryError,
    },
    #[error("diffuse texture of material {material} could not be loaded")]
    Texture {
        material: usize,
        #[source]
        source: ResourceLoadError,
    },
}

/// Failure to turn an image reference into a GPU image.
#[derive(Debug, Error)]
pub enum ResourceLoadError {
    #[error("can't read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't decode image '{label}'")]
    Decode {
        label: String,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("pixel buffer holds {actual} bytes, expected {expected} (width * height * 4)")]
    PixelBufferSize { expected: usize, actual: usize },
}

/// A mesh whose channels cannot be uploaded as a consistent indexed triangle list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("mesh has {vertices} vertices and {indices} indices, nothing to draw")]
    Empty { vertices: usize, indices: usize },
    #[error("{channel} channel has {actual} entries, expected {expected}")]
    ChannelLength {
        channel: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("{0} indices do not form a triangle list")]
    NotTriangles(usize),
}

/// Diagnostics reported by the GPU while building a shader program.
#[derive(Debug, Error)]
#[error("shader program '{label}' failed to build: {message}")]
pub struct ShaderCompileError {
    pub label: String,
    pub message: String,
}
