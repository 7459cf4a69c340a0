use std::path::Path;

use anyhow::Context as _;
use image::{ImageFormat, load_from_memory_with_format};

use crate::{
    data_structures::{material::DecodedImage, scene_graph::TextureSource},
    error::ResourceLoadError,
};

/// Turns a texture reference into a tightly packed RGBA8 pixel buffer.
pub trait ImageLoader {
    fn load(&self, source: &TextureSource) -> Result<DecodedImage, ResourceLoadError>;
}

/// [`ImageLoader`] backed by the `image` crate.
///
/// Files are read from disk, embedded images are decoded in place. Rows are kept
/// top row first, which is what wgpu expects for texture coordinates with a
/// top-left origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl ImageLoader for ImageDecoder {
    fn load(&self, source: &TextureSource) -> Result<DecodedImage, ResourceLoadError> {
        match source {
            TextureSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|source| ResourceLoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                let format = path
                    .extension()
                    .and_then(|ext| ImageFormat::from_extension(ext));
                decode(&bytes, &source.label(), format)
            }
            TextureSource::Embedded {
                label,
                bytes,
                mime_type,
            } => {
                let format = mime_type.as_deref().and_then(ImageFormat::from_mime_type);
                decode(bytes, label, format)
            }
        }
    }
}

/// Decodes `bytes`, guessing the format when `format` is `None`.
pub fn decode(
    bytes: &[u8],
    label: &str,
    format: Option<ImageFormat>,
) -> Result<DecodedImage, ResourceLoadError> {
    let img = match format {
        None => image::load_from_memory(bytes),
        Some(fmt) => load_from_memory_with_format(bytes, fmt),
    }
    .map_err(|source| ResourceLoadError::Decode {
        label: label.to_string(),
        source,
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("can't read {}", path.display()))
}

pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("can't read {}", path.display()))
}
