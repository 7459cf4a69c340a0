//! Per-material GPU state: a diffuse image binding or a flat colour.

use crate::{context::GpuUpload, data_structures::texture::Texture, error::ResourceLoadError};

/// A decoded image: tightly packed RGBA8 rows, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    /// Checks that `pixels` holds exactly `width * height` RGBA8 texels.
    pub fn validate(&self) -> Result<(), ResourceLoadError> {
        let expected = Self::expected_len(self.width, self.height);
        if self.pixels.len() != expected {
            return Err(ResourceLoadError::PixelBufferSize {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

/// A diffuse texture on the GPU with the bind group the scene pipeline samples it through.
#[derive(Debug)]
pub struct GpuImage {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

/// A material is either textured or flat coloured, never both.
///
/// The shader blends the sampled texel towards [`override_color`](Self::override_color)
/// by its alpha, so the image variant reports all zeros and the flat variant its
/// opaque colour.
#[derive(Debug)]
pub enum MaterialResource<T = GpuImage> {
    Image { image: T, width: u32, height: u32 },
    Flat { color: [f32; 4] },
}

impl<T> MaterialResource<T> {
    /// Uploads `image` as this material's diffuse texture.
    pub fn create_from_image<U>(
        uploader: &mut U,
        label: &str,
        image: &DecodedImage,
    ) -> Result<Self, ResourceLoadError>
    where
        U: GpuUpload<Image = T> + ?Sized,
    {
        image.validate()?;
        Ok(MaterialResource::Image {
            image: uploader.upload_image(label, image),
            width: image.width,
            height: image.height,
        })
    }

    pub fn create_flat(color: [f32; 4]) -> Self {
        MaterialResource::Flat { color }
    }

    pub fn override_color(&self) -> [f32; 4] {
        match self {
            MaterialResource::Image { .. } => [0.0; 4],
            MaterialResource::Flat { color } => *color,
        }
    }

    pub fn image(&self) -> Option<&T> {
        match self {
            MaterialResource::Image { image, .. } => Some(image),
            MaterialResource::Flat { .. } => None,
        }
    }

    pub fn flat_color(&self) -> Option<[f32; 4]> {
        match self {
            MaterialResource::Image { .. } => None,
            MaterialResource::Flat { color } => Some(*color),
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            MaterialResource::Image { width, height, .. } => Some((*width, *height)),
            MaterialResource::Flat { .. } => None,
        }
    }
}

impl MaterialResource<GpuImage> {
    /// Binds this material's texture at `group`, or `placeholder` for flat materials.
    pub fn bind<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'_>,
        group: u32,
        placeholder: &'a GpuImage,
    ) {
        let image = self.image().unwrap_or(placeholder);
        render_pass.set_bind_group(group, &image.bind_group, &[]);
    }
}
