use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::data_structures::{
    geometry::GpuGeometry,
    material::{DecodedImage, GpuImage},
    scene_graph::MeshData,
    texture::{self, Texture},
};

/// Creates GPU resources from decoded scene data.
///
/// The importer only talks to the GPU through this trait, which keeps it free of
/// a device handle and lets tests count uploads.
pub trait GpuUpload {
    type Geometry;
    type Image;

    /// Upload the four arrays of an already validated mesh.
    fn upload_geometry(&mut self, label: &str, mesh: &MeshData) -> Self::Geometry;

    /// Upload a tightly packed RGBA8 image.
    fn upload_image(&mut self, label: &str, image: &DecodedImage) -> Self::Image;
}

/// The wgpu implementation of [`GpuUpload`].
///
/// Uploads are synchronous queue writes; they complete before the first frame is
/// submitted.
pub struct GpuUploader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub texture_layout: &'a wgpu::BindGroupLayout,
}

impl GpuUpload for GpuUploader<'_> {
    type Geometry = GpuGeometry;
    type Image = GpuImage;

    fn upload_geometry(&mut self, label: &str, mesh: &MeshData) -> GpuGeometry {
        let buffer = |suffix: &str, contents: &[u8], usage: wgpu::BufferUsages| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} {suffix}")),
                    contents,
                    usage,
                })
        };
        GpuGeometry {
            positions: buffer(
                "Position Buffer",
                bytemuck::cast_slice(&mesh.positions),
                wgpu::BufferUsages::VERTEX,
            ),
            tex_coords: buffer(
                "Tex Coord Buffer",
                bytemuck::cast_slice(&mesh.tex_coords),
                wgpu::BufferUsages::VERTEX,
            ),
            normals: buffer(
                "Normal Buffer",
                bytemuck::cast_slice(&mesh.normals),
                wgpu::BufferUsages::VERTEX,
            ),
            indices: buffer(
                "Index Buffer",
                bytemuck::cast_slice(&mesh.indices),
                wgpu::BufferUsages::INDEX,
            ),
        }
    }

    fn upload_image(&mut self, label: &str, image: &DecodedImage) -> GpuImage {
        Texture::from_decoded(self.device, self.queue, image, Some(label)).into_gpu_image(
            self.device,
            self.texture_layout,
            label,
        )
    }
}

/// Window surface and GPU device shared by the importer and the renderer.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub texture_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, clear_colour: wgpu::Color) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scene-viewer device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("cannot open the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colours, so prefer an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // presentation waits for vertical sync
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let texture_layout = texture::diffuse_layout(&device);

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            texture_layout,
            clear_colour,
        })
    }

    pub fn uploader(&self) -> GpuUploader<'_> {
        GpuUploader {
            device: &self.device,
            queue: &self.queue,
            texture_layout: &self.texture_layout,
        }
    }

    /// Current framebuffer size in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface and depth buffer. Zero-sized requests (minimised
    /// windows) are ignored and report `false`.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }
}
