//! Per-frame rendering of an imported scene.
//!
//! A frame is first planned on the CPU by [`plan_frame`]: one [`DrawCommand`]
//! per draw entry, in draw-list order, each carrying the world transform and
//! override colour its draw call needs. [`FrameRenderer::render_frame`] then
//! uploads the plan and records a single render pass: set the viewport, clear
//! colour and depth, bind the shared view-projection, and for every command
//! bind its uniform slot, its material and its geometry before issuing one
//! indexed draw. There is no batching or instancing.

use std::{iter, num::NonZeroU64};

use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraUniform, Projection, view_projection},
    data_structures::{
        geometry::GpuGeometry,
        material::GpuImage,
        texture::Texture,
    },
    error::ShaderCompileError,
    importer::ImportedScene,
    pipelines::scene::{camera_layout, draw_layout, mk_scene_pipeline},
};

/// Bind group 1 of the scene pipeline, one slot per draw call.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub world: [[f32; 4]; 4],
    pub override_color: [f32; 4],
}

// Must match the WGSL struct size.
const _: [(); 80] = [(); std::mem::size_of::<DrawUniform>()];

/// One draw call of a planned frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub mesh: usize,
    pub material: usize,
    pub uniform: DrawUniform,
}

/// Everything a frame uploads, computed without touching the GPU.
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub viewport: (u32, u32),
    pub camera: CameraUniform,
    pub draws: Vec<DrawCommand>,
}

/// Plans one frame of `scene` as seen by `camera` in a `viewport`-sized target.
///
/// The view and projection are derived on every call whether or not the camera
/// moved. Draw entries whose geometry or material is missing are skipped.
pub fn plan_frame<G, T>(
    viewport: (u32, u32),
    camera: &Camera,
    projection: &Projection,
    scene: &ImportedScene<G, T>,
) -> FramePlan {
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(view_projection(camera, projection, viewport));

    let draws = scene
        .draw_list
        .iter()
        .filter(|entry| scene.geometries.contains(entry.mesh))
        .filter_map(|entry| {
            let world = scene.world_transform(entry)?;
            let material = scene.materials.get(entry.material)?;
            Some(DrawCommand {
                mesh: entry.mesh,
                material: entry.material,
                uniform: DrawUniform {
                    world: world.into(),
                    override_color: material.override_color(),
                },
            })
        })
        .collect();

    FramePlan {
        viewport,
        camera: camera_uniform,
        draws,
    }
}

#[derive(Debug)]
pub struct FrameRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: usize,
    draw_stride: wgpu::BufferAddress,
    placeholder: GpuImage,
}

impl FrameRenderer {
    /// Builds the scene pipeline for `color_format` targets. `texture_layout` must
    /// be the layout material images were created with.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ShaderCompileError> {
        let camera_layout = camera_layout(device);
        let draw_layout = draw_layout(device);
        let pipeline = mk_scene_pipeline(
            device,
            color_format,
            &camera_layout,
            &draw_layout,
            texture_layout,
        )?;

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let draw_stride = wgpu::util::align_to(
            std::mem::size_of::<DrawUniform>() as wgpu::BufferAddress,
            device.limits().min_uniform_buffer_offset_alignment as wgpu::BufferAddress,
        );
        let draw_capacity = 1;
        let (draw_buffer, draw_bind_group) =
            create_draw_buffer(device, &draw_layout, draw_stride, draw_capacity);

        let placeholder =
            Texture::create_placeholder(device, queue).into_gpu_image(device, texture_layout, "placeholder");

        Ok(Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_capacity,
            draw_stride,
            placeholder,
        })
    }

    /// Renders one frame of `scene` into `color_view`, using `depth_view` as the
    /// depth buffer. Both must be at least `viewport` in size.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        viewport: (u32, u32),
        camera: &Camera,
        projection: &Projection,
        scene: &ImportedScene<GpuGeometry, GpuImage>,
        clear_colour: wgpu::Color,
    ) {
        let plan = plan_frame(viewport, camera, projection, scene);
        self.upload(device, queue, &plan);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let (width, height) = plan.viewport;
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for (slot, draw) in plan.draws.iter().enumerate() {
                let (Some(geometry), Some(material)) = (
                    scene.geometries.get(draw.mesh),
                    scene.materials.get(draw.material),
                ) else {
                    continue;
                };
                let offset = slot as wgpu::BufferAddress * self.draw_stride;
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset as wgpu::DynamicOffset]);
                material.bind(&mut render_pass, 2, &self.placeholder);
                geometry.draw(&mut render_pass);
            }
        }
        queue.submit(iter::once(encoder.finish()));
    }

    /// Writes the camera uniform and all draw uniforms, growing the draw buffer
    /// when the plan has more draws than it can hold.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, plan: &FramePlan) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[plan.camera]));
        if plan.draws.is_empty() {
            return;
        }

        if plan.draws.len() > self.draw_capacity {
            self.draw_capacity = plan.draws.len().next_power_of_two();
            let (buffer, bind_group) =
                create_draw_buffer(device, &self.draw_layout, self.draw_stride, self.draw_capacity);
            self.draw_buffer = buffer;
            self.draw_bind_group = bind_group;
        }

        let stride = self.draw_stride as usize;
        let mut bytes = vec![0u8; stride * plan.draws.len()];
        for (slot, draw) in bytes.chunks_exact_mut(stride).zip(&plan.draws) {
            let uniform = bytemuck::bytes_of(&draw.uniform);
            slot[..uniform.len()].copy_from_slice(uniform);
        }
        queue.write_buffer(&self.draw_buffer, 0, &bytes);
    }
}

fn create_draw_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: wgpu::BufferAddress,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw Uniform Buffer"),
        size: stride * capacity as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
            }),
        }],
        label: Some("draw_bind_group"),
    });
    (buffer, bind_group)
}
