use std::num::NonZeroU64;

use crate::{
    data_structures::{geometry, texture::Texture},
    error::ShaderCompileError,
    render::DrawUniform,
};

/// Layout of bind group 0: the shared view-projection uniform.
pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

/// Layout of bind group 1: one [`DrawUniform`] per draw, selected by dynamic offset.
pub fn draw_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
            },
            count: None,
        }],
        label: Some("draw_bind_group_layout"),
    })
}

pub fn mk_scene_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    draw_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
) -> Result<wgpu::RenderPipeline, ShaderCompileError> {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[camera_layout, draw_layout, texture_layout],
        push_constant_ranges: &[],
    });

    let shader = compile_shader(
        device,
        wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        },
    )?;

    with_validation(device, "Scene Pipeline", || {
        mk_render_pipeline(
            device,
            &render_pipeline_layout,
            color_format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_FORMAT),
            &geometry::vertex_layouts(),
            &shader,
        )
    })
}

/// Compiles a shader module, logging every compiler message.
///
/// Errors reported by the compiler or by device validation are returned as
/// [`ShaderCompileError`].
pub fn compile_shader(
    device: &wgpu::Device,
    desc: wgpu::ShaderModuleDescriptor,
) -> Result<wgpu::ShaderModule, ShaderCompileError> {
    let label = desc.label.unwrap_or("shader").to_string();
    let module = with_validation(device, &label, || device.create_shader_module(desc))?;

    let info = futures::executor::block_on(module.get_compilation_info());
    let mut errors = Vec::new();
    for message in info.messages {
        match message.message_type {
            wgpu::CompilationMessageType::Error => errors.push(message.message),
            wgpu::CompilationMessageType::Warning => log::warn!("{}: {}", label, message.message),
            wgpu::CompilationMessageType::Info => log::info!("{}: {}", label, message.message),
        }
    }
    if !errors.is_empty() {
        let err = ShaderCompileError {
            label,
            message: errors.join("\n"),
        };
        log::error!("{}", err);
        return Err(err);
    }
    Ok(module)
}

/// Runs `create` inside a validation error scope.
fn with_validation<T>(
    device: &wgpu::Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> Result<T, ShaderCompileError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match futures::executor::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(e) => {
            let err = ShaderCompileError {
                label: label.to_string(),
                message: e.to_string(),
            };
            log::error!("{}", err);
            Err(err)
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Scene Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // imported meshes do not agree on a winding order
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
