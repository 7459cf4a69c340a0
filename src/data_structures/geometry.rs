//! Per-mesh GPU geometry.
//!
//! A [`GeometryResource`] is created once per unique mesh index during import and
//! never changes afterwards. Positions, texture coordinates and normals live in
//! three separate vertex buffers (shader locations 0, 1 and 2), indices in a
//! `u32` index buffer.

use crate::{context::GpuUpload, data_structures::scene_graph::MeshData, error::GeometryError};

/// GPU buffers of one mesh as created by [`GpuUploader`](crate::context::GpuUploader).
#[derive(Debug)]
pub struct GpuGeometry {
    pub positions: wgpu::Buffer,
    pub tex_coords: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub indices: wgpu::Buffer,
}

/// An uploaded mesh together with its element counts.
///
/// `G` is the handle type produced by the [`GpuUpload`] implementation, the wgpu
/// buffers in the viewer itself.
#[derive(Debug)]
pub struct GeometryResource<G = GpuGeometry> {
    pub buffers: G,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl<G> GeometryResource<G> {
    /// Validates `mesh` and uploads its four arrays.
    ///
    /// Nothing is uploaded when validation fails.
    pub fn create<U>(uploader: &mut U, mesh: &MeshData) -> Result<Self, GeometryError>
    where
        U: GpuUpload<Geometry = G> + ?Sized,
    {
        validate(mesh)?;
        let buffers = uploader.upload_geometry(&mesh.name, mesh);
        Ok(Self {
            buffers,
            vertex_count: mesh.vertex_count() as u32,
            index_count: mesh.indices.len() as u32,
        })
    }
}

impl GeometryResource<GpuGeometry> {
    /// Binds the vertex and index buffers and issues one indexed triangle-list draw.
    ///
    /// Pipeline, uniforms and texture must already be bound.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.buffers.positions.slice(..));
        render_pass.set_vertex_buffer(1, self.buffers.tex_coords.slice(..));
        render_pass.set_vertex_buffer(2, self.buffers.normals.slice(..));
        render_pass.set_index_buffer(self.buffers.indices.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Checks that the mesh is not empty, that every channel is present for every
/// vertex and that the indices form an in-range triangle list.
pub fn validate(mesh: &MeshData) -> Result<(), GeometryError> {
    let expected = mesh.vertex_count();
    // wgpu rejects empty buffer slices at draw time
    if expected == 0 || mesh.indices.is_empty() {
        return Err(GeometryError::Empty {
            vertices: expected,
            indices: mesh.indices.len(),
        });
    }
    let channels = [
        ("texture coordinate", mesh.tex_coords.len()),
        ("normal", mesh.normals.len()),
    ];
    for (channel, actual) in channels {
        if actual != expected {
            return Err(GeometryError::ChannelLength {
                channel,
                expected,
                actual,
            });
        }
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(GeometryError::NotTriangles(mesh.indices.len()));
    }
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= expected) {
        return Err(GeometryError::IndexOutOfRange {
            index,
            vertex_count: expected,
        });
    }
    Ok(())
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 0,
    format: wgpu::VertexFormat::Float32x3,
}];

const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 1,
    format: wgpu::VertexFormat::Float32x2,
}];

const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 2,
    format: wgpu::VertexFormat::Float32x3,
}];

/// Layouts of the three non-interleaved vertex buffers, in slot order.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    use std::mem;
    [
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEX_COORD_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        },
    ]
}
