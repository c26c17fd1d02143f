//! Per-primitive GPU buffers

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::animation::MAX_JOINTS;
use crate::document::{Primitive, Vertex};

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // normal
    2 => Float32x2, // uv
    3 => Float32x4, // joints
    4 => Float32x4, // weights
];

/// Vertex buffer layout matching the document's interleaved format.
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// GPU-side resources for one primitive, uploaded once at load.
///
/// Every mesh owns a full-capacity bone uniform so the bind group can be
/// resolved once here instead of per frame. Unskinned meshes keep the
/// identity matrices it is initialized with.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
    bone_buffer: wgpu::Buffer,
    bone_bind_group: wgpu::BindGroup,
    pub node: usize,
    pub skin: Option<usize>,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        primitive: &Primitive,
        bones_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&primitive.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = primitive.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let draw_count = primitive
            .indices
            .as_ref()
            .map(|i| i.len() as u32)
            .unwrap_or(primitive.vertices.len() as u32);

        let identity = [Mat4::IDENTITY; MAX_JOINTS];
        let bone_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_bones"),
            contents: bytemuck::cast_slice(&identity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bone_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bones_bind_group"),
            layout: bones_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: bone_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            draw_count,
            bone_buffer,
            bone_bind_group,
            node: primitive.node,
            skin: primitive.skin,
        }
    }

    /// Upload this frame's bone matrices, identity-padding the unused
    /// tail of the fixed-capacity uniform.
    pub fn write_bones(&self, queue: &wgpu::Queue, matrices: &[Mat4]) {
        let mut bones = [Mat4::IDENTITY; MAX_JOINTS];
        for (slot, matrix) in bones.iter_mut().zip(matrices) {
            *slot = *matrix;
        }
        queue.write_buffer(&self.bone_buffer, 0, bytemuck::cast_slice(&bones));
    }

    /// Issue one draw, indexed or not per the source primitive.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_bind_group(1, &self.bone_bind_group, &[]);
        match &self.index_buffer {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.draw_count, 0, 0..1);
            }
            None => pass.draw(0..self.draw_count, 0..1),
        }
    }
}
