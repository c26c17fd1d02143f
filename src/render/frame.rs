//! Per-frame rendering
//!
//! Owns every GPU resource derived from one loaded document: the
//! pipeline, the uploaded meshes, the frame uniform buffer and the feed
//! texture. All resources are created once at load; per frame only
//! uniform and bone buffer writes happen.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::animation::compute_bone_matrices;
use crate::document::Document;
use crate::render::mesh::GpuMesh;
use crate::render::pipeline::{DEPTH_FORMAT, FrameUniforms, ModelPipeline};
use crate::render::texture::FeedTexture;
use crate::scene::Pose;

const FOV_Y_DEGREES: f32 = 45.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
const EYE: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Fixed camera: eye on +Z looking at the origin, Y up.
fn view_projection(aspect: f32) -> Mat4 {
    let projection = Mat4::perspective_rh(
        FOV_Y_DEGREES.to_radians(),
        aspect.max(f32::EPSILON),
        NEAR_PLANE,
        FAR_PLANE,
    );
    let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y);
    projection * view
}

/// Matrices a mesh needs uploaded this frame. Unskinned meshes get
/// nothing: their buffer keeps the identity matrices it was created
/// with, so zero-weight vertices pass through unskinned.
fn bone_upload(document: &Document, pose: &Pose, skin: Option<usize>) -> Option<Vec<Mat4>> {
    skin.map(|skin| compute_bone_matrices(document, pose, &document.skins[skin]))
}

pub struct FrameRenderer {
    pipeline: ModelPipeline,
    uniform_buffer: wgpu::Buffer,
    feed: FeedTexture,
    frame_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl FrameRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        document: &Document,
        (width, height): (u32, u32),
    ) -> Self {
        let pipeline = ModelPipeline::new(device, surface_format);

        let uniforms = FrameUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let feed = FeedTexture::new(device, queue);
        let frame_bind_group =
            pipeline.create_frame_bind_group(device, &uniform_buffer, feed.view(), feed.sampler());

        let meshes = document
            .primitives
            .iter()
            .map(|primitive| GpuMesh::new(device, primitive, pipeline.bones_layout()))
            .collect::<Vec<_>>();
        log::info!("uploaded {} primitives", meshes.len());

        let depth_view = create_depth_view(device, width, height);

        Self {
            pipeline,
            uniform_buffer,
            feed,
            frame_bind_group,
            meshes,
            depth_view,
            depth_size: (width, height),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Apply one incoming pixel buffer to the feed texture, rebuilding
    /// the frame bind group when the texture was reallocated.
    pub fn update_feed(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) {
        if self.feed.update(device, queue, pixels, width, height, stride) {
            self.frame_bind_group = self.pipeline.create_frame_bind_group(
                device,
                &self.uniform_buffer,
                self.feed.view(),
                self.feed.sampler(),
            );
        }
    }

    /// Draw one frame of the posed document into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        (width, height): (u32, u32),
        document: &Document,
        pose: &Pose,
        rotation: f32,
    ) {
        if self.depth_size != (width, height) {
            self.depth_view = create_depth_view(device, width, height);
            self.depth_size = (width, height);
        }

        let aspect = width as f32 / height.max(1) as f32;
        let uniforms = FrameUniforms {
            view_proj: view_projection(aspect).to_cols_array_2d(),
            model: Mat4::from_rotation_y(rotation).to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        for mesh in &self.meshes {
            if let Some(bones) = bone_upload(document, pose, mesh.skin) {
                mesh.write_bones(queue, &bones);
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("model_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.pipeline.bind(&mut pass);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for mesh in &self.meshes {
                mesh.draw(&mut pass);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}
