//! Draws a [`SceneGraph`] to the window surface.
//!
//! Each frame the visible mesh nodes are split into opaque and transparent
//! draws. Opaque draws keep scene order; transparent draws are sorted far to
//! near by the view depth of their world-space bounding center. GPU buffers
//! are created the first time a node is drawn and kept for its lifetime.

use std::collections::HashMap;

use bytemuck::Zeroable;
use glam::Mat4;
use orrery_materials::MaterialSpec;
use orrery_scene::{NodeId, SceneGraph};

use crate::buffer::{BufferAllocator, MeshBuffer};
use crate::camera::Camera;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::pass::{FrameEncoder, RenderPassBuilder, clear_color};
use crate::pipeline::{BlendMode, FrameUniform, ObjectUniform, PipelineKey, ScenePipelines};
use crate::skybox::SkyboxRenderer;
use crate::texture::{GpuTextures, TextureStore};

/// One mesh node scheduled for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub world: Mat4,
    pub key: PipelineKey,
    /// Distance of the bounding center along the camera's forward axis.
    pub depth: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawList {
    pub opaque: Vec<DrawItem>,
    pub transparent: Vec<DrawItem>,
}

impl DrawList {
    /// Opaque draws first, then transparent.
    pub fn iter(&self) -> impl Iterator<Item = &DrawItem> {
        self.opaque.iter().chain(&self.transparent)
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

/// Collects visible meshes in draw order.
pub fn build_draw_list(scene: &SceneGraph, camera: &Camera) -> DrawList {
    let forward = camera.forward();
    let mut list = DrawList::default();

    for visited in scene.traverse() {
        let Some(mesh) = visited.node.as_mesh() else {
            continue;
        };
        let (center, _) = mesh.geometry.bounding_sphere();
        let world_center = visited.world.transform_point3(center);
        let item = DrawItem {
            node: visited.id,
            world: visited.world,
            key: PipelineKey::for_material(&mesh.material),
            depth: (world_center - camera.position).dot(forward),
        };
        match item.key.blend {
            BlendMode::Opaque => list.opaque.push(item),
            BlendMode::Transparent => list.transparent.push(item),
        }
    }

    // Stable, so equal depths keep scene order.
    list.transparent
        .sort_by(|a, b| b.depth.total_cmp(&a.depth));
    list
}

struct GpuMesh {
    buffer: MeshBuffer,
    object_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_generation: u64,
}

/// Owns every GPU resource needed to draw a scene.
pub struct SceneRenderer {
    pipelines: ScenePipelines,
    textures: GpuTextures,
    skybox: SkyboxRenderer,
    depth: DepthBuffer,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    meshes: HashMap<NodeId, GpuMesh>,
}

impl SceneRenderer {
    pub fn new(ctx: &RenderContext) -> Self {
        let device = &ctx.device;
        let pipelines = ScenePipelines::new(device, ctx.surface_format);
        let textures = GpuTextures::new(device, &ctx.queue);
        let skybox = SkyboxRenderer::new(device, ctx.surface_format);
        let (width, height) = ctx.size();
        let depth = DepthBuffer::new(device, width, height);

        let frame_buffer = BufferAllocator::new(device)
            .create_uniform("scene-frame-uniform", &FrameUniform::zeroed());
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-frame-bg"),
            layout: &pipelines.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipelines,
            textures,
            skybox,
            depth,
            frame_buffer,
            frame_bind_group,
            meshes: HashMap::new(),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    /// Uploads textures and the background cube staged since the last call.
    pub fn sync_textures(&mut self, ctx: &RenderContext, store: &mut TextureStore) -> usize {
        let mut uploaded = self.textures.sync(&ctx.device, &ctx.queue, store);
        if let Some(cube) = store.take_cube() {
            match self.skybox.set_cube_texture(&ctx.device, &ctx.queue, &cube) {
                Ok(()) => uploaded += 1,
                Err(err) => log::warn!("Skipping background cube texture: {err}"),
            }
        }
        uploaded
    }

    /// Renders one frame and presents it.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] when no surface texture could be acquired;
    /// the caller decides whether to skip the frame or exit.
    pub fn render(
        &mut self,
        ctx: &RenderContext,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> Result<(), SurfaceError> {
        let surface_texture = ctx.get_current_texture()?;
        let (width, height) = ctx.size();
        self.depth.resize(&ctx.device, width, height);

        let frame = FrameUniform::new(camera, scene);
        ctx.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));
        self.skybox.update(&ctx.queue, camera.skybox_matrix());

        let draws = build_draw_list(scene, camera);
        self.prepare_meshes(ctx, scene, &draws);

        let mut frame_encoder = FrameEncoder::new(&ctx.device, ctx.queue.clone(), surface_texture);
        let builder = RenderPassBuilder::new()
            .clear_color(clear_color(scene.background()))
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("scene-pass");

        if let Some(mut pass) = frame_encoder.begin_render_pass(&builder) {
            self.skybox.render(&mut pass);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for item in draws.iter() {
                let (Some(mesh), Some(pipeline)) =
                    (self.meshes.get(&item.node), self.pipelines.get(item.key))
                else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &mesh.bind_group, &[]);
                mesh.buffer.bind(&mut pass);
                mesh.buffer.draw(&mut pass);
            }
        }

        frame_encoder.submit();
        Ok(())
    }

    /// Number of nodes with uploaded buffers.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn textures(&self) -> &GpuTextures {
        &self.textures
    }

    /// Creates missing buffers, writes object uniforms and rebinds meshes
    /// whose textures changed since their bind group was built.
    fn prepare_meshes(&mut self, ctx: &RenderContext, scene: &SceneGraph, draws: &DrawList) {
        let generation = self.textures.generation();
        for item in draws.iter() {
            let Some(mesh) = scene.get(item.node).and_then(|n| n.as_mesh()) else {
                continue;
            };
            let uniform = ObjectUniform::new(item.world, &mesh.material);

            match self.meshes.get_mut(&item.node) {
                Some(gpu) => {
                    ctx.queue
                        .write_buffer(&gpu.object_buffer, 0, bytemuck::bytes_of(&uniform));
                    if gpu.texture_generation != generation {
                        gpu.bind_group = object_bind_group(
                            &ctx.device,
                            &self.pipelines,
                            &self.textures,
                            &gpu.object_buffer,
                            &mesh.material,
                        );
                        gpu.texture_generation = generation;
                    }
                }
                None => {
                    let data = mesh.geometry.tessellate();
                    if data.indices.is_empty() {
                        continue;
                    }
                    let label = scene.get(item.node).map_or("mesh", |n| n.name.as_str());
                    let allocator = BufferAllocator::new(&ctx.device);
                    let buffer = allocator.create_mesh(label, &data);
                    let object_buffer =
                        allocator.create_uniform(&format!("{label}-object"), &uniform);
                    let bind_group = object_bind_group(
                        &ctx.device,
                        &self.pipelines,
                        &self.textures,
                        &object_buffer,
                        &mesh.material,
                    );
                    log::debug!(
                        "Uploaded mesh '{label}' ({} vertices, {} indices)",
                        data.vertex_count(),
                        data.indices.len()
                    );
                    self.meshes.insert(
                        item.node,
                        GpuMesh {
                            buffer,
                            object_buffer,
                            bind_group,
                            texture_generation: generation,
                        },
                    );
                }
            }
        }
    }
}

fn object_bind_group(
    device: &wgpu::Device,
    pipelines: &ScenePipelines,
    textures: &GpuTextures,
    object_buffer: &wgpu::Buffer,
    material: &MaterialSpec,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene-object-bg"),
        layout: &pipelines.object_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: object_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(
                    textures.view(material.texture.as_ref()),
                ),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(textures.view(material.bump_map())),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(textures.sampler()),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orrery_geometry::disk;
    use orrery_materials::Side;
    use orrery_scene::{Node, Transform};

    fn transparent() -> MaterialSpec {
        MaterialSpec {
            transparent: true,
            opacity: 0.5,
            ..MaterialSpec::default()
        }
    }

    fn camera_at_z(z: f32) -> Camera {
        Camera {
            position: Vec3::new(0.0, 0.0, z),
            ..Camera::default()
        }
    }

    fn disk_at(name: &str, z: f32, material: MaterialSpec) -> Node {
        Node::mesh(name, disk(1.0, 8), material)
            .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, z)))
    }

    #[test]
    fn test_opaque_keeps_scene_order() {
        let mut scene = SceneGraph::new();
        let near = scene.add(disk_at("near", 5.0, MaterialSpec::default()));
        let far = scene.add(disk_at("far", -50.0, MaterialSpec::default()));

        let list = build_draw_list(&scene, &camera_at_z(10.0));
        let order: Vec<_> = list.opaque.iter().map(|d| d.node).collect();
        assert_eq!(order, vec![near, far]);
        assert!(list.transparent.is_empty());
    }

    #[test]
    fn test_transparent_sorted_far_to_near() {
        let mut scene = SceneGraph::new();
        let near = scene.add(disk_at("near", 5.0, transparent()));
        let far = scene.add(disk_at("far", -50.0, transparent()));
        let mid = scene.add(disk_at("mid", -10.0, transparent()));

        let list = build_draw_list(&scene, &camera_at_z(10.0));
        let order: Vec<_> = list.transparent.iter().map(|d| d.node).collect();
        assert_eq!(order, vec![far, mid, near]);
        assert!((list.transparent[0].depth - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_equal_depth_keeps_insertion_order() {
        let mut scene = SceneGraph::new();
        let a = scene.add(disk_at("a", 0.0, transparent()));
        let b = scene.add(disk_at("b", 0.0, transparent()));
        let list = build_draw_list(&scene, &camera_at_z(10.0));
        let order: Vec<_> = list.transparent.iter().map(|d| d.node).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_hidden_and_group_nodes_are_skipped() {
        let mut scene = SceneGraph::new();
        let mut hidden = disk_at("hidden", 0.0, MaterialSpec::default());
        hidden.visible = false;
        scene.add(hidden);
        let group = scene.add(Node::group("pivot"));
        let child = scene
            .add_child(group, disk_at("child", 0.0, transparent()))
            .unwrap();

        let list = build_draw_list(&scene, &camera_at_z(10.0));
        assert_eq!(list.len(), 1);
        assert_eq!(list.transparent[0].node, child);
    }

    #[test]
    fn test_draw_keys_carry_side() {
        let mut scene = SceneGraph::new();
        scene.add(disk_at(
            "double",
            0.0,
            MaterialSpec {
                side: Side::Double,
                ..MaterialSpec::default()
            },
        ));
        let list = build_draw_list(&scene, &camera_at_z(10.0));
        assert_eq!(
            list.opaque[0].key,
            PipelineKey::new(Side::Double, BlendMode::Opaque)
        );
    }

    #[test]
    fn test_child_depth_uses_world_position() {
        let mut scene = SceneGraph::new();
        let group = scene.add(
            Node::group("offset").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, -20.0))),
        );
        let child = scene
            .add_child(group, disk_at("child", -5.0, transparent()))
            .unwrap();
        let list = build_draw_list(&scene, &camera_at_z(10.0));
        assert_eq!(list.transparent[0].node, child);
        assert!((list.transparent[0].depth - 35.0).abs() < 1e-4);
    }
}
