//! Scene pipelines and the uniforms they read.
//!
//! One pipeline exists per (side, blend) pair; the shading model is selected
//! inside the shader from the per-object uniform, so switching between lit
//! and unlit materials never changes pipeline state.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orrery_materials::{MaterialGpuData, MaterialSpec, Side};
use orrery_scene::{Light, SceneGraph};

use crate::buffer::Vertex;
use crate::camera::Camera;
use crate::depth::DepthBuffer;
use crate::shader::SCENE_SHADER_SOURCE;

/// Point lights beyond this count are ignored.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Per-frame uniform (group 0). 272 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub camera_forward: [f32; 4],
    /// Summed ambient radiance, linear RGB.
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// x = fog near, y = fog far, z = fog enabled, w = point light count.
    pub params: [f32; 4],
    /// xyz = position, w = falloff distance.
    pub point_positions: [[f32; 4]; MAX_POINT_LIGHTS],
    /// Linear RGB premultiplied by intensity.
    pub point_colors: [[f32; 4]; MAX_POINT_LIGHTS],
}

impl FrameUniform {
    pub fn new(camera: &Camera, scene: &SceneGraph) -> Self {
        let mut uniform = Self::zeroed();
        uniform.view_proj = camera.view_projection_matrix().to_cols_array_2d();
        uniform.camera_position = camera.position.extend(1.0).to_array();
        uniform.camera_forward = camera.forward().extend(0.0).to_array();

        let mut ambient = Vec3::ZERO;
        let mut point_count = 0;
        for light in scene.lights() {
            match light {
                Light::Ambient { color, intensity } => {
                    ambient += Vec3::from(color.to_linear()) * *intensity;
                }
                Light::Point {
                    color,
                    intensity,
                    position,
                    distance,
                } => {
                    if point_count == MAX_POINT_LIGHTS {
                        log::warn!("more than {MAX_POINT_LIGHTS} point lights, extras ignored");
                        continue;
                    }
                    uniform.point_positions[point_count] = position.extend(*distance).to_array();
                    uniform.point_colors[point_count] =
                        (Vec3::from(color.to_linear()) * *intensity).extend(1.0).to_array();
                    point_count += 1;
                }
            }
        }
        uniform.ambient = ambient.extend(1.0).to_array();

        let (fog_near, fog_far, fog_enabled) = match scene.fog() {
            Some(fog) => {
                uniform.fog_color = Vec3::from(fog.color.to_linear()).extend(1.0).to_array();
                (fog.near, fog.far, 1.0)
            }
            None => (0.0, 0.0, 0.0),
        };
        uniform.params = [fog_near, fog_far, fog_enabled, point_count as f32];
        uniform
    }
}

/// Per-object uniform (group 1, binding 0). 176 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    pub material: MaterialGpuData,
}

impl ObjectUniform {
    pub fn new(world: Mat4, material: &MaterialSpec) -> Self {
        // Zero scale collapses the mesh anyway; keep the normals finite.
        let normal_matrix = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            material: MaterialGpuData::from(material),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    Transparent,
}

impl BlendMode {
    pub fn from_material(material: &MaterialSpec) -> Self {
        if material.transparent {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }

    fn blend_state(self) -> Option<wgpu::BlendState> {
        match self {
            Self::Opaque => None,
            Self::Transparent => Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }
}

/// Fixed-function state that differs between draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub side: Side,
    pub blend: BlendMode,
}

impl PipelineKey {
    pub const ALL: [PipelineKey; 6] = [
        PipelineKey::new(Side::Front, BlendMode::Opaque),
        PipelineKey::new(Side::Back, BlendMode::Opaque),
        PipelineKey::new(Side::Double, BlendMode::Opaque),
        PipelineKey::new(Side::Front, BlendMode::Transparent),
        PipelineKey::new(Side::Back, BlendMode::Transparent),
        PipelineKey::new(Side::Double, BlendMode::Transparent),
    ];

    pub const fn new(side: Side, blend: BlendMode) -> Self {
        Self { side, blend }
    }

    pub fn for_material(material: &MaterialSpec) -> Self {
        Self::new(material.side, BlendMode::from_material(material))
    }
}

/// Faces are wound counter-clockwise; the rendered side decides what to cull.
pub fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

/// All scene pipelines plus the bind group layouts they share.
pub struct ScenePipelines {
    pub frame_layout: wgpu::BindGroupLayout,
    pub object_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ScenePipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-frame-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<FrameUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-object-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<ObjectUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            immediate_size: 0,
        });

        let pipelines = PipelineKey::ALL
            .into_iter()
            .map(|key| {
                let pipeline = create_pipeline(device, &layout, &shader, surface_format, key);
                (key, pipeline)
            })
            .collect();

        log::info!("Scene pipelines created for {surface_format:?}");

        Self {
            frame_layout,
            object_layout,
            pipelines,
        }
    }

    pub fn get(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&key)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let label = format!("scene-pipeline-{:?}-{:?}", key.side, key.blend);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: cull_mode(key.side),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: DepthBuffer::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: key.blend.blend_state(),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_materials::Color;
    use orrery_scene::Fog;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 272);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
    }

    #[test]
    fn test_pipeline_keys_are_distinct() {
        let unique: std::collections::HashSet<_> = PipelineKey::ALL.iter().collect();
        assert_eq!(unique.len(), PipelineKey::ALL.len());
    }

    #[test]
    fn test_cull_modes() {
        assert_eq!(cull_mode(Side::Front), Some(wgpu::Face::Back));
        assert_eq!(cull_mode(Side::Back), Some(wgpu::Face::Front));
        assert_eq!(cull_mode(Side::Double), None);
    }

    #[test]
    fn test_blend_mode_follows_transparency() {
        let mut material = MaterialSpec::default();
        assert_eq!(BlendMode::from_material(&material), BlendMode::Opaque);
        material.transparent = true;
        assert_eq!(BlendMode::from_material(&material), BlendMode::Transparent);
        assert_eq!(
            PipelineKey::for_material(&material),
            PipelineKey::new(Side::Front, BlendMode::Transparent)
        );
    }

    #[test]
    fn test_frame_uniform_collects_lights_and_fog() {
        let mut scene = SceneGraph::new();
        scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 0.5,
        });
        scene.add_light(Light::Point {
            color: Color::WHITE,
            intensity: 2.0,
            position: Vec3::new(0.0, 10.0, 0.0),
            distance: 0.0,
        });
        scene.set_fog(Fog {
            color: Color::BLACK,
            near: 10.0,
            far: 500.0,
        });

        let uniform = FrameUniform::new(&Camera::default(), &scene);
        assert_eq!(uniform.params, [10.0, 500.0, 1.0, 1.0]);
        assert!((uniform.ambient[0] - 0.5).abs() < 1e-6);
        assert_eq!(uniform.point_positions[0], [0.0, 10.0, 0.0, 0.0]);
        assert!((uniform.point_colors[0][1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_extra_point_lights_are_dropped() {
        let mut scene = SceneGraph::new();
        for i in 0..6 {
            scene.add_light(Light::Point {
                color: Color::WHITE,
                intensity: 1.0,
                position: Vec3::splat(i as f32),
                distance: 0.0,
            });
        }
        let uniform = FrameUniform::new(&Camera::default(), &scene);
        assert_eq!(uniform.params[3], MAX_POINT_LIGHTS as f32);
        assert_eq!(uniform.params[2], 0.0);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniform = ObjectUniform::new(world, &MaterialSpec::default());
        let normal = Mat4::from_cols_array_2d(&uniform.normal_matrix);
        assert!((normal.x_axis.x - 0.5).abs() < 1e-6);

        let collapsed = ObjectUniform::new(Mat4::from_scale(Vec3::ZERO), &MaterialSpec::default());
        assert_eq!(collapsed.normal_matrix, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_all_pipelines_build() {
        let Some((device, _queue)) = crate::texture::create_test_device_queue() else {
            return;
        };
        let pipelines = ScenePipelines::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(pipelines.len(), PipelineKey::ALL.len());
        assert!(
            pipelines
                .get(PipelineKey::new(Side::Double, BlendMode::Transparent))
                .is_some()
        );
    }
}
