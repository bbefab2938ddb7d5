//! Skybox renderer: draws a cube texture behind all scene geometry.
//!
//! Uses a fullscreen triangle with inverse view-projection to sample the cube.
//! Until faces are uploaded nothing is drawn and the pass clear shows through.

use bytemuck::{Pod, Zeroable};
use orrery_assets::CubeTextureData;

use crate::buffer::BufferAllocator;
use crate::depth::DepthBuffer;
use crate::texture::TextureError;

const CUBE_FACES: u32 = 6;

/// Uniform buffer for the skybox: inverse view-projection matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyboxUniform {
    /// Inverse view-projection matrix (rotation only, no translation).
    pub inv_view_proj: [[f32; 4]; 4],
}

/// WGSL shader source for the skybox pass.
pub const SKYBOX_SHADER_SOURCE: &str = r#"
struct SkyboxUniform {
    inv_view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> skybox: SkyboxUniform;

@group(1) @binding(0)
var skybox_texture: texture_cube<f32>;
@group(1) @binding(1)
var skybox_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) view_dir: vec3<f32>,
};

@vertex
fn vs_skybox(@builtin(vertex_index) idx: u32) -> VertexOutput {
    // Fullscreen triangle
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = uv * 2.0 - 1.0;

    // Reverse-Z: depth 0 is the far plane.
    let clip_far = vec4<f32>(ndc.x, ndc.y, 0.0, 1.0);
    let world = skybox.inv_view_proj * clip_far;

    var out: VertexOutput;
    out.position = vec4<f32>(ndc.x, ndc.y, 0.0, 1.0);
    out.view_dir = world.xyz / world.w;
    return out;
}

@fragment
fn fs_skybox(in: VertexOutput) -> @location(0) vec4<f32> {
    // Face images are authored for a mirrored X axis.
    let dir = normalize(in.view_dir);
    let color = textureSample(skybox_texture, skybox_sampler, vec3<f32>(-dir.x, dir.y, dir.z));
    return vec4<f32>(color.rgb, 1.0);
}
"#;

/// GPU skybox renderer for a six-face cube texture.
pub struct SkyboxRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cubemap_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    cubemap_bind_group: Option<wgpu::BindGroup>,
}

impl SkyboxRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox-shader"),
            source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER_SOURCE.into()),
        });

        // Uniform bind group layout (group 0)
        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(64),
                },
                count: None,
            }],
        });

        // Cubemap bind group layout (group 1)
        let cubemap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-cubemap-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox-pipeline-layout"),
            bind_group_layouts: &[&uniform_bgl, &cubemap_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_skybox"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Shares the scene pass; drawn first and never occludes.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_skybox"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = BufferAllocator::new(device).create_uniform(
            "skybox-uniform",
            &SkyboxUniform {
                inv_view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            },
        );

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-uniform-bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            cubemap_layout,
            sampler,
            cubemap_bind_group: None,
        }
    }

    /// Uploads the six faces, replacing any earlier cube.
    pub fn set_cube_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cube: &CubeTextureData,
    ) -> Result<(), TextureError> {
        let face_size = validate_cube(cube)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox-cubemap"),
            size: wgpu::Extent3d {
                width: face_size,
                height: face_size,
                depth_or_array_layers: CUBE_FACES,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (i, face) in cube.faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: i as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &face.rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(face_size * 4),
                    rows_per_image: Some(face_size),
                },
                wgpu::Extent3d {
                    width: face_size,
                    height: face_size,
                    depth_or_array_layers: 1,
                },
            );
        }

        let cubemap_view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        self.cubemap_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-cubemap-bg"),
            layout: &self.cubemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));

        log::info!("Skybox cube texture uploaded: {face_size}x{face_size}, 6 faces");
        Ok(())
    }

    pub fn has_texture(&self) -> bool {
        self.cubemap_bind_group.is_some()
    }

    /// Update the skybox uniform with a new inverse view-projection matrix.
    ///
    /// The matrix should be rotation-only (strip translation from view matrix)
    /// so the skybox appears at infinite distance.
    pub fn update(&self, queue: &wgpu::Queue, inv_view_proj: glam::Mat4) {
        let uniform = SkyboxUniform {
            inv_view_proj: inv_view_proj.to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Draws the skybox if a cube texture is loaded. Call before scene geometry.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(cubemap_bind_group) = &self.cubemap_bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, cubemap_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Checks for six square faces of `cube.size` with full RGBA data. Returns
/// the face size.
pub fn validate_cube(cube: &CubeTextureData) -> Result<u32, TextureError> {
    let size = cube.size;
    if cube.faces.len() != CUBE_FACES as usize {
        return Err(TextureError::CubeFaceCount(cube.faces.len()));
    }
    if size == 0 {
        return Err(TextureError::ZeroDimensions {
            width: 0,
            height: 0,
        });
    }
    let expected = (size * size * 4) as usize;
    match cube.faces.iter().find(|f| f.rgba.len() != expected) {
        Some(face) => Err(TextureError::DataSizeMismatch {
            actual: face.rgba.len(),
            expected,
            width: size,
            height: size,
        }),
        None => Ok(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;
    use orrery_assets::TextureData;

    fn cube(size: u32) -> CubeTextureData {
        let face = TextureData {
            width: size,
            height: size,
            rgba: vec![128; (size * size * 4) as usize],
        };
        CubeTextureData {
            size,
            faces: vec![face; 6],
        }
    }

    #[test]
    fn test_uniform_is_one_matrix() {
        assert_eq!(std::mem::size_of::<SkyboxUniform>(), 64);
    }

    #[test]
    fn test_validate_cube() {
        assert_eq!(validate_cube(&cube(4)).unwrap(), 4);

        let mut five = cube(4);
        five.faces.pop();
        assert!(matches!(
            validate_cube(&five),
            Err(TextureError::CubeFaceCount(5))
        ));

        let mut short = cube(4);
        short.faces[2].rgba.truncate(12);
        assert!(matches!(
            validate_cube(&short),
            Err(TextureError::DataSizeMismatch { actual: 12, expected: 64, .. })
        ));

        assert!(matches!(
            validate_cube(&cube(0)),
            Err(TextureError::ZeroDimensions { .. })
        ));
    }

    #[test]
    fn test_cube_upload_enables_drawing() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut skybox = SkyboxRenderer::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert!(!skybox.has_texture());
        skybox.set_cube_texture(&device, &queue, &cube(4)).unwrap();
        assert!(skybox.has_texture());
    }

    #[test]
    fn test_short_face_is_rejected() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut skybox = SkyboxRenderer::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb);
        let mut bad = cube(4);
        bad.faces[3].rgba.truncate(8);
        assert!(matches!(
            skybox.set_cube_texture(&device, &queue, &bad),
            Err(TextureError::DataSizeMismatch { actual: 8, .. })
        ));
        assert!(!skybox.has_texture());
    }
}
