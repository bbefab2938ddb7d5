//! Texture staging and GPU upload.
//!
//! Decoded images arrive on the main thread through asset completions and are
//! staged in a [`TextureStore`]. [`GpuTextures`] drains the store before each
//! frame, uploads with mipmaps and hands out views by texture source. Sources
//! that have not arrived yet resolve to a white texel so meshes render
//! untextured until their image is ready.

use std::collections::{HashMap, HashSet};

use orrery_assets::{CubeTextureData, TextureData};
use orrery_materials::TextureRef;

/// Errors that can occur during texture creation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("cube texture needs 6 faces, got {0}")]
    CubeFaceCount(usize),
}

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    (width.max(height).max(1) as f32).log2().floor() as u32 + 1
}

/// Decoded textures waiting for upload, keyed by their source reference.
#[derive(Debug, Default)]
pub struct TextureStore {
    staged: Vec<(String, TextureData)>,
    staged_cube: Option<CubeTextureData>,
    loaded: HashSet<String>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `texture` under `source`. A later insert for the same source
    /// replaces the earlier one on upload.
    pub fn insert(&mut self, source: impl Into<String>, texture: TextureData) {
        let source = source.into();
        self.loaded.insert(source.clone());
        self.staged.push((source, texture));
    }

    /// Stages the background cube texture.
    pub fn insert_cube(&mut self, cube: CubeTextureData) {
        self.staged_cube = Some(cube);
    }

    /// Whether `source` has ever been staged.
    pub fn is_loaded(&self, source: &str) -> bool {
        self.loaded.contains(source)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty() || self.staged_cube.is_some()
    }

    pub fn take_staged(&mut self) -> Vec<(String, TextureData)> {
        std::mem::take(&mut self.staged)
    }

    pub fn take_cube(&mut self) -> Option<CubeTextureData> {
        self.staged_cube.take()
    }
}

/// An uploaded 2D texture.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub dimensions: (u32, u32),
    pub mip_level_count: u32,
}

/// WGSL shader for mipmap generation via fullscreen blit.
const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    // Full-screen triangle
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

/// Uploaded scene textures plus the shared repeat sampler.
pub struct GpuTextures {
    textures: HashMap<String, GpuTexture>,
    white: GpuTexture,
    sampler: wgpu::Sampler,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    generation: u64,
}

impl GpuTextures {
    /// Scene textures are sRGB color data.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene-texture-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("blit-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
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

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });

        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit-pipeline-layout"),
            bind_group_layouts: &[&blit_bind_group_layout],
            immediate_size: 0,
        });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mipmap-pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: Self::FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = create_texture(device, queue, "white-texel", &TextureData::white(), 1);

        Self {
            textures: HashMap::new(),
            white,
            sampler,
            blit_pipeline,
            blit_bind_group_layout,
            blit_sampler,
            generation: 0,
        }
    }

    /// Uploads `data` under `name`, replacing any earlier texture of that name.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &TextureData,
    ) -> Result<(), TextureError> {
        validate(data)?;

        let mip_levels = mip_level_count(data.width, data.height);
        let texture = create_texture(device, queue, name, data, mip_levels);
        if mip_levels > 1 {
            self.generate_mipmaps(device, queue, &texture.texture, mip_levels);
        }

        log::info!(
            "Uploaded texture '{name}' ({}x{}, {mip_levels} mips)",
            data.width,
            data.height
        );
        self.textures.insert(name.to_string(), texture);
        self.generation += 1;
        Ok(())
    }

    /// Uploads everything staged in `store`. Returns the number uploaded.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        store: &mut TextureStore,
    ) -> usize {
        let mut uploaded = 0;
        for (name, data) in store.take_staged() {
            match self.upload(device, queue, &name, &data) {
                Ok(()) => uploaded += 1,
                Err(err) => log::warn!("Skipping texture '{name}': {err}"),
            }
        }
        uploaded
    }

    /// View for `reference`, or the white texel when it is absent or not
    /// uploaded yet.
    pub fn view(&self, reference: Option<&TextureRef>) -> &wgpu::TextureView {
        reference
            .and_then(|r| self.textures.get(&r.source))
            .map_or(&self.white.view, |t| &t.view)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&GpuTexture> {
        self.textures.get(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Repeat-wrapping linear sampler shared by all scene textures.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Bumped on every upload; bind groups built against an older generation
    /// may still point at the white fallback.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fill mip levels 1.. by repeatedly blitting the previous level.
    fn generate_mipmaps(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        mip_count: u32,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.blit_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn validate(data: &TextureData) -> Result<(), TextureError> {
    if data.width == 0 || data.height == 0 {
        return Err(TextureError::ZeroDimensions {
            width: data.width,
            height: data.height,
        });
    }
    let expected = data.width as usize * data.height as usize * 4;
    if data.rgba.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.rgba.len(),
            expected,
            width: data.width,
            height: data.height,
        });
    }
    Ok(())
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    data: &TextureData,
    mip_levels: u32,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(name),
        size,
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: GpuTextures::FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.width * 4),
            rows_per_image: None,
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        dimensions: (data.width, data.height),
        mip_level_count: mip_levels,
    }
}

/// Create a test GPU device and queue. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}
