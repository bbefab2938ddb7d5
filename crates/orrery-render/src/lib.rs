//! wgpu rendering of an orrery scene graph: device and surface setup, mesh
//! upload, textures, the cube-map background and the lit scene pass.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod renderer;
pub mod shader;
pub mod skybox;
pub mod texture;

pub use buffer::{BufferAllocator, MeshBuffer, Vertex, vertices_from_mesh};
pub use camera::Camera;
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{FrameEncoder, RenderPassBuilder, clear_color};
pub use pipeline::{
    BlendMode, FrameUniform, MAX_POINT_LIGHTS, ObjectUniform, PipelineKey, ScenePipelines,
};
pub use renderer::{DrawList, SceneRenderer, build_draw_list};
pub use shader::SCENE_SHADER_SOURCE;
pub use skybox::SkyboxRenderer;
pub use texture::{GpuTextures, TextureError, TextureStore, mip_level_count};
