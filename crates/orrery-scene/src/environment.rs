use glam::Vec3;
use orrery_materials::{Color, TextureRef};

/// Number of faces in a cube texture: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Omnidirectional light. `distance == 0` disables falloff.
    Point {
        color: Color,
        intensity: f32,
        position: Vec3,
        distance: f32,
    },
    Ambient { color: Color, intensity: f32 },
}

/// Linear fog: no fog before `near`, full fog color at `far`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Fog blend factor in `[0, 1]` at view distance `depth`.
    pub fn factor(&self, depth: f32) -> f32 {
        if self.far <= self.near {
            return if depth >= self.far { 1.0 } else { 0.0 };
        }
        ((depth - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Background {
    #[default]
    None,
    Color(Color),
    /// Cube map faces in `+X, -X, +Y, -Y, +Z, -Z` order.
    CubeTexture([TextureRef; CUBE_FACE_COUNT]),
}
