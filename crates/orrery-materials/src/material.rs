//! Core material types: [`Color`], [`MaterialSpec`], and [`MaterialGpuData`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// 24-bit sRGB color written as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const BLACK: Color = Color(0x000000);

    /// Components in `[0, 1]`, still sRGB encoded.
    pub fn to_srgb(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        [r, g, b]
    }

    /// Components converted to linear light for shading.
    pub fn to_linear(self) -> [f32; 3] {
        self.to_srgb().map(srgb_to_linear)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

// ---------------------------------------------------------------------------
// Enums and references
// ---------------------------------------------------------------------------

/// Which faces of a mesh are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Lighting model applied in the fragment shader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadingModel {
    /// Color/texture only, ignores lights.
    Unlit,
    /// Diffuse response with roughness/metalness attenuation.
    #[default]
    Standard,
    /// Diffuse plus Blinn-Phong specular highlight.
    Phong,
}

impl ShadingModel {
    /// Index passed to the shader.
    pub fn shader_index(self) -> u32 {
        match self {
            ShadingModel::Unlit => 0,
            ShadingModel::Standard => 1,
            ShadingModel::Phong => 2,
        }
    }
}

/// A texture by source (relative asset path or URL) and UV repeat factors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    pub source: String,
    pub repeat: [f32; 2],
}

impl TextureRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            repeat: [1.0, 1.0],
        }
    }

    pub fn repeated(mut self, x: f32, y: f32) -> Self {
        self.repeat = [x, y];
        self
    }
}

/// How the surface responds to light beyond its base color.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SurfaceResponse {
    #[default]
    Plain,
    /// Tinted glass look.
    Glass { roughness: f32, metalness: f32 },
    /// Height map perturbing the shading normal.
    Bumped { map: TextureRef, scale: f32 },
}

// ---------------------------------------------------------------------------
// MaterialError
// ---------------------------------------------------------------------------

/// Errors returned during material validation.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// A texture reference has an empty source.
    #[error("texture source must not be empty")]
    EmptyTextureSource,
}

// ---------------------------------------------------------------------------
// MaterialSpec
// ---------------------------------------------------------------------------

/// Full description of a primitive's surface.
///
/// `color: None` shades as white; when a texture is present the color tints it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub model: ShadingModel,
    pub color: Option<Color>,
    pub texture: Option<TextureRef>,
    pub side: Side,
    /// Enables alpha blending and back-to-front sorting.
    pub transparent: bool,
    /// 1.0 = fully opaque. Only applied when `transparent` is set.
    pub opacity: f32,
    pub surface: SurfaceResponse,
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self {
            model: ShadingModel::Standard,
            color: None,
            texture: None,
            side: Side::Front,
            transparent: false,
            opacity: 1.0,
            surface: SurfaceResponse::Plain,
        }
    }
}

impl MaterialSpec {
    /// Validates texture references and clamps numeric fields to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::EmptyTextureSource`] if any texture reference
    /// (base map or bump map) has an empty source.
    pub fn validated(mut self) -> Result<Self, MaterialError> {
        if self
            .texture
            .as_ref()
            .is_some_and(|t| t.source.is_empty())
        {
            return Err(MaterialError::EmptyTextureSource);
        }

        self.opacity = self.opacity.clamp(0.0, 1.0);
        match &mut self.surface {
            SurfaceResponse::Plain => {}
            SurfaceResponse::Glass {
                roughness,
                metalness,
            } => {
                *roughness = roughness.clamp(0.0, 1.0);
                *metalness = metalness.clamp(0.0, 1.0);
            }
            SurfaceResponse::Bumped { map, scale } => {
                if map.source.is_empty() {
                    return Err(MaterialError::EmptyTextureSource);
                }
                *scale = scale.max(0.0);
            }
        }
        Ok(self)
    }

    /// Opacity as drawn: 1.0 unless the material is transparent.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent { self.opacity } else { 1.0 }
    }

    /// The bump map, if the surface has one.
    pub fn bump_map(&self) -> Option<&TextureRef> {
        match &self.surface {
            SurfaceResponse::Bumped { map, .. } => Some(map),
            _ => None,
        }
    }

    /// Every texture this material samples.
    pub fn texture_refs(&self) -> impl Iterator<Item = &TextureRef> {
        self.texture.iter().chain(self.bump_map())
    }
}

// ---------------------------------------------------------------------------
// MaterialGpuData
// ---------------------------------------------------------------------------

/// Packed per-draw material parameters, 48 bytes, uniform-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialGpuData {
    /// Linear RGB, w = opacity.
    pub color: [f32; 4],
    /// x = roughness, y = metalness, z = bump scale, w = shading model index.
    pub surface: [f32; 4],
    /// xy = UV repeat, z = has base texture, w = has bump map.
    pub uv_repeat_flags: [f32; 4],
}

impl From<&MaterialSpec> for MaterialGpuData {
    fn from(m: &MaterialSpec) -> Self {
        let [r, g, b] = m.color.unwrap_or(Color::WHITE).to_linear();
        let (roughness, metalness, bump_scale) = match &m.surface {
            SurfaceResponse::Plain => (1.0, 0.0, 0.0),
            SurfaceResponse::Glass {
                roughness,
                metalness,
            } => (*roughness, *metalness, 0.0),
            SurfaceResponse::Bumped { scale, .. } => (1.0, 0.0, *scale),
        };
        let repeat = m.texture.as_ref().map_or([1.0, 1.0], |t| t.repeat);
        Self {
            color: [r, g, b, m.effective_opacity()],
            surface: [
                roughness,
                metalness,
                bump_scale,
                m.model.shader_index() as f32,
            ],
            uv_repeat_flags: [
                repeat[0],
                repeat[1],
                if m.texture.is_some() { 1.0 } else { 0.0 },
                if m.bump_map().is_some() { 1.0 } else { 0.0 },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
