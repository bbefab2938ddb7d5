//! Materials for each decorative element of the scene.
//!
//! Every function here is pure: the same inputs always produce equal specs.

use crate::material::{Color, MaterialSpec, ShadingModel, Side, SurfaceResponse, TextureRef};

/// Solid color of the innermost ring and slice.
pub const RING_COLOR: Color = Color(0xFFA500);

/// Color of the central disk.
pub const SAFFRON: Color = Color(0xF4C430);

/// Innermost ring: solid orange, untextured. Outer rings: tiled, uncolored.
fn ring_fill(is_innermost: bool, tile: &TextureRef) -> (Option<Color>, Option<TextureRef>) {
    if is_innermost {
        (Some(RING_COLOR), None)
    } else {
        (None, Some(tile.clone()))
    }
}

/// Opaque, double-sided ring surface.
pub fn ring_material(is_innermost: bool, tile: &TextureRef) -> MaterialSpec {
    let (color, texture) = ring_fill(is_innermost, tile);
    MaterialSpec {
        model: ShadingModel::Standard,
        color,
        texture,
        side: Side::Double,
        transparent: false,
        opacity: 1.0,
        surface: SurfaceResponse::Plain,
    }
}

/// Glass variant for the angular slice: same fill rule as rings, but
/// translucent and glossy.
pub fn slice_material(is_innermost: bool, tile: &TextureRef) -> MaterialSpec {
    let (color, texture) = ring_fill(is_innermost, tile);
    MaterialSpec {
        model: ShadingModel::Standard,
        color,
        texture,
        side: Side::Double,
        transparent: true,
        opacity: 0.4,
        surface: SurfaceResponse::Glass {
            roughness: 0.1,
            metalness: 0.5,
        },
    }
}

/// Thin white ring drawn just below each colored ring.
pub fn outline_material() -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Unlit,
        color: Some(Color::WHITE),
        side: Side::Double,
        ..MaterialSpec::default()
    }
}

/// White annulus behind each ring.
pub fn backing_material() -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Unlit,
        color: Some(Color::WHITE),
        side: Side::Double,
        ..MaterialSpec::default()
    }
}

pub fn disk_material() -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Standard,
        color: Some(SAFFRON),
        side: Side::Double,
        ..MaterialSpec::default()
    }
}

/// Ground texture tiled 100 times in each direction.
pub fn ground_material(texture: &TextureRef) -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Standard,
        texture: Some(texture.clone().repeated(100.0, 100.0)),
        side: Side::Front,
        ..MaterialSpec::default()
    }
}

/// Phong-shaded globe with a bump map.
pub fn globe_material(map: &TextureRef, bump: &TextureRef) -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Phong,
        texture: Some(map.clone()),
        surface: SurfaceResponse::Bumped {
            map: bump.clone(),
            scale: 0.1,
        },
        ..MaterialSpec::default()
    }
}

pub fn flag_material(texture: &TextureRef) -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Unlit,
        texture: Some(texture.clone()),
        side: Side::Double,
        ..MaterialSpec::default()
    }
}

/// Unlit plane whose texture alpha shows through.
pub fn image_plane_material(texture: &TextureRef) -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Unlit,
        texture: Some(texture.clone()),
        side: Side::Double,
        transparent: true,
        opacity: 1.0,
        ..MaterialSpec::default()
    }
}

pub fn label_material(color: Color) -> MaterialSpec {
    MaterialSpec {
        model: ShadingModel::Unlit,
        color: Some(color),
        ..MaterialSpec::default()
    }
}
