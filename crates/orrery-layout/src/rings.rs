//! Concentric ring and angular slice generation.
//!
//! Ring `i` spans `[base + i * gap, base + i * gap + width]`. Every ring
//! becomes three flat primitives stacked a few hundredths apart so they do
//! not z-fight: the colored torus on top, a white backing annulus at the
//! same height facing the other way, and a white outline torus just below.

use std::f32::consts::{FRAC_PI_2, TAU};

use orrery_config::LayoutConfig;
use orrery_geometry::{Geometry, annulus, slice, torus_from_bounds};
use orrery_materials::{
    MaterialSpec, TextureRef, backing_material, outline_material, ring_material, slice_material,
};
use orrery_scene::{Node, Transform};

/// Height of the colored ring above the ground.
pub const RING_OFFSET: f32 = 0.01;
/// Height of the white outline ring; below the ground plane.
pub const OUTLINE_OFFSET: f32 = -0.02;
/// Height of the white backing annulus.
pub const BACKING_OFFSET: f32 = 0.01;

/// Parameters driving ring and slice generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub base_radius: f32,
    pub ring_gap: f32,
    pub ring_width: f32,
    pub num_rings: u32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub backing_segments: u32,
    pub num_slices: u32,
    /// Angular width of each slice, radians.
    pub slice_angle: f32,
    pub slice_inner_radius: f32,
    pub slice_height: f32,
    pub slice_segments: u32,
    /// Texture applied to every ring except the innermost.
    pub tile: TextureRef,
}

impl LayoutParams {
    pub fn from_config(layout: &LayoutConfig, tile: TextureRef) -> Self {
        Self {
            base_radius: layout.base_radius,
            ring_gap: layout.ring_gap,
            ring_width: layout.ring_width,
            num_rings: layout.num_rings,
            radial_segments: layout.radial_segments,
            tubular_segments: layout.tubular_segments,
            backing_segments: layout.backing_segments,
            num_slices: layout.num_slices,
            slice_angle: layout.slice_angle,
            slice_inner_radius: layout.slice_inner_radius,
            slice_height: layout.slice_height,
            slice_segments: layout.slice_segments,
            tile,
        }
    }
}

/// Radii and tessellation of one ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSpec {
    pub index: u32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub is_innermost: bool,
}

/// What a generated primitive represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveRole {
    Ring,
    Outline,
    Backing,
    Slice,
}

impl PrimitiveRole {
    fn label(self) -> &'static str {
        match self {
            PrimitiveRole::Ring => "ring",
            PrimitiveRole::Outline => "outline",
            PrimitiveRole::Backing => "backing",
            PrimitiveRole::Slice => "slice",
        }
    }
}

/// A flat primitive placed at a height and tilted about X.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveNode {
    pub role: PrimitiveRole,
    /// Ring index, or slice index for [`PrimitiveRole::Slice`].
    pub index: u32,
    pub geometry: Geometry,
    pub vertical_offset: f32,
    pub rotation_x: f32,
    pub material: MaterialSpec,
}

impl PrimitiveNode {
    /// Scene node name, e.g. `ring-3` or `slice-0`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.role.label(), self.index)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position(glam::Vec3::new(0.0, self.vertical_offset, 0.0))
            .with_rotation_x(self.rotation_x)
    }

    pub fn into_node(self) -> Node {
        let name = self.name();
        let transform = self.transform();
        Node::mesh(name, self.geometry, self.material).with_transform(transform)
    }
}

/// Radii for every ring, innermost first.
pub fn ring_specs(params: &LayoutParams) -> Vec<RingSpec> {
    (0..params.num_rings)
        .map(|index| {
            let inner_radius = params.base_radius + index as f32 * params.ring_gap;
            RingSpec {
                index,
                inner_radius,
                outer_radius: inner_radius + params.ring_width,
                radial_segments: params.radial_segments,
                tubular_segments: params.tubular_segments,
                is_innermost: index == 0,
            }
        })
        .collect()
}

/// The colored ring, its outline and its backing, in that order.
pub fn ring_nodes(spec: &RingSpec, params: &LayoutParams) -> [PrimitiveNode; 3] {
    let torus = torus_from_bounds(
        spec.inner_radius,
        spec.outer_radius,
        spec.radial_segments,
        spec.tubular_segments,
    );
    [
        PrimitiveNode {
            role: PrimitiveRole::Ring,
            index: spec.index,
            geometry: torus.clone(),
            vertical_offset: RING_OFFSET,
            rotation_x: FRAC_PI_2,
            material: ring_material(spec.is_innermost, &params.tile),
        },
        PrimitiveNode {
            role: PrimitiveRole::Outline,
            index: spec.index,
            geometry: torus,
            vertical_offset: OUTLINE_OFFSET,
            rotation_x: FRAC_PI_2,
            material: outline_material(),
        },
        PrimitiveNode {
            role: PrimitiveRole::Backing,
            index: spec.index,
            geometry: annulus(spec.inner_radius, spec.outer_radius, params.backing_segments),
            vertical_offset: BACKING_OFFSET,
            rotation_x: -FRAC_PI_2,
            material: backing_material(),
        },
    ]
}

/// All ring triples, innermost ring first.
pub fn generate_layout(params: &LayoutParams) -> Vec<PrimitiveNode> {
    let nodes: Vec<PrimitiveNode> = ring_specs(params)
        .iter()
        .flat_map(|spec| ring_nodes(spec, params))
        .collect();
    tracing::debug!(
        rings = params.num_rings,
        primitives = nodes.len(),
        "generated ring layout"
    );
    nodes
}

/// Outer radius of the last ring. With no rings, the would-be first ring's.
/// Slices reach 216 by default, not the 202 that `2 + (n-1)·gap` would give.
pub fn outermost_radius(params: &LayoutParams) -> f32 {
    params.base_radius
        + params.num_rings.saturating_sub(1) as f32 * params.ring_gap
        + params.ring_width
}

/// Glass wedges spaced evenly around the circle, each `slice_angle` wide,
/// reaching from the slice inner radius to the outermost ring.
pub fn slice_region(params: &LayoutParams) -> Vec<PrimitiveNode> {
    if params.num_slices == 0 {
        return Vec::new();
    }
    let step = TAU / params.num_slices as f32;
    if params.num_slices > 1 && params.slice_angle > step {
        // Wedges keep their fixed width, so neighbours overlap.
        tracing::warn!(
            num_slices = params.num_slices,
            slice_angle = params.slice_angle,
            spacing = step,
            "slice width exceeds slice spacing; wedges overlap"
        );
    }

    let outer = outermost_radius(params);
    (0..params.num_slices)
        .map(|i| {
            let start = i as f32 * step;
            PrimitiveNode {
                role: PrimitiveRole::Slice,
                index: i,
                geometry: slice(
                    params.slice_inner_radius,
                    outer,
                    params.slice_segments,
                    start,
                    start + params.slice_angle,
                ),
                vertical_offset: params.slice_height,
                rotation_x: FRAC_PI_2,
                material: slice_material(i == 0, &params.tile),
            }
        })
        .collect()
}
