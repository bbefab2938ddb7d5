//! Geometry descriptors and the factory functions that build them.
//!
//! A [`Geometry`] is a small parameter record. Tessellation into triangles is
//! deferred to [`Geometry::tessellate`], so descriptors can be compared and
//! inspected cheaply (layout tests rely on this).

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::mesh::MeshData;
use crate::tessellate;
use crate::text::TextMesh;

/// Torus centered at the origin, lying in the local XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusParams {
    /// Distance from the origin to the center of the tube.
    pub radius: f32,
    /// Tube cross-section radius.
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl TorusParams {
    /// Innermost extent in the ring plane.
    pub fn inner_radius(&self) -> f32 {
        self.radius - self.tube
    }

    /// Outermost extent in the ring plane.
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.tube
    }
}

/// Flat filled circle (or circular sector) in the local XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleParams {
    pub radius: f32,
    pub segments: u32,
    pub theta_start: f32,
    pub theta_length: f32,
}

/// Flat annulus (or annular sector) in the local XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingParams {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub theta_segments: u32,
    pub phi_segments: u32,
    pub theta_start: f32,
    pub theta_length: f32,
}

/// Rectangle in the local XY plane facing +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneParams {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

/// UV sphere centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

/// Kind tag, used for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Torus,
    Disk,
    Ring,
    Plane,
    Sphere,
    Text,
}

/// A parametric surface description.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Torus(TorusParams),
    Disk(CircleParams),
    Ring(RingParams),
    Plane(PlaneParams),
    Sphere(SphereParams),
    Text(TextMesh),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Torus(_) => GeometryKind::Torus,
            Geometry::Disk(_) => GeometryKind::Disk,
            Geometry::Ring(_) => GeometryKind::Ring,
            Geometry::Plane(_) => GeometryKind::Plane,
            Geometry::Sphere(_) => GeometryKind::Sphere,
            Geometry::Text(_) => GeometryKind::Text,
        }
    }

    /// Local-space bounding sphere as `(center, radius)`, without tessellating.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        match self {
            Geometry::Torus(p) => (Vec3::ZERO, p.radius.abs() + p.tube.abs()),
            Geometry::Disk(p) => (Vec3::ZERO, p.radius.abs()),
            Geometry::Ring(p) => (Vec3::ZERO, p.outer_radius.abs().max(p.inner_radius.abs())),
            Geometry::Plane(p) => (Vec3::ZERO, p.width.hypot(p.height) / 2.0),
            Geometry::Sphere(p) => (Vec3::ZERO, p.radius.abs()),
            Geometry::Text(t) => t.mesh.bounding_sphere(),
        }
    }

    /// Builds the triangle mesh for this descriptor.
    pub fn tessellate(&self) -> MeshData {
        match self {
            Geometry::Torus(p) => tessellate::torus(p),
            Geometry::Disk(p) => tessellate::circle(p),
            Geometry::Ring(p) => tessellate::ring(p),
            Geometry::Plane(p) => tessellate::plane(p),
            Geometry::Sphere(p) => tessellate::sphere(p),
            Geometry::Text(t) => t.mesh.as_ref().clone(),
        }
    }
}

/// Torus whose tube spans `[inner, outer]` in the ring plane.
///
/// The tube radius is `(outer - inner) / 2` and the main radius sits at the
/// midpoint. `outer < inner` yields a negative tube; callers are expected to
/// pass `outer > inner`.
pub fn torus_from_bounds(
    inner: f32,
    outer: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> Geometry {
    Geometry::Torus(TorusParams {
        radius: (inner + outer) / 2.0,
        tube: (outer - inner) / 2.0,
        radial_segments,
        tubular_segments,
    })
}

/// Full filled circle. Fewer than 3 segments are raised to 3 at tessellation.
pub fn disk(radius: f32, segments: u32) -> Geometry {
    Geometry::Disk(CircleParams {
        radius,
        segments,
        theta_start: 0.0,
        theta_length: TAU,
    })
}

/// Full annulus with a single radial band.
pub fn annulus(inner: f32, outer: f32, segments: u32) -> Geometry {
    Geometry::Ring(RingParams {
        inner_radius: inner,
        outer_radius: outer,
        theta_segments: segments,
        phi_segments: 1,
        theta_start: 0.0,
        theta_length: TAU,
    })
}

/// Annular sector spanning angles `[start, end]` (radians).
///
/// The swept length is `end - start`.
pub fn slice(inner: f32, outer: f32, segments: u32, start: f32, end: f32) -> Geometry {
    Geometry::Ring(RingParams {
        inner_radius: inner,
        outer_radius: outer,
        theta_segments: segments,
        phi_segments: 1,
        theta_start: start,
        theta_length: end - start,
    })
}

/// Single-quad rectangle.
pub fn plane(width: f32, height: f32) -> Geometry {
    Geometry::Plane(PlaneParams {
        width,
        height,
        width_segments: 1,
        height_segments: 1,
    })
}

pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    Geometry::Sphere(SphereParams {
        radius,
        width_segments,
        height_segments,
    })
}

/// Full sweep of a sphere's polar angle.
pub(crate) const SPHERE_THETA_END: f32 = PI;
