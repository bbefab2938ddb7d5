//! Triangle generation for the parametric primitives.
//!
//! Vertex order, UV layout and face winding follow the conventional
//! torus/circle/ring/plane/sphere layouts used by common scene libraries, so
//! textures authored for those map identically.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::mesh::MeshData;
use crate::primitives::{
    CircleParams, PlaneParams, RingParams, SPHERE_THETA_END, SphereParams, TorusParams,
};

pub(crate) fn torus(p: &TorusParams) -> MeshData {
    let radial = p.radial_segments.max(1);
    let tubular = p.tubular_segments.max(1);
    let mut mesh = MeshData::new();

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;

            let position = Vec3::new(
                (p.radius + p.tube * v.cos()) * u.cos(),
                (p.radius + p.tube * v.cos()) * u.sin(),
                p.tube * v.sin(),
            );
            let center = Vec3::new(p.radius * u.cos(), p.radius * u.sin(), 0.0);
            let normal = (position - center).normalize_or(Vec3::Z);
            let uv = [i as f32 / tubular as f32, j as f32 / radial as f32];
            mesh.push_vertex(position, normal, uv);
        }
    }

    let stride = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

pub(crate) fn circle(p: &CircleParams) -> MeshData {
    let segments = p.segments.max(3);
    let mut mesh = MeshData::new();

    mesh.push_vertex(Vec3::ZERO, Vec3::Z, [0.5, 0.5]);
    for s in 0..=segments {
        let angle = p.theta_start + s as f32 / segments as f32 * p.theta_length;
        let x = p.radius * angle.cos();
        let y = p.radius * angle.sin();
        let uv = if p.radius != 0.0 {
            [(x / p.radius + 1.0) / 2.0, (y / p.radius + 1.0) / 2.0]
        } else {
            [0.5, 0.5]
        };
        mesh.push_vertex(Vec3::new(x, y, 0.0), Vec3::Z, uv);
    }

    for i in 1..=segments {
        mesh.push_triangle(i, i + 1, 0);
    }
    mesh
}

pub(crate) fn ring(p: &RingParams) -> MeshData {
    let theta_segments = p.theta_segments.max(3);
    let phi_segments = p.phi_segments.max(1);
    let mut mesh = MeshData::new();

    let radius_step = (p.outer_radius - p.inner_radius) / phi_segments as f32;
    let mut radius = p.inner_radius;
    for _ in 0..=phi_segments {
        for i in 0..=theta_segments {
            let angle = p.theta_start + i as f32 / theta_segments as f32 * p.theta_length;
            let x = radius * angle.cos();
            let y = radius * angle.sin();
            let uv = if p.outer_radius != 0.0 {
                [
                    (x / p.outer_radius + 1.0) / 2.0,
                    (y / p.outer_radius + 1.0) / 2.0,
                ]
            } else {
                [0.5, 0.5]
            };
            mesh.push_vertex(Vec3::new(x, y, 0.0), Vec3::Z, uv);
        }
        radius += radius_step;
    }

    for j in 0..phi_segments {
        let level = j * (theta_segments + 1);
        for i in 0..theta_segments {
            let seg = level + i;
            let a = seg;
            let b = seg + theta_segments + 1;
            let c = seg + theta_segments + 2;
            let d = seg + 1;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

pub(crate) fn plane(p: &PlaneParams) -> MeshData {
    let grid_x = p.width_segments.max(1);
    let grid_y = p.height_segments.max(1);
    let segment_width = p.width / grid_x as f32;
    let segment_height = p.height / grid_y as f32;
    let mut mesh = MeshData::new();

    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - p.height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - p.width / 2.0;
            let uv = [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32];
            mesh.push_vertex(Vec3::new(x, -y, 0.0), Vec3::Z, uv);
        }
    }

    let stride = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + stride * iy;
            let b = ix + stride * (iy + 1);
            let c = ix + 1 + stride * (iy + 1);
            let d = ix + 1 + stride * iy;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

pub(crate) fn sphere(p: &SphereParams) -> MeshData {
    let width_segments = p.width_segments.max(3);
    let height_segments = p.height_segments.max(2);
    let mut mesh = MeshData::new();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // Pole vertices sit between their neighbours in u.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            let theta = v * SPHERE_THETA_END;
            let position = Vec3::new(
                -p.radius * phi.cos() * theta.sin(),
                p.radius * theta.cos(),
                p.radius * phi.sin() * theta.sin(),
            );
            let normal = position.normalize_or(Vec3::Y);
            row.push(mesh.push_vertex(position, normal, [u + u_offset, 1.0 - v]));
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.push_triangle(a, b, d);
            }
            if iy != height_segments as usize - 1 {
                mesh.push_triangle(b, c, d);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_4, PI};

    use super::*;
    use crate::primitives::{Geometry, annulus, disk, plane, slice, sphere, torus_from_bounds};

    const EPS: f32 = 1e-4;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.positions.len(), mesh.uvs.len());
        assert_eq!(mesh.indices.len() % 3, 0);
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n), "index out of range");
        for normal in &mesh.normals {
            assert!((normal.length() - 1.0).abs() < EPS, "non-unit normal {normal}");
        }
        // Sphere pole vertices are shifted half a segment in u.
        for uv in &mesh.uvs {
            assert!((-0.2..=1.2).contains(&uv[0]), "uv {uv:?}");
            assert!((-EPS..=1.0 + EPS).contains(&uv[1]), "uv {uv:?}");
        }
    }

    fn triangle_area(mesh: &MeshData) -> f32 {
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let a = mesh.positions[t[0] as usize];
                let b = mesh.positions[t[1] as usize];
                let c = mesh.positions[t[2] as usize];
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    #[test]
    fn test_torus_counts_and_extent() {
        let mesh = torus_from_bounds(14.0, 16.0, 32, 64).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertex_count(), 33 * 65);
        assert_eq!(mesh.triangle_count(), 32 * 64 * 2);

        for p in &mesh.positions {
            let planar = p.truncate().length();
            assert!(planar >= 14.0 - EPS && planar <= 16.0 + EPS);
            assert!(p.z.abs() <= 1.0 + EPS);
        }
    }

    #[test]
    fn test_torus_normals_point_away_from_tube_center() {
        let Geometry::Torus(params) = torus_from_bounds(4.0, 6.0, 8, 16) else {
            unreachable!()
        };
        let mesh = torus(&params);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let center = p.truncate().normalize().extend(0.0) * params.radius;
            assert!((*p - center).normalize().dot(*n) > 0.999);
        }
    }

    #[test]
    fn test_circle_faces_plus_z() {
        let mesh = disk(4.0, 32).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertex_count(), 34);
        assert_eq!(mesh.triangle_count(), 32);

        for t in mesh.indices.chunks_exact(3) {
            let a = mesh.positions[t[0] as usize];
            let b = mesh.positions[t[1] as usize];
            let c = mesh.positions[t[2] as usize];
            assert!((b - a).cross(c - a).z > 0.0);
        }
        // Polygonal area approaches pi r^2.
        let area = triangle_area(&mesh);
        assert!((area - PI * 16.0).abs() / (PI * 16.0) < 0.01);
    }

    #[test]
    fn test_circle_segments_clamped() {
        let mesh = disk(1.0, 1).tessellate();
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn test_annulus_counts_and_radii() {
        let mesh = annulus(15.0, 25.0, 32).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertex_count(), 2 * 33);
        assert_eq!(mesh.triangle_count(), 64);

        for p in &mesh.positions {
            let r = p.length();
            assert!((r - 15.0).abs() < EPS || (r - 25.0).abs() < EPS);
        }
    }

    #[test]
    fn test_slice_spans_requested_angles() {
        let mesh = slice(1.0, 216.0, 3, 0.0, FRAC_PI_4).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.triangle_count(), 6);

        for p in &mesh.positions {
            let angle = p.y.atan2(p.x);
            assert!((-EPS..=FRAC_PI_4 + EPS).contains(&angle));
        }
        let expected = 0.5 * FRAC_PI_4 * (216.0_f32.powi(2) - 1.0);
        let area = triangle_area(&mesh);
        // Three chords under-cover the arc by a few percent.
        assert!(area < expected && area > expected * 0.95);
    }

    #[test]
    fn test_plane_quad() {
        let mesh = plane(20.0, 10.0).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!((triangle_area(&mesh) - 200.0).abs() < EPS);
        assert_eq!(mesh.positions[0], Vec3::new(-10.0, 5.0, 0.0));
        assert_eq!(mesh.uvs[0], [0.0, 1.0]);
    }

    #[test]
    fn test_sphere_counts_skip_pole_caps() {
        let mesh = sphere(5.0, 32, 32).tessellate();
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        // Top and bottom rows contribute one triangle per quad.
        assert_eq!(mesh.triangle_count(), 32 * 30 * 2 + 32 * 2);
        for p in &mesh.positions {
            assert!((p.length() - 5.0).abs() < 1e-3);
        }
    }
}
