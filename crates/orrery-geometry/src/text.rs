//! Extruded text meshes.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::mesh::MeshData;
use crate::primitives::Geometry;
use crate::triangulate::{clean_contour, signed_area, triangulate};
use crate::typeface::{Shape, Typeface};

/// Layout and extrusion settings for a text label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// World units per em.
    pub size: f32,
    /// Extrusion along +Z.
    pub depth: f32,
    /// Line segments per flattened curve.
    pub curve_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 100.0,
            depth: 50.0,
            curve_segments: 12,
        }
    }
}

/// Pre-tessellated text: the string, its options and the extruded mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    pub text: String,
    pub options: TextOptions,
    pub mesh: Arc<MeshData>,
}

/// Lays out `text` with `typeface` and extrudes it into a [`Geometry::Text`].
///
/// The baseline of the first line starts at the local origin; the front face
/// sits at `z = depth` and the back face at `z = 0`.
pub fn text_geometry(typeface: &Typeface, text: &str, options: TextOptions) -> Geometry {
    let shapes = typeface.shapes(text, options.size, options.curve_segments);
    let mesh = extrude_shapes(&shapes, options.depth);
    tracing::debug!(
        text,
        family = typeface.family_name(),
        triangles = mesh.triangle_count(),
        "built text geometry"
    );
    Geometry::Text(TextMesh {
        text: text.to_string(),
        options,
        mesh: Arc::new(mesh),
    })
}

/// Extrudes filled shapes into a closed solid: both caps plus side walls.
pub fn extrude_shapes(shapes: &[Shape], depth: f32) -> MeshData {
    let mut mesh = MeshData::new();

    for shape in shapes {
        let (vertices, triangles) = triangulate(&shape.outer, &shape.holes);
        if triangles.is_empty() {
            continue;
        }

        let back = mesh.vertex_count() as u32;
        for v in &vertices {
            mesh.push_vertex(v.extend(0.0), Vec3::NEG_Z, [v.x, v.y]);
        }
        for t in triangles.chunks_exact(3) {
            mesh.push_triangle(back + t[2], back + t[1], back + t[0]);
        }

        let front = mesh.vertex_count() as u32;
        for v in &vertices {
            mesh.push_vertex(v.extend(depth), Vec3::Z, [v.x, v.y]);
        }
        for t in triangles.chunks_exact(3) {
            mesh.push_triangle(front + t[0], front + t[1], front + t[2]);
        }

        // Walls face away from the solid: outer counter-clockwise, holes clockwise.
        let mut outer = clean_contour(&shape.outer);
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        push_walls(&mut mesh, &outer, depth);

        for hole in &shape.holes {
            let mut hole = clean_contour(hole);
            if hole.len() < 3 {
                continue;
            }
            if signed_area(&hole) > 0.0 {
                hole.reverse();
            }
            push_walls(&mut mesh, &hole, depth);
        }
    }
    mesh
}

fn push_walls(mesh: &mut MeshData, contour: &[Vec2], depth: f32) {
    let n = contour.len();
    let mut distance = 0.0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        let edge = b - a;
        let length = edge.length();
        if length == 0.0 {
            continue;
        }
        let normal = Vec3::new(edge.y, -edge.x, 0.0) / length;
        let (u0, u1) = (distance, distance + length);
        distance = u1;

        let bottom_a = mesh.push_vertex(a.extend(0.0), normal, [u0, 0.0]);
        let bottom_b = mesh.push_vertex(b.extend(0.0), normal, [u1, 0.0]);
        let top_b = mesh.push_vertex(b.extend(depth), normal, [u1, depth]);
        let top_a = mesh.push_vertex(a.extend(depth), normal, [u0, depth]);
        mesh.push_triangle(bottom_a, bottom_b, top_b);
        mesh.push_triangle(bottom_a, top_b, top_a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeface::tests::TEST_FONT;

    fn facing_area(mesh: &MeshData, direction: Vec3) -> f32 {
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let a = mesh.positions[t[0] as usize];
                let b = mesh.positions[t[1] as usize];
                let c = mesh.positions[t[2] as usize];
                let n = (b - a).cross(c - a) * 0.5;
                n.dot(direction).max(0.0)
            })
            .sum()
    }

    #[test]
    fn test_caps_cover_glyph_minus_hole() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let Geometry::Text(text) = text_geometry(
            &font,
            "o",
            TextOptions {
                size: 1.0,
                depth: 0.2,
                curve_segments: 12,
            },
        ) else {
            panic!("expected text geometry");
        };
        let mesh = &text.mesh;
        // 0.6 x 0.7 minus a 0.3 x 0.4 hole.
        let expected = 0.42 - 0.12;
        assert!((facing_area(mesh, Vec3::Z) - expected).abs() < 1e-4);
        assert!((facing_area(mesh, Vec3::NEG_Z) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_extrusion_depth_bounds() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let geometry = text_geometry(
            &font,
            "lo",
            TextOptions {
                size: 4.0,
                depth: 0.2,
                curve_segments: 12,
            },
        );
        let mesh = geometry.tessellate();
        assert!(!mesh.is_empty());
        for p in &mesh.positions {
            assert!(p.z == 0.0 || (p.z - 0.2).abs() < 1e-6);
        }
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_walls_face_outward() {
        let bar = Shape {
            outer: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            holes: Vec::new(),
        };
        let mesh = extrude_shapes(&[bar], 1.0);
        // Each wall's area is edge length times depth.
        assert!((facing_area(&mesh, Vec3::X) - 1.0).abs() < 1e-5);
        assert!((facing_area(&mesh, Vec3::NEG_X) - 1.0).abs() < 1e-5);
        assert!((facing_area(&mesh, Vec3::Y) - 2.0).abs() < 1e-5);
        assert!((facing_area(&mesh, Vec3::NEG_Y) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let mesh = text_geometry(&font, "", TextOptions::default()).tessellate();
        assert!(mesh.is_empty());
    }
}
