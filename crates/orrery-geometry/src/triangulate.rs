//! Ear-clipping triangulation of simple polygons with holes.
//!
//! Holes are merged into the outer contour through bridge edges (rightmost
//! hole vertex to the nearest visible outer vertex), then the resulting
//! weakly-simple polygon is clipped ear by ear.

use glam::Vec2;

const AREA_EPSILON: f32 = 1e-9;

/// Signed area of a closed contour; positive when counter-clockwise.
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    let mut area = 0.0;
    for q in 0..n {
        let p = (q + n - 1) % n;
        area += contour[p].x * contour[q].y - contour[q].x * contour[p].y;
    }
    area * 0.5
}

/// Removes repeated consecutive points and a closing point equal to the first.
pub(crate) fn clean_contour(points: &[Vec2]) -> Vec<Vec2> {
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_none_or(|last| last.distance_squared(p) > AREA_EPSILON) {
            out.push(p);
        }
    }
    while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) <= AREA_EPSILON {
        out.pop();
    }
    out
}

/// Triangulates `outer` minus `holes`.
///
/// Returns the vertex list (outer points, then hole points) and triangle
/// indices into it, every triangle counter-clockwise. Input orientation does
/// not matter. Contours with fewer than three distinct points are ignored.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> (Vec<Vec2>, Vec<u32>) {
    let mut outer = clean_contour(outer);
    if outer.len() < 3 {
        return (Vec::new(), Vec::new());
    }
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }

    let mut vertices = outer;
    let mut polygon: Vec<usize> = (0..vertices.len()).collect();

    let mut hole_rings = Vec::with_capacity(holes.len());
    for hole in holes {
        let mut hole = clean_contour(hole);
        if hole.len() < 3 {
            continue;
        }
        if signed_area(&hole) > 0.0 {
            hole.reverse();
        }
        let start = vertices.len();
        vertices.extend_from_slice(&hole);
        hole_rings.push((start..vertices.len()).collect::<Vec<usize>>());
    }

    // Rightmost holes first, so later bridges can pass through earlier ones.
    hole_rings.sort_by(|a, b| max_x(&vertices, b).total_cmp(&max_x(&vertices, a)));
    for ring in &hole_rings {
        if !bridge_hole(&vertices, &mut polygon, ring) {
            tracing::debug!("hole is not enclosed by its contour, skipping");
        }
    }

    let indices = clip_ears(&vertices, polygon);
    (vertices, indices)
}

fn max_x(vertices: &[Vec2], ring: &[usize]) -> f32 {
    ring.iter().map(|&i| vertices[i].x).fold(f32::MIN, f32::max)
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn is_reflex(vertices: &[Vec2], polygon: &[usize], pos: usize) -> bool {
    let n = polygon.len();
    let prev = vertices[polygon[(pos + n - 1) % n]];
    let curr = vertices[polygon[pos]];
    let next = vertices[polygon[(pos + 1) % n]];
    cross(prev, curr, next) < 0.0
}

/// Splices `hole` into `polygon` through a mutually visible vertex pair.
fn bridge_hole(vertices: &[Vec2], polygon: &mut Vec<usize>, hole: &[usize]) -> bool {
    let Some((m_pos, m)) = hole
        .iter()
        .enumerate()
        .max_by(|a, b| vertices[*a.1].x.total_cmp(&vertices[*b.1].x))
        .map(|(pos, &idx)| (pos, vertices[idx]))
    else {
        return false;
    };

    // Closest edge hit by a ray from M towards +x.
    let n = polygon.len();
    let mut hit: Option<(f32, usize)> = None;
    for k in 0..n {
        let a = vertices[polygon[k]];
        let b = vertices[polygon[(k + 1) % n]];
        if (a.y > m.y) == (b.y > m.y) {
            continue;
        }
        let t = (m.y - a.y) / (b.y - a.y);
        let x = a.x + t * (b.x - a.x);
        if x < m.x {
            continue;
        }
        let candidate = if a.x > b.x { k } else { (k + 1) % n };
        if hit.is_none_or(|(best_x, _)| x < best_x) {
            hit = Some((x, candidate));
        }
    }
    let Some((hit_x, mut p_pos)) = hit else {
        return false;
    };

    // A reflex vertex inside (M, I, P) may block P; take the one closest in
    // angle to the ray.
    let i = Vec2::new(hit_x, m.y);
    let p = vertices[polygon[p_pos]];
    let mut best: Option<(f32, f32)> = None;
    for k in 0..n {
        let v = vertices[polygon[k]];
        if k == p_pos || v == p || !is_reflex(vertices, polygon, k) {
            continue;
        }
        let d = v - m;
        if d.x <= 0.0 || !point_in_triangle(v, m, i, p) {
            continue;
        }
        let slope = d.y.abs() / d.x;
        let len = d.length_squared();
        let better = match best {
            None => true,
            Some((s, l)) => slope < s || (slope == s && len < l),
        };
        if better {
            best = Some((slope, len));
            p_pos = k;
        }
    }

    let p_idx = polygon[p_pos];
    let mut bridged = Vec::with_capacity(n + hole.len() + 2);
    bridged.extend_from_slice(&polygon[..=p_pos]);
    for offset in 0..=hole.len() {
        bridged.push(hole[(m_pos + offset) % hole.len()]);
    }
    bridged.push(p_idx);
    bridged.extend_from_slice(&polygon[p_pos + 1..]);
    *polygon = bridged;
    true
}

fn clip_ears(vertices: &[Vec2], mut remaining: Vec<usize>) -> Vec<u32> {
    let mut indices = Vec::with_capacity(remaining.len().saturating_sub(2) * 3);
    let mut cursor = 0;

    while remaining.len() > 3 {
        let n = remaining.len();
        let mut clipped = false;

        for step in 0..n {
            let k = (cursor + step) % n;
            let prev = remaining[(k + n - 1) % n];
            let curr = remaining[k];
            let next = remaining[(k + 1) % n];
            let (a, b, c) = (vertices[prev], vertices[curr], vertices[next]);
            let turn = cross(a, b, c);

            if turn.abs() <= AREA_EPSILON {
                // Collinear or spike vertex: drop it without emitting a triangle.
                remaining.remove(k);
                cursor = k.saturating_sub(1);
                clipped = true;
                break;
            }
            if turn < 0.0 {
                continue;
            }
            let blocked = remaining.iter().any(|&other| {
                let v = vertices[other];
                other != prev
                    && other != curr
                    && other != next
                    && v != a
                    && v != b
                    && v != c
                    && point_in_triangle(v, a, b, c)
            });
            if blocked {
                continue;
            }

            indices.extend_from_slice(&[prev as u32, curr as u32, next as u32]);
            remaining.remove(k);
            cursor = k.saturating_sub(1);
            clipped = true;
            break;
        }

        if !clipped {
            // No valid ear (self-touching input); force progress.
            tracing::trace!(remaining = n, "ear clipping stalled, forcing a cut");
            let (prev, curr, next) = (remaining[n - 1], remaining[0], remaining[1]);
            if cross(vertices[prev], vertices[curr], vertices[next]) > 0.0 {
                indices.extend_from_slice(&[prev as u32, curr as u32, next as u32]);
            }
            remaining.remove(0);
        }
    }

    if let [a, b, c] = remaining[..]
        && cross(vertices[a], vertices[b], vertices[c]) > AREA_EPSILON
    {
        indices.extend_from_slice(&[a as u32, b as u32, c as u32]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f32, max: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(min, min),
            Vec2::new(max, min),
            Vec2::new(max, max),
            Vec2::new(min, max),
        ]
    }

    fn total_area(vertices: &[Vec2], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                let area = cross(
                    vertices[t[0] as usize],
                    vertices[t[1] as usize],
                    vertices[t[2] as usize],
                ) * 0.5;
                assert!(area > 0.0, "triangle {t:?} is not counter-clockwise");
                area
            })
            .sum()
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = square(0.0, 2.0);
        assert_eq!(signed_area(&ccw), 4.0);
        let cw: Vec<Vec2> = ccw.into_iter().rev().collect();
        assert_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn test_square() {
        let (vertices, indices) = triangulate(&square(0.0, 1.0), &[]);
        assert_eq!(indices.len(), 6);
        assert!((total_area(&vertices, &indices) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clockwise_input_is_reoriented() {
        let cw: Vec<Vec2> = square(0.0, 3.0).into_iter().rev().collect();
        let (vertices, indices) = triangulate(&cw, &[]);
        assert!((total_area(&vertices, &indices) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_concave_polygon() {
        let l_shape = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let (vertices, indices) = triangulate(&l_shape, &[]);
        assert_eq!(indices.len() / 3, 4);
        assert!((total_area(&vertices, &indices) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_square_with_hole() {
        let (vertices, indices) = triangulate(&square(0.0, 10.0), &[square(3.0, 7.0)]);
        assert_eq!(vertices.len(), 8);
        assert!((total_area(&vertices, &indices) - 84.0).abs() < 1e-3);
    }

    #[test]
    fn test_two_holes() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let holes = vec![square(2.0, 6.0), {
            let mut h = square(2.0, 6.0);
            h.iter_mut().for_each(|p| p.x += 10.0);
            h
        }];
        let (vertices, indices) = triangulate(&outer, &holes);
        assert!((total_area(&vertices, &indices) - (200.0 - 32.0)).abs() < 1e-3);
    }

    #[test]
    fn test_duplicate_points_are_cleaned() {
        let mut pts = square(0.0, 1.0);
        pts.insert(1, pts[0]);
        pts.push(pts[0]);
        assert_eq!(clean_contour(&pts).len(), 4);
    }

    #[test]
    fn test_degenerate_input() {
        let (vertices, indices) = triangulate(&[Vec2::ZERO, Vec2::X], &[]);
        assert!(vertices.is_empty());
        assert!(indices.is_empty());
    }
}
