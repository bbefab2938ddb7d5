//! End-to-end checks of the ring layout against the reference scene numbers.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use orrery_config::LayoutConfig;
use orrery_geometry::{Geometry, GeometryKind};
use orrery_layout::{
    LayoutParams, PrimitiveRole, generate_layout, outermost_radius, ring_specs, slice_region,
};
use orrery_materials::{Color, TextureRef};

fn reference_params() -> LayoutParams {
    LayoutParams::from_config(&LayoutConfig::default(), TextureRef::new("tile_texture.jpg"))
}

#[test]
fn reference_ring_radii() {
    let specs = ring_specs(&reference_params());
    assert_eq!(specs.len(), 21);
    assert_eq!((specs[0].inner_radius, specs[0].outer_radius), (14.0, 16.0));
    assert_eq!((specs[1].inner_radius, specs[1].outer_radius), (24.0, 26.0));
    assert_eq!((specs[20].inner_radius, specs[20].outer_radius), (214.0, 216.0));
}

#[test]
fn every_ring_yields_an_ordered_triple() {
    let params = reference_params();
    let nodes = generate_layout(&params);
    assert_eq!(nodes.len(), 21 * 3);

    for (i, triple) in nodes.chunks_exact(3).enumerate() {
        let roles: Vec<PrimitiveRole> = triple.iter().map(|n| n.role).collect();
        assert_eq!(
            roles,
            [
                PrimitiveRole::Ring,
                PrimitiveRole::Outline,
                PrimitiveRole::Backing
            ]
        );
        assert!(triple.iter().all(|n| n.index == i as u32));
        // Outline sits lowest.
        assert!(triple[1].vertical_offset < triple[0].vertical_offset);
        assert!(triple[1].vertical_offset < triple[2].vertical_offset);
    }
}

#[test]
fn torus_mapping_from_ring_bounds() {
    let nodes = generate_layout(&reference_params());
    let Geometry::Torus(torus) = &nodes[3].geometry else {
        panic!("ring 1 should be a torus");
    };
    assert_eq!(torus.radius, 25.0);
    assert_eq!(torus.tube, 1.0);
    assert_eq!(torus.radial_segments, 32);
    assert_eq!(torus.tubular_segments, 64);

    let Geometry::Ring(backing) = &nodes[5].geometry else {
        panic!("backing should be a ring");
    };
    assert_eq!((backing.inner_radius, backing.outer_radius), (24.0, 26.0));
    assert_eq!(backing.theta_segments, 32);
}

#[test]
fn innermost_ring_is_orange_others_tiled() {
    let nodes = generate_layout(&reference_params());
    let rings: Vec<_> = nodes
        .iter()
        .filter(|n| n.role == PrimitiveRole::Ring)
        .collect();

    assert_eq!(rings[0].material.color, Some(Color(0xFFA500)));
    assert_eq!(rings[0].material.texture, None);
    for ring in &rings[1..] {
        assert_eq!(ring.material.color, None);
        assert_eq!(
            ring.material.texture.as_ref().map(|t| t.source.as_str()),
            Some("tile_texture.jpg")
        );
    }
}

#[test]
fn layout_is_deterministic() {
    let params = reference_params();
    assert_eq!(generate_layout(&params), generate_layout(&params));
    assert_eq!(slice_region(&params), slice_region(&params));
}

#[test]
fn slice_spans_quarter_pi_to_outermost_ring() {
    let params = reference_params();
    let slices = slice_region(&params);
    assert_eq!(slices.len(), 1);

    let wedge = &slices[0];
    assert_eq!(wedge.geometry.kind(), GeometryKind::Ring);
    let Geometry::Ring(ring) = &wedge.geometry else {
        unreachable!()
    };
    assert_eq!(ring.theta_start, 0.0);
    assert_eq!(ring.theta_length, FRAC_PI_4);
    assert_eq!(ring.inner_radius, 1.0);
    assert_eq!(ring.outer_radius, 216.0);
    assert_eq!(ring.outer_radius, outermost_radius(&params));
    assert_eq!(ring.theta_segments, 3);

    assert_eq!(wedge.vertical_offset, 8.0);
    assert_eq!(wedge.rotation_x, FRAC_PI_2);
    assert!(wedge.material.transparent);
    assert_eq!(wedge.material.opacity, 0.4);
}

#[test]
fn rings_stay_disjoint_when_gap_exceeds_width() {
    let mut params = reference_params();
    for gap in [2.5, 3.0, 10.0, 40.0] {
        params.ring_gap = gap;
        let specs = ring_specs(&params);
        for pair in specs.windows(2) {
            assert!(pair[0].outer_radius < pair[1].inner_radius, "gap {gap}");
        }
    }
}

#[test]
fn ring_count_follows_config() {
    let mut params = reference_params();
    params.num_rings = 0;
    assert!(generate_layout(&params).is_empty());

    params.num_rings = 3;
    assert_eq!(generate_layout(&params).len(), 9);
    assert_eq!(outermost_radius(&params), 14.0 + 2.0 * 10.0 + 2.0);
}
