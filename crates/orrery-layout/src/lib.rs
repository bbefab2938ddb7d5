//! Procedural layout of the decorative scene.
//!
//! [`rings`] produces the concentric ring triples and the angular slice as
//! flat lists of [`PrimitiveNode`]s; [`compose`] assembles them with the
//! ground, globe, flags, lights and environment into a [`SceneGraph`].
//!
//! [`SceneGraph`]: orrery_scene::SceneGraph

pub mod compose;
pub mod rings;

pub use compose::{ComposedScene, LabelRequest, compose_scene, label_node};
pub use rings::{
    BACKING_OFFSET, LayoutParams, OUTLINE_OFFSET, PrimitiveNode, PrimitiveRole, RING_OFFSET,
    RingSpec, generate_layout, outermost_radius, ring_nodes, ring_specs, slice_region,
};
