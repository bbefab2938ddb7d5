//! Surface materials for scene primitives.
//!
//! [`MaterialSpec`] describes how a mesh is shaded: base color and/or texture,
//! which faces are drawn, transparency and the surface response (plain, glass
//! or bump mapped). The [`roles`] module maps each decorative element to its
//! material.

mod material;
pub mod roles;

pub use material::{
    Color, MaterialError, MaterialGpuData, MaterialSpec, ShadingModel, Side, SurfaceResponse,
    TextureRef,
};
pub use roles::{
    RING_COLOR, SAFFRON, backing_material, disk_material, flag_material, globe_material,
    ground_material, image_plane_material, label_material, outline_material, ring_material,
    slice_material,
};
