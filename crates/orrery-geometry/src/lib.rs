//! Procedural geometry: parametric primitives (torus rings, disks, annular
//! slices, planes, spheres, extruded text) and their tessellation into
//! indexed triangle meshes.

mod coords;
mod mesh;
mod primitives;
mod tessellate;
mod text;
mod triangulate;
mod typeface;

pub use coords::lat_lon_to_vec3;
pub use mesh::MeshData;
pub use primitives::{
    CircleParams, Geometry, GeometryKind, PlaneParams, RingParams, SphereParams, TorusParams,
    annulus, disk, plane, slice, sphere, torus_from_bounds,
};
pub use text::{TextMesh, TextOptions, extrude_shapes, text_geometry};
pub use triangulate::{signed_area, triangulate};
pub use typeface::{Shape, Typeface, TypefaceError};
