//! Retained scene graph: meshes and groups with local transforms, plus the
//! scene-wide lights, fog and background.

mod environment;
mod graph;
mod pick;
mod transform;

pub use environment::{Background, CUBE_FACE_COUNT, Fog, Light};
pub use graph::{Mesh, Node, NodeId, NodeKind, SceneError, SceneGraph, WorldNode};
pub use pick::{Hit, Ray};
pub use transform::Transform;
