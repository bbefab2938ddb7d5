//! Arena-backed scene graph.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Root
//! order is insertion order, and traversal is depth-first pre-order, so draw
//! order for opaque geometry follows the order nodes were added.

use glam::Mat4;
use orrery_geometry::Geometry;
use orrery_materials::{MaterialSpec, SurfaceResponse, TextureRef};
use thiserror::Error;

use crate::environment::{Background, Fog, Light};
use crate::transform::Transform;

/// Index of a node within its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
}

/// Drawable geometry paired with its surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: MaterialSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Transform-only node used to rotate its children together.
    Group,
    Mesh(Mesh),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: MaterialSpec) -> Self {
        Self::new(name, NodeKind::Mesh(Mesh { geometry, material }))
    }

    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

/// A visible node reached by traversal, with its accumulated world matrix.
#[derive(Debug, Clone, Copy)]
pub struct WorldNode<'a> {
    pub id: NodeId,
    pub node: &'a Node,
    pub world: Mat4,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    lights: Vec<Light>,
    fog: Option<Fog>,
    background: Background,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.insert(node, None);
        self.roots.push(id);
        id
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        if self.get(parent).is_none() {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.insert(node, Some(parent));
        self.nodes[parent.0 as usize].children.push(id);
        Ok(id)
    }

    /// Adds a top-level `group` with `children` in order. Returns the group id
    /// and the child ids.
    pub fn add_group(
        &mut self,
        group: Node,
        children: impl IntoIterator<Item = Node>,
    ) -> (NodeId, Vec<NodeId>) {
        let parent = self.add(group);
        let ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.insert(child, Some(parent)))
            .collect();
        self.nodes[parent.0 as usize].children.extend_from_slice(&ids);
        (parent, ids)
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if let NodeKind::Mesh(mesh) = &mut node.kind {
            mesh.material = admit_material(&node.name, std::mem::take(&mut mesh.material));
        }
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Mutable access to a node's transform.
    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform, SceneError> {
        self.get_mut(id)
            .map(|n| &mut n.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = Some(fog);
    }

    pub fn fog(&self) -> Option<&Fog> {
        self.fog.as_ref()
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// World matrix of `id`: product of its ancestors' local matrices.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.get(id).ok_or(SceneError::UnknownNode(id))?;
        let mut world = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.get(parent).ok_or(SceneError::UnknownNode(parent))?;
            world = node.transform.matrix() * world;
        }
        Ok(world)
    }

    /// Visible nodes in depth-first pre-order with world matrices. Children of
    /// a hidden node are skipped too.
    pub fn traverse(&self) -> Vec<WorldNode<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            out.push(WorldNode { id, node, world });
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
        out
    }

    /// Every texture referenced by meshes and the background.
    pub fn texture_refs(&self) -> Vec<&TextureRef> {
        let mut refs: Vec<&TextureRef> = self
            .nodes
            .iter()
            .filter_map(Node::as_mesh)
            .flat_map(|m| m.material.texture_refs())
            .collect();
        if let Background::CubeTexture(faces) = &self.background {
            refs.extend(faces.iter());
        }
        refs
    }
}

/// Clamps a material on its way into the scene. A texture reference with an
/// empty source is dropped with a warning and the mesh draws without it.
fn admit_material(node: &str, material: MaterialSpec) -> MaterialSpec {
    match material.clone().validated() {
        Ok(spec) => spec,
        Err(err) => {
            tracing::warn!(node, "invalid material: {err}");
            let mut spec = material;
            spec.texture = spec.texture.filter(|t| !t.source.is_empty());
            if spec.bump_map().is_some_and(|map| map.source.is_empty()) {
                spec.surface = SurfaceResponse::Plain;
            }
            spec.validated().unwrap_or_default()
        }
    }
}
