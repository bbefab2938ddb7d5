//! Ray picking against mesh bounding spheres.

use glam::Vec3;

use crate::graph::{NodeId, SceneGraph};

/// A ray in world space. `direction` is expected to be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first intersection with a sphere, if any.
    /// A ray starting inside the sphere hits at distance 0.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        if c <= 0.0 {
            return Some(0.0);
        }
        let discriminant = b * b - c;
        if b > 0.0 || discriminant < 0.0 {
            return None;
        }
        Some(-b - discriminant.sqrt())
    }
}

/// Closest picked node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

impl SceneGraph {
    /// Nearest mesh among `candidates` whose world-space bounding sphere the
    /// ray crosses. Groups, hidden nodes and unknown ids are ignored.
    pub fn raycast(&self, ray: &Ray, candidates: &[NodeId]) -> Option<Hit> {
        candidates
            .iter()
            .filter_map(|&id| {
                let node = self.get(id)?;
                let mesh = node.as_mesh()?;
                if !node.visible {
                    return None;
                }
                let world = self.world_matrix(id).ok()?;
                let (local_center, local_radius) = mesh.geometry.bounding_sphere();
                let center = world.transform_point3(local_center);
                let (scale, _, _) = world.to_scale_rotation_translation();
                let radius = local_radius * scale.abs().max_element();
                let distance = ray.intersect_sphere(center, radius)?;
                Some(Hit {
                    node: id,
                    distance,
                    point: ray.at(distance),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
