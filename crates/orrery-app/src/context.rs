//! Scene state owned by the application and mutated by asset completions.

use std::collections::HashSet;

use orrery_assets::AssetLoader;
use orrery_config::AnimationConfig;
use orrery_layout::{LabelRequest, label_node};
use orrery_render::TextureStore;
use orrery_scene::{Background, Hit, NodeId, Ray, SceneGraph};
use tracing::{debug, info, warn};

/// The live scene plus everything completions and the frame loop touch.
#[derive(Debug)]
pub struct SceneContext {
    pub scene: SceneGraph,
    /// Decoded images waiting for GPU upload.
    pub textures: TextureStore,
    pub pivot: NodeId,
    pub image_plane: NodeId,
    /// Nodes eligible for hover and click picking. Empty unless populated.
    pub clickable: Vec<NodeId>,
    pub hovered: Option<NodeId>,
}

impl SceneContext {
    pub fn new(scene: SceneGraph, pivot: NodeId, image_plane: NodeId) -> Self {
        Self {
            scene,
            textures: TextureStore::new(),
            pivot,
            image_plane,
            clickable: Vec::new(),
            hovered: None,
        }
    }

    /// Advances both rotations by one frame's increment.
    pub fn spin(&mut self, animation: &AnimationConfig) {
        for (id, step) in [
            (self.pivot, animation.pivot_spin),
            (self.image_plane, animation.image_spin),
        ] {
            match self.scene.transform_mut(id) {
                Ok(transform) => transform.rotation.y += step,
                Err(err) => warn!("cannot spin {id:?}: {err}"),
            }
        }
    }

    /// Updates the hovered node from a pointer ray. Returns the nearest hit.
    pub fn hover(&mut self, ray: &Ray) -> Option<Hit> {
        let hit = self.scene.raycast(ray, &self.clickable);
        let hovered = hit.as_ref().map(|h| h.node);
        if hovered != self.hovered {
            debug!(?hovered, "hover changed");
            self.hovered = hovered;
        }
        hit
    }
}

/// Queues every texture, the background cube and one font load per label.
/// Returns the number of requests queued.
pub fn start_asset_loads(
    loader: &mut AssetLoader<SceneContext>,
    scene: &SceneGraph,
    font: &str,
    labels: &[LabelRequest],
) -> usize {
    let mut queued = 0;

    let cube_faces: Vec<String> = match scene.background() {
        Background::CubeTexture(faces) => faces.iter().map(|f| f.source.clone()).collect(),
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    for reference in scene.texture_refs() {
        if cube_faces.contains(&reference.source) || !seen.insert(reference.source.clone()) {
            continue;
        }
        let source = reference.source.clone();
        let requested = loader.load_texture(&reference.source, move |data, ctx| {
            debug!(%source, width = data.width, height = data.height, "texture ready");
            ctx.textures.insert(source, data);
        });
        queued += usize::from(requested.is_some());
    }

    if !cube_faces.is_empty() {
        let requested = loader.load_cube_texture(&cube_faces, |cube, ctx| {
            debug!(size = cube.size, "background cube ready");
            ctx.textures.insert_cube(cube);
        });
        queued += usize::from(requested.is_some());
    }

    for label in labels {
        let label = label.clone();
        let requested = loader.load_font(font, move |typeface, ctx| {
            let id = ctx.scene.add(label_node(&typeface, &label));
            info!(text = %label.text, ?id, "label added");
        });
        queued += usize::from(requested.is_some());
    }

    info!(queued, "asset loads started");
    queued
}
