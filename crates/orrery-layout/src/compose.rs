//! Assembly of the full decorative scene.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use orrery_config::{Config, LabelConfig};
use orrery_geometry::{TextOptions, Typeface, annulus, disk, plane, sphere, text_geometry};
use orrery_materials::{
    Color, TextureRef, disk_material, flag_material, globe_material, ground_material,
    image_plane_material, label_material,
};
use orrery_scene::{Background, CUBE_FACE_COUNT, Fog, Light, Node, NodeId, SceneGraph, Transform};

use crate::rings::{LayoutParams, generate_layout, slice_region};

const GROUND_SIZE: f32 = 1000.0;
const GLOBE_RADIUS: f32 = 5.0;
const GLOBE_SEGMENTS: u32 = 64;
const GLOBE_HEIGHT: f32 = 12.5;
const DISK_SEGMENTS: u32 = 64;
const DISK_OFFSET: f32 = 0.02;
const FLAG_OFFSET: f32 = 0.1;
const INNER_FLAG_RADIUS: f32 = 15.0;
const OUTER_FLAG_RADII: (f32, f32) = (15.0, 25.0);
const FLAG_SEGMENTS: u32 = 32;
const IMAGE_PLANE_SIZE: (f32, f32) = (20.0, 10.0);
/// Height of the image plane above the globe center.
const IMAGE_PLANE_DISTANCE: f32 = 15.0;
const POINT_LIGHT_POSITION: Vec3 = Vec3::new(0.0, 50.0, 50.0);
const AMBIENT_COLOR: Color = Color(0x404040);

/// A text label to build once its font arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub text: String,
    pub size: f32,
    pub depth: f32,
    pub color: Color,
    pub position: Vec3,
}

impl From<&LabelConfig> for LabelRequest {
    fn from(label: &LabelConfig) -> Self {
        Self {
            text: label.text.clone(),
            size: label.size,
            depth: label.depth,
            color: Color(label.color),
            position: Vec3::from_array(label.position),
        }
    }
}

/// The composed scene plus handles the frame loop animates.
#[derive(Debug, Clone)]
pub struct ComposedScene {
    pub scene: SceneGraph,
    /// Group holding the globe and the image plane; spun about Y.
    pub pivot: NodeId,
    /// Spun about its own Y axis on top of the pivot rotation.
    pub image_plane: NodeId,
    /// Font source every label is laid out with.
    pub font: String,
    pub labels: Vec<LabelRequest>,
}

fn flat(y: f32, rotation_x: f32) -> Transform {
    Transform::from_position(Vec3::new(0.0, y, 0.0)).with_rotation_x(rotation_x)
}

/// Builds the whole decorative scene from `config`.
///
/// Textures are referenced, not loaded: the renderer shows meshes whose
/// textures are still pending with a white placeholder. Labels need a font and
/// are returned as requests.
pub fn compose_scene(config: &Config) -> ComposedScene {
    let assets = &config.assets;
    let mut scene = SceneGraph::new();

    scene.add(
        Node::mesh(
            "ground",
            plane(GROUND_SIZE, GROUND_SIZE),
            ground_material(&TextureRef::new(assets.ground_texture.as_str())),
        )
        .with_transform(flat(0.0, -FRAC_PI_2)),
    );

    scene.add_light(Light::Point {
        color: Color::WHITE,
        intensity: 1.0,
        position: POINT_LIGHT_POSITION,
        distance: 0.0,
    });
    scene.add_light(Light::Ambient {
        color: AMBIENT_COLOR,
        intensity: 1.0,
    });

    let globe = Node::mesh(
        "globe",
        sphere(GLOBE_RADIUS, GLOBE_SEGMENTS, GLOBE_SEGMENTS),
        globe_material(
            &TextureRef::new(assets.globe_texture.as_str()),
            &TextureRef::new(assets.globe_bump.as_str()),
        ),
    )
    .with_transform(Transform::from_position(Vec3::new(0.0, GLOBE_HEIGHT, 0.0)));
    let image_plane = Node::mesh(
        "image-plane",
        plane(IMAGE_PLANE_SIZE.0, IMAGE_PLANE_SIZE.1),
        image_plane_material(&TextureRef::new(assets.image_texture.as_str())),
    )
    .with_transform(Transform::from_position(Vec3::new(
        0.0,
        GLOBE_HEIGHT + IMAGE_PLANE_DISTANCE,
        0.0,
    )));
    let (pivot, pivot_children) = scene.add_group(Node::group("globe-pivot"), [globe, image_plane]);
    let image_plane = pivot_children[1];

    scene.add(
        Node::mesh(
            "disk",
            disk(config.layout.base_radius, DISK_SEGMENTS),
            disk_material(),
        )
        .with_transform(flat(DISK_OFFSET, FRAC_PI_2)),
    );

    let params = LayoutParams::from_config(
        &config.layout,
        TextureRef::new(assets.tile_texture.as_str()),
    );
    for primitive in generate_layout(&params) {
        scene.add(primitive.into_node());
    }

    scene.add(
        Node::mesh(
            "inner-flag",
            disk(INNER_FLAG_RADIUS, FLAG_SEGMENTS),
            flag_material(&TextureRef::new(assets.inner_flag.as_str())),
        )
        .with_transform(flat(FLAG_OFFSET, FRAC_PI_2)),
    );

    for primitive in slice_region(&params) {
        scene.add(primitive.into_node());
    }

    scene.add(
        Node::mesh(
            "outer-flag",
            annulus(OUTER_FLAG_RADII.0, OUTER_FLAG_RADII.1, FLAG_SEGMENTS),
            flag_material(&TextureRef::new(assets.outer_flag.as_str())),
        )
        .with_transform(flat(FLAG_OFFSET, FRAC_PI_2)),
    );

    scene.set_fog(Fog {
        color: Color(config.scenery.fog_color),
        near: config.scenery.fog_near,
        far: config.scenery.fog_far,
    });
    scene.set_background(skybox(&assets.skybox));

    tracing::info!(
        nodes = scene.len(),
        rings = config.layout.num_rings,
        labels = config.scenery.labels.len(),
        "composed scene"
    );

    ComposedScene {
        scene,
        pivot,
        image_plane,
        font: assets.font.clone(),
        labels: config.scenery.labels.iter().map(LabelRequest::from).collect(),
    }
}

fn skybox(faces: &[String]) -> Background {
    let refs: Vec<TextureRef> = faces.iter().map(|f| TextureRef::new(f.as_str())).collect();
    match <[TextureRef; CUBE_FACE_COUNT]>::try_from(refs) {
        Ok(faces) => Background::CubeTexture(faces),
        Err(refs) => {
            tracing::warn!(
                faces = refs.len(),
                "skybox needs exactly {CUBE_FACE_COUNT} faces; using no background"
            );
            Background::None
        }
    }
}

/// Builds the scene node for a label once `typeface` is available.
pub fn label_node(typeface: &Typeface, label: &LabelRequest) -> Node {
    let geometry = text_geometry(
        typeface,
        &label.text,
        TextOptions {
            size: label.size,
            depth: label.depth,
            ..TextOptions::default()
        },
    );
    Node::mesh(
        format!("label-{}", label.text),
        geometry,
        label_material(label.color),
    )
    .with_transform(Transform::from_position(label.position))
}

#[cfg(test)]
mod tests {
    use orrery_geometry::{Geometry, GeometryKind};
    use orrery_materials::ShadingModel;

    use super::*;

    fn mesh_kind(scene: &SceneGraph, name: &str) -> GeometryKind {
        let id = scene.find(name).unwrap_or_else(|| panic!("missing {name}"));
        scene.get(id).unwrap().as_mesh().unwrap().geometry.kind()
    }

    #[test]
    fn test_default_scene_contents() {
        let composed = compose_scene(&Config::default());
        let scene = &composed.scene;

        // ground, pivot, globe, image plane, disk, 21 triples, 2 flags, 1 slice
        assert_eq!(scene.len(), 5 + 21 * 3 + 2 + 1);
        assert_eq!(mesh_kind(scene, "ground"), GeometryKind::Plane);
        assert_eq!(mesh_kind(scene, "globe"), GeometryKind::Sphere);
        assert_eq!(mesh_kind(scene, "inner-flag"), GeometryKind::Disk);
        assert_eq!(mesh_kind(scene, "outer-flag"), GeometryKind::Ring);
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.fog().map(|f| (f.near, f.far)), Some((20.0, 300.0)));
        assert!(matches!(scene.background(), Background::CubeTexture(_)));
    }

    #[test]
    fn test_root_order() {
        let composed = compose_scene(&Config::default());
        let scene = &composed.scene;
        let names: Vec<&str> = scene
            .roots()
            .iter()
            .map(|id| scene.get(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(&names[..4], ["ground", "globe-pivot", "disk", "ring-0"]);
        assert_eq!(names[names.len() - 3], "inner-flag");
        assert_eq!(names[names.len() - 2], "slice-0");
        assert_eq!(names[names.len() - 1], "outer-flag");
    }

    #[test]
    fn test_pivot_holds_globe_and_image_plane() {
        let composed = compose_scene(&Config::default());
        let scene = &composed.scene;
        let pivot = scene.get(composed.pivot).unwrap();
        assert_eq!(pivot.children().len(), 2);
        assert_eq!(pivot.children()[1], composed.image_plane);

        let image = scene.get(composed.image_plane).unwrap();
        assert_eq!(image.transform.position.y, 27.5);
        assert!(image.as_mesh().unwrap().material.transparent);
    }

    #[test]
    fn test_globe_material() {
        let composed = compose_scene(&Config::default());
        let scene = &composed.scene;
        let globe = scene.get(scene.find("globe").unwrap()).unwrap();
        assert_eq!(globe.transform.position.y, 12.5);
        let material = &globe.as_mesh().unwrap().material;
        assert_eq!(material.model, ShadingModel::Phong);
        assert!(material.bump_map().is_some());
    }

    #[test]
    fn test_labels_requested() {
        let composed = compose_scene(&Config::default());
        assert_eq!(composed.labels.len(), 2);
        assert_eq!(composed.labels[0].text, "Industries");
        assert_eq!(composed.labels[0].position, Vec3::new(20.0, 16.0, 10.0));
        assert_eq!(composed.labels[1].color, Color::BLACK);
        assert!(composed.font.ends_with("helvetiker_regular.typeface.json"));
    }

    #[test]
    fn test_wrong_skybox_face_count() {
        let mut config = Config::default();
        config.assets.skybox.pop();
        let composed = compose_scene(&config);
        assert_eq!(composed.scene.background(), &Background::None);
    }

    #[test]
    fn test_textures_referenced() {
        let composed = compose_scene(&Config::default());
        let sources: Vec<&str> = composed
            .scene
            .texture_refs()
            .into_iter()
            .map(|t| t.source.as_str())
            .collect();
        for expected in ["grass_texture.jpg", "tile_texture.jpg", "earth-bump.png", "px.jpg"] {
            assert!(sources.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_label_node() {
        let font = Typeface::from_json(
            r#"{"resolution": 1000, "glyphs": {"I": {"ha": 300, "o": "m 0 0 l 0 700 l 200 700 l 200 0 z"}}}"#,
        )
        .unwrap();
        let request = LabelRequest {
            text: "II".into(),
            size: 2.0,
            depth: 0.2,
            color: Color::BLACK,
            position: Vec3::new(0.0, 2.0, 0.0),
        };
        let node = label_node(&font, &request);
        assert_eq!(node.name, "label-II");
        assert_eq!(node.transform.position, request.position);
        let mesh = node.as_mesh().unwrap();
        let Geometry::Text(text) = &mesh.geometry else {
            panic!("expected text");
        };
        assert_eq!(text.options.size, 2.0);
        assert!(!text.mesh.is_empty());
    }
}
