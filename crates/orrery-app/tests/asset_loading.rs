//! Loads a full asset directory through the worker pool and checks that every
//! completion lands in the scene context.

use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};

use orrery_app::{SceneContext, start_asset_loads};
use orrery_assets::AssetLoader;
use orrery_config::Config;
use orrery_layout::{ComposedScene, compose_scene};

const FONT: &str = r#"{
    "resolution": 1000,
    "glyphs": {
        "I": { "ha": 300, "o": "m 0 0 l 0 700 l 200 700 l 200 0 z" },
        "?": { "ha": 400, "o": "m 0 0 l 0 100 l 100 100 l 100 0 z" },
        " ": { "ha": 250 }
    }
}"#;

fn write_png(path: &Path, size: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let image = image::RgbaImage::from_pixel(size, size, image::Rgba([40, 120, 200, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn local_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.assets.root = root.to_path_buf();
    config.assets.font = "font.json".to_string();
    config
}

fn poll_until_idle(loader: &mut AssetLoader<SceneContext>, ctx: &mut SceneContext) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while loader.pending_count() > 0 && Instant::now() < deadline {
        loader.poll(ctx);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(loader.pending_count(), 0, "loads did not finish in time");
}

fn load(config: &Config) -> (SceneContext, usize, usize) {
    let ComposedScene {
        scene,
        pivot,
        image_plane,
        font,
        labels,
    } = compose_scene(config);
    let nodes_before = scene.len();

    let mut loader = AssetLoader::new(config.assets.root.clone(), 2);
    let queued = start_asset_loads(&mut loader, &scene, &font, &labels);
    let mut ctx = SceneContext::new(scene, pivot, image_plane);
    poll_until_idle(&mut loader, &mut ctx);
    (ctx, nodes_before, queued)
}

#[test]
fn every_asset_reaches_the_scene() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    let assets = &config.assets;

    for name in [
        &assets.ground_texture,
        &assets.tile_texture,
        &assets.image_texture,
        &assets.globe_texture,
        &assets.globe_bump,
        &assets.inner_flag,
        &assets.outer_flag,
    ] {
        write_png(&dir.path().join(name), 4);
    }
    for face in &assets.skybox {
        write_png(&dir.path().join(face), 8);
    }
    std::fs::write(dir.path().join("font.json"), FONT).unwrap();

    let (mut ctx, nodes_before, queued) = load(&config);

    // Seven distinct textures, one cube, one font load per label.
    assert_eq!(queued, 7 + 1 + config.scenery.labels.len());
    for name in [&assets.ground_texture, &assets.globe_bump, &assets.outer_flag] {
        assert!(ctx.textures.is_loaded(name), "{name} not staged");
    }
    assert_eq!(ctx.textures.loaded_count(), 7);
    assert!(ctx.textures.take_cube().is_some());

    assert_eq!(ctx.scene.len(), nodes_before + config.scenery.labels.len());
    assert!(ctx.scene.find("label-Industries").is_some());
    assert!(ctx.scene.find("label-India").is_some());
}

#[test]
fn missing_assets_leave_the_scene_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());

    let (mut ctx, nodes_before, _) = load(&config);

    assert_eq!(ctx.scene.len(), nodes_before);
    assert_eq!(ctx.textures.loaded_count(), 0);
    assert!(ctx.textures.take_cube().is_none());
}

#[test]
fn broken_face_drops_only_the_background() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path());
    for (i, face) in config.assets.skybox.iter().enumerate() {
        // One face of a different size fails the whole cube.
        write_png(&dir.path().join(face), if i == 3 { 4 } else { 8 });
    }
    write_png(&dir.path().join(&config.assets.globe_texture), 2);

    let (mut ctx, _, _) = load(&config);

    assert!(ctx.textures.take_cube().is_none());
    assert!(ctx.textures.is_loaded(&config.assets.globe_texture));
}
