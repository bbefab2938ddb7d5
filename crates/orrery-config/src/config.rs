//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Perspective camera settings.
    pub camera: CameraConfig,
    /// Orbit control settings.
    pub controls: ControlsConfig,
    /// Ring and slice layout parameters.
    pub layout: LayoutConfig,
    /// Per-frame rotation increments.
    pub animation: AnimationConfig,
    /// Asset locations.
    pub assets: AssetConfig,
    /// Fog and text labels.
    pub scenery: SceneryConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Perspective camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Initial eye position.
    pub position: [f32; 3],
    /// Point the camera orbits around.
    pub target: [f32; 3],
}

/// Orbit control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Allow panning the orbit target with the right mouse button.
    pub enable_pan: bool,
    /// Closest allowed eye-to-target distance.
    pub min_distance: f32,
    /// Farthest allowed eye-to-target distance.
    pub max_distance: f32,
    /// Radians of rotation per pixel of pointer drag.
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line.
    pub zoom_speed: f32,
    /// World units of pan per pixel of pointer drag.
    pub pan_speed: f32,
}

/// Ring and slice layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Inner radius of the innermost ring.
    pub base_radius: f32,
    /// Distance between the inner radii of consecutive rings.
    pub ring_gap: f32,
    /// Radial width of every ring.
    pub ring_width: f32,
    /// Number of concentric rings.
    pub num_rings: u32,
    /// Tube cross-section segments of each torus ring.
    pub radial_segments: u32,
    /// Segments around each torus ring.
    pub tubular_segments: u32,
    /// Theta segments of the white backing annulus.
    pub backing_segments: u32,
    /// Number of angular slices.
    pub num_slices: u32,
    /// Angular width of each slice in radians.
    pub slice_angle: f32,
    /// Inner radius of the slice region.
    pub slice_inner_radius: f32,
    /// Height of the slice region above the ground.
    pub slice_height: f32,
    /// Theta segments of each slice.
    pub slice_segments: u32,
}

/// Per-frame rotation increments in radians.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Y rotation added to the globe pivot each frame.
    pub pivot_spin: f32,
    /// Y rotation added to the image plane each frame.
    pub image_spin: f32,
}

/// Asset locations. Relative paths resolve against `root`; `http(s)://`
/// sources are fetched over the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory relative asset paths are resolved against.
    pub root: PathBuf,
    /// Number of background loader threads.
    pub loader_threads: usize,
    /// Ground plane texture.
    pub ground_texture: String,
    /// Tiled ring texture.
    pub tile_texture: String,
    /// Image plane texture orbiting the globe.
    pub image_texture: String,
    /// Globe color map.
    pub globe_texture: String,
    /// Globe bump map.
    pub globe_bump: String,
    /// Flag drawn on the central disk.
    pub inner_flag: String,
    /// Flag drawn on the first annulus.
    pub outer_flag: String,
    /// Six cube faces in `px, nx, py, ny, pz, nz` order.
    pub skybox: Vec<String>,
    /// Typeface JSON font used by text labels.
    pub font: String,
}

/// A text label appended once its font has loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelConfig {
    /// Text content.
    pub text: String,
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion depth.
    pub depth: f32,
    /// `0xRRGGBB` color.
    pub color: u32,
    /// World position of the text origin.
    pub position: [f32; 3],
}

/// Fog and label configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneryConfig {
    /// `0xRRGGBB` fog color.
    pub fog_color: u32,
    /// Distance where fog starts.
    pub fog_near: f32,
    /// Distance where fog is opaque.
    pub fog_far: f32,
    /// Text labels.
    pub labels: Vec<LabelConfig>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Stop after this many frames (`None` = run until closed).
    pub max_frames: Option<u64>,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 10.0, 25.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_pan: false,
            min_distance: 10.0,
            max_distance: 100.0,
            rotate_speed: 0.005,
            zoom_speed: 0.05,
            pan_speed: 0.05,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_radius: 14.0,
            ring_gap: 10.0,
            ring_width: 2.0,
            num_rings: 21,
            radial_segments: 32,
            tubular_segments: 64,
            backing_segments: 32,
            num_slices: 1,
            slice_angle: std::f32::consts::FRAC_PI_4,
            slice_inner_radius: 1.0,
            slice_height: 8.0,
            slice_segments: 3,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            pivot_spin: 0.005,
            image_spin: 0.005,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            loader_threads: 2,
            ground_texture: "grass_texture.jpg".to_string(),
            tile_texture: "tile_texture.jpg".to_string(),
            image_texture: "VKB.png".to_string(),
            globe_texture: "earth-texture.jpg".to_string(),
            globe_bump: "earth-bump.png".to_string(),
            inner_flag: "flags/india.png".to_string(),
            outer_flag: "flags/argentina.png".to_string(),
            skybox: ["px.jpg", "nx.jpg", "py.jpg", "ny.jpg", "pz.jpg", "nz.jpg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            font: "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json"
                .to_string(),
        }
    }
}

impl Default for SceneryConfig {
    fn default() -> Self {
        Self {
            fog_color: 0xcceeff,
            fog_near: 20.0,
            fog_far: 300.0,
            labels: vec![
                LabelConfig {
                    text: "Industries".to_string(),
                    size: 4.0,
                    depth: 0.2,
                    color: 0xffffff,
                    position: [20.0, 16.0, 10.0],
                },
                LabelConfig {
                    text: "India".to_string(),
                    size: 2.0,
                    depth: 0.2,
                    color: 0x000000,
                    position: [0.0, 2.0, 0.0],
                },
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frames: None,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default per-user config directory (`<os config dir>/orrery`), if the OS
    /// exposes one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("orrery"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let write_err = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(&config_path, serialized).map_err(write_err)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("num_rings: 21"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_layout_defaults_match_reference_scene() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.base_radius, 14.0);
        assert_eq!(layout.ring_gap, 10.0);
        assert_eq!(layout.ring_width, 2.0);
        assert_eq!(layout.num_rings, 21);
        assert_eq!(layout.num_slices, 1);
        assert!((layout.slice_angle - std::f32::consts::FRAC_PI_4).abs() < 1e-7);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), layout: (num_rings: 5))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.layout.num_rings, 5);
        assert_eq!(config.layout.ring_gap, 10.0);
        assert_eq!(config.controls, ControlsConfig::default());
        assert_eq!(config.scenery.labels.len(), 2);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.layout.ring_gap = 12.0;
        config.debug.max_frames = Some(10);

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.animation.pivot_spin = 0.01;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().animation.pivot_spin, 0.01);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        match result {
            Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_skybox_has_six_faces() {
        assert_eq!(AssetConfig::default().skybox.len(), 6);
    }
}
