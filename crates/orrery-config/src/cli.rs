//! Command-line argument parsing for Orrery.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Decorative globe and ring scene")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory that relative asset paths resolve against.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Number of concentric rings.
    #[arg(long)]
    pub rings: Option<u32>,

    /// Distance between consecutive ring inner radii.
    #[arg(long)]
    pub ring_gap: Option<f32>,

    /// Exit after rendering this many frames.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref root) = args.assets {
            self.assets.root = root.clone();
        }
        if let Some(rings) = args.rings {
            self.layout.num_rings = rings;
        }
        if let Some(gap) = args.ring_gap {
            self.layout.ring_gap = gap;
        }
        if let Some(frames) = args.frames {
            self.debug.max_frames = Some(frames);
        }
    }
}
