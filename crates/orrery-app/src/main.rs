//! Orrery binary: resolves directories, loads config, starts logging and
//! opens the viewer window.
//!
//! Run with: `cargo run -p orrery-app -- --assets ./assets`

use std::process::ExitCode;

use clap::Parser;
use orrery_app::{AppError, PlatformDirs};
use orrery_config::{CliArgs, Config};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match start(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("orrery: {e}");
            ExitCode::FAILURE
        }
    }
}

fn start(args: &CliArgs) -> Result<(), AppError> {
    let dirs = match &args.config {
        Some(root) => PlatformDirs::resolve_with_root(root),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "Window: {}x{} | rings: {} | assets: {}",
        config.window.width,
        config.window.height,
        config.layout.num_rings,
        config.assets.root.display(),
    );

    orrery_app::run(config)
}
