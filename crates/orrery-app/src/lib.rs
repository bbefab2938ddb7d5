//! Orrery viewer: window, input, orbit controls and the frame loop that ties
//! the scene, asset loader and renderer together.

pub mod context;
pub mod controls;
pub mod error;
pub mod frame_loop;
pub mod input;
pub mod platform;
pub mod window;

pub use context::{SceneContext, start_asset_loads};
pub use controls::OrbitControls;
pub use error::AppError;
pub use frame_loop::{CancellationToken, FrameLoop};
pub use input::PointerState;
pub use platform::{PlatformDirs, PlatformError};
pub use window::{AppState, run};
