//! Asynchronous texture and font loading.
//!
//! [`AssetLoader`] reads and decodes on worker threads; the main thread calls
//! [`AssetLoader::poll`] once per frame to run completion callbacks against
//! its own context. Failures are logged and their callbacks dropped.

mod error;
mod loader;
mod source;
mod texture;

pub use error::AssetError;
pub use loader::{Asset, AssetKind, AssetLoader, AssetRequest, RequestId};
pub use source::{AssetSource, CONNECT_TIMEOUT, Fetcher, MAX_BODY_BYTES, READ_TIMEOUT};
pub use texture::{CubeTextureData, TextureData, decode_cube, decode_texture};
