use std::path::PathBuf;

use orrery_geometry::TypefaceError;
use thiserror::Error;

/// Errors that can occur while fetching or decoding an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        source: Box<ureq::Error>,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        source: std::io::Error,
    },

    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("failed to decode image {name}: {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },

    #[error("failed to parse font {name}: {source}")]
    Font {
        name: String,
        source: TypefaceError,
    },

    #[error("cube texture needs 6 faces, got {0}")]
    CubeFaceCount(usize),

    #[error("cube face {index} is {width}x{height}, expected {expected}x{expected}")]
    CubeFaceSize {
        index: usize,
        width: u32,
        height: u32,
        expected: u32,
    },
}
