//! Error type shared by the codecs, the numeric stages and the exporters.
//!
//! Low-level failures are raised to the calling stage; nothing here retries.
//! Pixel repairs that find no valid neighbor are not errors: they are
//! recorded in [`crate::repair::RepairReport`] instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed PFM/PLY header or payload.
    #[error("format error: {0}")]
    Format(String),

    /// Tile size does not evenly divide the array.
    #[error(
        "image of {rows}x{cols} (rows x cols) is not a multiple of tile {tile_rows}x{tile_cols}"
    )]
    Dimension {
        rows: usize,
        cols: usize,
        tile_rows: usize,
        tile_cols: usize,
    },

    /// Two buffers that must share a shape do not.
    #[error("{what}: expected {expected:?} (w, h), found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A file expected under the naming contract is absent.
    #[error("missing required file {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image {
            path: path.into(),
            source,
        }
    }
}
