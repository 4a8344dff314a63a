#![doc = include_str!("../README.md")]

// Core numeric stages and codecs
pub mod disparity;
pub mod downsample;
pub mod image;
pub mod pfm;
pub mod repair;
pub mod types;

// Products rebuilt from a rendered capture
pub mod geometry;
pub mod mosaic;
pub mod ply;
pub mod pointcloud;

// Driving the stages
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod naming;
pub mod pipeline;

// --- High-level re-exports -------------------------------------------------

pub use crate::disparity::{depth_to_disparity, DynamicRange};
pub use crate::downsample::{median_downsample, TileSize};
pub use crate::error::{Error, Result};
pub use crate::naming::{CameraGrid, ViewNaming};
pub use crate::pipeline::{
    process_camera, process_cameras, process_depth, CameraDepth, DepthOptions, DepthProducts,
    ExportConfig, OutputFormats,
};
pub use crate::types::{CameraCalibration, Resolution};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use lightfield_gt::prelude::*;
///
/// # fn main() -> lightfield_gt::Result<()> {
/// // 4x oversampled depth pass of a 128x128 view, everything at 8 m
/// let depth = ImageF32::filled(512, 512, 8.0);
/// let calib = CameraCalibration {
///     resolution: Resolution::new(128, 128),
///     ..Default::default()
/// };
/// let opts = DepthOptions {
///     tile: TileSize::square(4),
///     ..Default::default()
/// };
/// let products = process_depth(depth, &calib, &opts)?;
/// println!("disparity range {:?}", products.disp_range);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::{
        process_depth, CameraCalibration, DepthOptions, DynamicRange, Resolution, TileSize,
    };
}
