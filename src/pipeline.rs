//! Depth pipeline driver: raw renderer depth in, ground-truth products out.
//!
//! Per camera the stages run as
//!
//! 1. downsample the full-resolution depth by the tiled lower median,
//! 2. flag samples outside the low-resolution range and, if any, inpaint
//!    them and downsample again,
//! 3. convert the repaired full-resolution depth to disparity,
//! 4. downsample the disparity independently,
//! 5. derive the 8-bit ranges and export PFM (raw) and PNG (normalized).
//!
//! Cameras are independent; [`process_cameras`] maps them through rayon when
//! the `parallel` feature is enabled.
use crate::diagnostics::{
    elapsed_ms, CameraFailure, CameraReport, FrameReport, TimingBreakdown,
};
use crate::disparity::{depth_to_disparity, DynamicRange};
use crate::downsample::{median_downsample, TileSize};
use crate::error::Result;
use crate::image::io::save_gray_image;
use crate::image::ImageF32;
use crate::naming::{camera_name, map_path, MapFormat, MapKind, MapResolution, ViewNaming};
use crate::pfm::write_pfm;
use crate::repair::{out_of_range_mask, repair_artifacts, RepairReport, DEFAULT_HALF_WINDOW};
use crate::types::CameraCalibration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Numeric parameters of the depth stages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOptions {
    /// Tile collapsing the oversampled depth pass to the output resolution.
    pub tile: TileSize,
    pub half_window: usize,
}

impl Default for DepthOptions {
    fn default() -> Self {
        Self {
            tile: TileSize::square(10),
            half_window: DEFAULT_HALF_WINDOW,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFormats {
    pub png: bool,
    pub pfm: bool,
}

impl Default for OutputFormats {
    fn default() -> Self {
        Self {
            png: true,
            pfm: true,
        }
    }
}

impl OutputFormats {
    fn enabled(&self) -> impl Iterator<Item = MapFormat> {
        [(self.pfm, MapFormat::Pfm), (self.png, MapFormat::Png)]
            .into_iter()
            .filter_map(|(on, fmt)| on.then_some(fmt))
    }
}

/// Where and how products are written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub target_dir: PathBuf,
    #[serde(default)]
    pub formats: OutputFormats,
    #[serde(default)]
    pub naming: ViewNaming,
}

/// One camera's raw depth pass plus its calibration.
#[derive(Clone, Debug)]
pub struct CameraDepth {
    pub camera: usize,
    pub depth: ImageF32,
    pub calibration: CameraCalibration,
}

/// Every buffer derived from one depth pass.
#[derive(Clone, Debug)]
pub struct DepthProducts {
    /// Repaired full-resolution depth.
    pub depth_high: ImageF32,
    pub depth_low: ImageF32,
    pub disp_high: ImageF32,
    pub disp_low: ImageF32,
    pub depth_range: DynamicRange,
    pub disp_range: DynamicRange,
    pub repair: RepairReport,
}

/// Run the numeric stages on one depth pass.
pub fn process_depth(
    depth: ImageF32,
    calib: &CameraCalibration,
    opts: &DepthOptions,
) -> Result<DepthProducts> {
    let mut timings = TimingBreakdown::default();
    process_depth_timed(depth, calib, opts, &mut timings)
}

fn process_depth_timed(
    mut depth: ImageF32,
    calib: &CameraCalibration,
    opts: &DepthOptions,
    timings: &mut TimingBreakdown,
) -> Result<DepthProducts> {
    let mut depth_low = timings.measure("downsample_depth", || {
        median_downsample(&depth, opts.tile)
    })?;

    let mask = out_of_range_mask(&depth, &depth_low);
    let repair = if mask.any() {
        let report = timings.measure("repair", || {
            repair_artifacts(&mut depth, &mask, opts.half_window)
        });
        depth_low = timings.measure("downsample_repaired", || {
            median_downsample(&depth, opts.tile)
        })?;
        report
    } else {
        RepairReport::default()
    };

    let disp_high = timings.measure("disparity", || depth_to_disparity(&depth, calib));
    let disp_low = timings.measure("downsample_disparity", || {
        median_downsample(&disp_high, opts.tile)
    })?;

    let depth_range = DynamicRange::from_buffer(&depth_low)?;
    let disp_range = DynamicRange::from_buffer(&disp_low)?;
    log::debug!(
        "depth range [{:.1}, {:.1}], disparity range [{:.1}, {:.1}]",
        depth_range.min,
        depth_range.max,
        disp_range.min,
        disp_range.max
    );

    Ok(DepthProducts {
        depth_high: depth,
        depth_low,
        disp_high,
        disp_low,
        depth_range,
        disp_range,
        repair,
    })
}

/// Write the enabled formats of all four maps for `camera`.
pub fn export_products(
    products: &DepthProducts,
    export: &ExportConfig,
    camera: usize,
) -> Result<Vec<PathBuf>> {
    let maps = [
        (MapKind::Depth, MapResolution::High, &products.depth_high, &products.depth_range),
        (MapKind::Disparity, MapResolution::High, &products.disp_high, &products.disp_range),
        (MapKind::Depth, MapResolution::Low, &products.depth_low, &products.depth_range),
        (MapKind::Disparity, MapResolution::Low, &products.disp_low, &products.disp_range),
    ];
    let mut written = Vec::new();
    for format in export.formats.enabled() {
        for (kind, res, buffer, range) in maps {
            let path = map_path(&export.target_dir, kind, res, format, export.naming, camera);
            match format {
                MapFormat::Pfm => write_pfm(buffer, &path)?,
                MapFormat::Png => save_gray_image(&range.normalize_to_u8(buffer), &path)?,
            }
            log::info!("wrote {}", path.display());
            written.push(path);
        }
    }
    Ok(written)
}

/// Process and export one camera.
pub fn process_camera(
    input: CameraDepth,
    opts: &DepthOptions,
    export: &ExportConfig,
) -> Result<CameraReport> {
    let start = Instant::now();
    let mut timings = TimingBreakdown::default();
    let highres = input.depth.dims();
    let products = process_depth_timed(input.depth, &input.calibration, opts, &mut timings)?;
    let written = timings.measure("export", || export_products(&products, export, input.camera))?;
    timings.total_ms = elapsed_ms(start);

    Ok(CameraReport {
        camera: input.camera,
        name: camera_name(input.camera),
        highres,
        lowres: products.depth_low.dims(),
        depth_range: products.depth_range,
        disparity_range: products.disp_range,
        repair: products.repair,
        written,
        timings,
    })
}

/// Process a batch of cameras, one result per input in input order.
pub fn process_cameras(
    inputs: Vec<CameraDepth>,
    opts: &DepthOptions,
    export: &ExportConfig,
) -> Vec<Result<CameraReport>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        inputs
            .into_par_iter()
            .map(|input| process_camera(input, opts, export))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        inputs
            .into_iter()
            .map(|input| process_camera(input, opts, export))
            .collect()
    }
}

/// Smallest range covering every camera's disparity range.
pub fn frame_disparity_range<'a>(
    reports: impl IntoIterator<Item = &'a CameraReport>,
) -> Option<DynamicRange> {
    reports
        .into_iter()
        .map(|r| r.disparity_range)
        .reduce(|acc, r| acc.union(&r))
}

/// Split batch results into a [`FrameReport`].
pub fn summarize_frame(results: Vec<Result<CameraReport>>, cameras: &[usize]) -> FrameReport {
    let mut frame = FrameReport::default();
    for (result, &camera) in results.into_iter().zip(cameras) {
        match result {
            Ok(report) => frame.cameras.push(report),
            Err(err) => {
                log::error!("{}: {err}", camera_name(camera));
                frame.failures.push(CameraFailure {
                    camera,
                    error: err.to_string(),
                });
            }
        }
    }
    frame.disparity_range = frame_disparity_range(&frame.cameras);
    frame.total_ms = frame.cameras.iter().map(|c| c.timings.total_ms).sum();
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfm::read_pfm_gray;

    fn calib(res: usize) -> CameraCalibration {
        CameraCalibration {
            resolution: crate::types::Resolution::new(res, res),
            ..CameraCalibration::default()
        }
    }

    #[test]
    fn clean_depth_skips_repair() {
        let depth = ImageF32::filled(8, 8, 8.0);
        let opts = DepthOptions {
            tile: TileSize::square(2),
            ..DepthOptions::default()
        };
        let products = process_depth(depth, &calib(4), &opts).unwrap();
        assert_eq!(products.repair.flagged, 0);
        assert_eq!(products.depth_low.dims(), (4, 4));
        assert!(products.disp_low.data.iter().all(|&v| v == 0.0));
        assert!((products.disp_range.min + 0.1).abs() < 1e-6);
        assert!((products.disp_range.max - 0.1).abs() < 1e-6);
    }

    #[test]
    fn artifact_is_repaired_before_conversion() {
        let mut depth = ImageF32::filled(4, 4, 8.0);
        depth.set(1, 2, 1.0e6);
        let opts = DepthOptions {
            tile: TileSize::square(2),
            ..DepthOptions::default()
        };
        let products = process_depth(depth, &calib(2), &opts).unwrap();
        assert_eq!(products.repair.flagged, 1);
        assert_eq!(products.repair.repaired, 1);
        assert_eq!(products.depth_high.get(1, 2), 8.0);
        assert!(products.disp_high.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn indivisible_depth_fails() {
        let depth = ImageF32::filled(5, 4, 1.0);
        let opts = DepthOptions {
            tile: TileSize::square(2),
            ..DepthOptions::default()
        };
        assert!(process_depth(depth, &calib(2), &opts).is_err());
    }

    #[test]
    fn export_honors_formats_and_naming() {
        let dir = tempfile::tempdir().unwrap();
        let export = ExportConfig {
            target_dir: dir.path().to_path_buf(),
            formats: OutputFormats {
                png: false,
                pfm: true,
            },
            naming: ViewNaming::AllViews,
        };
        let depth = ImageF32::from_vec(2, 2, vec![7.5, 8.0, 8.2, 8.5]).unwrap();
        let opts = DepthOptions {
            tile: TileSize::square(2),
            ..DepthOptions::default()
        };
        let report = process_camera(
            CameraDepth {
                camera: 3,
                depth: depth.clone(),
                calibration: calib(1),
            },
            &opts,
            &export,
        )
        .unwrap();
        assert_eq!(report.written.len(), 4);
        assert_eq!(report.name, "Cam003");
        let back = read_pfm_gray(&dir.path().join("gt_depth_highres_Cam003.pfm")).unwrap();
        assert_eq!(back, depth);
        assert!(!dir.path().join("gt_disp_lowres_Cam003.png").exists());
    }

    #[test]
    fn frame_range_is_union_of_cameras() {
        let dir = tempfile::tempdir().unwrap();
        let export = ExportConfig {
            target_dir: dir.path().to_path_buf(),
            formats: OutputFormats {
                png: true,
                pfm: false,
            },
            naming: ViewNaming::AllViews,
        };
        let opts = DepthOptions {
            tile: TileSize::square(1),
            ..DepthOptions::default()
        };
        let inputs = vec![
            CameraDepth {
                camera: 0,
                depth: ImageF32::filled(2, 2, 4.0),
                calibration: calib(2),
            },
            CameraDepth {
                camera: 1,
                depth: ImageF32::filled(2, 2, 16.0),
                calibration: calib(2),
            },
            CameraDepth {
                camera: 2,
                depth: ImageF32::filled(3, 2, 16.0),
                calibration: calib(2),
            },
        ];
        let results = process_cameras(inputs, &opts, &export);
        let frame = summarize_frame(results, &[0, 1, 2]);
        assert_eq!(frame.cameras.len(), 3);
        assert!(frame.failures.is_empty());
        let range = frame.disparity_range.unwrap();
        assert!(range.min < 0.0 && range.max > 0.0);
        assert_eq!(range.min, frame.cameras[1].disparity_range.min);
        assert_eq!(range.max, frame.cameras[0].disparity_range.max);
    }
}
