//! Closed-form conversion between depth and calibrated pixel disparity.
//!
//! With `F = baseline * focal * max(res)` and focus distance `f`:
//!
//! ```text
//! disparity = (F * f / depth - F) / (f * sensor)
//! depth     = F * f / (disparity * f * sensor + F)
//! ```
//!
//! The focus plane has zero disparity. A focus distance of 0 (infinity) is
//! evaluated with [`INFINITE_FOCUS_DISTANCE`].
//!
//! Low-resolution disparity is obtained by downsampling the full-resolution
//! disparity, never by converting downsampled depth: the lower median does
//! not commute with the (decreasing) depth→disparity map for even tiles.
use crate::error::{Error, Result};
use crate::image::ImageF32;
use crate::types::{CameraCalibration, INFINITE_FOCUS_DISTANCE};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Margin added on both sides of the rounded extrema.
pub const RANGE_MARGIN: f32 = 0.1;

/// Convert a depth buffer to disparity in pixels of the calibration grid.
pub fn depth_to_disparity(depth: &ImageF32, calib: &CameraCalibration) -> ImageF32 {
    let factor = calib.disparity_factor() as f64;
    let focus = calib.effective_focus_distance() as f64;
    let denom = focus * calib.sensor_size_mm as f64;
    depth.map(|d| (factor * (focus / d as f64 - 1.0) / denom) as f32)
}

/// Inverse of [`depth_to_disparity`].
pub fn disparity_to_depth(disparity: &ImageF32, calib: &CameraCalibration) -> ImageF32 {
    let factor = calib.disparity_factor() as f64;
    let focus = calib.effective_focus_distance() as f64;
    let sensor = calib.sensor_size_mm as f64;
    disparity.map(|p| (factor * focus / (p as f64 * focus * sensor + factor)) as f32)
}

/// Value range used to quantize a float map to 8 bits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicRange {
    pub min: f32,
    pub max: f32,
}

impl DynamicRange {
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(Error::InvalidParameter(format!(
                "dynamic range needs finite min < max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    /// Range of a (low-resolution) buffer: extrema rounded outward to one
    /// decimal and widened by [`RANGE_MARGIN`].
    pub fn from_buffer(buffer: &ImageF32) -> Result<Self> {
        let (lo, hi) = buffer.min_max().ok_or_else(|| {
            Error::InvalidParameter("cannot derive a range from an empty buffer".to_string())
        })?;
        let min = ((lo as f64 * 10.0).floor() / 10.0) as f32 - RANGE_MARGIN;
        let max = ((hi as f64 * 10.0).ceil() / 10.0) as f32 + RANGE_MARGIN;
        Self::new(min, max)
    }

    /// Linear map of `[min, max]` onto `[0, out_max]`, unclamped.
    #[inline]
    pub fn rescale(&self, value: f32, out_max: f32) -> f32 {
        out_max * (value - self.min) / (self.max - self.min)
    }

    /// Quantize to 8 bits: `255 * (v - min) / (max - min)`, rounded and
    /// saturated. NaN maps to 0.
    pub fn normalize_to_u8(&self, buffer: &ImageF32) -> GrayImage {
        GrayImage::from_fn(buffer.w as u32, buffer.h as u32, |x, y| {
            let v = self.rescale(buffer.get(x as usize, y as usize), 255.0);
            Luma([if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 }])
        })
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &DynamicRange) -> DynamicRange {
        DynamicRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resolution;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn focus_plane_has_zero_disparity() {
        let calib = CameraCalibration {
            focal_length_mm: 100.0,
            sensor_size_mm: 35.0,
            baseline_m: 0.05,
            focus_distance_m: 8.0,
            resolution: Resolution::new(512, 512),
        };
        let depth = ImageF32::filled(4, 3, 8.0);
        let disp = depth_to_disparity(&depth, &calib);
        assert!(disp.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn nearer_points_have_positive_disparity() {
        let calib = CameraCalibration::default();
        let depth = ImageF32::from_vec(2, 1, vec![4.0, 16.0]).unwrap();
        let disp = depth_to_disparity(&depth, &calib);
        // F = 2560, f = 8, s = 35: (2560 * 8 / 4 - 2560) / 280
        assert!(approx_eq(disp.data[0], 2560.0 / 280.0, 1e-3));
        assert!(disp.data[1] < 0.0);
    }

    #[test]
    fn infinite_focus_uses_stand_in_distance() {
        let calib = CameraCalibration {
            focus_distance_m: 0.0,
            ..CameraCalibration::default()
        };
        let depth = ImageF32::filled(1, 1, INFINITE_FOCUS_DISTANCE);
        let disp = depth_to_disparity(&depth, &calib);
        assert!(disp.data[0].is_finite());
        assert!(approx_eq(disp.data[0], 0.0, 1e-6));
    }

    #[test]
    fn disparity_inverts_back_to_depth() {
        let calib = CameraCalibration::default();
        let depth = ImageF32::from_vec(3, 1, vec![2.0, 8.0, 30.0]).unwrap();
        let back = disparity_to_depth(&depth_to_disparity(&depth, &calib), &calib);
        for (a, b) in depth.data.iter().zip(&back.data) {
            assert!(approx_eq(*a, *b, 1e-3), "{a} vs {b}");
        }
    }

    #[test]
    fn range_rounds_outward_with_margin() {
        let low = ImageF32::from_vec(2, 1, vec![-1.23, 2.01]).unwrap();
        let range = DynamicRange::from_buffer(&low).unwrap();
        assert!(approx_eq(range.min, -1.4, 1e-5));
        assert!(approx_eq(range.max, 2.2, 1e-5));
    }

    #[test]
    fn normalize_saturates() {
        let range = DynamicRange::new(0.0, 1.0).unwrap();
        let buf = ImageF32::from_vec(4, 1, vec![-0.5, 0.0, 0.5, 2.0]).unwrap();
        let png = range.normalize_to_u8(&buf);
        assert_eq!(png.into_raw(), vec![0, 0, 128, 255]);
    }

    #[test]
    fn degenerate_range_is_rejected() {
        assert!(DynamicRange::new(1.0, 1.0).is_err());
    }
}
