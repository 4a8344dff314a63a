use serde::{Deserialize, Serialize};

/// Finite stand-in for "focused at infinity" and for frustum far planes that
/// would otherwise lie behind the camera. Shared by the disparity and
/// frustum calculators so both describe the same rig.
pub const INFINITE_FOCUS_DISTANCE: f32 = 10_000.0;

/// Output image resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: usize,
    pub y: usize,
}

impl Resolution {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// `max(x, y)`, the reference length disparities are expressed against.
    pub fn max_side(&self) -> usize {
        self.x.max(self.y)
    }
}

/// Per-camera intrinsic/extrinsic parameters supplied with every depth buffer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCalibration {
    pub focal_length_mm: f32,
    pub sensor_size_mm: f32,
    /// Distance between neighbouring cameras in metres.
    pub baseline_m: f32,
    /// Focus distance in metres; 0 means focused at infinity.
    pub focus_distance_m: f32,
    /// Low-resolution output size; disparities are in pixels of this grid.
    pub resolution: Resolution,
}

impl CameraCalibration {
    /// Focus distance with the infinity stand-in applied.
    pub fn effective_focus_distance(&self) -> f32 {
        if self.focus_distance_m == 0.0 {
            INFINITE_FOCUS_DISTANCE
        } else {
            self.focus_distance_m
        }
    }

    /// `baseline * focal * max(res)`, the numerator shared by the
    /// depth/disparity relations.
    pub fn disparity_factor(&self) -> f32 {
        self.baseline_m * self.focal_length_mm * self.resolution.max_side() as f32
    }
}

impl Default for CameraCalibration {
    fn default() -> Self {
        Self {
            focal_length_mm: 100.0,
            sensor_size_mm: 35.0,
            baseline_m: 0.05,
            focus_distance_m: 8.0,
            resolution: Resolution::new(512, 512),
        }
    }
}
