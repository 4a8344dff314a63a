use super::timing::TimingBreakdown;
use crate::disparity::DynamicRange;
use crate::repair::RepairReport;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of processing one camera's depth buffer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraReport {
    pub camera: usize,
    pub name: String,
    /// Full-resolution `(w, h)`.
    pub highres: (usize, usize),
    /// Output resolution `(w, h)`.
    pub lowres: (usize, usize),
    pub depth_range: DynamicRange,
    pub disparity_range: DynamicRange,
    pub repair: RepairReport,
    pub written: Vec<PathBuf>,
    pub timings: TimingBreakdown,
}

/// Summary of a batch of cameras, written by the depth export tool.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub cameras: Vec<CameraReport>,
    pub failures: Vec<CameraFailure>,
    /// Union of the per-camera disparity ranges.
    pub disparity_range: Option<DynamicRange>,
    pub total_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFailure {
    pub camera: usize,
    pub error: String,
}
