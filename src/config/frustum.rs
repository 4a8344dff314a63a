use super::depth::default_grid;
use crate::error::Result;
use crate::naming::CameraGrid;
use crate::ply::PlyOptions;
use crate::types::CameraCalibration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct FrustumToolConfig {
    #[serde(default)]
    pub calibration: CameraCalibration,
    #[serde(default = "default_grid")]
    pub grid: CameraGrid,
    #[serde(default)]
    pub frustum: FrustumRange,
    #[serde(default)]
    pub focus: FocusStackConfig,
    #[serde(default)]
    pub ply: PlyOptions,
    pub output: FrustumOutputConfig,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct FrustumRange {
    pub min_disp: f32,
    pub max_disp: f32,
}

impl Default for FrustumRange {
    fn default() -> Self {
        Self {
            min_disp: -2.0,
            max_disp: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct FocusStackConfig {
    pub separation_m: f32,
    pub steps: u32,
}

impl Default for FocusStackConfig {
    fn default() -> Self {
        Self {
            separation_m: 5.0,
            steps: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FrustumOutputConfig {
    pub frustum_ply: PathBuf,
    #[serde(default)]
    pub focus_planes_ply: Option<PathBuf>,
    /// Camera rig (positions, lens shifts) as JSON.
    #[serde(default)]
    pub rig_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<FrustumToolConfig> {
    super::read_json_config(path)
}
