use super::parameters::read_parameters;
use crate::downsample::downsample_factor;
use crate::error::Result;
use crate::naming::{CameraGrid, PARAMETERS_FILE};
use crate::pipeline::{DepthOptions, ExportConfig};
use crate::types::CameraCalibration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One camera's full-resolution depth pass, stored as a top-down PFM.
#[derive(Clone, Debug, Deserialize)]
pub struct DepthInput {
    pub camera: usize,
    pub depth: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DepthToolConfig {
    pub inputs: Vec<DepthInput>,
    #[serde(default)]
    pub calibration: CameraCalibration,
    #[serde(default = "default_grid")]
    pub grid: CameraGrid,
    #[serde(default)]
    pub depth: DepthOptions,
    /// Oversampling of the depth pass; overrides `depth.tile` when set.
    #[serde(default)]
    pub depth_map_scale: Option<usize>,
    pub export: ExportConfig,
    #[serde(default)]
    pub parameters: ParametersOutput,
    /// Optional JSON frame report.
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

/// What goes into `parameters.cfg` besides the calibration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ParametersOutput {
    pub write: bool,
    pub fstop: f32,
    pub frustum_disp_min: f32,
    pub frustum_disp_max: f32,
}

impl Default for ParametersOutput {
    fn default() -> Self {
        Self {
            write: true,
            fstop: 100.0,
            frustum_disp_min: -2.0,
            frustum_disp_max: 2.0,
        }
    }
}

impl DepthToolConfig {
    /// Depth options with the tile matching the depth-map oversampling.
    ///
    /// The scale comes from `depth_map_scale`, else from the `[meta]`
    /// section of an existing `parameters.cfg` in the target directory,
    /// else `depth.tile` is kept.
    pub fn resolve_depth_options(&self) -> Result<DepthOptions> {
        let scale = match self.depth_map_scale {
            Some(scale) => Some(scale),
            None => self.recorded_depth_map_scale()?,
        };
        Ok(match scale {
            Some(scale) if scale > 0 => DepthOptions {
                tile: downsample_factor(scale),
                ..self.depth
            },
            _ => self.depth,
        })
    }

    fn recorded_depth_map_scale(&self) -> Result<Option<usize>> {
        let dir = &self.export.target_dir;
        if !dir.join(PARAMETERS_FILE).is_file() {
            return Ok(None);
        }
        let recorded = read_parameters(dir)?
            .meta
            .map(|meta| meta.depth_map_scale)
            .filter(|s| s.is_finite() && *s >= 1.0)
            .map(|s| s.round() as usize);
        if let Some(scale) = recorded {
            log::debug!("depth_map_scale {scale} from {}", dir.display());
        }
        Ok(recorded)
    }
}

pub(crate) fn default_grid() -> CameraGrid {
    CameraGrid::new(3, 3)
}

pub fn load_config(path: &Path) -> Result<DepthToolConfig> {
    super::read_json_config(path)
}
