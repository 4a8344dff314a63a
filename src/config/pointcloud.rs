use crate::error::Result;
use crate::naming::{CameraGrid, ViewNaming};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct PointCloudToolConfig {
    pub dir: PathBuf,
    /// Camera grid; read from `parameters.cfg` when omitted.
    #[serde(default)]
    pub grid: Option<CameraGrid>,
    #[serde(default)]
    pub naming: ViewNaming,
    /// File stem of the written `<name>.ply`.
    #[serde(default = "default_name")]
    pub name: String,
}

impl PointCloudToolConfig {
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(format!("{}.ply", self.name))
    }
}

fn default_name() -> String {
    "pointcloud".to_string()
}

pub fn load_config(path: &Path) -> Result<PointCloudToolConfig> {
    super::read_json_config(path)
}
