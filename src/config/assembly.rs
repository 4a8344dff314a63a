use super::depth::default_grid;
use crate::error::Result;
use crate::naming::{sequence_frame_dir, sequence_frames, CameraGrid, ViewNaming};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct AssemblyToolConfig {
    /// Capture directory (or sequence root when `sequence` is set).
    pub dir: PathBuf,
    #[serde(default = "default_grid")]
    pub grid: CameraGrid,
    #[serde(default)]
    pub naming: ViewNaming,
    #[serde(default = "enabled")]
    pub lenslet: bool,
    #[serde(default = "enabled")]
    pub side_by_side: bool,
    #[serde(default)]
    pub sequence: Option<SequenceRange>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SequenceRange {
    pub start: u32,
    pub end: u32,
    #[serde(default = "unit_step")]
    pub step: u32,
}

impl AssemblyToolConfig {
    /// Directories to assemble, one per frame for sequences.
    pub fn frame_dirs(&self) -> Vec<PathBuf> {
        match &self.sequence {
            Some(seq) => sequence_frames(seq.start, seq.end, seq.step)
                .into_iter()
                .map(|frame| sequence_frame_dir(&self.dir, frame))
                .collect(),
            None => vec![self.dir.clone()],
        }
    }
}

fn enabled() -> bool {
    true
}

fn unit_step() -> u32 {
    1
}

pub fn load_config(path: &Path) -> Result<AssemblyToolConfig> {
    super::read_json_config(path)
}
