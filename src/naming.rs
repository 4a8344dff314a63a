//! File naming contract shared with the renderer.
//!
//! Per-camera RGB views are `input_Cam###.png`; depth products are
//! `gt_<kind>_<res>[_Cam###].<ext>`, where the camera suffix is present only
//! when products are saved for every view.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PARAMETERS_FILE: &str = "parameters.cfg";
pub const LENSLET_FILE: &str = "lenslet.png";
pub const SIDE_BY_SIDE_FILE: &str = "side-by-side.png";

/// Whether depth products exist for the center view only or for every view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewNaming {
    #[default]
    CenterView,
    AllViews,
}

impl ViewNaming {
    /// Suffix appended to product stems for `camera`.
    pub fn suffix(&self, camera: usize) -> String {
        match self {
            ViewNaming::CenterView => String::new(),
            ViewNaming::AllViews => format!("_{}", camera_name(camera)),
        }
    }
}

/// Rectangular camera array; index `v * cams_x + u` for column `u`, row `v`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraGrid {
    pub cams_x: usize,
    pub cams_y: usize,
}

impl CameraGrid {
    pub fn new(cams_x: usize, cams_y: usize) -> Self {
        Self { cams_x, cams_y }
    }

    pub fn len(&self) -> usize {
        self.cams_x * self.cams_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, u: usize, v: usize) -> usize {
        v * self.cams_x + u
    }

    /// `(u, v)` of a camera index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.cams_x, index / self.cams_x)
    }

    /// Middle camera; rounds toward the top-left for even counts.
    pub fn center_index(&self) -> usize {
        self.index((self.cams_x.saturating_sub(1)) / 2, (self.cams_y.saturating_sub(1)) / 2)
    }
}

/// `Cam007`-style name of a camera index.
pub fn camera_name(index: usize) -> String {
    format!("Cam{index:03}")
}

/// Which depth product a file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapKind {
    Depth,
    Disparity,
}

impl MapKind {
    fn stem(&self) -> &'static str {
        match self {
            MapKind::Depth => "depth",
            MapKind::Disparity => "disp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapResolution {
    High,
    Low,
}

impl MapResolution {
    fn stem(&self) -> &'static str {
        match self {
            MapResolution::High => "highres",
            MapResolution::Low => "lowres",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapFormat {
    Png,
    Pfm,
}

impl MapFormat {
    fn extension(&self) -> &'static str {
        match self {
            MapFormat::Png => "png",
            MapFormat::Pfm => "pfm",
        }
    }
}

/// Path of a depth/disparity product for `camera` under `dir`.
pub fn map_path(
    dir: &Path,
    kind: MapKind,
    res: MapResolution,
    format: MapFormat,
    naming: ViewNaming,
    camera: usize,
) -> PathBuf {
    dir.join(format!(
        "gt_{}_{}{}.{}",
        kind.stem(),
        res.stem(),
        naming.suffix(camera),
        format.extension()
    ))
}

/// `input_Cam###.png` under `dir`.
pub fn input_view_path(dir: &Path, camera: usize) -> PathBuf {
    dir.join(format!("input_{}.png", camera_name(camera)))
}

/// `objectids_highres[_Cam###].png` under `dir`.
pub fn object_ids_path(dir: &Path, naming: ViewNaming, camera: usize) -> PathBuf {
    dir.join(format!("objectids_highres{}.png", naming.suffix(camera)))
}

/// Output directory of one frame when rendering a sequence.
pub fn sequence_frame_dir(root: &Path, frame: u32) -> PathBuf {
    root.join("sequence").join(format!("{frame:06}"))
}

/// Frames `start..=end` every `step`. Empty when `end < start`; a zero
/// step yields `start` only.
pub fn sequence_frames(start: u32, end: u32, step: u32) -> Vec<u32> {
    if end < start {
        return Vec::new();
    }
    if step == 0 {
        return vec![start];
    }
    (start..=end).step_by(step as usize).collect()
}
