//! `parameters.cfg`: the render description written next to every capture.
//!
//! The file is INI with `key = value` lines grouped in `[intrinsics]`,
//! `[extrinsics]` and `[meta]` sections. [`IniDocument`] keeps section and
//! key order, so keys this crate does not know survive a rewrite untouched.
use crate::disparity::DynamicRange;
use crate::error::{Error, Result};
use crate::image::io::write_atomic;
use crate::naming::{input_view_path, CameraGrid, PARAMETERS_FILE};
use crate::types::{CameraCalibration, Resolution};
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub const INTRINSICS: &str = "intrinsics";
pub const EXTRINSICS: &str = "extrinsics";
pub const META: &str = "meta";

#[derive(Clone, Debug, Default, PartialEq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// Ordered INI document. Comments and blank lines are dropped on parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = IniDocument::default();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                doc.section_mut(name.trim());
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::Config(format!("line {}: expected `key = value`, got {line:?}", lineno + 1))
            })?;
            let section = doc.sections.last_mut().ok_or_else(|| {
                Error::Config(format!("line {}: key outside of any section", lineno + 1))
            })?;
            let (key, value) = (key.trim().to_string(), value.trim().to_string());
            match section.entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => section.entries.push((key, value)),
            }
        }
        Ok(doc)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_string();
        write_atomic(path, |w| w.write_all(text.as_bytes()))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|s| s.name == section)
    }

    /// Parsed value, `Ok(None)` when absent.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T::Err: Display,
    {
        self.get(section, key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| Error::Config(format!("[{section}] {key} = {raw:?}: {e}")))
            })
            .transpose()
    }

    /// Parsed value that must be present.
    pub fn require<T: FromStr>(&self, section: &str, key: &str) -> Result<T>
    where
        T::Err: Display,
    {
        self.get_parsed(section, key)?
            .ok_or_else(|| Error::Config(format!("missing [{section}] {key}")))
    }

    /// Insert or overwrite, keeping the position of existing keys.
    pub fn set(&mut self, section: &str, key: &str, value: impl Display) {
        let value = value.to_string();
        let sec = self.section_mut(section);
        match sec.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => sec.entries.push((key.to_string(), value)),
        }
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        let pos = match self.sections.iter().position(|s| s.name == name) {
            Some(pos) => pos,
            None => {
                self.sections.push(Section {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[pos]
    }
}

impl std::fmt::Display for IniDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (k, v) in &section.entries {
                writeln!(f, "{k} = {v}")?;
            }
        }
        Ok(())
    }
}

/// Values of the `[meta]` section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParametersMeta {
    pub disp_min: f32,
    pub disp_max: f32,
    pub frustum_disp_min: f32,
    pub frustum_disp_max: f32,
    pub depth_map_scale: f32,
}

impl Default for ParametersMeta {
    fn default() -> Self {
        Self {
            disp_min: -2.0,
            disp_max: 2.0,
            frustum_disp_min: -2.0,
            frustum_disp_max: 2.0,
            depth_map_scale: 10.0,
        }
    }
}

/// Typed view of `parameters.cfg`.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParameters {
    pub focal_length_mm: f32,
    pub resolution: Resolution,
    pub sensor_size_mm: f32,
    pub fstop: f32,
    pub grid: CameraGrid,
    pub baseline_mm: f32,
    pub focus_distance_m: f32,
    pub meta: Option<ParametersMeta>,
}

impl RenderParameters {
    pub fn from_calibration(calib: &CameraCalibration, grid: CameraGrid, fstop: f32) -> Self {
        Self {
            focal_length_mm: calib.focal_length_mm,
            resolution: calib.resolution,
            sensor_size_mm: calib.sensor_size_mm,
            fstop,
            grid,
            baseline_mm: calib.baseline_m * 1000.0,
            focus_distance_m: calib.focus_distance_m,
            meta: None,
        }
    }

    pub fn from_ini(doc: &IniDocument) -> Result<Self> {
        let meta = if doc.has_section(META) {
            let defaults = ParametersMeta::default();
            Some(ParametersMeta {
                disp_min: doc.require(META, "disp_min")?,
                disp_max: doc.require(META, "disp_max")?,
                frustum_disp_min: doc
                    .get_parsed(META, "frustum_disp_min")?
                    .unwrap_or(defaults.frustum_disp_min),
                frustum_disp_max: doc
                    .get_parsed(META, "frustum_disp_max")?
                    .unwrap_or(defaults.frustum_disp_max),
                depth_map_scale: doc
                    .get_parsed(META, "depth_map_scale")?
                    .unwrap_or(defaults.depth_map_scale),
            })
        } else {
            None
        };
        Ok(Self {
            focal_length_mm: doc.require(INTRINSICS, "focal_length_mm")?,
            resolution: Resolution::new(
                doc.require(INTRINSICS, "image_resolution_x_px")?,
                doc.require(INTRINSICS, "image_resolution_y_px")?,
            ),
            sensor_size_mm: doc.require(INTRINSICS, "sensor_size_mm")?,
            fstop: doc.get_parsed(INTRINSICS, "fstop")?.unwrap_or(100.0),
            grid: CameraGrid::new(
                doc.require(EXTRINSICS, "num_cams_x")?,
                doc.require(EXTRINSICS, "num_cams_y")?,
            ),
            baseline_mm: doc.require(EXTRINSICS, "baseline_mm")?,
            focus_distance_m: doc.require(EXTRINSICS, "focus_distance_m")?,
            meta,
        })
    }

    /// Write every known key into `doc`, leaving other keys in place.
    pub fn apply_to(&self, doc: &mut IniDocument) {
        doc.set(INTRINSICS, "focal_length_mm", self.focal_length_mm);
        doc.set(INTRINSICS, "image_resolution_x_px", self.resolution.x);
        doc.set(INTRINSICS, "image_resolution_y_px", self.resolution.y);
        doc.set(INTRINSICS, "sensor_size_mm", self.sensor_size_mm);
        doc.set(INTRINSICS, "fstop", self.fstop);
        doc.set(EXTRINSICS, "num_cams_x", self.grid.cams_x);
        doc.set(EXTRINSICS, "num_cams_y", self.grid.cams_y);
        doc.set(EXTRINSICS, "baseline_mm", self.baseline_mm);
        doc.set(EXTRINSICS, "focus_distance_m", self.focus_distance_m);
        if let Some(meta) = &self.meta {
            doc.set(META, "disp_min", meta.disp_min);
            doc.set(META, "disp_max", meta.disp_max);
            doc.set(META, "frustum_disp_min", meta.frustum_disp_min);
            doc.set(META, "frustum_disp_max", meta.frustum_disp_max);
            doc.set(META, "depth_map_scale", meta.depth_map_scale);
        }
    }

    pub fn calibration(&self) -> CameraCalibration {
        CameraCalibration {
            focal_length_mm: self.focal_length_mm,
            sensor_size_mm: self.sensor_size_mm,
            baseline_m: self.baseline_mm / 1000.0,
            focus_distance_m: self.focus_distance_m,
            resolution: self.resolution,
        }
    }

    /// Disparity range recorded in `[meta]`, if any.
    pub fn disparity_range(&self) -> Option<DynamicRange> {
        let meta = self.meta.as_ref()?;
        DynamicRange::new(meta.disp_min, meta.disp_max).ok()
    }
}

/// Read `parameters.cfg` from a capture directory.
pub fn read_parameters(dir: &Path) -> Result<RenderParameters> {
    RenderParameters::from_ini(&IniDocument::load(&dir.join(PARAMETERS_FILE))?)
}

/// Merge `params` into the capture's `parameters.cfg`, creating it if needed.
pub fn write_parameters(dir: &Path, params: &RenderParameters) -> Result<()> {
    let path = dir.join(PARAMETERS_FILE);
    let mut doc = if path.is_file() {
        IniDocument::load(&path)?
    } else {
        IniDocument::default()
    };
    params.apply_to(&mut doc);
    doc.save(&path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Resolution of input views already rendered into `dir`.
///
/// `None` when no `input_Cam###.png` exists yet; the recorded resolution
/// otherwise.
pub fn existing_render_resolution(dir: &Path, grid: &CameraGrid) -> Result<Option<Resolution>> {
    let any_view = (0..grid.len()).any(|cam| input_view_path(dir, cam).is_file());
    if !any_view {
        return Ok(None);
    }
    Ok(Some(read_parameters(dir)?.resolution))
}

/// Whether input views must be (re)rendered at `target` resolution.
pub fn needs_input_render(dir: &Path, grid: &CameraGrid, target: Resolution) -> Result<bool> {
    Ok(existing_render_resolution(dir, grid)? != Some(target))
}
