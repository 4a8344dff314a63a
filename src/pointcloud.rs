//! Colored point clouds from an RGB view and its low-resolution disparity.
//!
//! One point per pixel, row-major: `x` is the column, `y` the row and `z`
//! the disparity value. PNG disparities are used as stored (0..255); float
//! PFM disparities are rescaled to `0..512` over the capture's disparity
//! range. Colors are written in true RGB order.
//!
//! The ASCII PLY layout is fixed:
//!
//! ```text
//! ply
//! format ascii 1.0
//! element vertex N
//! property float x
//! property float y
//! property float z
//! property uchar diffuse_red
//! property uchar diffuse_green
//! property uchar diffuse_blue
//! element face 0
//! property list uchar int vertex_indices
//! end_header
//! ```
use crate::config::parameters::RenderParameters;
use crate::disparity::DynamicRange;
use crate::error::{Error, Result};
use crate::image::io::{load_gray_image, load_rgb_image, write_atomic};
use crate::image::ImageF32;
use crate::naming::{
    input_view_path, map_path, CameraGrid, MapFormat, MapKind, MapResolution, ViewNaming,
};
use crate::pfm::read_pfm_gray;
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Upper end of the depth axis for float disparity sources.
pub const PFM_DEPTH_SCALE: f32 = 512.0;

const VERTEX_PROPERTIES: [&str; 6] = [
    "property float x",
    "property float y",
    "property float z",
    "property uchar diffuse_red",
    "property uchar diffuse_green",
    "property uchar diffuse_blue",
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PointCloudPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Disparity channel of a point cloud.
#[derive(Clone, Debug)]
pub enum DisparitySource {
    /// 8-bit preview, values used as-is.
    Png(GrayImage),
    /// Raw float disparity rescaled over `range`.
    Pfm { map: ImageF32, range: DynamicRange },
}

impl DisparitySource {
    fn dims(&self) -> (usize, usize) {
        match self {
            DisparitySource::Png(img) => (img.width() as usize, img.height() as usize),
            DisparitySource::Pfm { map, .. } => map.dims(),
        }
    }

    fn depth_at(&self, x: usize, y: usize) -> f32 {
        match self {
            DisparitySource::Png(img) => img.get_pixel(x as u32, y as u32).0[0] as f32,
            DisparitySource::Pfm { map, range } => range.rescale(map.get(x, y), PFM_DEPTH_SCALE),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointCloud {
    pub width: usize,
    pub height: usize,
    pub points: Vec<PointCloudPoint>,
}

impl PointCloud {
    /// One point per pixel of `rgb`; the disparity must share its size.
    pub fn build(rgb: &RgbImage, source: &DisparitySource) -> Result<Self> {
        let (w, h) = (rgb.width() as usize, rgb.height() as usize);
        if source.dims() != (w, h) {
            return Err(Error::ShapeMismatch {
                what: "disparity map".to_string(),
                expected: (w, h),
                found: source.dims(),
            });
        }
        let points = rgb
            .enumerate_pixels()
            .map(|(x, y, px)| {
                let [r, g, b] = px.0;
                PointCloudPoint {
                    x: x as f32,
                    y: y as f32,
                    z: source.depth_at(x as usize, y as usize),
                    r,
                    g,
                    b,
                }
            })
            .collect();
        Ok(Self {
            width: w,
            height: h,
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn write_point_cloud_ply(cloud: &PointCloud, path: &Path) -> Result<()> {
    write_atomic(path, |w| write_point_cloud_ply_to(w, cloud))?;
    log::info!("wrote {} ({} points)", path.display(), cloud.len());
    Ok(())
}

pub fn write_point_cloud_ply_to<W: Write + ?Sized>(
    w: &mut W,
    cloud: &PointCloud,
) -> std::io::Result<()> {
    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "element vertex {}", cloud.len())?;
    for prop in VERTEX_PROPERTIES {
        writeln!(w, "{prop}")?;
    }
    writeln!(w, "element face 0")?;
    writeln!(w, "property list uchar int vertex_indices")?;
    writeln!(w, "end_header")?;
    for p in &cloud.points {
        writeln!(
            w,
            "{:.6} {:.6} {:.6} {} {} {}",
            p.x, p.y, p.z, p.r, p.g, p.b
        )?;
    }
    Ok(())
}

pub fn read_point_cloud_ply(path: &Path) -> Result<Vec<PointCloudPoint>> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_point_cloud_ply_from(BufReader::new(file))
}

/// Parse the layout written by [`write_point_cloud_ply_to`].
pub fn read_point_cloud_ply_from<R: BufRead>(reader: R) -> Result<Vec<PointCloudPoint>> {
    let mut lines = reader.lines();
    let mut next_line = || -> Result<Option<String>> {
        lines
            .next()
            .transpose()
            .map_err(|e| Error::Format(format!("PLY read failed: {e}")))
    };

    let mut header = Vec::new();
    loop {
        match next_line()? {
            Some(line) if line.trim() == "end_header" => break,
            Some(line) => header.push(line.trim().to_string()),
            None => return Err(Error::Format("PLY header has no end_header".to_string())),
        }
    }
    if header.first().map(String::as_str) != Some("ply") {
        return Err(Error::Format("missing `ply` magic".to_string()));
    }
    if header.get(1).map(String::as_str) != Some("format ascii 1.0") {
        return Err(Error::Format("only ASCII point clouds are supported".to_string()));
    }
    let count: usize = header
        .get(2)
        .and_then(|l| l.strip_prefix("element vertex "))
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| Error::Format("missing `element vertex N`".to_string()))?;
    let props: Vec<&str> = header
        .iter()
        .skip(3)
        .take(VERTEX_PROPERTIES.len())
        .map(String::as_str)
        .collect();
    if props != VERTEX_PROPERTIES {
        return Err(Error::Format(format!("unexpected vertex properties {props:?}")));
    }

    let mut points = Vec::with_capacity(count);
    while let Some(line) = next_line()? {
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_point(&line)?);
    }
    if points.len() != count {
        return Err(Error::Format(format!(
            "header declares {count} vertices, found {}",
            points.len()
        )));
    }
    Ok(points)
}

fn parse_point(line: &str) -> Result<PointCloudPoint> {
    let bad = || Error::Format(format!("malformed vertex line {line:?}"));
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(bad());
    }
    let f = |i: usize| fields[i].parse::<f32>().map_err(|_| bad());
    let c = |i: usize| fields[i].parse::<u8>().map_err(|_| bad());
    Ok(PointCloudPoint {
        x: f(0)?,
        y: f(1)?,
        z: f(2)?,
        r: c(3)?,
        g: c(4)?,
        b: c(5)?,
    })
}

/// Disparity of `camera` as stored in `dir`: PNG preferred, PFM otherwise.
///
/// The PFM range comes from `params` when it records one, else from the
/// map itself.
pub fn load_disparity_source(
    dir: &Path,
    naming: ViewNaming,
    camera: usize,
    params: Option<&RenderParameters>,
) -> Result<DisparitySource> {
    let lowres = |format: MapFormat| {
        map_path(dir, MapKind::Disparity, MapResolution::Low, format, naming, camera)
    };
    let png = lowres(MapFormat::Png);
    if png.is_file() {
        log::debug!("point cloud disparity from {}", png.display());
        return Ok(DisparitySource::Png(load_gray_image(&png)?));
    }
    let pfm = lowres(MapFormat::Pfm);
    if !pfm.is_file() {
        return Err(Error::MissingFile(png));
    }
    let map = read_pfm_gray(&pfm)?;
    let range = match params.and_then(RenderParameters::disparity_range) {
        Some(range) => range,
        None => DynamicRange::from_buffer(&map)?,
    };
    log::debug!(
        "point cloud disparity from {} over [{}, {}]",
        pfm.display(),
        range.min,
        range.max
    );
    Ok(DisparitySource::Pfm { map, range })
}

/// Point cloud of the center camera of a rendered capture.
pub fn point_cloud_from_dir(
    dir: &Path,
    grid: &CameraGrid,
    naming: ViewNaming,
    params: Option<&RenderParameters>,
) -> Result<PointCloud> {
    let center = grid.center_index();
    let rgb = load_rgb_image(&input_view_path(dir, center))?;
    let source = load_disparity_source(dir, naming, center, params)?;
    PointCloud::build(&rgb, &source)
}
