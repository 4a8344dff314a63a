//! Composites rebuilt from a rendered capture directory.
//!
//! - lenslet: every view's pixel `(x, y)` lands in the `Nx × Ny` macro-pixel
//!   at `(x, y)`, view `(u, v)` at offset `(u, v)` inside it;
//! - side-by-side: center RGB view on the left, its 8-bit disparity on the
//!   right.
use crate::disparity::DynamicRange;
use crate::error::{Error, Result};
use crate::image::io::{load_gray_image, load_rgb_image, save_rgb_image};
use crate::image::ImageF32;
use crate::naming::{
    input_view_path, map_path, CameraGrid, MapFormat, MapKind, MapResolution, ViewNaming,
    LENSLET_FILE, SIDE_BY_SIDE_FILE,
};
use image::{GrayImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};

fn dims_of(img: &RgbImage) -> (usize, usize) {
    (img.width() as usize, img.height() as usize)
}

/// Interleave `views` (indexed `v * cams_x + u`) into a lenslet image of
/// `(W * cams_x) × (H * cams_y)`.
pub fn assemble_lenslet(grid: &CameraGrid, views: &[RgbImage]) -> Result<RgbImage> {
    if grid.is_empty() || views.len() != grid.len() {
        return Err(Error::InvalidParameter(format!(
            "lenslet of {}x{} cameras needs {} views, got {}",
            grid.cams_x,
            grid.cams_y,
            grid.len(),
            views.len()
        )));
    }
    let (w, h) = dims_of(&views[0]);
    if let Some((idx, view)) = views
        .iter()
        .enumerate()
        .find(|(_, v)| dims_of(v) != (w, h))
    {
        return Err(Error::ShapeMismatch {
            what: format!("view {idx}"),
            expected: (w, h),
            found: dims_of(view),
        });
    }

    let (nx, ny) = (grid.cams_x, grid.cams_y);
    let mut out = RgbImage::new((w * nx) as u32, (h * ny) as u32);
    for (index, view) in views.iter().enumerate() {
        let (u, v) = grid.coords(index);
        for (x, y, px) in view.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            out.put_pixel((x * nx + u) as u32, (y * ny + v) as u32, *px);
        }
    }
    log::debug!(
        "assembled {}x{} lenslet from {} views of {w}x{h}",
        out.width(),
        out.height(),
        views.len()
    );
    Ok(out)
}

/// `rgb` next to `disparity` replicated to three channels, `(2W) × H`.
pub fn assemble_side_by_side(rgb: &RgbImage, disparity: &GrayImage) -> Result<RgbImage> {
    if rgb.dimensions() != disparity.dimensions() {
        return Err(Error::ShapeMismatch {
            what: "disparity preview".to_string(),
            expected: dims_of(rgb),
            found: (disparity.width() as usize, disparity.height() as usize),
        });
    }
    let (w, h) = rgb.dimensions();
    let mut out = RgbImage::new(2 * w, h);
    for (x, y, px) in rgb.enumerate_pixels() {
        out.put_pixel(x, y, *px);
    }
    for (x, y, px) in disparity.enumerate_pixels() {
        let g = px.0[0];
        out.put_pixel(w + x, y, Rgb([g, g, g]));
    }
    Ok(out)
}

/// 8-bit preview of a float disparity map.
pub fn render_disparity_preview(disparity: &ImageF32, range: &DynamicRange) -> GrayImage {
    range.normalize_to_u8(disparity)
}

/// Load every `input_Cam###.png` of `grid` and assemble the lenslet image.
pub fn lenslet_from_dir(dir: &Path, grid: &CameraGrid) -> Result<RgbImage> {
    let views = (0..grid.len())
        .map(|cam| load_rgb_image(&input_view_path(dir, cam)))
        .collect::<Result<Vec<_>>>()?;
    assemble_lenslet(grid, &views)
}

/// Center view plus its low-resolution disparity PNG.
pub fn side_by_side_from_dir(
    dir: &Path,
    grid: &CameraGrid,
    naming: ViewNaming,
) -> Result<RgbImage> {
    let center = grid.center_index();
    let rgb = load_rgb_image(&input_view_path(dir, center))?;
    let disp_path = map_path(
        dir,
        MapKind::Disparity,
        MapResolution::Low,
        MapFormat::Png,
        naming,
        center,
    );
    let disparity = load_gray_image(&disp_path)?;
    assemble_side_by_side(&rgb, &disparity)
}

/// Assemble and save `lenslet.png` into `dir`.
pub fn write_lenslet(dir: &Path, grid: &CameraGrid) -> Result<PathBuf> {
    let lenslet = lenslet_from_dir(dir, grid)?;
    let path = dir.join(LENSLET_FILE);
    save_rgb_image(&lenslet, &path)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Assemble and save `side-by-side.png` into `dir`.
pub fn write_side_by_side(dir: &Path, grid: &CameraGrid, naming: ViewNaming) -> Result<PathBuf> {
    let composite = side_by_side_from_dir(dir, grid, naming)?;
    let path = dir.join(SIDE_BY_SIDE_FILE);
    save_rgb_image(&composite, &path)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn tagged_view(tag: u8, w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([tag, x as u8, y as u8]))
    }

    #[test]
    fn lenslet_interleaves_views() {
        let grid = CameraGrid::new(2, 2);
        let views: Vec<_> = (0..4).map(|i| tagged_view(i, 2, 2)).collect();
        let lenslet = assemble_lenslet(&grid, &views).unwrap();
        assert_eq!(lenslet.dimensions(), (4, 4));
        for oy in 0..4u32 {
            for ox in 0..4u32 {
                let (u, x) = (ox % 2, ox / 2);
                let (v, y) = (oy % 2, oy / 2);
                let cam = (v * 2 + u) as u8;
                assert_eq!(
                    *lenslet.get_pixel(ox, oy),
                    Rgb([cam, x as u8, y as u8]),
                    "output ({ox}, {oy})"
                );
            }
        }
    }

    #[test]
    fn lenslet_rejects_mixed_sizes() {
        let grid = CameraGrid::new(2, 1);
        let views = vec![tagged_view(0, 2, 2), tagged_view(1, 3, 2)];
        match assemble_lenslet(&grid, &views) {
            Err(Error::ShapeMismatch { found, .. }) => assert_eq!(found, (3, 2)),
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
        assert!(assemble_lenslet(&grid, &views[..1]).is_err());
    }

    #[test]
    fn side_by_side_replicates_disparity() {
        let rgb = tagged_view(9, 3, 2);
        let disp = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * x + y) as u8]));
        let out = assemble_side_by_side(&rgb, &disp).unwrap();
        assert_eq!(out.dimensions(), (6, 2));
        assert_eq!(*out.get_pixel(1, 1), Rgb([9, 1, 1]));
        assert_eq!(*out.get_pixel(5, 1), Rgb([21, 21, 21]));
    }

    #[test]
    fn missing_disparity_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let grid = CameraGrid::new(1, 1);
        save_rgb_image(&tagged_view(0, 2, 2), &input_view_path(dir.path(), 0)).unwrap();
        match side_by_side_from_dir(dir.path(), &grid, ViewNaming::CenterView) {
            Err(Error::MissingFile(p)) => assert_eq!(p, dir.path().join("gt_disp_lowres.png")),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }
}
