use image::{Rgb, RgbImage};
use lightfield_gt::image::io::save_rgb_image;
use lightfield_gt::image::ImageF32;
use lightfield_gt::naming::{input_view_path, CameraGrid};
use std::path::Path;

/// Depth of a plane tilted along x, from `near` at the left edge to `far`
/// at the right edge.
pub fn tilted_plane_depth(width: usize, height: usize, near: f32, far: f32) -> ImageF32 {
    assert!(width > 1 && height > 0, "image dimensions must be positive");
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            img.set(x, y, near + (far - near) * x as f32 / (width - 1) as f32);
        }
    }
    img
}

/// RGB view whose red channel encodes the camera index and whose green and
/// blue channels encode the pixel position.
pub fn tagged_view(camera: usize, width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([camera as u8, x as u8, y as u8]))
}

/// Write `input_Cam###.png` for every camera of `grid`.
pub fn write_input_views(dir: &Path, grid: &CameraGrid, width: u32, height: u32) {
    for cam in 0..grid.len() {
        save_rgb_image(&tagged_view(cam, width, height), &input_view_path(dir, cam))
            .expect("write input view");
    }
}
