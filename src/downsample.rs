//! Exact tiled-median downsampling.
//!
//! Each non-overlapping `tile.rows × tile.cols` block of the input collapses
//! to the lower median of its samples: the tile is sorted ascending and the
//! element at index `n / 2` is kept. For even `n` the two middle values are
//! never averaged, so the output is always one of the input samples and the
//! result is reproducible bit for bit.
//!
//! The same primitive produces both the low-resolution depth and the
//! low-resolution disparity maps, and the artifact repair reuses
//! [`lower_median`] for its inpainting windows.
use crate::error::{Error, Result};
use crate::image::{ImageF32, ImageView, ImageViewMut};
use serde::{Deserialize, Serialize};

/// Tile shape in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
    pub rows: usize,
    pub cols: usize,
}

impl TileSize {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Square tile matching the renderer's depth-map oversampling factor.
    pub fn square(scale: usize) -> Self {
        Self::new(scale, scale)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tile for a renderer depth-map scale: depth passes are rendered at
/// `scale` times the output resolution on both axes.
pub fn downsample_factor(depth_map_scale: usize) -> TileSize {
    TileSize::square(depth_map_scale)
}

/// Lower median of `values`, reordering them in place. `None` when empty.
///
/// NaNs sort after every number (IEEE total order), so a tile is only
/// reduced to NaN when at least half of it is NaN.
pub fn lower_median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    Some(*median)
}

/// Reduce `img` by the exact lower median of every tile.
///
/// Fails with [`Error::Dimension`] unless the tile evenly divides both image
/// dimensions.
pub fn median_downsample(img: &ImageF32, tile: TileSize) -> Result<ImageF32> {
    if tile.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "tile size must be positive, got {}x{}",
            tile.rows, tile.cols
        )));
    }
    if img.h % tile.rows != 0 || img.w % tile.cols != 0 {
        return Err(Error::Dimension {
            rows: img.h,
            cols: img.w,
            tile_rows: tile.rows,
            tile_cols: tile.cols,
        });
    }

    let (nw, nh) = (img.w / tile.cols, img.h / tile.rows);
    let mut out = ImageF32::new(nw, nh);
    let mut scratch = Vec::with_capacity(tile.len());
    for ty in 0..nh {
        let dst_row = out.row_mut(ty);
        for (tx, dst_px) in dst_row.iter_mut().enumerate() {
            scratch.clear();
            for y in ty * tile.rows..(ty + 1) * tile.rows {
                let src_row = img.row(y);
                scratch.extend_from_slice(&src_row[tx * tile.cols..(tx + 1) * tile.cols]);
            }
            // tile is non-empty, checked above
            *dst_px = lower_median(&mut scratch).unwrap_or(f32::NAN);
        }
    }
    log::debug!(
        "median_downsample {}x{} -> {}x{} (tile {}x{})",
        img.w,
        img.h,
        nw,
        nh,
        tile.rows,
        tile.cols
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_map_scale_gives_square_tile() {
        let tile = downsample_factor(4);
        assert_eq!(tile, TileSize::new(4, 4));
        let small = median_downsample(&ImageF32::filled(8, 12, 1.0), tile).unwrap();
        assert_eq!(small.dims(), (2, 3));
    }

    #[test]
    fn constant_image_stays_constant() {
        let img = ImageF32::filled(6, 4, 2.5);
        let small = median_downsample(&img, TileSize::new(2, 3)).unwrap();
        assert_eq!(small.dims(), (2, 2));
        assert!(small.data.iter().all(|&v| v == 2.5));
    }

    #[test]
    fn even_tile_takes_upper_middle_index() {
        // sorted [1,2,3,4], index 4/2 = 2 -> 3, no averaging
        let img = ImageF32::from_vec(2, 2, vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        let small = median_downsample(&img, TileSize::square(2)).unwrap();
        assert_eq!(small.data, vec![3.0]);
    }

    #[test]
    fn odd_tile_takes_true_median() {
        let img = ImageF32::from_vec(3, 3, vec![9.0, 1.0, 8.0, 2.0, 7.0, 3.0, 6.0, 4.0, 5.0])
            .unwrap();
        let small = median_downsample(&img, TileSize::square(3)).unwrap();
        assert_eq!(small.data, vec![5.0]);
    }

    #[test]
    fn tiles_are_row_major() {
        #[rustfmt::skip]
        let data = vec![
            1.0, 1.0, 5.0, 5.0,
            1.0, 1.0, 5.0, 5.0,
            7.0, 7.0, 9.0, 9.0,
            7.0, 7.0, 9.0, 9.0,
        ];
        let img = ImageF32::from_vec(4, 4, data).unwrap();
        let small = median_downsample(&img, TileSize::square(2)).unwrap();
        assert_eq!(small.data, vec![1.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn indivisible_shape_is_dimension_error() {
        let img = ImageF32::new(5, 5);
        let err = median_downsample(&img, TileSize::square(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::Dimension {
                rows: 5,
                cols: 5,
                tile_rows: 2,
                tile_cols: 2
            }
        ));
    }

    #[test]
    fn zero_tile_is_rejected() {
        let img = ImageF32::new(4, 4);
        assert!(matches!(
            median_downsample(&img, TileSize::new(0, 2)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn lower_median_of_empty_is_none() {
        assert_eq!(lower_median(&mut []), None);
        assert_eq!(lower_median(&mut [2.0, 1.0]), Some(2.0));
    }
}
