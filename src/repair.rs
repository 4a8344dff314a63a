//! Inpainting of isolated out-of-range depth samples.
//!
//! A full-resolution sample is an artifact when it falls outside
//! `[0.9 * min(low), 1.1 * max(low)]`, where `low` is the tiled-median
//! downsample of the same buffer; a single stray pixel cannot move its own
//! tile median, so it cannot widen the range it is tested against.
//!
//! Each artifact is replaced by the lower median of the non-artifact samples
//! in a `(2 * half_window + 1)²` window clipped to the image. Samples with no
//! valid neighbor stay untouched and are reported.
use crate::downsample::lower_median;
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// Lower bound factor applied to the low-resolution minimum.
pub const LOWER_FACTOR: f32 = 0.9;
/// Upper bound factor applied to the low-resolution maximum.
pub const UPPER_FACTOR: f32 = 1.1;
/// Default window half size (3×3 window).
pub const DEFAULT_HALF_WINDOW: usize = 1;

/// Boolean mask with the same shape as the buffer it flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactMask {
    pub w: usize,
    pub h: usize,
    pub flags: Vec<bool>,
}

impl ArtifactMask {
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.flags[y * self.w + x]
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn any(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Flagged coordinates as `[x, y]`, row-major.
    pub fn coordinates(&self) -> impl Iterator<Item = [usize; 2]> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(move |(i, _)| [i % self.w, i / self.w])
    }
}

/// A flagged sample left unmodified because its window held no valid
/// neighbor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpaintExhausted {
    pub x: usize,
    pub y: usize,
    pub value: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub flagged: usize,
    pub repaired: usize,
    pub exhausted: Vec<InpaintExhausted>,
}

impl RepairReport {
    pub fn is_complete(&self) -> bool {
        self.exhausted.is_empty()
    }
}

/// Flag samples of `full` outside the range implied by its downsample `low`.
pub fn out_of_range_mask(full: &ImageF32, low: &ImageF32) -> ArtifactMask {
    let flags = match low.min_max() {
        Some((lo, hi)) => {
            let (lower, upper) = (LOWER_FACTOR * lo, UPPER_FACTOR * hi);
            full.data.iter().map(|&v| v < lower || v > upper).collect()
        }
        None => vec![false; full.data.len()],
    };
    ArtifactMask {
        w: full.w,
        h: full.h,
        flags,
    }
}

/// Replace every flagged sample of `buffer` by the lower median of its valid
/// neighbors. Validity comes from `mask` alone, so values written earlier in
/// the pass are never used as neighbors.
pub fn repair_artifacts(
    buffer: &mut ImageF32,
    mask: &ArtifactMask,
    half_window: usize,
) -> RepairReport {
    debug_assert_eq!((buffer.w, buffer.h), (mask.w, mask.h));
    let mut report = RepairReport {
        flagged: mask.count(),
        ..RepairReport::default()
    };
    if report.flagged == 0 {
        return report;
    }
    log::debug!(
        "repairing {} out-of-range pixel(s) with a {}x{} window",
        report.flagged,
        2 * half_window + 1,
        2 * half_window + 1
    );

    let (w, h) = (buffer.w, buffer.h);
    let mut window = Vec::with_capacity((2 * half_window + 1).pow(2));
    for [x, y] in mask.coordinates() {
        let (x0, x1) = (x.saturating_sub(half_window), (x + half_window).min(w - 1));
        let (y0, y1) = (y.saturating_sub(half_window), (y + half_window).min(h - 1));

        window.clear();
        for wy in y0..=y1 {
            for wx in x0..=x1 {
                if !mask.is_set(wx, wy) {
                    window.push(buffer.get(wx, wy));
                }
            }
        }

        match lower_median(&mut window) {
            Some(median) => {
                buffer.set(x, y, median);
                report.repaired += 1;
            }
            None => {
                let value = buffer.get(x, y);
                log::warn!("no valid pixels for inpainting depth artifact at ({x}, {y})");
                report.exhausted.push(InpaintExhausted { x, y, value });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::{median_downsample, TileSize};

    #[test]
    fn central_outlier_takes_neighbor_median() {
        #[rustfmt::skip]
        let data = vec![
            9.6, 10.3, 9.8,
            10.1, 500.0, 9.9,
            10.4, 9.7, 10.2,
        ];
        let mut depth = ImageF32::from_vec(3, 3, data).unwrap();
        let low = median_downsample(&depth, TileSize::square(3)).unwrap();
        assert_eq!(low.data, vec![10.1]);

        let mask = out_of_range_mask(&depth, &low);
        assert_eq!(mask.coordinates().collect::<Vec<_>>(), vec![[1, 1]]);
        let report = repair_artifacts(&mut depth, &mask, DEFAULT_HALF_WINDOW);
        // eight neighbors sorted, index 8 / 2 = 4 -> 10.1
        assert_eq!(depth.get(1, 1), 10.1);
        assert_eq!(report.flagged, 1);
        assert_eq!(report.repaired, 1);
        assert!(report.is_complete());
    }

    #[test]
    fn isolated_pixel_is_left_and_reported() {
        let mut depth = ImageF32::filled(1, 1, 42.0);
        let mask = ArtifactMask {
            w: 1,
            h: 1,
            flags: vec![true],
        };
        let report = repair_artifacts(&mut depth, &mask, DEFAULT_HALF_WINDOW);
        assert_eq!(depth.get(0, 0), 42.0);
        assert_eq!(report.repaired, 0);
        assert_eq!(
            report.exhausted,
            vec![InpaintExhausted {
                x: 0,
                y: 0,
                value: 42.0
            }]
        );
    }

    #[test]
    fn flagged_neighbors_are_excluded() {
        #[rustfmt::skip]
        let data = vec![
            0.0, 0.0, 1.0,
            0.0, 0.0, 1.0,
            1.0, 1.0, 1.0,
        ];
        let mut depth = ImageF32::from_vec(3, 3, data).unwrap();
        #[rustfmt::skip]
        let flags = vec![
            true, true, false,
            true, true, false,
            false, false, false,
        ];
        let mask = ArtifactMask { w: 3, h: 3, flags };
        let report = repair_artifacts(&mut depth, &mask, 1);
        // (0,0) only sees flagged pixels
        assert_eq!(report.exhausted.len(), 1);
        assert_eq!((report.exhausted[0].x, report.exhausted[0].y), (0, 0));
        assert_eq!(depth.get(1, 1), 1.0);
        assert_eq!(depth.get(0, 0), 0.0);
    }

    #[test]
    fn mask_uses_scaled_low_res_bounds() {
        let full = ImageF32::from_vec(4, 1, vec![8.9, 9.0, 11.0, 11.1]).unwrap();
        let low = ImageF32::from_vec(2, 1, vec![10.0, 10.0]).unwrap();
        let mask = out_of_range_mask(&full, &low);
        assert_eq!(mask.flags, vec![true, false, false, true]);
    }
}
