//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Row 0 is the top of the image. Depth and disparity buffers use this type
//! throughout the pipeline; renderer buffers that arrive bottom-up are
//! flipped once on construction.
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Construct a buffer of size `w × h` with every sample set to `value`.
    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Wrap top-down row-major samples.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != w * h {
            return Err(Error::InvalidParameter(format!(
                "buffer of {} samples cannot hold a {w}x{h} image",
                data.len()
            )));
        }
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    /// Wrap bottom-up row-major samples (first row = bottom of the image),
    /// the order renderers hand out depth passes in.
    pub fn from_bottom_up(w: usize, h: usize, data: Vec<f32>) -> Result<Self> {
        let mut img = Self::from_vec(w, h, data)?;
        img.flip_vertical();
        Ok(img)
    }

    /// Extract the first channel of a bottom-up RGBA viewer capture.
    ///
    /// Viewer captures store the depth pass replicated into an RGBA float
    /// buffer of `w * h * 4` samples.
    pub fn from_rgba_bottom_up(w: usize, h: usize, rgba: &[f32]) -> Result<Self> {
        if rgba.len() != w * h * 4 {
            return Err(Error::InvalidParameter(format!(
                "RGBA capture of {} samples cannot hold a {w}x{h} image",
                rgba.len()
            )));
        }
        let depth = rgba.iter().step_by(4).copied().collect();
        Self::from_bottom_up(w, h, depth)
    }

    /// `(width, height)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Reverse the row order in place.
    pub fn flip_vertical(&mut self) {
        let (w, h) = (self.w, self.h);
        for y in 0..h / 2 {
            let (top, bottom) = self.data.split_at_mut((h - 1 - y) * w);
            top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }

    /// Apply `f` to every sample, producing a new image of the same shape.
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> ImageF32 {
        ImageF32 {
            w: self.w,
            h: self.h,
            stride: self.w,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Smallest and largest sample, ignoring NaNs. `None` for an empty or
    /// all-NaN buffer.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl crate::image::traits::ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl crate::image::traits::ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}
