//! Portable Float Map codec.
//!
//! Layout: an ASCII header of three lines (`PF` color / `Pf` grayscale,
//! `"<width> <height>"`, signed scale) followed by raw f32 samples. A negative
//! scale selects little-endian samples, a positive one big-endian; its
//! magnitude multiplies every sample on read. Sample rows run bottom to top.
//!
//! In-memory images are top-down, so the writer emits rows in reverse and the
//! reader flips them back: `read_pfm(write_pfm(a)) == a` bit for bit.
use crate::error::{Error, Result};
use crate::image::io::write_atomic;
use crate::image::{ImageF32, ImageView};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Interleaved RGB float image, top-down.
#[derive(Clone, Debug, PartialEq)]
pub struct PfmColor {
    pub w: usize,
    pub h: usize,
    /// `w * h * 3` samples, RGB interleaved.
    pub data: Vec<f32>,
}

/// Decoded PFM payload.
#[derive(Clone, Debug, PartialEq)]
pub enum PfmImage {
    Gray(ImageF32),
    Color(PfmColor),
}

impl PfmImage {
    pub fn dims(&self) -> (usize, usize) {
        match self {
            PfmImage::Gray(img) => img.dims(),
            PfmImage::Color(img) => (img.w, img.h),
        }
    }

    pub fn into_gray(self) -> Option<ImageF32> {
        match self {
            PfmImage::Gray(img) => Some(img),
            PfmImage::Color(_) => None,
        }
    }
}

/// Write a grayscale PFM (`Pf`, scale -1) atomically.
pub fn write_pfm(image: &ImageF32, path: &Path) -> Result<()> {
    write_atomic(path, |w| write_pfm_to(w, image))?;
    log::debug!("wrote {}x{} PFM {}", image.w, image.h, path.display());
    Ok(())
}

/// Encode a grayscale PFM into `writer`.
pub fn write_pfm_to<W: Write + ?Sized>(writer: &mut W, image: &ImageF32) -> std::io::Result<()> {
    write!(writer, "Pf\n{} {}\n-1\n", image.w, image.h)?;
    let mut row_bytes = Vec::with_capacity(image.w * 4);
    for y in (0..image.h).rev() {
        row_bytes.clear();
        for &v in image.row(y) {
            row_bytes.extend_from_slice(&v.to_le_bytes());
        }
        writer.write_all(&row_bytes)?;
    }
    Ok(())
}

/// Read a grayscale or color PFM from disk.
pub fn read_pfm(path: &Path) -> Result<PfmImage> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_pfm_from(BufReader::new(file)).map_err(|e| match e {
        Error::Format(msg) => Error::Format(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Read a PFM that must be single-channel.
pub fn read_pfm_gray(path: &Path) -> Result<ImageF32> {
    read_pfm(path)?.into_gray().ok_or_else(|| {
        Error::Format(format!(
            "{}: expected a grayscale (Pf) map, found color (PF)",
            path.display()
        ))
    })
}

/// Decode a PFM from any buffered reader.
pub fn read_pfm_from<R: BufRead>(mut reader: R) -> Result<PfmImage> {
    let ident = read_header_line(&mut reader)?;
    let channels = match ident.as_str() {
        "PF" => 3,
        "Pf" => 1,
        other => {
            return Err(Error::Format(format!(
                "unknown PFM identifier {other:?}, expected PF or Pf"
            )))
        }
    };

    let dims = read_header_line(&mut reader)?;
    let mut parts = dims.split_whitespace();
    let (w, h) = match (
        parts.next().and_then(|s| s.parse::<usize>().ok()),
        parts.next().and_then(|s| s.parse::<usize>().ok()),
        parts.next(),
    ) {
        (Some(w), Some(h), None) => (w, h),
        _ => return Err(Error::Format(format!("invalid PFM dimensions {dims:?}"))),
    };

    let scale_line = read_header_line(&mut reader)?;
    let scale_endianness: f32 = scale_line
        .parse()
        .map_err(|_| Error::Format(format!("invalid PFM scale {scale_line:?}")))?;
    if scale_endianness == 0.0 || !scale_endianness.is_finite() {
        return Err(Error::Format(format!(
            "PFM scale must be a finite non-zero value, got {scale_endianness}"
        )));
    }
    let big_endian = scale_endianness > 0.0;
    let scale = scale_endianness.abs();

    let samples = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| Error::Format(format!("PFM dimensions {w}x{h} overflow")))?;
    let expected_bytes = samples
        .checked_mul(4)
        .ok_or_else(|| Error::Format(format!("PFM dimensions {w}x{h} overflow")))?;

    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .map_err(|e| Error::Format(format!("failed to read PFM payload: {e}")))?;
    if payload.len() != expected_bytes {
        return Err(Error::Format(format!(
            "PFM payload holds {} bytes, expected {expected_bytes} for {w}x{h}x{channels}",
            payload.len()
        )));
    }

    let row_len = w * channels;
    let mut data = vec![0.0f32; samples];
    for (src_row, chunk) in payload.chunks_exact(row_len.max(1) * 4).enumerate() {
        let dst_row = h - 1 - src_row;
        let dst = &mut data[dst_row * row_len..(dst_row + 1) * row_len];
        for (out, bytes) in dst.iter_mut().zip(chunk.chunks_exact(4)) {
            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
            let v = if big_endian {
                f32::from_be_bytes(raw)
            } else {
                f32::from_le_bytes(raw)
            };
            *out = if scale == 1.0 { v } else { v * scale };
        }
    }

    Ok(if channels == 1 {
        PfmImage::Gray(ImageF32::from_vec(w, h, data)?)
    } else {
        PfmImage::Color(PfmColor { w, h, data })
    })
}

fn read_header_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let n = reader
        .read_until(b'\n', &mut bytes)
        .map_err(|e| Error::Format(format!("failed to read PFM header: {e}")))?;
    if n == 0 {
        return Err(Error::Format("truncated PFM header".to_string()));
    }
    // Header bytes are ASCII; anything else maps 1:1 like latin-1.
    let line: String = bytes.iter().map(|&b| b as char).collect();
    Ok(line.trim().to_string())
}
