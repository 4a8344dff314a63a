//! I/O helpers for 8-bit images, JSON reports and atomic file output.
//!
//! - `load_rgb_image` / `load_gray_image`: read a PNG into an owned buffer,
//!   reporting a missing file as [`Error::MissingFile`].
//! - `save_rgb_image` / `save_gray_image`: encode a PNG and write it atomically.
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `write_atomic`: write through a temporary file in the target directory
//!   that is only persisted once the closure succeeds.
use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    Ok(open_image(path)?.into_rgb8())
}

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_gray_image(path: &Path) -> Result<GrayImage> {
    Ok(open_image(path)?.into_luma8())
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    image::open(path).map_err(|e| Error::image(path, e))
}

/// Save an RGB buffer as PNG.
pub fn save_rgb_image(image: &RgbImage, path: &Path) -> Result<()> {
    save_png(&DynamicImage::ImageRgb8(image.clone()), path)
}

/// Save a grayscale buffer as PNG.
pub fn save_gray_image(image: &GrayImage, path: &Path) -> Result<()> {
    save_png(&DynamicImage::ImageLuma8(image.clone()), path)
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|e| Error::image(path, e))?;
    let bytes = encoded.into_inner();
    write_atomic(path, |w| w.write_all(&bytes))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, |w| w.write_all(json.as_bytes()))
}

/// Write `path` through a temporary sibling file.
///
/// The temporary file is renamed over `path` only after `fill` returns and
/// the buffer is flushed; on any failure it is deleted, so a truncated output
/// never appears under the final name.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer).map_err(|e| Error::io(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    Ok(())
}
