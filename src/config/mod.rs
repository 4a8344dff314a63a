//! Tool configuration.
//!
//! `parameters` handles the INI file written next to every capture; the other
//! modules hold the JSON configs the command-line tools are driven by.

pub mod assembly;
pub mod depth;
pub mod frustum;
pub mod parameters;
pub mod pointcloud;

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and deserialize a JSON tool config.
pub fn read_json_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
}
