use lightfield_gt::config::parameters::read_parameters;
use lightfield_gt::config::pointcloud::load_config;
use lightfield_gt::naming::PARAMETERS_FILE;
use lightfield_gt::pointcloud::{point_cloud_from_dir, write_point_cloud_ply};
use lightfield_gt::{Error, Result};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let params = if config.dir.join(PARAMETERS_FILE).is_file() {
        Some(read_parameters(&config.dir)?)
    } else {
        None
    };
    let grid = config
        .grid
        .or_else(|| params.as_ref().map(|p| p.grid))
        .ok_or_else(|| {
            Error::Config(format!(
                "no camera grid in config and no {PARAMETERS_FILE} in {}",
                config.dir.display()
            ))
        })?;

    let cloud = point_cloud_from_dir(&config.dir, &grid, config.naming, params.as_ref())?;
    let path = config.output_path();
    write_point_cloud_ply(&cloud, &path)?;
    println!(
        "Saved {} points ({}x{}) to {}",
        cloud.len(),
        cloud.width,
        cloud.height,
        path.display()
    );
    Ok(())
}

fn usage() -> Error {
    Error::Config("Usage: point_cloud_export <config.json>".to_string())
}
