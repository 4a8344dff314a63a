use lightfield_gt::config::frustum::load_config;
use lightfield_gt::geometry::{camera_rig, focus_planes, frustum};
use lightfield_gt::image::io::write_json_file;
use lightfield_gt::ply::write_mesh;
use lightfield_gt::{Error, Result};
use nalgebra::Point3;
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
    let calib = &config.calibration;

    let volume = frustum(calib, config.frustum.min_disp, config.frustum.max_disp);
    write_mesh(&volume.to_mesh(), &config.output.frustum_ply, &config.ply)?;
    println!(
        "Saved frustum ({:.3} m .. {:.3} m) to {}",
        volume.near_distance,
        volume.far_distance,
        config.output.frustum_ply.display()
    );

    if let Some(path) = &config.output.focus_planes_ply {
        let planes = focus_planes(
            &Point3::origin(),
            calib.effective_focus_distance(),
            config.focus.separation_m,
            config.focus.steps,
        );
        write_mesh(&planes, path, &config.ply)?;
        println!("Saved focus planes to {}", path.display());
    }

    if let Some(path) = &config.output.rig_json {
        let rig = camera_rig(&config.grid, calib.baseline_m, calib.baseline_m, calib);
        write_json_file(path, &rig)?;
        println!("Saved {} camera poses to {}", rig.len(), path.display());
    }
    Ok(())
}

fn usage() -> Error {
    Error::Config("Usage: frustum_mesh <config.json>".to_string())
}
