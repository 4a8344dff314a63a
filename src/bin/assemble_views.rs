use lightfield_gt::config::assembly::load_config;
use lightfield_gt::mosaic::{write_lenslet, write_side_by_side};
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

    for dir in config.frame_dirs() {
        if config.lenslet {
            let path = write_lenslet(&dir, &config.grid)?;
            println!("Saved lenslet image to {}", path.display());
        }
        if config.side_by_side {
            let path = write_side_by_side(&dir, &config.grid, config.naming)?;
            println!("Saved side-by-side image to {}", path.display());
        }
    }
    Ok(())
}

fn usage() -> Error {
    Error::Config("Usage: assemble_views <config.json>".to_string())
}
