use lightfield_gt::config::depth::{load_config, DepthToolConfig};
use lightfield_gt::config::parameters::{write_parameters, ParametersMeta, RenderParameters};
use lightfield_gt::diagnostics::FrameReport;
use lightfield_gt::image::io::write_json_file;
use lightfield_gt::pfm::read_pfm_gray;
use lightfield_gt::pipeline::{process_cameras, summarize_frame, CameraDepth, DepthOptions};
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

    let inputs = config
        .inputs
        .iter()
        .map(|input| {
            Ok(CameraDepth {
                camera: input.camera,
                depth: read_pfm_gray(&input.depth)?,
                calibration: config.calibration,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let cameras: Vec<usize> = inputs.iter().map(|i| i.camera).collect();
    let options = config.resolve_depth_options()?;

    let results = process_cameras(inputs, &options, &config.export);
    let frame = summarize_frame(results, &cameras);

    for report in &frame.cameras {
        println!(
            "{}: {}x{} -> {}x{}, disparity [{:.1}, {:.1}], repaired {}/{} in {:.1} ms",
            report.name,
            report.highres.0,
            report.highres.1,
            report.lowres.0,
            report.lowres.1,
            report.disparity_range.min,
            report.disparity_range.max,
            report.repair.repaired,
            report.repair.flagged,
            report.timings.total_ms
        );
    }

    if config.parameters.write {
        save_parameters(&config, &options, &frame)?;
    }
    if let Some(path) = &config.report_json {
        write_json_file(path, &frame)?;
        println!("Saved frame report to {}", path.display());
    }

    if frame.failures.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} of {} camera(s) failed",
            frame.failures.len(),
            cameras.len()
        )))
    }
}

fn save_parameters(
    config: &DepthToolConfig,
    options: &DepthOptions,
    frame: &FrameReport,
) -> Result<()> {
    let Some(range) = frame.disparity_range else {
        return Ok(());
    };
    let mut params =
        RenderParameters::from_calibration(&config.calibration, config.grid, config.parameters.fstop);
    params.meta = Some(ParametersMeta {
        disp_min: range.min,
        disp_max: range.max,
        frustum_disp_min: config.parameters.frustum_disp_min,
        frustum_disp_max: config.parameters.frustum_disp_max,
        depth_map_scale: options.tile.cols as f32,
    });
    write_parameters(&config.export.target_dir, &params)
}

fn usage() -> Error {
    Error::Config("Usage: depth_export <config.json>".to_string())
}
