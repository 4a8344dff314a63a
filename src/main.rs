use lightfield_gt::image::ImageF32;
use lightfield_gt::{process_depth, CameraCalibration, DepthOptions, Resolution, TileSize};

fn main() {
    env_logger::init();

    // Demo stub: a tilted plane from 4 m to 12 m rendered at 4x the output
    // resolution, with one stray sample, run through the depth stages
    let (w, h, scale) = (64usize, 48usize, 4usize);
    let mut depth = ImageF32::new(w * scale, h * scale);
    for y in 0..depth.h {
        for x in 0..depth.w {
            depth.set(x, y, 4.0 + 8.0 * x as f32 / (depth.w - 1) as f32);
        }
    }
    depth.set(17, 23, 1.0e5);

    let calib = CameraCalibration {
        resolution: Resolution::new(w, h),
        ..Default::default()
    };
    let opts = DepthOptions {
        tile: TileSize::square(scale),
        ..Default::default()
    };
    match process_depth(depth, &calib, &opts) {
        Ok(products) => println!(
            "repaired={} disparity=[{:.1}, {:.1}] lowres={:?}",
            products.repair.repaired,
            products.disp_range.min,
            products.disp_range.max,
            products.depth_low.dims()
        ),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
