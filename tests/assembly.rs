mod common;

use common::synthetic::write_input_views;
use image::{GrayImage, Luma, Rgb};
use lightfield_gt::image::io::{load_rgb_image, save_gray_image};
use lightfield_gt::mosaic::{write_lenslet, write_side_by_side};
use lightfield_gt::naming::{sequence_frame_dir, CameraGrid, ViewNaming};
use lightfield_gt::Error;

#[test]
fn lenslet_from_rendered_views() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let grid = CameraGrid::new(3, 2);
    write_input_views(dir.path(), &grid, 4, 3);

    let path = write_lenslet(dir.path(), &grid).unwrap();
    assert_eq!(path, dir.path().join("lenslet.png"));
    let lenslet = load_rgb_image(&path).unwrap();
    assert_eq!(lenslet.dimensions(), (12, 6));
    // view (u=2, v=1) is camera 5; its pixel (3, 2) lands at (3*3+2, 2*2+1)
    assert_eq!(*lenslet.get_pixel(11, 5), Rgb([5, 3, 2]));
    assert_eq!(*lenslet.get_pixel(0, 0), Rgb([0, 0, 0]));
}

#[test]
fn side_by_side_uses_center_camera() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let grid = CameraGrid::new(3, 3);
    write_input_views(dir.path(), &grid, 4, 2);
    let disp = GrayImage::from_fn(4, 2, |x, _| Luma([60 * x as u8]));
    save_gray_image(&disp, &dir.path().join("gt_disp_lowres_Cam004.png")).unwrap();

    let path = write_side_by_side(dir.path(), &grid, ViewNaming::AllViews).unwrap();
    let composite = load_rgb_image(&path).unwrap();
    assert_eq!(composite.dimensions(), (8, 2));
    assert_eq!(*composite.get_pixel(1, 0), Rgb([4, 1, 0]));
    assert_eq!(*composite.get_pixel(7, 1), Rgb([180, 180, 180]));

    // center-view naming expects the unsuffixed file
    assert!(matches!(
        write_side_by_side(dir.path(), &grid, ViewNaming::CenterView),
        Err(Error::MissingFile(_))
    ));
}

#[test]
fn missing_view_aborts_lenslet() {
    let dir = tempfile::tempdir().unwrap();
    let frame_dir = sequence_frame_dir(dir.path(), 3);
    let grid = CameraGrid::new(2, 2);
    write_input_views(&frame_dir, &CameraGrid::new(3, 1), 2, 2);
    match write_lenslet(&frame_dir, &grid) {
        Err(Error::MissingFile(p)) => assert!(p.ends_with("input_Cam003.png")),
        other => panic!("expected MissingFile, got {other:?}"),
    }
    assert!(!frame_dir.join("lenslet.png").exists());
}
