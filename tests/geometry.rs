use lightfield_gt::geometry::{camera_rig, frustum};
use lightfield_gt::naming::CameraGrid;
use lightfield_gt::ply::{write_mesh, PlyFormat, PlyOptions};
use lightfield_gt::CameraCalibration;

#[test]
fn frustum_mesh_is_written_as_ascii_ply() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let calib = CameraCalibration::default();
    let volume = frustum(&calib, -2.0, 2.0);
    let path = dir.path().join("frustum.ply");
    let opts = PlyOptions {
        format: PlyFormat::Ascii,
        ..PlyOptions::default()
    };
    write_mesh(&volume.to_mesh(), &path, &opts).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("ply\nformat ascii 1.0\nelement vertex 8\n"));
    assert!(text.contains("element face 2\n"));
    // positions only: no vertex carries normals, UVs or colors
    assert!(!text.contains("property float nx"));
    assert!(text.ends_with("4 0 1 2 3\n4 4 7 6 5\n"));
}

#[test]
fn rig_is_centered_on_middle_camera() {
    let calib = CameraCalibration::default();
    let rig = camera_rig(&CameraGrid::new(5, 5), 0.05, 0.05, &calib);
    let center = &rig[CameraGrid::new(5, 5).center_index()];
    assert_eq!(center.name, "Cam012");
    assert!(center.position.coords.norm() < 1e-6);
    assert!(rig[0].position.x < 0.0 && rig[0].position.y > 0.0);
}
