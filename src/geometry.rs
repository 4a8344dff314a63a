//! Camera rig and view-frustum geometry.
//!
//! Pure functions consumed by the renderer side to place cameras and draw
//! helper volumes. Cameras look down `-z`; the rig lies in the `z = 0` plane,
//! `+x` to the right and `+y` up.
//!
//! The distance at which a point has disparity `d` follows the pinhole
//! relation
//!
//! ```text
//! G(d) = b * f * F * R / (b * f * R + d * F * s)
//! ```
//!
//! with baseline `b`, focal length `f`, focus distance `F`, sensor size `s`
//! and `R = max(res)`.
use crate::naming::{camera_name, CameraGrid};
use crate::ply::{Mesh, MeshVertex};
use crate::types::{CameraCalibration, INFINITE_FOCUS_DISTANCE};
use nalgebra::{Point3, Vector2};
use serde::Serialize;

/// Distance along the optical axis at which points have disparity `disp`.
///
/// Negative or non-finite distances (points "beyond infinity") are replaced
/// by [`INFINITE_FOCUS_DISTANCE`].
pub fn distance_for_disparity(calib: &CameraCalibration, disp: f32) -> f32 {
    let bfr = calib.disparity_factor() as f64;
    let focus = calib.effective_focus_distance() as f64;
    let g = bfr * focus / (bfr + disp as f64 * focus * calib.sensor_size_mm as f64);
    if g.is_finite() && g >= 0.0 {
        g as f32
    } else {
        INFINITE_FOCUS_DISTANCE
    }
}

/// Truncated pyramid bounding the disparity range `[min_disp, max_disp]`.
#[derive(Clone, Debug, Serialize)]
pub struct Frustum {
    /// Far plane (0..4) then near plane (4..8), counter-clockwise from the
    /// bottom-left corner.
    pub vertices: [Point3<f32>; 8],
    pub edges: [(usize, usize); 4],
    pub faces: [[usize; 4]; 2],
    pub near_distance: f32,
    pub far_distance: f32,
}

const FRUSTUM_EDGES: [(usize, usize); 4] = [(0, 4), (1, 5), (2, 6), (3, 7)];
const FRUSTUM_FACES: [[usize; 4]; 2] = [[0, 1, 2, 3], [4, 7, 6, 5]];

/// Frustum with the near plane at `max_disp` and the far plane at `min_disp`.
pub fn frustum(calib: &CameraCalibration, min_disp: f32, max_disp: f32) -> Frustum {
    let near = distance_for_disparity(calib, max_disp);
    let far = distance_for_disparity(calib, min_disp);

    let max_res = calib.resolution.max_side() as f32;
    let a = 2.0 * calib.focal_length_mm / calib.sensor_size_mm;
    let ar_x = calib.resolution.x as f32 / max_res;
    let ar_y = calib.resolution.y as f32 / max_res;

    let corners = |g: f32| {
        let (hx, hy) = (ar_x * g / a, ar_y * g / a);
        [
            Point3::new(-hx, -hy, -g),
            Point3::new(hx, -hy, -g),
            Point3::new(hx, hy, -g),
            Point3::new(-hx, hy, -g),
        ]
    };
    let [f0, f1, f2, f3] = corners(far);
    let [n0, n1, n2, n3] = corners(near);

    Frustum {
        vertices: [f0, f1, f2, f3, n0, n1, n2, n3],
        edges: FRUSTUM_EDGES,
        faces: FRUSTUM_FACES,
        near_distance: near,
        far_distance: far,
    }
}

impl Frustum {
    /// Both planes as a two-face mesh; the connecting edges are implied.
    pub fn to_mesh(&self) -> Mesh {
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|p| MeshVertex::at([p.x, p.y, p.z]))
                .collect(),
            faces: self
                .faces
                .iter()
                .map(|f| f.iter().map(|&i| i as u32).collect())
                .collect(),
        }
    }
}

/// World positions of a regular camera grid centered at the origin.
///
/// Row-major: top row first (largest `y`), left to right within a row.
pub fn camera_grid_positions(
    grid: &CameraGrid,
    baseline_x: f32,
    baseline_y: f32,
) -> Vec<Point3<f32>> {
    let x0 = -baseline_x * (grid.cams_x.saturating_sub(1)) as f32 / 2.0;
    let y0 = baseline_y * (grid.cams_y.saturating_sub(1)) as f32 / 2.0;
    (0..grid.cams_y)
        .flat_map(|v| {
            (0..grid.cams_x).map(move |u| {
                Point3::new(x0 + u as f32 * baseline_x, y0 - v as f32 * baseline_y, 0.0)
            })
        })
        .collect()
}

/// Placement of one light-field camera.
#[derive(Clone, Debug, Serialize)]
pub struct CameraPose {
    pub index: usize,
    pub name: String,
    pub position: Point3<f32>,
    /// Sensor shift (in sensor-width units) converging every view on the
    /// focus plane; zero when focused at infinity.
    pub shift: Vector2<f32>,
}

/// Full rig layout with per-camera lens shift.
pub fn camera_rig(
    grid: &CameraGrid,
    baseline_x: f32,
    baseline_y: f32,
    calib: &CameraCalibration,
) -> Vec<CameraPose> {
    let factor = if calib.focus_distance_m == 0.0 {
        0.0
    } else {
        calib.focal_length_mm / calib.sensor_size_mm / calib.focus_distance_m
    };
    camera_grid_positions(grid, baseline_x, baseline_y)
        .into_iter()
        .enumerate()
        .map(|(index, position)| CameraPose {
            index,
            name: camera_name(index),
            position,
            shift: Vector2::new(-position.x * factor, -position.y * factor),
        })
        .collect()
}

/// Half extent of the focus-plane quads.
pub const FOCUS_PLANE_HALF_SIZE: f32 = 5.0;

/// Two square quads marking the first and last plane of a focus stack in
/// front of `center`: at `focus_distance` and at
/// `focus_distance + separation * steps`.
pub fn focus_planes(
    center: &Point3<f32>,
    focus_distance: f32,
    separation: f32,
    steps: u32,
) -> Mesh {
    let s = FOCUS_PLANE_HALF_SIZE;
    let quad = |depth: f32| {
        [(-s, -s), (-s, s), (s, s), (s, -s)]
            .map(|(dx, dy)| MeshVertex::at([center.x + dx, center.y + dy, center.z - depth]))
    };
    let near = quad(focus_distance);
    let far = quad(focus_distance + separation * steps as f32);
    Mesh {
        vertices: near.into_iter().chain(far).collect(),
        faces: vec![vec![0, 1, 2, 3], vec![4, 7, 6, 5]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disparity::depth_to_disparity;
    use crate::image::ImageF32;
    use crate::types::Resolution;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn frustum_planes_match_disparity_converter() {
        let calib = CameraCalibration::default();
        let f = frustum(&calib, -2.0, 2.0);
        let depths = ImageF32::from_vec(2, 1, vec![f.near_distance, f.far_distance]).unwrap();
        let disp = depth_to_disparity(&depths, &calib);
        assert!(approx_eq(disp.data[0], 2.0, 1e-4), "near {}", disp.data[0]);
        assert!(approx_eq(disp.data[1], -2.0, 1e-4), "far {}", disp.data[1]);
        assert!(f.near_distance < calib.focus_distance_m);
        assert!(f.far_distance > calib.focus_distance_m);
    }

    #[test]
    fn negative_far_plane_falls_back_to_stand_in() {
        // disparity so negative that the far distance turns negative
        let calib = CameraCalibration::default();
        let f = frustum(&calib, -20.0, 2.0);
        assert_eq!(f.far_distance, INFINITE_FOCUS_DISTANCE);
        assert_eq!(f.vertices[0].z, -INFINITE_FOCUS_DISTANCE);
    }

    #[test]
    fn frustum_corners_follow_aspect_ratio() {
        let calib = CameraCalibration {
            resolution: Resolution::new(512, 256),
            ..CameraCalibration::default()
        };
        let f = frustum(&calib, -1.0, 1.0);
        let a = 2.0 * calib.focal_length_mm / calib.sensor_size_mm;
        let g = f.near_distance;
        assert!(approx_eq(f.vertices[6].x, g / a, 1e-5));
        assert!(approx_eq(f.vertices[6].y, 0.5 * g / a, 1e-5));
        assert_eq!(f.to_mesh().faces, vec![vec![0, 1, 2, 3], vec![4, 7, 6, 5]]);
    }

    #[test]
    fn grid_is_centered_and_row_major() {
        let grid = CameraGrid::new(3, 2);
        let pos = camera_grid_positions(&grid, 0.1, 0.2);
        assert_eq!(pos.len(), 6);
        assert!(approx_eq(pos[0].x, -0.1, 1e-6));
        assert!(approx_eq(pos[0].y, 0.1, 1e-6));
        assert!(approx_eq(pos[2].x, 0.1, 1e-6));
        assert!(approx_eq(pos[3].y, -0.1, 1e-6));
        let cx: f32 = pos.iter().map(|p| p.x).sum();
        let cy: f32 = pos.iter().map(|p| p.y).sum();
        assert!(cx.abs() < 1e-5 && cy.abs() < 1e-5);
    }

    #[test]
    fn rig_shift_converges_on_focus_plane() {
        let calib = CameraCalibration::default();
        let rig = camera_rig(&CameraGrid::new(3, 3), 0.05, 0.05, &calib);
        assert_eq!(rig[4].name, "Cam004");
        assert_eq!(rig[4].shift, Vector2::zeros());
        let factor = calib.focal_length_mm / calib.sensor_size_mm / calib.focus_distance_m;
        assert!(approx_eq(rig[0].shift.x, 0.05 * factor, 1e-5));

        let at_infinity = CameraCalibration {
            focus_distance_m: 0.0,
            ..calib
        };
        let rig = camera_rig(&CameraGrid::new(3, 3), 0.05, 0.05, &at_infinity);
        assert!(rig.iter().all(|c| c.shift == Vector2::zeros()));
    }

    #[test]
    fn focus_planes_span_the_stack() {
        let mesh = focus_planes(&Point3::origin(), 8.0, 5.0, 5);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.vertices[0].position[2], -8.0);
        assert_eq!(mesh.vertices[4].position[2], -33.0);
    }
}
