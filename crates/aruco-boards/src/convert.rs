//! Marshaling between the core `nalgebra` types and OpenCV arrays.

use aruco_boards_core::{CameraIntrinsics, Pose};
use log::warn;
use nalgebra::{Matrix3, Vector3};
use opencv::calib3d;
use opencv::core::{Mat, Vector};
use opencv::prelude::*;

pub(crate) fn camera_matrix_to_mat(m: &Matrix3<f64>) -> opencv::Result<Mat> {
    Mat::from_slice_2d(&[
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ])
}

pub(crate) fn mat_to_camera_matrix(mat: &Mat) -> opencv::Result<Matrix3<f64>> {
    let mut out = Matrix3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            out[(r, c)] = *mat.at_2d::<f64>(r, c)?;
        }
    }
    Ok(out)
}

pub(crate) fn distortion_to_vector(distortion: &[f64]) -> Vector<f64> {
    Vector::from_slice(distortion)
}

/// Flatten a distortion coefficient Mat (1×N or N×1) into a plain vec.
pub(crate) fn mat_to_distortion(mat: &Mat) -> opencv::Result<Vec<f64>> {
    let total = mat.total();
    let mut out = Vec::with_capacity(total);
    for i in 0..total {
        out.push(*mat.at::<f64>(i as i32)?);
    }
    Ok(out)
}

pub(crate) fn vec3_from_mat(mat: &Mat) -> opencv::Result<Vector3<f64>> {
    Ok(Vector3::new(
        *mat.at::<f64>(0)?,
        *mat.at::<f64>(1)?,
        *mat.at::<f64>(2)?,
    ))
}

pub(crate) fn vec3_to_vector(v: &Vector3<f64>) -> Vector<f64> {
    Vector::from_slice(&[v.x, v.y, v.z])
}

pub(crate) fn pose_from_mats(rvec: &Mat, tvec: &Mat) -> opencv::Result<Pose> {
    Ok(Pose {
        rvec: vec3_from_mat(rvec)?,
        tvec: vec3_from_mat(tvec)?,
    })
}

/// One PnP solve over matched board correspondences.
///
/// Solver-reported failure (as opposed to an OpenCV error) yields `None`
/// after a warning, matching the wrapper's pose contract.
pub(crate) fn solve_board_pnp(
    obj_points: &Mat,
    img_points: &Mat,
    intrinsics: &CameraIntrinsics,
) -> opencv::Result<Option<Pose>> {
    let camera_matrix = camera_matrix_to_mat(&intrinsics.camera_matrix)?;
    let dist_coeffs = distortion_to_vector(&intrinsics.distortion);

    let mut rvec = Mat::default();
    let mut tvec = Mat::default();
    let solved = calib3d::solve_pnp(
        obj_points,
        img_points,
        &camera_matrix,
        &dist_coeffs,
        &mut rvec,
        &mut tvec,
        false,
        calib3d::SOLVEPNP_ITERATIVE,
    )?;
    if !solved {
        warn!("PnP solve failed, no board pose");
        return Ok(None);
    }
    Ok(Some(pose_from_mats(&rvec, &tvec)?))
}
