//! End-to-end batch calibration on synthetic board views.

use aruco_boards::calibration::{self, CalibrationConfig};
use aruco_boards::charuco::CharucoBoardSpec;
use aruco_boards::core::CameraIntrinsics;
use aruco_boards::CharucoDetector;
use opencv::core::{self, Mat, Point2f, Scalar, Size, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};

/// Warp the full board render onto a destination quadrilateral, filling
/// the outside with white, to fake a distinct camera view.
fn warp_view(board: &Mat, dst_quad: [(f32, f32); 4]) -> Mat {
    let size = board.size().expect("size");
    let (w, h) = (size.width as f32, size.height as f32);
    let src = Vector::<Point2f>::from_slice(&[
        Point2f::new(0.0, 0.0),
        Point2f::new(w, 0.0),
        Point2f::new(w, h),
        Point2f::new(0.0, h),
    ]);
    let dst: Vector<Point2f> = dst_quad
        .iter()
        .map(|&(x, y)| Point2f::new(x, y))
        .collect();
    let m = imgproc::get_perspective_transform_def(&src, &dst).expect("homography");
    let mut out = Mat::default();
    imgproc::warp_perspective(
        board,
        &mut out,
        &m,
        size,
        imgproc::INTER_LINEAR,
        core::BORDER_CONSTANT,
        Scalar::all(255.0),
    )
    .expect("warp");
    out
}

#[test]
fn batch_calibration_writes_camera_parameters() {
    let board = CharucoBoardSpec::default();
    let detector = CharucoDetector::new(board.clone()).expect("detector");
    let render = detector.generate(Size::new(500, 700), 50).expect("render");

    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    std::fs::create_dir(&data).expect("mkdir");

    // one straight view plus mildly tilted fakes
    imgcodecs::imwrite_def(
        data.join("view0.jpg").to_str().expect("utf8"),
        &render,
    )
    .expect("imwrite");
    let quads = [
        [(20.0, 30.0), (470.0, 15.0), (480.0, 660.0), (30.0, 680.0)],
        [(40.0, 10.0), (460.0, 45.0), (450.0, 690.0), (10.0, 640.0)],
        [(15.0, 50.0), (485.0, 20.0), (465.0, 640.0), (45.0, 685.0)],
    ];
    for (i, quad) in quads.iter().enumerate() {
        let view = warp_view(&render, *quad);
        let path = data.join(format!("view{}.jpg", i + 1));
        imgcodecs::imwrite_def(path.to_str().expect("utf8"), &view).expect("imwrite");
    }

    let config = CalibrationConfig {
        image_dir: data,
        output_dir: dir.path().join("camera_params"),
        ..CalibrationConfig::default()
    };
    let outcome = calibration::run(&config).expect("calibrate");

    assert_eq!(outcome.total_images, 4);
    assert!(
        outcome.used_views >= 2,
        "only {} of 4 views were usable",
        outcome.used_views
    );
    assert!(outcome.reprojection_error.is_finite());

    let written = CameraIntrinsics::read_csv(&config.output_dir).expect("read outputs back");
    assert!(written.camera_matrix[(0, 0)] > 0.0, "positive focal length");
    assert_eq!(written.camera_matrix[(2, 2)], 1.0);
    assert!(!written.distortion.is_empty());
    assert_eq!(written, outcome.intrinsics);
}

#[test]
fn unreadable_image_aborts_the_run_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    std::fs::create_dir(&data).expect("mkdir");
    std::fs::write(data.join("broken.jpg"), b"not an image").expect("write");

    let config = CalibrationConfig {
        image_dir: data,
        output_dir: dir.path().join("camera_params"),
        ..CalibrationConfig::default()
    };
    assert!(matches!(
        calibration::run(&config),
        Err(calibration::CalibrationError::UnreadableImage { .. })
    ));
    assert!(!config.output_dir.exists(), "no partial output on failure");
}
