//! Generate → detect round trips on synthetic renders.

use aruco_boards::charuco::CharucoBoardSpec;
use aruco_boards::core::CameraIntrinsics;
use aruco_boards::{CharucoDetector, DiamondDetector, DictionaryKind, MarkerDetector};
use nalgebra::Matrix3;
use opencv::core::{self, Mat, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;

fn pad_white(img: &Mat, border: i32) -> Mat {
    let mut out = Mat::default();
    core::copy_make_border(
        img,
        &mut out,
        border,
        border,
        border,
        border,
        core::BORDER_CONSTANT,
        Scalar::all(255.0),
    )
    .expect("pad");
    out
}

fn intrinsics_for(size: Size) -> CameraIntrinsics {
    let f = 1.2 * f64::from(size.width.max(size.height));
    CameraIntrinsics {
        camera_matrix: Matrix3::new(
            f,
            0.0,
            f64::from(size.width) / 2.0,
            0.0,
            f,
            f64::from(size.height) / 2.0,
            0.0,
            0.0,
            1.0,
        ),
        distortion: vec![0.0; 5],
    }
}

#[test]
fn generated_marker_is_detected_with_its_id() {
    let detector = MarkerDetector::new(DictionaryKind::default()).expect("detector");
    let marker = detector.generate(7, 240).expect("generate");
    assert_eq!(marker.size().expect("size"), Size::new(240, 240));

    let scene = pad_white(&marker, 80);
    let detection = detector.detect(&scene).expect("detect");
    assert_eq!(detection.len(), 1);
    assert_eq!(detection.ids.get(0).expect("id"), 7);
}

#[test]
fn out_of_dictionary_id_fails_generation() {
    let detector = MarkerDetector::new(DictionaryKind::default()).expect("detector");
    // DICT_6X6_50 holds ids 0..=49
    assert!(detector.generate(50, 240).is_err());
    assert!(detector.generate(7, 240).is_ok());
}

#[test]
fn marker_poses_cover_every_detection() {
    let detector = MarkerDetector::new(DictionaryKind::default()).expect("detector");
    let scene = pad_white(&detector.generate(3, 240).expect("generate"), 80);
    let detection = detector.detect(&scene).expect("detect");
    assert_eq!(detection.len(), 1);

    let intrinsics = intrinsics_for(scene.size().expect("size"));
    let poses = detector
        .estimate_poses(&detection.corners, &intrinsics)
        .expect("estimate")
        .expect("all solves succeed");
    assert_eq!(poses.len(), detection.len());
    assert!(poses[0].tvec.z > 0.0, "marker should be in front of the camera");
}

#[test]
fn draw_leaves_the_input_untouched() {
    let detector = MarkerDetector::new(DictionaryKind::default()).expect("detector");
    let scene = pad_white(&detector.generate(11, 240).expect("generate"), 80);
    let detection = detector.detect(&scene).expect("detect");

    let mut scene_bgr = Mat::default();
    imgproc::cvt_color_def(&scene, &mut scene_bgr, imgproc::COLOR_GRAY2BGR).expect("to bgr");
    let before = scene_bgr.try_clone().expect("clone");

    let canvas = detector.draw(&scene_bgr, &detection, None).expect("draw");

    let mut diff = Mat::default();
    core::absdiff(&scene_bgr, &before, &mut diff).expect("absdiff");
    assert_eq!(
        core::sum_elems(&diff).expect("sum"),
        Scalar::all(0.0),
        "draw must not touch its input"
    );

    let mut overlay = Mat::default();
    core::absdiff(&canvas, &before, &mut overlay).expect("absdiff");
    assert_ne!(
        core::sum_elems(&overlay).expect("sum"),
        Scalar::all(0.0),
        "the returned copy should carry the overlay"
    );
}

#[test]
fn charuco_board_render_detects_inner_corners() {
    let detector = CharucoDetector::new(CharucoBoardSpec::default()).expect("detector");
    let board_img = detector.generate(Size::new(500, 700), 10).expect("generate");
    let detection = detector.detect(&board_img).expect("detect");

    assert!(
        detection.corner_count() >= 20,
        "expected most of the 24 inner corners, got {}",
        detection.corner_count()
    );
    assert_eq!(detection.charuco_corners.len(), detection.charuco_ids.len());

    let mut ids: Vec<i32> = detection.charuco_ids.iter().collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), detection.corner_count(), "corner ids are unique");
    assert!(ids.iter().all(|&id| (0..24).contains(&id)));
    assert!(!detection.marker_ids.is_empty());
}

#[test]
fn charuco_pose_solves_on_a_clean_render() {
    let detector = CharucoDetector::new(CharucoBoardSpec::default()).expect("detector");
    let board_img = detector.generate(Size::new(500, 700), 10).expect("generate");
    let detection = detector.detect(&board_img).expect("detect");

    let intrinsics = intrinsics_for(board_img.size().expect("size"));
    let pose = detector
        .estimate_pose(&detection, &intrinsics)
        .expect("estimate")
        .expect("solver succeeds on a clean render");
    assert!(pose.tvec.z > 0.0);
}

#[test]
fn diamond_render_detects_one_cluster() {
    let detector = DiamondDetector::new(0.6, DictionaryKind::default(), None).expect("detector");
    let img = detector.generate(Size::new(480, 480), 40).expect("generate");
    let detection = detector.detect(&img).expect("detect");

    assert!(detection.marker_ids.len() >= 4, "all four diamond markers");
    assert!(!detection.is_empty(), "expected at least one diamond");

    let quad = detection.diamond_ids.get(0).expect("quad");
    let mut ids = [quad[0], quad[1], quad[2], quad[3]];
    ids.sort_unstable();
    assert_eq!(ids, [0, 1, 2, 3]);
}
