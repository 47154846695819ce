//! Black-box checks of the two binaries.

use assert_cmd::Command;
use opencv::core::{Mat, Scalar, CV_8UC3};
use predicates::prelude::*;

fn calibrate() -> Command {
    Command::cargo_bin("charuco-calibrate").expect("binary")
}

fn board_gen() -> Command {
    Command::cargo_bin("board-gen").expect("binary")
}

/// A featureless white frame: readable, but no board in sight.
fn write_blank_jpg(path: &std::path::Path) {
    let blank =
        Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::all(255.0)).expect("mat");
    opencv::imgcodecs::imwrite_def(path.to_str().expect("utf8"), &blank).expect("imwrite");
}

#[test]
fn help_shows_the_documented_defaults() {
    calibrate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("./data"))
        .stdout(predicate::str::contains("jpg"))
        .stdout(predicate::str::contains("./camera_params"))
        .stdout(predicate::str::contains("57"));
}

#[test]
fn with_no_arguments_the_local_data_dir_is_scanned() {
    let tmp = tempfile::tempdir().expect("tempdir");
    // no ./data here, so the run fails while naming the default directory
    calibrate()
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("./data"));
}

#[test]
fn file_count_is_reported_even_when_no_view_is_usable() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let data = tmp.path().join("data");
    std::fs::create_dir(&data).expect("mkdir");
    write_blank_jpg(&data.join("one.jpg"));
    write_blank_jpg(&data.join("two.jpg"));
    // wrong suffix and wrong case must not be counted
    write_blank_jpg(&data.join("three.png"));
    write_blank_jpg(&data.join("FOUR.JPG"));

    calibrate()
        .arg("--impath")
        .arg(&data)
        .arg("--output")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Detect 2 images."))
        .stderr(predicate::str::contains("no usable views"));

    assert!(
        !tmp.path().join("out").exists(),
        "failed runs must not write output files"
    );
}

#[test]
fn suffix_filter_is_honoured() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let data = tmp.path().join("data");
    std::fs::create_dir(&data).expect("mkdir");
    write_blank_jpg(&data.join("a.png"));
    write_blank_jpg(&data.join("b.png"));
    write_blank_jpg(&data.join("c.png"));
    write_blank_jpg(&data.join("d.jpg"));

    calibrate()
        .arg("--impath")
        .arg(&data)
        .arg("--suffix")
        .arg("png")
        .arg("--output")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Detect 3 images."));
}

#[test]
fn board_gen_writes_a_charuco_bitmap() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("charuco.png");

    board_gen()
        .arg("--out")
        .arg(&out)
        .arg("--width")
        .arg("400")
        .arg("--height")
        .arg("560")
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let metadata = std::fs::metadata(&out).expect("output file");
    assert!(metadata.len() > 0);
}

#[test]
fn board_gen_rejects_an_unknown_dictionary() {
    board_gen()
        .arg("--dictionary")
        .arg("DICT_9X9_9")
        .assert()
        .failure();
}
