//! Core camera-parameter types for the `aruco-boards` workspace.
//!
//! This crate is intentionally small and free of any vision-library
//! dependency: plain intrinsics and pose containers, their on-disk CSV
//! form, and a minimal logger for the workspace binaries.

mod intrinsics;
mod logger;
mod pose;

pub use intrinsics::{
    read_matrix_csv, write_matrix_csv, CameraIntrinsics, CsvMatrixError, CAMERA_MATRIX_FILE,
    DISTORTION_FILE,
};
pub use logger::init_with_level;
pub use pose::Pose;
