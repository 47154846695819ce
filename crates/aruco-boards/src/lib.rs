//! Typed convenience layer over OpenCV's ArUco/ChArUco facilities.
//!
//! Marker, grid-board, ChArUco-board, and diamond operations — generation,
//! detection, pose estimation, drawing, calibration — are all single calls
//! into OpenCV. This crate contributes typed board descriptions, parameter
//! marshaling between `nalgebra` types and OpenCV arrays, and a batch
//! calibration routine over a directory of images.
//!
//! Board kinds are plain data plus one detector struct per kind. The
//! behavior differences between kinds are data (which OpenCV board object
//! backs the calls), not a trait hierarchy.
//!
//! ## API map
//! - [`marker`]: individual markers of one dictionary.
//! - [`grid`]: ArUco grid boards (markers only).
//! - [`charuco`]: chessboard/marker hybrid boards.
//! - [`diamond`]: four-marker diamond clusters.
//! - [`calibration`]: batch intrinsics estimation from board images.

pub mod calibration;
pub mod charuco;
mod convert;
pub mod diamond;
mod dictionary;
pub mod grid;
pub mod io;
pub mod marker;

pub use aruco_boards_core as core;

pub use calibration::{CalibrationConfig, CalibrationError, CalibrationOutcome};
pub use charuco::{CharucoBoardSpec, CharucoDetection, CharucoDetector, CharucoError};
pub use diamond::{DiamondDetection, DiamondDetector};
pub use dictionary::{DictionaryKind, DictionaryParseError, ALL_DICTIONARY_KINDS};
pub use grid::{BoardAxes, GridBoardDetector, GridBoardError, GridBoardSpec};
pub use marker::{MarkerAxes, MarkerDetection, MarkerDetector, MarkerError};
