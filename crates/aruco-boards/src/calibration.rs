//! Batch ChArUco camera calibration over a directory of images.
//!
//! The whole batch is one pass: enumerate files, detect the board on each,
//! accumulate full-board observations, then issue a single
//! `calibrateCamera` call and write both CSV outputs.

use std::fs;
use std::path::{Path, PathBuf};

use aruco_boards_core::{CameraIntrinsics, CsvMatrixError};
use log::{debug, warn};
use opencv::calib3d;
use opencv::core::{Mat, Point2f, Point3f, Size, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};

use crate::charuco::{CharucoBoardSpec, CharucoDetector, CharucoError};
use crate::convert;

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("failed to scan {}: {source}", .dir.display())]
    Scan {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("no .{suffix} images found in {}", .dir.display())]
    NoImages { dir: PathBuf, suffix: String },
    #[error("failed to read image {}", .path.display())]
    UnreadableImage { path: PathBuf },
    #[error("no usable views: no full corner set detected in any of {total} images")]
    NoUsableViews { total: usize },
    #[error(transparent)]
    Board(#[from] CharucoError),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
    #[error(transparent)]
    Csv(#[from] CsvMatrixError),
}

/// Batch calibration settings. The defaults are the CLI defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Directory scanned (non-recursively) for calibration images.
    pub image_dir: PathBuf,
    /// File extension filter, without the leading dot. Case-sensitive.
    pub suffix: String,
    /// Destination directory for both CSV files, created if absent.
    pub output_dir: PathBuf,
    /// Physical side of one chessboard square, in millimetres.
    pub square_size_mm: f64,
    #[serde(default)]
    pub board: CharucoBoardSpec,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./data"),
            suffix: "jpg".to_string(),
            output_dir: PathBuf::from("./camera_params"),
            square_size_mm: 57.0,
            board: CharucoBoardSpec::default(),
        }
    }
}

/// Result of one calibration run.
#[derive(Clone, Debug)]
pub struct CalibrationOutcome {
    pub intrinsics: CameraIntrinsics,
    /// RMS reprojection error reported by the library.
    pub reprojection_error: f64,
    /// Views whose full corner set was detected and entered the batch.
    pub used_views: usize,
    /// Files matching the suffix filter (the `Detect N images.` count).
    pub total_images: usize,
}

/// Non-recursive enumeration of `*.{suffix}` files, sorted by name.
///
/// The extension match is case-sensitive: `photo.JPG` does not match
/// suffix `jpg`.
pub fn list_images(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, CalibrationError> {
    let scan_err = |source| CalibrationError::Scan {
        dir: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_err)? {
        let path = entry.map_err(scan_err)?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(suffix) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The fixed planar template: the board's inner-corner grid at z = 0,
/// row-major with x varying fastest, scaled by the physical square size.
pub fn object_point_template(board: &CharucoBoardSpec, square_size: f64) -> Vector<Point3f> {
    let cols = board.cols.saturating_sub(1);
    let rows = board.rows.saturating_sub(1);
    let mut points = Vector::with_capacity((cols * rows) as usize);
    for y in 0..rows {
        for x in 0..cols {
            points.push(Point3f::new(
                x as f32 * square_size as f32,
                y as f32 * square_size as f32,
                0.0,
            ));
        }
    }
    points
}

/// Run the whole batch: scan, detect, calibrate once, write both CSVs.
///
/// A view enters the batch only when its detected corner count equals the
/// full template length; partial detections are skipped with a warning.
/// Prints `Detect N images.` with the raw matching-file count, then the
/// library's RMS reprojection error is returned to the caller.
pub fn run(config: &CalibrationConfig) -> Result<CalibrationOutcome, CalibrationError> {
    let detector = CharucoDetector::new(config.board.clone())?;
    let images = list_images(&config.image_dir, &config.suffix)?;
    if images.is_empty() {
        return Err(CalibrationError::NoImages {
            dir: config.image_dir.clone(),
            suffix: config.suffix.clone(),
        });
    }

    let template = object_point_template(&config.board, config.square_size_mm);
    let expected = template.len();

    let mut object_points = Vector::<Vector<Point3f>>::new();
    let mut image_points = Vector::<Vector<Point2f>>::new();
    let mut image_size: Option<Size> = None;

    for path in &images {
        let image = imgcodecs::imread(path.to_string_lossy().as_ref(), imgcodecs::IMREAD_COLOR)?;
        if image.empty() {
            return Err(CalibrationError::UnreadableImage { path: path.clone() });
        }
        if image_size.is_none() {
            image_size = Some(image.size()?);
        }
        let detection = detector.detect(&image)?;
        if detection.corner_count() != expected {
            warn!(
                "{}: detected {}/{} corners, skipping view",
                path.display(),
                detection.corner_count(),
                expected
            );
            continue;
        }
        // calibrateCamera pairs observations with the template by position,
        // so store the corners in corner-id order
        let mut ordered = vec![Point2f::new(0.0, 0.0); expected];
        let mut in_range = true;
        for (id, corner) in detection
            .charuco_ids
            .iter()
            .zip(detection.charuco_corners.iter())
        {
            match ordered.get_mut(id as usize) {
                Some(slot) => *slot = corner,
                None => {
                    in_range = false;
                    break;
                }
            }
        }
        if !in_range {
            warn!("{}: corner id out of board range, skipping view", path.display());
            continue;
        }
        debug!("{}: full corner set detected", path.display());
        object_points.push(template.clone());
        image_points.push(Vector::from_slice(&ordered));
    }

    println!("Detect {} images.", images.len());

    let used_views = image_points.len();
    if used_views == 0 {
        return Err(CalibrationError::NoUsableViews {
            total: images.len(),
        });
    }
    let size = image_size.ok_or(CalibrationError::NoUsableViews {
        total: images.len(),
    })?;

    let mut camera_matrix = Mat::default();
    let mut dist_coeffs = Mat::default();
    let mut rvecs = Vector::<Mat>::new();
    let mut tvecs = Vector::<Mat>::new();
    let reprojection_error = calib3d::calibrate_camera_def(
        &object_points,
        &image_points,
        size,
        &mut camera_matrix,
        &mut dist_coeffs,
        &mut rvecs,
        &mut tvecs,
    )?;

    let intrinsics = CameraIntrinsics {
        camera_matrix: convert::mat_to_camera_matrix(&camera_matrix)?,
        distortion: convert::mat_to_distortion(&dist_coeffs)?,
    };
    intrinsics.write_csv(&config.output_dir)?;

    Ok(CalibrationOutcome {
        intrinsics,
        reprojection_error,
        used_views,
        total_images: images.len(),
    })
}
