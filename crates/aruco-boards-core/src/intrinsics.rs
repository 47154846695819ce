//! Camera intrinsics and their on-disk CSV form.
//!
//! The calibration pipeline writes two headerless comma-separated files
//! into one output directory: `camera_matrix.csv` (3×3) and
//! `distortion_coefficients.csv` (one row, N coefficients). Values are
//! plain `f64` decimal text and round-trip exactly.

use std::fs;
use std::path::Path;

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// File name of the camera matrix output.
pub const CAMERA_MATRIX_FILE: &str = "camera_matrix.csv";
/// File name of the distortion coefficient output.
pub const DISTORTION_FILE: &str = "distortion_coefficients.csv";

/// Errors for the headerless CSV matrix format.
#[derive(thiserror::Error, Debug)]
pub enum CsvMatrixError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{path}: row {row}: not a number: {value:?}")]
    BadNumber {
        path: String,
        row: usize,
        value: String,
    },
    #[error("{path}: expected {expected} rows, got {got}")]
    BadRowCount {
        path: String,
        expected: usize,
        got: usize,
    },
    #[error("{path}: row {row} has {got} values, expected {expected}")]
    BadRowLength {
        path: String,
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("{path}: empty matrix")]
    Empty { path: String },
}

/// Write rows as headerless comma-separated lines, overwriting `path`.
pub fn write_matrix_csv(path: &Path, rows: &[Vec<f64>]) -> Result<(), CsvMatrixError> {
    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(f64::to_string).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}

/// Read headerless comma-separated rows. All rows must have equal length.
pub fn read_matrix_csv(path: &Path) -> Result<Vec<Vec<f64>>, CsvMatrixError> {
    let text = fs::read_to_string(path)?;
    let display = path.display().to_string();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for value in line.split(',') {
            let parsed =
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| CsvMatrixError::BadNumber {
                        path: display.clone(),
                        row: i + 1,
                        value: value.to_string(),
                    })?;
            row.push(parsed);
        }
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(CsvMatrixError::BadRowLength {
                    path: display,
                    row: i + 1,
                    expected: first.len(),
                    got: row.len(),
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(CsvMatrixError::Empty { path: display });
    }
    Ok(rows)
}

/// Camera matrix plus lens distortion coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// 3×3 pinhole intrinsic matrix.
    pub camera_matrix: Matrix3<f64>,
    /// Distortion coefficients in OpenCV order (k1, k2, p1, p2, k3, ...).
    pub distortion: Vec<f64>,
}

impl CameraIntrinsics {
    /// Write both CSV files into `dir`, creating the directory if absent
    /// and overwriting any prior output unconditionally.
    pub fn write_csv(&self, dir: &Path) -> Result<(), CsvMatrixError> {
        fs::create_dir_all(dir)?;
        let m = &self.camera_matrix;
        let rows: Vec<Vec<f64>> = (0..3)
            .map(|r| (0..3).map(|c| m[(r, c)]).collect())
            .collect();
        write_matrix_csv(&dir.join(CAMERA_MATRIX_FILE), &rows)?;
        write_matrix_csv(&dir.join(DISTORTION_FILE), &[self.distortion.clone()])?;
        Ok(())
    }

    /// Read both CSV files back from `dir`.
    pub fn read_csv(dir: &Path) -> Result<Self, CsvMatrixError> {
        let matrix_path = dir.join(CAMERA_MATRIX_FILE);
        let display = matrix_path.display().to_string();
        let rows = read_matrix_csv(&matrix_path)?;
        if rows.len() != 3 {
            return Err(CsvMatrixError::BadRowCount {
                path: display,
                expected: 3,
                got: rows.len(),
            });
        }
        let mut camera_matrix = Matrix3::zeros();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != 3 {
                return Err(CsvMatrixError::BadRowLength {
                    path: display,
                    row: r + 1,
                    expected: 3,
                    got: row.len(),
                });
            }
            for (c, v) in row.iter().enumerate() {
                camera_matrix[(r, c)] = *v;
            }
        }

        let dist_path = dir.join(DISTORTION_FILE);
        let dist_rows = read_matrix_csv(&dist_path)?;
        if dist_rows.len() != 1 {
            return Err(CsvMatrixError::BadRowCount {
                path: dist_path.display().to_string(),
                expected: 1,
                got: dist_rows.len(),
            });
        }

        Ok(Self {
            camera_matrix,
            distortion: dist_rows.into_iter().next().unwrap_or_default(),
        })
    }
}
