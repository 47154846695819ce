//! ChArUco boards: chessboard/marker hybrids with identified corners.

use aruco_boards_core::{CameraIntrinsics, Pose};
use log::warn;
use opencv::core::{Mat, Point2f, Scalar, Size, Vector};
use opencv::objdetect;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::BoardAxes;
use crate::marker::draw_axes_on;
use crate::{convert, DictionaryKind};

#[derive(thiserror::Error, Debug)]
pub enum CharucoError {
    #[error("board must be at least 2x2 squares")]
    InvalidSize,
    #[error("marker_square_rel must be finite and > 0")]
    InvalidMarkerSquareRel,
    #[error("board needs {needed} markers, dictionary {dictionary} has {available}")]
    NotEnoughDictionaryCodes {
        needed: usize,
        available: usize,
        dictionary: DictionaryKind,
    },
    #[error("board carries {needed} markers, got {got} custom ids")]
    BadIdCount { needed: usize, got: usize },
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// Static ChArUco board description.
///
/// `cols`/`rows` are chessboard **square** counts. Squares have unit side;
/// markers sit on the white squares with a side of `marker_square_rel`
/// square units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharucoBoardSpec {
    pub cols: u32,
    pub rows: u32,
    pub marker_square_rel: f32,
    pub dictionary: DictionaryKind,
    /// Custom marker ids, row-major over the white squares. `None` assigns
    /// sequential ids.
    #[serde(default)]
    pub ids: Option<Vec<i32>>,
}

impl Default for CharucoBoardSpec {
    fn default() -> Self {
        Self::new(5, 7, 0.6, DictionaryKind::default())
    }
}

impl CharucoBoardSpec {
    /// Build a spec. A marker/square ratio of 1 or more is clamped to
    /// exactly 1, as in the original wrapper.
    pub fn new(cols: u32, rows: u32, marker_square_rel: f32, dictionary: DictionaryKind) -> Self {
        Self {
            cols,
            rows,
            marker_square_rel: clamp_marker_square_rel(marker_square_rel),
            dictionary,
            ids: None,
        }
    }

    /// Ratio actually handed to the library: clamped to at most 1 even if
    /// the field was mutated or deserialized past the constructor.
    #[inline]
    pub fn effective_marker_square_rel(&self) -> f32 {
        clamp_marker_square_rel(self.marker_square_rel)
    }

    /// Number of inner chessboard corners the board exposes.
    #[inline]
    pub fn inner_corner_count(&self) -> usize {
        (self.cols.saturating_sub(1) as usize) * (self.rows.saturating_sub(1) as usize)
    }

    /// Number of markers on the board: the white squares, with the
    /// top-left square black.
    #[inline]
    pub fn marker_count(&self) -> usize {
        (self.cols as usize * self.rows as usize) / 2
    }

    pub(crate) fn validate(&self) -> Result<(), CharucoError> {
        if self.cols < 2 || self.rows < 2 {
            return Err(CharucoError::InvalidSize);
        }
        let rel = self.marker_square_rel;
        if !rel.is_finite() || rel <= 0.0 {
            return Err(CharucoError::InvalidMarkerSquareRel);
        }
        let needed = self.marker_count();
        let available = self.dictionary.marker_count();
        if needed > available {
            return Err(CharucoError::NotEnoughDictionaryCodes {
                needed,
                available,
                dictionary: self.dictionary,
            });
        }
        if let Some(ids) = &self.ids {
            if ids.len() != needed {
                return Err(CharucoError::BadIdCount {
                    needed,
                    got: ids.len(),
                });
            }
        }
        Ok(())
    }
}

#[inline]
fn clamp_marker_square_rel(rel: f32) -> f32 {
    if rel >= 1.0 {
        1.0
    } else {
        rel
    }
}

/// Output of one board detection: identified chessboard corners plus the
/// raw marker detections they came from.
#[derive(Debug)]
pub struct CharucoDetection {
    pub charuco_corners: Vector<Point2f>,
    pub charuco_ids: Vector<i32>,
    pub marker_corners: Vector<Vector<Point2f>>,
    pub marker_ids: Vector<i32>,
}

impl CharucoDetection {
    /// Number of identified chessboard corners.
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.charuco_corners.len()
    }
}

/// Detector for one ChArUco board.
pub struct CharucoDetector {
    spec: CharucoBoardSpec,
    pub(crate) board: objdetect::CharucoBoard,
    pub(crate) detector: objdetect::CharucoDetector,
}

impl CharucoDetector {
    pub fn new(spec: CharucoBoardSpec) -> Result<Self, CharucoError> {
        spec.validate()?;
        let dictionary = spec.dictionary.load()?;
        let size = Size::new(spec.cols as i32, spec.rows as i32);
        let rel = spec.effective_marker_square_rel();
        let board = match &spec.ids {
            Some(ids) => {
                let ids = Vector::<i32>::from_slice(ids);
                objdetect::CharucoBoard::new(size, 1.0, rel, &dictionary, &ids)?
            }
            None => objdetect::CharucoBoard::new_def(size, 1.0, rel, &dictionary)?,
        };
        let detector = objdetect::CharucoDetector::new_def(&board)?;
        Ok(Self {
            spec,
            board,
            detector,
        })
    }

    #[inline]
    pub fn spec(&self) -> &CharucoBoardSpec {
        &self.spec
    }

    /// Render the board bitmap.
    pub fn generate(&self, size: Size, margin: i32) -> Result<Mat, CharucoError> {
        let mut img = Mat::default();
        self.board.generate_image(size, &mut img, margin, 1)?;
        Ok(img)
    }

    /// Detect the board: markers first, then interpolated and identified
    /// chessboard corners, all inside the library.
    pub fn detect(&self, image: &Mat) -> Result<CharucoDetection, CharucoError> {
        let mut charuco_corners = Vector::<Point2f>::new();
        let mut charuco_ids = Vector::<i32>::new();
        let mut marker_corners = Vector::<Vector<Point2f>>::new();
        let mut marker_ids = Vector::<i32>::new();
        self.detector.detect_board(
            image,
            &mut charuco_corners,
            &mut charuco_ids,
            &mut marker_corners,
            &mut marker_ids,
        )?;
        Ok(CharucoDetection {
            charuco_corners,
            charuco_ids,
            marker_corners,
            marker_ids,
        })
    }

    /// One global board pose from the identified chessboard corners, or
    /// `None` when nothing was detected or the solver reports failure.
    pub fn estimate_pose(
        &self,
        detection: &CharucoDetection,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Option<Pose>, CharucoError> {
        if detection.charuco_corners.is_empty() {
            warn!("no charuco corners detected, no board pose");
            return Ok(None);
        }
        let mut obj_points = Mat::default();
        let mut img_points = Mat::default();
        self.board.match_image_points(
            &detection.charuco_corners,
            &detection.charuco_ids,
            &mut obj_points,
            &mut img_points,
        )?;
        Ok(convert::solve_board_pnp(
            &obj_points,
            &img_points,
            intrinsics,
        )?)
    }

    /// Draw identified chessboard corners (red, the library default the
    /// original wrapper used) and an optional axes triad on a copy of
    /// `image`. The input is never modified.
    pub fn draw(
        &self,
        image: &Mat,
        detection: &CharucoDetection,
        axes: Option<&BoardAxes<'_>>,
    ) -> Result<Mat, CharucoError> {
        let mut canvas = image.try_clone()?;
        objdetect::draw_detected_corners_charuco(
            &mut canvas,
            &detection.charuco_corners,
            &detection.charuco_ids,
            Scalar::new(0.0, 0.0, 255.0, 0.0),
        )?;
        if let Some(axes) = axes {
            draw_axes_on(&mut canvas, axes.intrinsics, &axes.pose, axes.axis_length)?;
        }
        Ok(canvas)
    }
}
