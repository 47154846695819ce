//! ArUco grid boards: generation, detection with optional refinement,
//! whole-board pose.

use aruco_boards_core::{CameraIntrinsics, Pose};
use log::warn;
use opencv::core::{self, Mat, Size};
use opencv::objdetect::GridBoard;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};

use crate::marker::{draw_axes_on, draw_markers_on, MarkerDetection, MarkerDetector, MarkerError};
use crate::{convert, DictionaryKind};

#[derive(thiserror::Error, Debug)]
pub enum GridBoardError {
    #[error("board must have at least 1x1 markers")]
    InvalidSize,
    #[error("marker_separation_rel must be finite and > 0")]
    InvalidSeparation,
    #[error("board needs {needed} markers, dictionary {dictionary} has {available}")]
    NotEnoughDictionaryCodes {
        needed: usize,
        available: usize,
        dictionary: DictionaryKind,
    },
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

impl From<MarkerError> for GridBoardError {
    fn from(err: MarkerError) -> Self {
        match err {
            MarkerError::OpenCv(e) => Self::OpenCv(e),
        }
    }
}

/// Static grid-board description: `cols` × `rows` markers of unit side
/// length, separated by `marker_separation_rel` board units.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridBoardSpec {
    pub cols: u32,
    pub rows: u32,
    pub marker_separation_rel: f32,
    pub dictionary: DictionaryKind,
}

impl Default for GridBoardSpec {
    fn default() -> Self {
        Self {
            cols: 5,
            rows: 7,
            marker_separation_rel: 0.1,
            dictionary: DictionaryKind::default(),
        }
    }
}

impl GridBoardSpec {
    /// Number of markers the board carries.
    #[inline]
    pub fn marker_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub(crate) fn validate(&self) -> Result<(), GridBoardError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(GridBoardError::InvalidSize);
        }
        if !self.marker_separation_rel.is_finite() || self.marker_separation_rel <= 0.0 {
            return Err(GridBoardError::InvalidSeparation);
        }
        let available = self.dictionary.marker_count();
        let needed = self.marker_count();
        if needed > available {
            return Err(GridBoardError::NotEnoughDictionaryCodes {
                needed,
                available,
                dictionary: self.dictionary,
            });
        }
        Ok(())
    }
}

/// Camera context for overlaying one board-level axes triad.
pub struct BoardAxes<'a> {
    pub intrinsics: &'a CameraIntrinsics,
    pub pose: Pose,
    pub axis_length: f32,
}

/// Detector for a whole grid board.
pub struct GridBoardDetector {
    spec: GridBoardSpec,
    board: GridBoard,
    marker: MarkerDetector,
}

impl GridBoardDetector {
    pub fn new(spec: GridBoardSpec) -> Result<Self, GridBoardError> {
        spec.validate()?;
        let marker = MarkerDetector::new(spec.dictionary)?;
        let board = GridBoard::new_def(
            Size::new(spec.cols as i32, spec.rows as i32),
            1.0,
            spec.marker_separation_rel,
            &marker.dictionary,
        )?;
        Ok(Self {
            spec,
            board,
            marker,
        })
    }

    #[inline]
    pub fn spec(&self) -> &GridBoardSpec {
        &self.spec
    }

    /// Render the board bitmap (the original wrapper's defaults were a
    /// 500×700 output with a 10 px margin).
    pub fn generate(&self, size: Size, margin: i32) -> Result<Mat, GridBoardError> {
        let mut img = Mat::default();
        self.board.generate_image(size, &mut img, margin, 1)?;
        Ok(img)
    }

    /// Detect board markers. With `refine`, previously rejected candidates
    /// are re-examined against the known board layout.
    pub fn detect(&self, image: &Mat, refine: bool) -> Result<MarkerDetection, GridBoardError> {
        let mut detection = self.marker.detect(image)?;
        if refine {
            self.marker.detector.refine_detected_markers(
                image,
                &self.board,
                &mut detection.corners,
                &mut detection.ids,
                &mut detection.rejected,
                &core::no_array(),
                &core::no_array(),
                &mut core::no_array(),
            )?;
        }
        Ok(detection)
    }

    /// One global board pose from observed/expected correspondences
    /// matched by the library, or `None` when nothing usable was detected
    /// or the solver reports failure.
    pub fn estimate_pose(
        &self,
        detection: &MarkerDetection,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Option<Pose>, GridBoardError> {
        if detection.is_empty() {
            warn!("no markers detected, no board pose");
            return Ok(None);
        }
        let mut obj_points = Mat::default();
        let mut img_points = Mat::default();
        self.board.match_image_points(
            &detection.corners,
            &detection.ids,
            &mut obj_points,
            &mut img_points,
        )?;
        Ok(convert::solve_board_pnp(
            &obj_points,
            &img_points,
            intrinsics,
        )?)
    }

    /// Draw detected markers and, when given, one board axes triad on a
    /// copy of `image`. The input is never modified.
    pub fn draw(
        &self,
        image: &Mat,
        detection: &MarkerDetection,
        axes: Option<&BoardAxes<'_>>,
    ) -> Result<Mat, GridBoardError> {
        let mut canvas = image.try_clone()?;
        draw_markers_on(&mut canvas, &detection.corners, &detection.ids)?;
        if let Some(axes) = axes {
            draw_axes_on(&mut canvas, axes.intrinsics, &axes.pose, axes.axis_length)?;
        }
        Ok(canvas)
    }
}
