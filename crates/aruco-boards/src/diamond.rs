//! ChArUco diamonds: four-marker clusters around one chessboard square.

use aruco_boards_core::{CameraIntrinsics, Pose};
use opencv::core::{Mat, Point2f, Scalar, Vec4i, Vector};
use opencv::objdetect;
use opencv::prelude::*;

use crate::charuco::{CharucoBoardSpec, CharucoDetector, CharucoError};
use crate::grid::BoardAxes;
use crate::marker::{draw_axes_on, draw_markers_on};
use crate::DictionaryKind;

/// Output of one diamond search.
#[derive(Debug)]
pub struct DiamondDetection {
    /// One quadrilateral per diamond (the central square's corners).
    pub diamond_corners: Vector<Vector<Point2f>>,
    /// The four marker ids forming each diamond.
    pub diamond_ids: Vector<Vec4i>,
    pub marker_corners: Vector<Vector<Point2f>>,
    pub marker_ids: Vector<i32>,
}

impl DiamondDetection {
    /// Number of diamond clusters found.
    #[inline]
    pub fn len(&self) -> usize {
        self.diamond_corners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diamond_corners.is_empty()
    }
}

/// Detector for diamond clusters, backed by a 3×3 ChArUco board.
pub struct DiamondDetector {
    charuco: CharucoDetector,
}

impl DiamondDetector {
    /// A diamond is always a 3×3 board; only the marker/square ratio, the
    /// dictionary, and optional custom marker ids vary.
    pub fn new(
        marker_square_rel: f32,
        dictionary: DictionaryKind,
        ids: Option<Vec<i32>>,
    ) -> Result<Self, CharucoError> {
        let mut spec = CharucoBoardSpec::new(3, 3, marker_square_rel, dictionary);
        spec.ids = ids;
        Ok(Self {
            charuco: CharucoDetector::new(spec)?,
        })
    }

    #[inline]
    pub fn spec(&self) -> &CharucoBoardSpec {
        self.charuco.spec()
    }

    /// Render the underlying 3×3 board bitmap.
    pub fn generate(&self, size: opencv::core::Size, margin: i32) -> Result<Mat, CharucoError> {
        self.charuco.generate(size, margin)
    }

    /// Search `image` for diamond-shaped four-marker clusters.
    pub fn detect(&self, image: &Mat) -> Result<DiamondDetection, CharucoError> {
        let mut diamond_corners = Vector::<Vector<Point2f>>::new();
        let mut diamond_ids = Vector::<Vec4i>::new();
        let mut marker_corners = Vector::<Vector<Point2f>>::new();
        let mut marker_ids = Vector::<i32>::new();
        self.charuco.detector.detect_diamonds(
            image,
            &mut diamond_corners,
            &mut diamond_ids,
            &mut marker_corners,
            &mut marker_ids,
        )?;
        Ok(DiamondDetection {
            diamond_corners,
            diamond_ids,
            marker_corners,
            marker_ids,
        })
    }

    /// Board pose of the underlying 3×3 board from its chessboard corners.
    pub fn estimate_pose(
        &self,
        detection: &crate::charuco::CharucoDetection,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Option<Pose>, CharucoError> {
        self.charuco.estimate_pose(detection, intrinsics)
    }

    /// Draw the detected markers, an optional axes triad, and the diamond
    /// outlines (blue, the original wrapper's default) on a copy of
    /// `image`. The input is never modified.
    pub fn draw(
        &self,
        image: &Mat,
        detection: &DiamondDetection,
        axes: Option<&BoardAxes<'_>>,
    ) -> Result<Mat, CharucoError> {
        let mut canvas = image.try_clone()?;
        draw_markers_on(&mut canvas, &detection.marker_corners, &detection.marker_ids)?;
        if let Some(axes) = axes {
            draw_axes_on(&mut canvas, axes.intrinsics, &axes.pose, axes.axis_length)?;
        }
        objdetect::draw_detected_diamonds(
            &mut canvas,
            &detection.diamond_corners,
            &detection.diamond_ids,
            Scalar::new(255.0, 0.0, 0.0, 0.0),
        )?;
        Ok(canvas)
    }
}
