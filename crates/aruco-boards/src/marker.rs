//! Individual marker operations: generation, detection, pose, drawing.

use aruco_boards_core::{CameraIntrinsics, Pose};
use log::warn;
use opencv::calib3d;
use opencv::core::{Mat, Point2f, Point3f, Scalar, Vector};
use opencv::objdetect::{self, ArucoDetector, DetectorParameters, RefineParameters};
use opencv::prelude::*;

use crate::convert;
use crate::DictionaryKind;

/// Axis length the original wrapper used when none was given.
pub const DEFAULT_AXIS_LENGTH: f32 = 1.0;

/// Errors from marker operations. Generation and detection failures are
/// the wrapped library's own errors, surfaced unchanged.
#[derive(thiserror::Error, Debug)]
pub enum MarkerError {
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// Corner sets, decoded ids, and rejected candidates from one detection.
#[derive(Debug)]
pub struct MarkerDetection {
    /// One quadrilateral (TL, TR, BR, BL) per decoded marker.
    pub corners: Vector<Vector<Point2f>>,
    /// Decoded id per quadrilateral, parallel to `corners`.
    pub ids: Vector<i32>,
    /// Candidate quadrilaterals that did not decode to a dictionary id.
    pub rejected: Vector<Vector<Point2f>>,
}

impl MarkerDetection {
    /// Number of decoded markers.
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

/// Camera context for overlaying per-marker axes in [`MarkerDetector::draw`].
pub struct MarkerAxes<'a> {
    pub intrinsics: &'a CameraIntrinsics,
    /// One pose per detected marker, as returned by `estimate_poses`.
    pub poses: &'a [Pose],
    pub axis_length: f32,
}

/// Detector for individual markers of one predefined dictionary.
///
/// Detection parameters are OpenCV defaults and are not caller-tunable.
pub struct MarkerDetector {
    kind: DictionaryKind,
    pub(crate) dictionary: objdetect::Dictionary,
    pub(crate) detector: ArucoDetector,
}

impl MarkerDetector {
    pub fn new(kind: DictionaryKind) -> Result<Self, MarkerError> {
        let dictionary = kind.load()?;
        let parameters = DetectorParameters::default()?;
        let refine = RefineParameters::new(10.0, 3.0, true)?;
        let detector = ArucoDetector::new(&dictionary, &parameters, refine)?;
        Ok(Self {
            kind,
            dictionary,
            detector,
        })
    }

    #[inline]
    pub fn dictionary_kind(&self) -> DictionaryKind {
        self.kind
    }

    /// Render one marker as a square 8-bit bitmap, `side_pixels` per side.
    ///
    /// An `id` beyond the dictionary capacity fails with the library's own
    /// error.
    pub fn generate(&self, id: i32, side_pixels: i32) -> Result<Mat, MarkerError> {
        let mut img = Mat::default();
        objdetect::generate_image_marker(&self.dictionary, id, side_pixels, &mut img, 1)?;
        Ok(img)
    }

    /// Detect all markers of this dictionary in `image`.
    pub fn detect(&self, image: &Mat) -> Result<MarkerDetection, MarkerError> {
        let mut corners = Vector::<Vector<Point2f>>::new();
        let mut ids = Vector::<i32>::new();
        let mut rejected = Vector::<Vector<Point2f>>::new();
        self.detector
            .detect_markers(image, &mut corners, &mut ids, &mut rejected)?;
        Ok(MarkerDetection {
            corners,
            ids,
            rejected,
        })
    }

    /// Estimate one pose per detected marker against the canonical unit
    /// square (TL, TR, BR, BL, z = 0).
    ///
    /// All-or-nothing: if the solver reports failure for any one marker,
    /// the whole batch is discarded and `None` is returned.
    pub fn estimate_poses(
        &self,
        corners: &Vector<Vector<Point2f>>,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Option<Vec<Pose>>, MarkerError> {
        let object_points = unit_square_object_points();
        let camera_matrix = convert::camera_matrix_to_mat(&intrinsics.camera_matrix)?;
        let dist_coeffs = convert::distortion_to_vector(&intrinsics.distortion);

        let mut poses = Vec::with_capacity(corners.len());
        for corner in corners.iter() {
            let mut rvec = Mat::default();
            let mut tvec = Mat::default();
            let solved = calib3d::solve_pnp(
                &object_points,
                &corner,
                &camera_matrix,
                &dist_coeffs,
                &mut rvec,
                &mut tvec,
                false,
                calib3d::SOLVEPNP_ITERATIVE,
            )?;
            if !solved {
                warn!(
                    "PnP solve failed for marker {} of {}, discarding all poses",
                    poses.len(),
                    corners.len()
                );
                return Ok(None);
            }
            poses.push(convert::pose_from_mats(&rvec, &tvec)?);
        }
        Ok(Some(poses))
    }

    /// Draw detected markers, and optionally per-marker axes, on a copy of
    /// `image`. The input is never modified.
    pub fn draw(
        &self,
        image: &Mat,
        detection: &MarkerDetection,
        axes: Option<&MarkerAxes<'_>>,
    ) -> Result<Mat, MarkerError> {
        let mut canvas = image.try_clone()?;
        draw_markers_on(&mut canvas, &detection.corners, &detection.ids)?;
        if let Some(axes) = axes {
            for pose in axes.poses {
                draw_axes_on(&mut canvas, axes.intrinsics, pose, axes.axis_length)?;
            }
        }
        Ok(canvas)
    }
}

/// The canonical marker template: a unit square centred on the origin.
fn unit_square_object_points() -> Vector<Point3f> {
    Vector::from_slice(&[
        Point3f::new(-0.5, 0.5, 0.0),
        Point3f::new(0.5, 0.5, 0.0),
        Point3f::new(0.5, -0.5, 0.0),
        Point3f::new(-0.5, -0.5, 0.0),
    ])
}

/// Overlay marker outlines and ids in the library's default green.
pub(crate) fn draw_markers_on(
    canvas: &mut Mat,
    corners: &Vector<Vector<Point2f>>,
    ids: &Vector<i32>,
) -> opencv::Result<()> {
    objdetect::draw_detected_markers(canvas, corners, ids, Scalar::new(0.0, 255.0, 0.0, 0.0))
}

/// Overlay one pose's coordinate axes.
pub(crate) fn draw_axes_on(
    canvas: &mut Mat,
    intrinsics: &CameraIntrinsics,
    pose: &Pose,
    axis_length: f32,
) -> opencv::Result<()> {
    let camera_matrix = convert::camera_matrix_to_mat(&intrinsics.camera_matrix)?;
    let dist_coeffs = convert::distortion_to_vector(&intrinsics.distortion);
    calib3d::draw_frame_axes_def(
        canvas,
        &camera_matrix,
        &dist_coeffs,
        &convert::vec3_to_vector(&pose.rvec),
        &convert::vec3_to_vector(&pose.tvec),
        axis_length,
    )
}
