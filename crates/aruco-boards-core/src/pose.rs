use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Rigid pose as reported by the PnP solver: a Rodrigues rotation vector
/// plus a translation, expressed in the camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rvec: Vector3<f64>,
    pub tvec: Vector3<f64>,
}

impl Pose {
    /// Distance from the camera centre to the pose origin.
    #[inline]
    pub fn range(&self) -> f64 {
        self.tvec.norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn range_is_the_translation_norm() {
        let pose = Pose {
            rvec: Vector3::zeros(),
            tvec: Vector3::new(3.0, 4.0, 12.0),
        };
        assert_relative_eq!(pose.range(), 13.0);
    }

    #[test]
    fn pose_round_trips_through_json() {
        let pose = Pose {
            rvec: Vector3::new(0.1, -0.2, 0.3),
            tvec: Vector3::new(10.0, 20.0, 300.0),
        };
        let json = serde_json::to_string(&pose).expect("serialize");
        let back: Pose = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(pose, back);
    }
}
