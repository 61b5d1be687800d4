use nalgebra as na;

use crate::calibration::Homography;
use crate::detection::Detection;
use crate::error::Error;

/// Maps pixel measurements into field coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateProjector;

impl CoordinateProjector {
    /// Points that land at infinity are dropped.
    pub fn project(
        &self,
        homography: Option<&Homography>,
        points: &[na::Point2<f64>],
    ) -> Result<Vec<na::Point2<f64>>, Error> {
        let h = homography.ok_or(Error::Uncalibrated)?;

        Ok(points.iter().filter_map(|p| h.project(p)).collect())
    }

    pub fn project_detections(
        &self,
        homography: Option<&Homography>,
        detections: &[Detection],
    ) -> Result<Vec<na::Point2<f64>>, Error> {
        let points: Vec<_> = detections.iter().map(Detection::centroid).collect();

        self.project(homography, &points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncalibrated() {
        let res = CoordinateProjector.project(None, &[na::Point2::new(1.0, 2.0)]);
        assert!(matches!(res, Err(Error::Uncalibrated)));
    }

    #[test]
    fn test_normalizes_homogeneous_coordinate() {
        let h = Homography(na::Matrix3::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0));
        let out = CoordinateProjector
            .project(Some(&h), &[na::Point2::new(3.0, -4.0)])
            .unwrap();

        assert_eq!(out, vec![na::Point2::new(3.0, -4.0)]);
    }

    #[test]
    fn test_detections_use_centroid() {
        let h = Homography(na::Matrix3::new(1.0, 0.0, 5.0, 0.0, 1.0, -5.0, 0.0, 0.0, 1.0));
        let out = CoordinateProjector
            .project_detections(Some(&h), &[Detection::new(0.0, 0.0, 10.0, 20.0)])
            .unwrap();

        assert_eq!(out, vec![na::Point2::new(10.0, 5.0)]);
    }

    #[test]
    fn test_point_at_infinity_dropped() {
        let h = Homography(na::Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0));
        let out = CoordinateProjector
            .project(Some(&h), &[na::Point2::new(0.0, 1.0), na::Point2::new(2.0, 1.0)])
            .unwrap();

        assert_eq!(out, vec![na::Point2::new(1.0, 0.5)]);
    }
}
