use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Axis-aligned player box, left-top-right-bottom in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Detection {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The measurement point fed to the tracker.
    #[inline]
    pub fn centroid(&self) -> na::Point2<f64> {
        na::Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

pub fn centroids(detections: &[Detection]) -> Vec<na::Point2<f64>> {
    detections.iter().map(Detection::centroid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        let det = Detection::new(10.0, 20.0, 30.0, 60.0);

        assert_eq!(det.centroid(), na::Point2::new(20.0, 40.0));
    }

    #[test]
    fn test_serde_field_names() {
        let det: Detection =
            serde_json::from_str(r#"{"x1": 0, "y1": 0, "x2": 4, "y2": 2}"#).unwrap();
        assert_eq!(centroids(&[det]), vec![na::Point2::new(2.0, 1.0)]);
    }
}
