use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::line::LineEquation;
use crate::math::is_close;

/// A raw line segment in pixel space, as emitted by the line detector.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        na::distance(&self.start(), &self.end())
    }

    #[inline(always)]
    pub fn start(&self) -> na::Point2<f64> {
        na::Point2::new(self.x1, self.y1)
    }

    #[inline(always)]
    pub fn end(&self) -> na::Point2<f64> {
        na::Point2::new(self.x2, self.y2)
    }
}

/// Collapses a frame's segments into distinct general-form equations.
#[derive(Debug, Clone)]
pub struct LineEquationExtractor {
    min_segment_length: f64,
    rel_tolerance: f64,
    abs_tolerance: f64,
    coefficient_rtol: f64,
}

impl LineEquationExtractor {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            min_segment_length: config.min_segment_length,
            rel_tolerance: config.rel_tolerance,
            abs_tolerance: config.abs_tolerance,
            coefficient_rtol: config.coefficient_rtol,
        }
    }

    pub fn extract(&self, segments: &[Segment]) -> Vec<LineEquation> {
        let mut out: Vec<LineEquation> = Vec::with_capacity(segments.len());

        for seg in segments {
            if !(seg.length() >= self.min_segment_length) {
                continue;
            }

            let eq = match LineEquation::through(seg.start(), seg.end()) {
                Some(eq) => eq,
                None => continue,
            };

            if out.iter().any(|prev| self.same_line(&eq, prev)) {
                continue;
            }

            out.push(eq);
        }

        out
    }

    /// Every coefficient is either close in value or close to a unit ratio.
    pub fn same_line(&self, eq: &LineEquation, prev: &LineEquation) -> bool {
        eq.coefficients()
            .iter()
            .zip(prev.coefficients().iter())
            .all(|(&v, &p)| self.coefficient_matches(v, p))
    }

    fn coefficient_matches(&self, v: f64, prev: f64) -> bool {
        if is_close(v, prev, self.coefficient_rtol, self.abs_tolerance) {
            return true;
        }

        // a zero stored coefficient has no ratio
        if prev == 0.0 {
            return false;
        }

        is_close(v / prev, 1.0, self.rel_tolerance, self.abs_tolerance)
    }
}

impl Default for LineEquationExtractor {
    fn default() -> Self {
        Self::new(&CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(LineEquationExtractor::default().extract(&[]).is_empty());
    }

    #[test]
    fn test_scalar_multiples_collapse() {
        let ex = LineEquationExtractor::default();
        let lines = ex.extract(&[
            Segment::new(0.0, 0.0, 100.0, 50.0),
            Segment::new(0.0, 0.0, 200.0, 100.0),
        ]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].coefficients(), [-50.0, 100.0, 0.0]);
        assert!(lines[0].label.is_none());
        assert_eq!(
            lines[0].endpoints,
            Some([na::Point2::new(0.0, 0.0), na::Point2::new(100.0, 50.0)])
        );
    }

    #[test]
    fn test_distinct_lines_survive() {
        let ex = LineEquationExtractor::default();
        let lines = ex.extract(&[
            Segment::new(0.0, 0.0, 100.0, 0.0),
            Segment::new(0.0, 0.0, 0.0, 100.0),
            Segment::new(0.0, 0.0, 100.0, 100.0),
        ]);

        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_short_segments_dropped() {
        let ex = LineEquationExtractor::default();
        let lines = ex.extract(&[
            Segment::new(5.0, 5.0, 5.0, 5.0),
            Segment::new(5.0, 5.0, 8.0, 9.0),
            Segment::new(10.0, 10.0, 300.0, 10.0),
        ]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].coefficients(), [0.0, 290.0, -2900.0]);
    }

    #[test]
    fn test_zero_coefficient_is_not_a_ratio_match() {
        let ex = LineEquationExtractor::default();
        let horizontal = LineEquation::new(0.0, 100.0, -500.0).unwrap();
        let sloped = LineEquation::new(20.0, 100.0, -500.0).unwrap();

        assert!(!ex.same_line(&sloped, &horizontal));
        assert!(ex.same_line(&horizontal, &horizontal));
    }
}
