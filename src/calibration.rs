use std::fmt::Debug;

use log::{debug, warn};
#[cfg(test)]
use mockall::automock;
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::error::Error;
use crate::line::{FieldLine, LineEquation};

/// A point seen in the footage paired with the same point on the field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub footage: na::Point2<f64>,
    pub field: na::Point2<f64>,
    pub lines: (FieldLine, FieldLine),
}

/// Projective mapping from footage pixels to field units.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Homography(pub na::Matrix3<f64>);

impl Homography {
    #[inline]
    pub fn matrix(&self) -> &na::Matrix3<f64> {
        &self.0
    }

    /// `None` when the point maps to infinity.
    pub fn project(&self, p: &na::Point2<f64>) -> Option<na::Point2<f64>> {
        let v = self.0 * na::Vector3::new(p.x, p.y, 1.0);

        if v.z.abs() < f64::EPSILON {
            return None;
        }

        let out = na::Point2::new(v.x / v.z, v.y / v.z);

        if out.x.is_finite() && out.y.is_finite() {
            Some(out)
        } else {
            None
        }
    }
}

/// Assigns known field labels to footage lines.
#[cfg_attr(test, automock)]
pub trait LineLabeler: Debug {
    fn label(&self, line: &LineEquation) -> Option<FieldLine>;
}

/// Leaves every footage line unlabeled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLabels;

impl LineLabeler for NoLabels {
    fn label(&self, _line: &LineEquation) -> Option<FieldLine> {
        None
    }
}

/// Pairs every two differently-labeled footage lines with the same pair of
/// field lines and intersects both.
pub fn correspondences(lines: &[LineEquation]) -> Vec<Correspondence> {
    let mut out = Vec::new();

    for (i, l1) in lines.iter().enumerate() {
        for l2 in &lines[i + 1..] {
            let (t1, t2) = match (l1.label, l2.label) {
                (Some(t1), Some(t2)) if t1 != t2 => (t1, t2),
                _ => continue,
            };

            let footage = match l1.intersect(l2) {
                Some(p) => p,
                None => continue,
            };

            let field = match t1.equation().intersect(&t2.equation()) {
                Some(p) => p,
                None => continue,
            };

            out.push(Correspondence {
                footage,
                field,
                lines: (t1.min(t2), t1.max(t2)),
            });
        }
    }

    out
}

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalization(points: &[na::Point2<f64>]) -> Option<na::Matrix3<f64>> {
    let n = points.len() as f64;
    let centroid = points
        .iter()
        .fold(na::Vector2::zeros(), |acc, p| acc + p.coords)
        / n;

    let mean_dist = points
        .iter()
        .map(|p| (p.coords - centroid).norm())
        .sum::<f64>()
        / n;

    if mean_dist < f64::EPSILON || !mean_dist.is_finite() {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;

    Some(na::Matrix3::new(
        s,
        0.0,
        -s * centroid.x,
        0.0,
        s,
        -s * centroid.y,
        0.0,
        0.0,
        1.0,
    ))
}

/// Whether normalized points spread in two directions rather than along a line.
fn spans_plane(points: &[na::Point2<f64>], t: &na::Matrix3<f64>) -> bool {
    let scatter = points.iter().fold(na::Matrix2::zeros(), |acc, p| {
        let q = t * p.to_homogeneous();
        let v = na::Vector2::new(q.x / q.z, q.y / q.z);
        acc + v * v.transpose()
    });

    scatter.symmetric_eigenvalues().min() > 1e-9
}

/// Least-squares DLT over all correspondences.
pub fn fit_homography(pairs: &[Correspondence]) -> Result<Homography, Error> {
    if pairs.len() < 4 {
        return Err(Error::DegenerateHomography);
    }

    let src: Vec<_> = pairs.iter().map(|c| c.footage).collect();
    let dst: Vec<_> = pairs.iter().map(|c| c.field).collect();

    let t_src = normalization(&src).ok_or(Error::DegenerateHomography)?;
    let t_dst = normalization(&dst).ok_or(Error::DegenerateHomography)?;

    if !spans_plane(&src, &t_src) || !spans_plane(&dst, &t_dst) {
        return Err(Error::DegenerateHomography);
    }

    let mut a = na::DMatrix::<f64>::zeros(2 * pairs.len(), 9);

    for (i, (s, d)) in src.iter().zip(&dst).enumerate() {
        let s = t_src * s.to_homogeneous();
        let d = t_dst * d.to_homogeneous();
        let (x, y) = (s.x / s.z, s.y / s.z);
        let (u, v) = (d.x / d.z, d.y / d.z);

        let r = 2 * i;
        a.row_mut(r)
            .copy_from_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        a.row_mut(r + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
    }

    // null vector of A = eigenvector of A^T A with the smallest eigenvalue
    let ata = a.transpose() * &a;
    let eigen = na::SymmetricEigen::new(ata);
    let (idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))
        .ok_or(Error::DegenerateHomography)?;

    let h = eigen.eigenvectors.column(idx);
    let hn = na::Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(Error::DegenerateHomography)?;
    let mut m = t_dst_inv * hn * t_src;

    if m.determinant().abs() < 1e-12 || m.iter().any(|v| !v.is_finite()) {
        return Err(Error::DegenerateHomography);
    }

    let scale = m[(2, 2)];
    if scale.abs() > f64::EPSILON {
        m /= scale;
    }

    Ok(Homography(m))
}

/// Keeps the most recent successful homography fit.
#[derive(Debug, Clone)]
pub struct PitchCalibrator {
    homography: Option<Homography>,
    min_correspondences: usize,
}

impl PitchCalibrator {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            homography: None,
            min_correspondences: config.min_correspondences.max(4),
        }
    }

    #[inline]
    pub fn homography(&self) -> Option<&Homography> {
        self.homography.as_ref()
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.homography.is_some()
    }

    /// Refits from labeled footage lines. Returns whether a new fit replaced
    /// the stored one, along with the current homography.
    pub fn calibrate(&mut self, lines: &[LineEquation]) -> (bool, Option<&Homography>) {
        let pairs = correspondences(lines);
        self.fit(&pairs)
    }

    pub fn fit(&mut self, pairs: &[Correspondence]) -> (bool, Option<&Homography>) {
        if pairs.len() < self.min_correspondences {
            debug!(target: "calibration", "{} correspondences, keeping previous homography", pairs.len());
            return (false, self.homography.as_ref());
        }

        match fit_homography(pairs) {
            Ok(h) => {
                debug!(target: "calibration", "fit homography from {} correspondences", pairs.len());
                self.homography = Some(h);
                (true, self.homography.as_ref())
            }
            Err(err) => {
                warn!(target: "calibration", "homography fit rejected: {err}");
                (false, self.homography.as_ref())
            }
        }
    }
}

impl Default for PitchCalibrator {
    fn default() -> Self {
        Self::new(&CalibrationConfig::default())
    }
}
