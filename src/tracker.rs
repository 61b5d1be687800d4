use nalgebra as na;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::FilterConfig;
use crate::math;

/// Belief over one target's field position, kept as a weighted particle cloud.
#[derive(Debug, Clone)]
pub struct ParticleFilter {
    pub particles: Vec<na::Point2<f64>>,
    pub velocities: Vec<na::Vector2<f64>>,
    pub weights: Vec<f64>,

    // frames since the last measurement update
    pub missed: u32,

    // the estimate drifted on prediction alone
    pub predicted: bool,

    weight_floor: f64,
    resample_ratio: f64,
}

impl ParticleFilter {
    pub fn new<R: Rng>(pos: na::Point2<f64>, config: &FilterConfig, rng: &mut R) -> Self {
        let n = config.particles.max(1);
        let (px, py) = config.position_std;
        let (vx, vy) = config.velocity_std;

        let mut gauss = |std: f64| -> f64 { rng.sample::<f64, _>(StandardNormal) * std };

        let particles = (0..n)
            .map(|_| na::Point2::new(pos.x + gauss(px), pos.y + gauss(py)))
            .collect();

        let velocities = (0..n)
            .map(|_| na::Vector2::new(gauss(vx), gauss(vy)))
            .collect();

        Self {
            particles,
            velocities,
            weights: vec![1.0 / n as f64; n],
            missed: 0,
            predicted: false,
            weight_floor: config.weight_floor,
            resample_ratio: config.resample_ratio,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Constant-velocity step, no noise.
    pub fn predict(&mut self) {
        self.particles
            .iter_mut()
            .zip(&self.velocities)
            .for_each(|(p, v)| *p += v);
    }

    /// Reweights every particle by the standard normal density at its
    /// distance from `z`.
    pub fn update(&mut self, z: na::Point2<f64>) {
        self.predicted = false;
        self.missed = 0;

        for (w, p) in self.weights.iter_mut().zip(&self.particles) {
            *w = math::std_normal_pdf(na::distance(p, &z)) + self.weight_floor;
        }

        self.normalize();
    }

    /// Records a frame without a measurement. Returns `true` once the track
    /// has gone `max_missed` frames unmatched.
    pub fn mark_missed(&mut self, max_missed: u32) -> bool {
        self.predicted = true;
        self.missed += 1;

        self.missed >= max_missed
    }

    #[inline]
    pub fn effective_sample_size(&self) -> f64 {
        math::effective_sample_size(&self.weights)
    }

    #[inline]
    pub fn needs_resample(&self) -> bool {
        self.effective_sample_size() < self.len() as f64 / self.resample_ratio
    }

    /// Redraws the particles when the effective sample size collapses.
    /// Returns whether a resample happened.
    pub fn resample<R: Rng>(&mut self, rng: &mut R) -> bool {
        if !self.needs_resample() {
            return false;
        }

        let n = self.len();
        let cumsum = math::cumulative_weights(&self.weights);

        self.particles = (0..n)
            .map(|_| {
                let u: f64 = rng.random();
                self.particles[math::search_sorted(&cumsum, u)]
            })
            .collect();

        self.weights.fill(1.0 / n as f64);

        true
    }

    pub fn estimate(&self) -> na::Point2<f64> {
        math::weighted_mean(&self.particles, &self.weights).unwrap_or(self.particles[0])
    }

    fn normalize(&mut self) {
        let total: f64 = self.weights.iter().sum();

        if total > 0.0 && total.is_finite() {
            self.weights.iter_mut().for_each(|w| *w /= total);
        } else {
            let n = self.len() as f64;
            self.weights.fill(1.0 / n);
        }
    }
}
