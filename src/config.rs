use serde_derive::{Deserialize, Serialize};

/// Per-target particle filter parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub particles: usize,
    pub position_std: (f64, f64),
    pub velocity_std: (f64, f64),
    pub weight_floor: f64,

    // resample when ESS < particles / resample_ratio
    pub resample_ratio: f64,
}

impl FilterConfig {
    pub fn new(particles: usize) -> Self {
        Self {
            particles,
            ..Default::default()
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            particles: 500,
            position_std: (0.005, 0.005),
            velocity_std: (5.0, 5.0),
            weight_floor: 1e-300,
            resample_ratio: 1.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub filter: FilterConfig,
    pub gating_distance: f64,
    pub max_missed_frames: u32,
    pub seed: Option<u64>,
}

impl TrackerConfig {
    pub fn new(gating_distance: f64, max_missed_frames: u32) -> Self {
        Self {
            gating_distance,
            max_missed_frames,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            gating_distance: 25.0,
            max_missed_frames: 30,
            seed: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    pub min_correspondences: usize,

    /// Segments shorter than this (in pixels) are treated as artifacts.
    pub min_segment_length: f64,

    /// Relative tolerance used when comparing coefficient ratios against 1.
    pub rel_tolerance: f64,
    pub abs_tolerance: f64,
    pub coefficient_rtol: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_correspondences: 4,
            min_segment_length: 10.0,
            rel_tolerance: 1.0,
            abs_tolerance: 1e-8,
            coefficient_rtol: 1e-5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub change_threshold: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            change_threshold: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub calibration: CalibrationConfig,
    pub scene: SceneConfig,

    /// Feed pixel centroids to the tracker while no homography exists.
    pub track_in_pixels_when_uncalibrated: bool,
}
