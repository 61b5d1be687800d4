pub mod calibration;
pub mod config;
pub mod detection;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod line;
pub mod math;
pub mod phash;
pub mod pipeline;
pub mod projector;
pub mod scene;
pub mod tracker;

mod track;

pub use calibration::{Homography, PitchCalibrator};
pub use config::Config;
pub use detection::Detection;
pub use extractor::{LineEquationExtractor, Segment};
pub use frame::Frame;
pub use line::{FieldLine, LineEquation};
pub use phash::{DctHasher, ImageHash, SceneChangeDetector};
pub use pipeline::{FrameReport, Pipeline, PipelineState};
pub use projector::CoordinateProjector;
pub use scene::TrackManager;
pub use track::Track;

use nalgebra as na;

pub trait Tracking {
    fn update(&mut self, points: &[na::Point2<f64>], scene_changed: bool) -> Vec<na::Point2<f64>>;
    fn tracks(&self) -> Vec<Track>;
    fn clear(&mut self);
}
