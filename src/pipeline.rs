use log::{debug, error};
use nalgebra as na;
use serde_derive::Serialize;

use crate::calibration::{Homography, LineLabeler, PitchCalibrator};
use crate::config::Config;
use crate::detection;
use crate::error::Error;
use crate::extractor::LineEquationExtractor;
use crate::frame::Frame;
use crate::line::LineEquation;
use crate::phash::{PerceptualHasher, SceneChangeDetector};
use crate::projector::CoordinateProjector;
use crate::scene::TrackManager;
use crate::Track;

/// Everything carried from one frame to the next.
#[derive(Debug)]
pub struct PipelineState {
    pub scene: SceneChangeDetector,
    pub calibrator: PitchCalibrator,
    pub tracker: TrackManager,
}

impl PipelineState {
    pub fn new(config: &Config) -> Self {
        Self {
            scene: SceneChangeDetector::new(&config.scene),
            calibrator: PitchCalibrator::new(&config.calibration),
            tracker: TrackManager::new(config.tracker.clone()),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct FrameReport {
    pub index: u64,
    pub scene_changed: bool,

    // a new homography was fit on this frame
    pub refit: bool,
    pub homography: Option<Homography>,

    /// Field-space estimates; withheld while uncalibrated unless pixel
    /// tracking is enabled.
    pub estimates: Vec<na::Point2<f64>>,
    pub tracks: Vec<Track>,
    pub active_tracks: usize,
}

/// Per-frame driver: scene check, calibration, projection, tracking.
#[derive(Debug)]
pub struct Pipeline<H, L> {
    hasher: H,
    labeler: L,
    extractor: LineEquationExtractor,
    projector: CoordinateProjector,
    track_in_pixels: bool,
}

impl<H, L> Pipeline<H, L>
where
    H: PerceptualHasher,
    L: LineLabeler,
{
    pub fn new(config: &Config, hasher: H, labeler: L) -> Self {
        Self {
            hasher,
            labeler,
            extractor: LineEquationExtractor::new(&config.calibration),
            projector: CoordinateProjector,
            track_in_pixels: config.track_in_pixels_when_uncalibrated,
        }
    }

    fn footage_lines(&self, frame: &Frame) -> Vec<LineEquation> {
        let mut lines = self.extractor.extract(&frame.segments);

        for line in &mut lines {
            line.label = self.labeler.label(line);
        }

        lines.extend(frame.labeled_lines.iter().cloned());
        lines
    }

    pub fn step(&self, mut state: PipelineState, frame: &Frame) -> (PipelineState, FrameReport) {
        let hash = frame
            .hash
            .or_else(|| frame.pixels.as_ref().map(|p| self.hasher.hash(p)));

        let scene_changed = match hash {
            Some(h) => state.scene.update(&self.hasher, h),
            None => false,
        };

        let lines = self.footage_lines(frame);
        let (refit, homography) = state.calibrator.calibrate(&lines);
        let homography = homography.copied();

        let points = match self
            .projector
            .project_detections(homography.as_ref(), &frame.detections)
        {
            Ok(points) => Some(points),
            Err(Error::Uncalibrated) if self.track_in_pixels => {
                Some(detection::centroids(&frame.detections))
            }
            Err(err) => {
                debug!(target: "pipeline", "frame {}: {err}", frame.index);
                None
            }
        };

        let estimates = match points {
            Some(points) => state.tracker.update(&points, scene_changed),
            None => {
                if scene_changed {
                    state.tracker.clear();
                }
                Vec::new()
            }
        };

        let report = FrameReport {
            index: frame.index,
            scene_changed,
            refit,
            homography,
            estimates,
            tracks: state.tracker.tracks(),
            active_tracks: state.tracker.len(),
        };

        (state, report)
    }

    /// Drives frames until the source ends or fails. Returns the final
    /// state and the number of processed frames, or the read error.
    pub fn run<I, F>(
        &self,
        mut state: PipelineState,
        frames: I,
        mut on_frame: F,
    ) -> (PipelineState, Result<u64, Error>)
    where
        I: IntoIterator<Item = Result<Frame, Error>>,
        F: FnMut(&FrameReport),
    {
        let mut processed = 0;

        for frame in frames {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    error!(target: "pipeline", "stopping after {processed} frames: {err}");
                    return (state, Err(err));
                }
            };

            let (next, report) = self.step(state, &frame);
            state = next;
            processed += 1;

            on_frame(&report);
        }

        (state, Ok(processed))
    }
}
