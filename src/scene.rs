use log::{debug, info, warn};
use munkres::{solve_assignment, WeightMatrix};
use nalgebra as na;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::TrackerConfig;
use crate::error::Error;
use crate::tracker::ParticleFilter;
use crate::Track;

pub type TrackId = u32;

const UNASSIGNED_COST: f64 = 100000.0;

/// One tracked player: a stable handle plus its particle filter.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: TrackId,
    pub filter: ParticleFilter,
}

impl Participant {
    #[inline]
    pub fn estimate(&self) -> na::Point2<f64> {
        self.filter.estimate()
    }
}

impl From<&Participant> for Track {
    fn from(p: &Participant) -> Track {
        Track {
            track_id: p.id,
            position: p.estimate(),
            predicted: p.filter.predicted,
            missed: p.filter.missed,
        }
    }
}

/// Owns the active tracks and associates each frame's detections with them.
#[derive(Debug)]
pub struct TrackManager {
    pub tracks: Vec<Participant>,
    config: TrackerConfig,
    rng: StdRng,
    next_id: TrackId,
}

impl TrackManager {
    pub fn new(config: TrackerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            tracks: Vec::with_capacity(64),
            config,
            rng,
            next_id: 1,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: TrackId) -> Option<&Participant> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn spawn(&mut self, pos: na::Point2<f64>) -> Participant {
        let id = self.next_id;
        self.next_id += 1;

        debug!(target: "scene", "spawned track {id} at ({:.1}, {:.1})", pos.x, pos.y);

        Participant {
            id,
            filter: ParticleFilter::new(pos, &self.config.filter, &mut self.rng),
        }
    }

    /// Minimum-cost matching of track rows to detection columns as
    /// `(track, detection, distance)`.
    fn assignment(&self, points: &[na::Point2<f64>]) -> Result<Vec<(usize, usize, f64)>, Error> {
        let rows = self.tracks.len();
        let cols = points.len();

        if rows == 0 || cols == 0 {
            return Err(Error::Assignment(format!("empty cost matrix {rows}x{cols}")));
        }

        let estimates: Vec<_> = self.tracks.iter().map(Participant::estimate).collect();
        let cost: Vec<Vec<f64>> = estimates
            .iter()
            .map(|e| points.iter().map(|p| na::distance(e, p)).collect())
            .collect();

        if cost.iter().flatten().any(|c| !c.is_finite()) {
            return Err(Error::Assignment("non-finite cost".to_string()));
        }

        let n = rows.max(cols);
        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < rows && c < cols {
                cost[r][c]
            } else {
                UNASSIGNED_COST
            }
        });

        let solution =
            solve_assignment(&mut mat).map_err(|err| Error::Assignment(format!("{err:?}")))?;

        Ok(solution
            .into_iter()
            .filter(|pos| pos.row < rows && pos.column < cols)
            .map(|pos| (pos.row, pos.column, cost[pos.row][pos.column]))
            .collect())
    }

    /// Runs one frame of association over field-space detection points and
    /// returns the estimate of every active track.
    pub fn update(
        &mut self,
        points: &[na::Point2<f64>],
        scene_changed: bool,
    ) -> Vec<na::Point2<f64>> {
        if scene_changed {
            info!(target: "scene", "scene changed, dropping {} tracks", self.tracks.len());
            self.tracks.clear();
        }

        let finite: Vec<_> = points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .copied()
            .collect();

        if finite.len() < points.len() {
            warn!(target: "scene", "dropped {} non-finite detections", points.len() - finite.len());
        }

        let points = finite.as_slice();

        if self.tracks.is_empty() {
            for p in points {
                let track = self.spawn(*p);
                self.tracks.push(track);
            }

            return points.to_vec();
        }

        for t in &mut self.tracks {
            t.filter.predict();
        }

        let assignments = if points.is_empty() {
            Vec::new()
        } else {
            match self.assignment(points) {
                Ok(a) => a,
                Err(err) => {
                    warn!(target: "scene", "{err}");
                    return self.estimates();
                }
            }
        };

        let gating = self.config.gating_distance;
        let max_missed = self.config.max_missed_frames;

        let mut previous: Vec<Option<Participant>> =
            std::mem::take(&mut self.tracks).into_iter().map(Some).collect();
        let mut matched_dets = vec![false; points.len()];
        let mut active = Vec::with_capacity(previous.len() + points.len());

        for (row, col, dist) in assignments {
            matched_dets[col] = true;

            if dist > gating {
                active.push(self.spawn(points[col]));
                continue;
            }

            if let Some(mut track) = previous[row].take() {
                track.filter.update(points[col]);
                track.filter.resample(&mut self.rng);
                active.push(track);
            }
        }

        for (col, _) in matched_dets.iter().enumerate().filter(|(_, m)| !**m) {
            active.push(self.spawn(points[col]));
        }

        for mut track in previous.into_iter().flatten() {
            if track.filter.mark_missed(max_missed) {
                debug!(target: "scene", "retired track {} after {} missed frames", track.id, track.filter.missed);
            } else {
                active.push(track);
            }
        }

        self.tracks = active;
        self.estimates()
    }

    pub fn estimates(&self) -> Vec<na::Point2<f64>> {
        self.tracks.iter().map(Participant::estimate).collect()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.tracks.iter().map(Into::into).collect()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for TrackManager {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl crate::Tracking for TrackManager {
    #[inline]
    fn update(&mut self, points: &[na::Point2<f64>], scene_changed: bool) -> Vec<na::Point2<f64>> {
        TrackManager::update(self, points, scene_changed)
    }

    #[inline]
    fn tracks(&self) -> Vec<Track> {
        TrackManager::tracks(self)
    }

    #[inline]
    fn clear(&mut self) {
        TrackManager::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    fn manager() -> TrackManager {
        let mut config = TrackerConfig::default().with_seed(17);
        config.filter = FilterConfig::new(200);
        TrackManager::new(config)
    }

    fn pt(x: f64, y: f64) -> na::Point2<f64> {
        na::Point2::new(x, y)
    }

    fn ids(m: &TrackManager) -> Vec<TrackId> {
        let mut ids: Vec<_> = m.tracks.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_first_frame_spawns_and_echoes_points() {
        let mut m = manager();
        let points = vec![pt(10.0, 10.0), pt(200.0, 100.0)];

        assert_eq!(m.update(&points, false), points);
        assert_eq!(ids(&m), vec![1, 2]);
        assert!(m.tracks().iter().all(|t| !t.predicted && t.missed == 0));
    }

    #[test]
    fn test_empty_first_frame() {
        let mut m = manager();
        assert!(m.update(&[], false).is_empty());
        assert!(m.is_empty());
    }

    #[test]
    fn test_matched_detection_updates_same_track() {
        let mut m = manager();
        m.update(&[pt(10.0, 10.0), pt(300.0, 200.0)], false);
        let est = m.update(&[pt(301.0, 200.0), pt(11.0, 10.0)], false);

        assert_eq!(est.len(), 2);
        assert_eq!(ids(&m), vec![1, 2]);

        let first = m.get(1).unwrap();
        assert!(na::distance(&first.estimate(), &pt(11.0, 10.0)) < 3.0);
        assert!(!first.filter.predicted);
        assert_eq!(first.filter.missed, 0);

        let second = m.get(2).unwrap();
        assert!(na::distance(&second.estimate(), &pt(301.0, 200.0)) < 3.0);
    }

    #[test]
    fn test_gated_detection_spawns_new_track() {
        let mut m = manager();
        m.update(&[pt(0.0, 0.0)], false);
        m.update(&[pt(100.0, 0.0)], false);

        assert_eq!(ids(&m), vec![1, 2]);

        let old = m.get(1).unwrap();
        assert!(old.filter.predicted);
        assert_eq!(old.filter.missed, 1);

        let new = m.get(2).unwrap();
        assert!(!new.filter.predicted);
        assert!(na::distance(&new.estimate(), &pt(100.0, 0.0)) < 0.1);
    }

    #[test]
    fn test_surplus_detections_spawn() {
        let mut m = manager();
        m.update(&[pt(50.0, 50.0)], false);
        m.update(&[pt(50.0, 51.0), pt(400.0, 300.0)], false);

        assert_eq!(ids(&m), vec![1, 2]);
        assert_eq!(m.get(1).unwrap().filter.missed, 0);
    }

    #[test]
    fn test_retired_on_thirtieth_missed_frame() {
        let mut m = manager();
        m.update(&[pt(50.0, 50.0)], false);

        for _ in 0..29 {
            m.update(&[], false);
        }
        assert_eq!(m.len(), 1);
        let t = &m.tracks()[0];
        assert_eq!(t.missed, 29);
        assert!(t.predicted);

        m.update(&[], false);
        assert!(m.is_empty());
    }

    #[test]
    fn test_scene_change_discards_tracks() {
        let mut m = manager();
        m.update(&[pt(10.0, 10.0), pt(20.0, 20.0)], false);

        let est = m.update(&[pt(10.0, 10.0)], true);
        assert_eq!(est, vec![pt(10.0, 10.0)]);
        assert_eq!(ids(&m), vec![3]);
    }

    #[test]
    fn test_non_finite_detections_dropped() {
        let mut m = manager();
        let est = m.update(&[pt(10.0, 10.0), pt(f64::NAN, 0.0)], false);
        assert_eq!(est, vec![pt(10.0, 10.0)]);
        assert_eq!(ids(&m), vec![1]);

        for _ in 0..40 {
            m.update(&[pt(10.5, 10.0), pt(f64::INFINITY, 3.0)], false);
        }

        let t = &m.tracks()[0];
        assert_eq!(m.len(), 1);
        assert_eq!(t.missed, 0);
        assert!(!t.predicted);
        assert!(na::distance(&t.position, &pt(10.5, 10.0)) < 3.0);
    }

    #[test]
    fn test_assignment_rejects_non_finite_cost() {
        let mut m = manager();
        m.update(&[pt(10.0, 10.0)], false);
        m.tracks[0].filter.particles[0] = pt(f64::NAN, 0.0);

        assert!(matches!(m.assignment(&[pt(10.0, 10.0)]), Err(Error::Assignment(_))));
        assert!(matches!(m.assignment(&[]), Err(Error::Assignment(_))));
    }

    #[test]
    fn test_solver_failure_keeps_tracks() {
        let mut m = manager();
        m.update(&[pt(10.0, 10.0), pt(200.0, 100.0)], false);
        m.update(&[pt(200.0, 100.0)], false);
        m.tracks[1].filter.particles[0] = pt(f64::NAN, 0.0);

        let before: Vec<_> = m.tracks().iter().map(|t| (t.track_id, t.missed)).collect();
        let est = m.update(&[pt(10.0, 10.0), pt(200.0, 100.0)], false);
        let after: Vec<_> = m.tracks().iter().map(|t| (t.track_id, t.missed)).collect();

        assert_eq!(m.len(), 2);
        assert_eq!(after, before);
        assert_eq!(est.len(), 2);
        assert_eq!(est[0], m.estimates()[0]);
        assert!(est[1].x.is_nan());
    }

    #[test]
    fn test_configurable_thresholds() {
        let mut config = TrackerConfig::new(200.0, 2).with_seed(3);
        config.filter = FilterConfig::new(100);
        let mut m = TrackManager::new(config);

        m.update(&[pt(0.0, 0.0)], false);
        m.update(&[pt(100.0, 0.0)], false);
        assert_eq!(ids(&m), vec![1]);

        m.update(&[], false);
        assert_eq!(m.len(), 1);
        m.update(&[], false);
        assert!(m.is_empty());
    }

    #[test]
    fn test_weights_stay_normalized() {
        let mut m = manager();
        m.update(&[pt(0.0, 0.0), pt(60.0, 0.0)], false);

        for i in 1..20 {
            let x = i as f64;
            m.update(&[pt(x, 0.0), pt(60.0 + x, 0.0)], false);

            for t in &m.tracks {
                let sum: f64 = t.filter.weights.iter().sum();
                assert!((sum - 1.0).abs() < 1e-9);
                assert!(t.filter.weights.iter().all(|&w| w >= 0.0));
                assert_eq!(t.filter.len(), 200);
            }
        }
    }
}
