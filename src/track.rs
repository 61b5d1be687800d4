use nalgebra as na;
use serde_derive::Serialize;

use crate::scene::TrackId;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: TrackId,

    // field units, or pixels when tracking uncalibrated
    pub position: na::Point2<f64>,

    // no measurement this frame, estimate is drift only
    pub predicted: bool,
    pub missed: u32,
}
