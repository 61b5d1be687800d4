use ndarray::Array2;

use crate::detection::Detection;
use crate::extractor::Segment;
use crate::line::LineEquation;
use crate::phash::ImageHash;

/// Everything the external collaborators produced for one video frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub index: u64,

    /// Grayscale pixels, hashed when `hash` is absent.
    pub pixels: Option<Array2<u8>>,
    pub hash: Option<ImageHash>,

    pub detections: Vec<Detection>,
    pub segments: Vec<Segment>,

    /// Footage lines that arrive already labeled.
    pub labeled_lines: Vec<LineEquation>,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}
