use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no homography has been fit yet")]
    Uncalibrated,

    #[error("homography fit is degenerate")]
    DegenerateHomography,

    #[error("assignment could not be solved: {0}")]
    Assignment(String),

    #[error("frame source failed: {0}")]
    Source(String),
}
