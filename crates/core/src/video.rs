//! Video decode/encode/transcode seam.
//!
//! The annotation pipeline only sees these traits; [`crate::ffmpeg`] provides
//! the production implementation.

use std::path::Path;

use image::RgbImage;

use crate::error::ProcessingError;

/// Frame rate substituted when the source reports something unusable.
pub const DEFAULT_FRAME_RATE: f64 = 25.0;

/// Highest source frame rate taken at face value.
pub const MAX_FRAME_RATE: f64 = 120.0;

/// Stream properties reported by the source container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
}

/// Output frame rate for a reported source rate.
///
/// Non-positive, non-finite or implausibly high (> 120) rates fall back to
/// [`DEFAULT_FRAME_RATE`].
pub fn effective_frame_rate(reported: f64) -> f64 {
    if !reported.is_finite() || reported <= 0.0 || reported > MAX_FRAME_RATE {
        DEFAULT_FRAME_RATE
    } else {
        reported
    }
}

/// Sequential RGB frame source. Dropping it releases the underlying handle.
pub trait FrameReader {
    fn metadata(&self) -> VideoMetadata;

    /// Next frame, or `None` at end of stream. Read failures also end the
    /// stream.
    fn read_frame(&mut self) -> Option<RgbImage>;
}

/// Sequential RGB frame sink writing the intermediate container.
pub trait FrameWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), ProcessingError>;

    /// Flush and close the output. Dropping a writer without finishing it
    /// releases the handle but leaves the output incomplete.
    fn finish(self: Box<Self>) -> Result<(), ProcessingError>;
}

/// Everything the video annotator needs from the media toolchain.
pub trait VideoBackend: Send + Sync {
    /// Open `path` as a frame stream. Fails with
    /// [`ProcessingError::OpenFailed`] when it cannot be read as video.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, ProcessingError>;

    /// Create an intermediate writer with a portable codec.
    fn create_writer(
        &self,
        path: &Path,
        frame_rate: f64,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn FrameWriter>, ProcessingError>;

    /// Re-encode `input` into a browser-playable container at `output`.
    /// Fails with [`ProcessingError::TranscodeFailed`] on a non-zero exit.
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ProcessingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_rates_are_kept() {
        assert_eq!(effective_frame_rate(30.0), 30.0);
        assert_eq!(effective_frame_rate(23.976), 23.976);
        assert_eq!(effective_frame_rate(120.0), 120.0);
    }

    #[test]
    fn unusable_rates_fall_back() {
        assert_eq!(effective_frame_rate(0.0), DEFAULT_FRAME_RATE);
        assert_eq!(effective_frame_rate(-5.0), DEFAULT_FRAME_RATE);
        assert_eq!(effective_frame_rate(120.5), DEFAULT_FRAME_RATE);
        assert_eq!(effective_frame_rate(1000.0), DEFAULT_FRAME_RATE);
        assert_eq!(effective_frame_rate(f64::NAN), DEFAULT_FRAME_RATE);
    }
}
