mod memory;
mod sequence;

pub use memory::MemorySource;
pub use sequence::{decode_frame, FrameDecoder, ImageSequenceSource};

use crate::error::CaptureError;
use crate::segmentation::BackgroundChannels;
use image::RgbImage;
use std::time::Duration;

/// Trait for per-camera video sources
///
/// Fetches block the calling thread; a fetch that cannot finish within
/// `timeout` reports [`CaptureError::Timeout`] and leaves the current frame
/// as it was.
pub trait VideoSource: Send {
    /// Frame currently held; empty before the first successful fetch
    fn current_frame(&self) -> &RgbImage;

    /// Decode the frame following the current one (frame 0 if none yet)
    fn advance_frame(&mut self, timeout: Duration) -> Result<(), CaptureError>;

    /// Jump to an arbitrary frame
    fn seek_frame(&mut self, index: usize, timeout: Duration) -> Result<(), CaptureError>;

    /// Background reference captured for this camera, if any
    fn background_channels(&self) -> Option<BackgroundChannels> {
        None
    }

    /// Number of frames the source can deliver
    fn frames_amount(&self) -> usize;

    /// Get the resolution of delivered frames
    fn resolution(&self) -> (u32, u32);
}

/// Index the next sequential fetch lands on
pub(crate) fn next_index(position: Option<usize>) -> usize {
    position.map_or(0, |p| p + 1)
}

pub(crate) fn check_index(index: usize, available: usize) -> Result<(), CaptureError> {
    if index >= available {
        return Err(CaptureError::OutOfRange { index, available });
    }
    Ok(())
}
