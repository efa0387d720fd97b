use super::{check_index, next_index, VideoSource};
use crate::error::CaptureError;
use crate::segmentation::BackgroundChannels;
use image::RgbImage;
use std::time::Duration;

/// Frames held in memory, mostly for tests and offline tooling
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<RgbImage>,
    background: Option<BackgroundChannels>,
    position: Option<usize>,
    current: RgbImage,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames,
            background: None,
            position: None,
            current: RgbImage::new(0, 0),
        }
    }

    /// Attach the empty-scene capture used as background
    pub fn with_background(mut self, background: &RgbImage) -> Self {
        match BackgroundChannels::from_frame(background) {
            Ok(channels) => self.background = Some(channels),
            Err(err) => tracing::warn!("Background frame rejected: {}", err),
        }
        self
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    fn load(&mut self, index: usize) -> Result<(), CaptureError> {
        check_index(index, self.frames.len())?;
        self.current = self.frames[index].clone();
        self.position = Some(index);
        Ok(())
    }
}

impl VideoSource for MemorySource {
    fn current_frame(&self) -> &RgbImage {
        &self.current
    }

    fn advance_frame(&mut self, _timeout: Duration) -> Result<(), CaptureError> {
        self.load(next_index(self.position))
    }

    fn seek_frame(&mut self, index: usize, _timeout: Duration) -> Result<(), CaptureError> {
        self.load(index)
    }

    fn background_channels(&self) -> Option<BackgroundChannels> {
        self.background.clone()
    }

    fn frames_amount(&self) -> usize {
        self.frames.len()
    }

    fn resolution(&self) -> (u32, u32) {
        self.frames.first().map_or((0, 0), |f| f.dimensions())
    }
}
