mod adaptive;
pub mod color;
mod fixed;
pub mod morphology;
pub mod threshold;
pub mod types;

pub use adaptive::{pixel_score, AdaptiveSegmenter, SCALER_EXPONENT};
pub use fixed::FixedThreshold;
pub use types::{
    BackgroundChannels, ForegroundSegmenter, HsvChannel, HsvImage, Mask, SegmentationParameters, SharedParameters,
    MAX_KERNEL_RADIUS,
};

use crate::error::SegmentError;
use image::RgbImage;

/// The segmentation strategy in use, chosen by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pipeline {
    Fixed(FixedThreshold),
    Adaptive(AdaptiveSegmenter),
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::Fixed(FixedThreshold)
    }
}

impl Pipeline {
    pub fn fixed() -> Self {
        Pipeline::Fixed(FixedThreshold::new())
    }

    pub fn adaptive() -> Self {
        Pipeline::Adaptive(AdaptiveSegmenter::new())
    }

    /// Convert a raw RGB frame and segment it
    pub fn segment_frame(
        &self,
        frame: &RgbImage,
        background: &BackgroundChannels,
        params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(SegmentError::EmptyFrame);
        }
        if background.dimensions() != (width, height) {
            return Err(SegmentError::UninitializedBackground(format!(
                "background is {:?}, frame is {:?}",
                background.dimensions(),
                (width, height)
            )));
        }
        let hsv = color::to_hsv(frame);
        self.segment(&hsv, background, params)
    }
}

impl ForegroundSegmenter for Pipeline {
    fn name(&self) -> &'static str {
        match self {
            Pipeline::Fixed(s) => s.name(),
            Pipeline::Adaptive(s) => s.name(),
        }
    }

    fn segment(
        &self,
        hsv: &HsvImage,
        background: &BackgroundChannels,
        params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError> {
        match self {
            Pipeline::Fixed(s) => s.segment(hsv, background, params),
            Pipeline::Adaptive(s) => s.segment(hsv, background, params),
        }
    }
}
