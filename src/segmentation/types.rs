use crate::error::SegmentError;
use image::{GrayImage, RgbImage};
use parking_lot::RwLock;
use std::sync::Arc;

use super::color;

/// Binary foreground mask: 255 = foreground, 0 = background
/// Dimensions match the source frame dimensions
pub type Mask = GrayImage;

/// Frame in hue / saturation / value, stored as three 8-bit sub-pixels
///
/// Hue is in [0, 180), saturation and value in [0, 255].
pub type HsvImage = RgbImage;

/// Largest kernel radius accepted from the control surface
pub const MAX_KERNEL_RADIUS: u32 = 21;

/// Trait for foreground segmenters
/// Both pipelines share the same contract: (frame, background, parameters) -> mask
pub trait ForegroundSegmenter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Compute the foreground mask of an HSV frame against the background
    ///
    /// # Arguments
    /// * `hsv` - Frame already converted with [`color::to_hsv`]
    /// * `background` - Reference channels captured during calibration
    /// * `params` - Snapshot of the segmentation parameters for this tick
    ///
    /// # Returns
    /// * Mask with values 0 / 255, same dimensions as `hsv`
    ///
    /// Implementations hold no state between calls.
    fn segment(
        &self,
        hsv: &HsvImage,
        background: &BackgroundChannels,
        params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError>;
}

/// One plane of an HSV image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HsvChannel {
    Hue = 0,
    Saturation = 1,
    Value = 2,
}

/// Background reference: hue, saturation and value planes of the empty scene
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundChannels {
    channels: [GrayImage; 3],
}

impl BackgroundChannels {
    /// Build from three separate planes, all non-empty and of equal size
    pub fn new(hue: GrayImage, saturation: GrayImage, value: GrayImage) -> Result<Self, SegmentError> {
        let dims = hue.dimensions();
        if dims.0 == 0 || dims.1 == 0 {
            return Err(SegmentError::UninitializedBackground(
                "background channels are empty".to_string(),
            ));
        }
        if saturation.dimensions() != dims || value.dimensions() != dims {
            return Err(SegmentError::UninitializedBackground(format!(
                "channel sizes differ: {:?} / {:?} / {:?}",
                dims,
                saturation.dimensions(),
                value.dimensions()
            )));
        }
        Ok(Self {
            channels: [hue, saturation, value],
        })
    }

    /// Build from an RGB capture of the empty scene
    pub fn from_frame(frame: &RgbImage) -> Result<Self, SegmentError> {
        let [h, s, v] = color::split_channels(&color::to_hsv(frame));
        Self::new(h, s, v)
    }

    pub fn channel(&self, channel: HsvChannel) -> &GrayImage {
        &self.channels[channel as usize]
    }

    pub fn channels(&self) -> &[GrayImage; 3] {
        &self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.channels[0].dimensions()
    }

    /// Recombine the planes into one HSV image
    pub fn merged(&self) -> HsvImage {
        color::merge_channels(&self.channels)
    }

    /// Must pass before any pixel of `hsv` is touched
    pub(crate) fn check_frame(&self, hsv: &HsvImage) -> Result<(), SegmentError> {
        let (w, h) = hsv.dimensions();
        if w == 0 || h == 0 {
            return Err(SegmentError::EmptyFrame);
        }
        if self.dimensions() != (w, h) {
            return Err(SegmentError::UninitializedBackground(format!(
                "background is {:?}, frame is {:?}",
                self.dimensions(),
                (w, h)
            )));
        }
        Ok(())
    }
}

/// Tunable numbers read by the segmenters
///
/// The thresholds drive the fixed pipeline only, the kernel radii size the
/// rectangular kernels of its morphology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationParameters {
    pub hue_threshold: u8,
    pub sat_threshold: u8,
    pub val_threshold: u8,
    erosion_radius: u32,
    dilation_radius: u32,
}

impl Default for SegmentationParameters {
    fn default() -> Self {
        Self {
            hue_threshold: 10,
            sat_threshold: 20,
            val_threshold: 50,
            erosion_radius: 1,
            dilation_radius: 3,
        }
    }
}

impl SegmentationParameters {
    pub fn new(hue: u8, sat: u8, val: u8, erosion_radius: u32, dilation_radius: u32) -> Self {
        let mut params = Self {
            hue_threshold: hue,
            sat_threshold: sat,
            val_threshold: val,
            ..Self::default()
        };
        params.set_erosion_radius(erosion_radius);
        params.set_dilation_radius(dilation_radius);
        params
    }

    pub fn erosion_radius(&self) -> u32 {
        self.erosion_radius
    }

    pub fn dilation_radius(&self) -> u32 {
        self.dilation_radius
    }

    /// Clamped to [`MAX_KERNEL_RADIUS`]
    pub fn set_erosion_radius(&mut self, radius: u32) {
        self.erosion_radius = radius.min(MAX_KERNEL_RADIUS);
    }

    /// Clamped to [`MAX_KERNEL_RADIUS`]
    pub fn set_dilation_radius(&mut self, radius: u32) {
        self.dilation_radius = radius.min(MAX_KERNEL_RADIUS);
    }
}

/// Parameters shared between the control surface (single writer) and the
/// frame controller, which takes one snapshot per tick
#[derive(Debug, Clone, Default)]
pub struct SharedParameters {
    inner: Arc<RwLock<SegmentationParameters>>,
}

impl SharedParameters {
    pub fn new(params: SegmentationParameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Consistent copy of the current values
    pub fn snapshot(&self) -> SegmentationParameters {
        *self.inner.read()
    }

    /// Apply a change; takes effect from the next snapshot
    pub fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut SegmentationParameters),
    {
        let mut params = self.inner.write();
        change(&mut params);
        tracing::debug!("Segmentation parameters updated: {:?}", *params);
    }
}
