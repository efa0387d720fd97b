use super::morphology::{dilate, erode, median_blur, Kernel};
use super::threshold::{bitwise_or, otsu_threshold, threshold_binary};
use super::types::{BackgroundChannels, ForegroundSegmenter, HsvImage, Mask, SegmentationParameters};
use crate::error::SegmentError;
use image::GrayImage;

/// Exponent applied to the hue/saturation scaling factor
pub const SCALER_EXPONENT: f64 = 0.3;

/// Perceptual difference of two HSV pixels, saturated to [0, 255]
///
/// The Euclidean distance of the raw channel differences is scaled by
/// `min(min(sA, sB) * |hA - hB| + |sA - sB|, 1) ^ exponent`, with hue and
/// saturation normalised to [0, 1]. Hue is not treated as circular.
pub fn pixel_score(a: [u8; 3], b: [u8; 3], exponent: f64) -> u8 {
    let d: [f64; 3] = [
        a[0] as f64 - b[0] as f64,
        a[1] as f64 - b[1] as f64,
        a[2] as f64 - b[2] as f64,
    ];

    let hue_a = a[0] as f64 / 180.0;
    let hue_b = b[0] as f64 / 180.0;
    let sat_a = a[1] as f64 / 255.0;
    let sat_b = b[1] as f64 / 255.0;

    let scaler = (sat_a.min(sat_b) * (hue_a - hue_b).abs() + (sat_a - sat_b).abs())
        .min(1.0)
        .powf(exponent);
    let distance = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();

    (distance * scaler).min(255.0) as u8
}

/// Segmenter driven by a single difference score and automatic thresholds
///
/// Ignores the manual thresholds and kernel radii of [`SegmentationParameters`];
/// its own kernel sizes are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSegmenter {
    kernel_size: u32,
    median_size: u32,
    exponent: f64,
}

impl Default for AdaptiveSegmenter {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            median_size: 5,
            exponent: SCALER_EXPONENT,
        }
    }
}

impl AdaptiveSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score image of `hsv` against the merged background
    pub fn score(&self, hsv: &HsvImage, background: &BackgroundChannels) -> Result<GrayImage, SegmentError> {
        background.check_frame(hsv)?;
        let reference = background.merged();

        let (width, height) = hsv.dimensions();
        let mut score = GrayImage::new(width, height);
        for ((a, b), out) in hsv.pixels().zip(reference.pixels()).zip(score.pixels_mut()) {
            out[0] = pixel_score(a.0, b.0, self.exponent);
        }
        Ok(score)
    }

    /// Otsu threshold of a score image, always in [0, 255]
    pub fn automatic_threshold(&self, score: &GrayImage) -> f64 {
        otsu_threshold(score)
    }

    /// Binary mask from a score image, before morphology
    ///
    /// Otsu mask, unioned with the half-threshold mask and the score itself,
    /// then thresholded by Otsu once more.
    pub fn threshold_score(&self, score: &GrayImage) -> Mask {
        let thresh = self.automatic_threshold(score);
        let coarse = threshold_binary(score, thresh);
        let weak = threshold_binary(score, thresh * 0.5);

        let combined = bitwise_or(&bitwise_or(&weak, &coarse), score);
        let second = otsu_threshold(&combined);
        tracing::debug!("Adaptive thresholds: first={}, second={}", thresh, second);

        threshold_binary(&combined, second)
    }

    /// Ellipse dilate, ellipse erode, median smoothing
    pub fn refine(&self, mask: &Mask) -> Mask {
        let kernel = Kernel::ellipse(self.kernel_size);
        let mask = dilate(mask, &kernel);
        let mask = erode(&mask, &kernel);
        median_blur(&mask, self.median_size)
    }
}

impl ForegroundSegmenter for AdaptiveSegmenter {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn segment(
        &self,
        hsv: &HsvImage,
        background: &BackgroundChannels,
        _params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError> {
        let _span = tracing::debug_span!("adaptive_segment").entered();
        let score = self.score(hsv, background)?;
        let mask = self.threshold_score(&score);
        Ok(self.refine(&mask))
    }
}
