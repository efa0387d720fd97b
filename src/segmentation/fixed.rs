use super::color::split_channels;
use super::morphology::{dilate, erode, Kernel};
use super::threshold::{abs_diff, bitwise_and, bitwise_or, threshold_binary};
use super::types::{
    BackgroundChannels, ForegroundSegmenter, HsvChannel, HsvImage, Mask, SegmentationParameters,
};
use crate::error::SegmentError;

/// Background subtraction with one manual threshold per HSV channel
///
/// Hue counts only where saturation confirms it; large value (brightness)
/// changes always count. The mask is then cleaned with erode, dilate, erode
/// using square kernels sized from the parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedThreshold;

impl FixedThreshold {
    pub fn new() -> Self {
        Self
    }

    /// Channel-combined mask before any morphology
    pub fn raw_mask(
        &self,
        hsv: &HsvImage,
        background: &BackgroundChannels,
        params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError> {
        background.check_frame(hsv)?;
        let [hue, sat, val] = split_channels(hsv);

        // Background subtraction H
        let diff = abs_diff(&hue, background.channel(HsvChannel::Hue));
        let mut foreground = threshold_binary(&diff, params.hue_threshold as f64);

        // Background subtraction S
        let diff = abs_diff(&sat, background.channel(HsvChannel::Saturation));
        let confirmed = threshold_binary(&diff, params.sat_threshold as f64);
        foreground = bitwise_and(&foreground, &confirmed);

        // Background subtraction V
        let diff = abs_diff(&val, background.channel(HsvChannel::Value));
        let bright = threshold_binary(&diff, params.val_threshold as f64);
        foreground = bitwise_or(&foreground, &bright);

        Ok(foreground)
    }

    /// Erode, dilate, erode with square kernels
    pub fn refine(&self, mask: &Mask, params: &SegmentationParameters) -> Mask {
        let erosion = Kernel::rect_radius(params.erosion_radius());
        let dilation = Kernel::rect_radius(params.dilation_radius());

        let mask = erode(mask, &erosion);
        let mask = dilate(&mask, &dilation);
        erode(&mask, &erosion)
    }
}

impl ForegroundSegmenter for FixedThreshold {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn segment(
        &self,
        hsv: &HsvImage,
        background: &BackgroundChannels,
        params: &SegmentationParameters,
    ) -> Result<Mask, SegmentError> {
        let _span = tracing::debug_span!("fixed_segment").entered();
        let raw = self.raw_mask(hsv, background, params)?;
        Ok(self.refine(&raw, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::threshold::count_foreground;
    use image::Rgb;

    fn background_of(pixel: [u8; 3], w: u32, h: u32) -> BackgroundChannels {
        let [a, b, c] = split_channels(&HsvImage::from_pixel(w, h, Rgb(pixel)));
        BackgroundChannels::new(a, b, c).unwrap()
    }

    #[test]
    fn test_hue_needs_saturation() {
        let bg = background_of([10, 5, 100], 1, 1);
        let params = SegmentationParameters::new(10, 20, 50, 0, 0);

        // big hue change, tiny saturation change: rejected
        let frame = HsvImage::from_pixel(1, 1, Rgb([90, 10, 100]));
        let mask = FixedThreshold.raw_mask(&frame, &bg, &params).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);

        // big hue and saturation change: accepted
        let frame = HsvImage::from_pixel(1, 1, Rgb([90, 100, 100]));
        let mask = FixedThreshold.raw_mask(&frame, &bg, &params).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_value_always_counts() {
        let bg = background_of([10, 5, 100], 1, 1);
        let params = SegmentationParameters::new(10, 20, 50, 0, 0);
        let frame = HsvImage::from_pixel(1, 1, Rgb([10, 5, 200]));
        let mask = FixedThreshold.raw_mask(&frame, &bg, &params).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_saturation_alone_is_not_enough() {
        let bg = background_of([10, 5, 100], 1, 1);
        let params = SegmentationParameters::new(10, 20, 50, 0, 0);
        let frame = HsvImage::from_pixel(1, 1, Rgb([10, 200, 100]));
        let mask = FixedThreshold.raw_mask(&frame, &bg, &params).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_zero_radii_keep_raw_mask() {
        let bg = background_of([0, 0, 0], 5, 5);
        let mut frame = HsvImage::from_pixel(5, 5, Rgb([0, 0, 0]));
        frame.put_pixel(2, 2, Rgb([0, 0, 255]));
        let params = SegmentationParameters::new(10, 20, 50, 0, 0);
        let mask = FixedThreshold.segment(&frame, &bg, &params).unwrap();
        assert_eq!(count_foreground(&mask), 1);
    }

    #[test]
    fn test_background_size_checked_first() {
        let bg = background_of([0, 0, 0], 5, 5);
        let frame = HsvImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let err = FixedThreshold
            .segment(&frame, &bg, &SegmentationParameters::default())
            .unwrap_err();
        assert!(matches!(err, SegmentError::UninitializedBackground(_)));
    }
}
