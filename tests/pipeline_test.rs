//! Behaviour of the fixed and adaptive segmenters

use image::{Rgb, RgbImage};
use proptest::prelude::*;
use voxcut::segmentation::color::{split_channels, to_hsv};
use voxcut::segmentation::threshold::count_foreground;
use voxcut::segmentation::{AdaptiveSegmenter, FixedThreshold, HsvImage};
use voxcut::{BackgroundChannels, ForegroundSegmenter, Pipeline, SegmentationParameters};

fn background_from_hsv(hsv: &HsvImage) -> BackgroundChannels {
    let [h, s, v] = split_channels(hsv);
    BackgroundChannels::new(h, s, v).unwrap()
}

fn rgb_from(values: &[u8], width: u32) -> RgbImage {
    RgbImage::from_vec(width, values.len() as u32 / (3 * width), values.to_vec()).unwrap()
}

fn scene() -> (RgbImage, RgbImage) {
    let background = RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 4) as u8, (y * 6) as u8, 90]));
    let mut frame = background.clone();
    for y in 6..18 {
        for x in 10..22 {
            frame.put_pixel(x, y, Rgb([220, 30, 40]));
        }
    }
    (background, frame)
}

#[test]
fn test_segmenters_are_deterministic() {
    let (background, frame) = scene();
    let bg = BackgroundChannels::from_frame(&background).unwrap();
    let params = SegmentationParameters::default();

    for pipeline in [Pipeline::fixed(), Pipeline::adaptive()] {
        let a = pipeline.segment_frame(&frame, &bg, &params).unwrap();
        let b = pipeline.segment_frame(&frame, &bg, &params).unwrap();
        assert_eq!(a, b, "{} pipeline", pipeline.name());
        assert_eq!(a.dimensions(), frame.dimensions());
        assert!(a.iter().all(|&v| v == 0 || v == 255));
        assert!(count_foreground(&a) > 0, "{} pipeline found nothing", pipeline.name());
    }
}

#[test]
fn test_object_found_by_both_pipelines() {
    let (background, frame) = scene();
    let bg = BackgroundChannels::from_frame(&background).unwrap();
    let params = SegmentationParameters::default();

    for pipeline in [Pipeline::fixed(), Pipeline::adaptive()] {
        let mask = pipeline.segment_frame(&frame, &bg, &params).unwrap();
        assert_eq!(mask.get_pixel(16, 12)[0], 255, "{} centre", pipeline.name());
        assert_eq!(mask.get_pixel(2, 2)[0], 0, "{} corner", pipeline.name());
    }
}

#[test]
fn test_identical_frame_gives_empty_masks() {
    let (background, _) = scene();
    let bg = BackgroundChannels::from_frame(&background).unwrap();
    let params = SegmentationParameters::default();

    let fixed = Pipeline::fixed().segment_frame(&background, &bg, &params).unwrap();
    assert_eq!(count_foreground(&fixed), 0);

    let adaptive = AdaptiveSegmenter::new();
    let hsv = to_hsv(&background);
    let score = adaptive.score(&hsv, &bg).unwrap();
    assert_eq!(count_foreground(&score), 0);
    let mask = adaptive.segment(&hsv, &bg, &params).unwrap();
    assert_eq!(count_foreground(&mask), 0);
}

#[test]
fn test_large_uniform_shift_is_full_foreground() {
    let bg = background_from_hsv(&HsvImage::from_pixel(10, 8, Rgb([10, 20, 30])));
    let frame = HsvImage::from_pixel(10, 8, Rgb([100, 200, 250]));
    let params = SegmentationParameters::default();

    let raw = FixedThreshold.raw_mask(&frame, &bg, &params).unwrap();
    assert!(raw.iter().all(|&v| v == 255));
}

#[test]
fn test_single_speckle_removed() {
    let background = RgbImage::new(15, 15);
    let mut frame = background.clone();
    frame.put_pixel(7, 7, Rgb([255, 255, 255]));
    let bg = BackgroundChannels::from_frame(&background).unwrap();
    let params = SegmentationParameters::default();

    let raw = FixedThreshold.raw_mask(&to_hsv(&frame), &bg, &params).unwrap();
    assert_eq!(count_foreground(&raw), 1);

    let mask = Pipeline::fixed().segment_frame(&frame, &bg, &params).unwrap();
    assert_eq!(mask.get_pixel(7, 7)[0], 0);
    assert_eq!(count_foreground(&mask), 0);
}

#[test]
fn test_mismatched_background_rejected() {
    let (background, frame) = scene();
    let small = image::imageops::crop_imm(&background, 0, 0, 8, 8).to_image();
    let bg = BackgroundChannels::from_frame(&small).unwrap();
    for pipeline in [Pipeline::fixed(), Pipeline::adaptive()] {
        assert!(pipeline
            .segment_frame(&frame, &bg, &SegmentationParameters::default())
            .is_err());
    }
}

proptest! {
    #[test]
    fn test_val_threshold_monotonic(
        frame in prop::collection::vec(any::<u8>(), 3 * 8 * 6),
        background in prop::collection::vec(any::<u8>(), 3 * 8 * 6),
        low in any::<u8>(),
        raise in any::<u8>(),
        hue in any::<u8>(),
        sat in any::<u8>(),
    ) {
        let high = low.saturating_add(raise);
        let frame = to_hsv(&rgb_from(&frame, 8));
        let bg = BackgroundChannels::from_frame(&rgb_from(&background, 8)).unwrap();

        let loose = SegmentationParameters::new(hue, sat, low, 1, 2);
        let strict = SegmentationParameters::new(hue, sat, high, 1, 2);
        let a = FixedThreshold.segment(&frame, &bg, &loose).unwrap();
        let b = FixedThreshold.segment(&frame, &bg, &strict).unwrap();

        prop_assert!(count_foreground(&b) <= count_foreground(&a));
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!(*y == 0 || *x == 255);
        }
    }

    #[test]
    fn test_automatic_threshold_in_range(values in prop::collection::vec(any::<u8>(), 1..400)) {
        let len = values.len() as u32;
        let score = image::GrayImage::from_vec(len, 1, values).unwrap();
        let t = AdaptiveSegmenter::new().automatic_threshold(&score);
        prop_assert!((0.0..=255.0).contains(&t));
    }

    #[test]
    fn test_adaptive_deterministic(
        frame in prop::collection::vec(any::<u8>(), 3 * 6 * 6),
        background in prop::collection::vec(any::<u8>(), 3 * 6 * 6),
    ) {
        let frame = rgb_from(&frame, 6);
        let bg = BackgroundChannels::from_frame(&rgb_from(&background, 6)).unwrap();
        let params = SegmentationParameters::default();
        let a = Pipeline::adaptive().segment_frame(&frame, &bg, &params).unwrap();
        let b = Pipeline::adaptive().segment_frame(&frame, &bg, &params).unwrap();
        prop_assert_eq!(a, b);
    }
}
