use image::{GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::map::map_colors2;

/// Combine two equally sized planes pixel by pixel
fn zip_map<F>(a: &GrayImage, b: &GrayImage, f: F) -> GrayImage
where
    F: Fn(u8, u8) -> u8,
{
    map_colors2(a, b, |x: Luma<u8>, y: Luma<u8>| Luma([f(x[0], y[0])]))
}

/// Per-pixel |a - b|
pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_map(a, b, |x, y| x.abs_diff(y))
}

pub fn bitwise_and(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_map(a, b, |x, y| x & y)
}

pub fn bitwise_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_map(a, b, |x, y| x | y)
}

/// Binary threshold: 255 where the pixel is strictly above `thresh`, 0 elsewhere
///
/// Fractional thresholds are floored, so `thresh = 12.5` behaves like 12.
pub fn threshold_binary(src: &GrayImage, thresh: f64) -> GrayImage {
    let thresh = thresh.floor();
    if thresh < 0.0 {
        return GrayImage::from_pixel(src.width(), src.height(), Luma([255]));
    }
    if thresh >= 255.0 {
        return GrayImage::new(src.width(), src.height());
    }
    threshold(src, thresh as u8, ThresholdType::Binary)
}

/// Threshold maximising the between-class variance of the histogram (Otsu)
///
/// Always in [0, 255]; 0 for empty or single-valued images.
pub fn otsu_threshold(src: &GrayImage) -> f64 {
    if src.is_empty() {
        return 0.0;
    }
    f64::from(otsu_level(src))
}

/// Number of non-zero pixels
pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.iter().filter(|&&v| v != 0).count()
}
