use image::{GrayImage, Luma, Rgb, RgbImage};
use std::sync::OnceLock;

use super::types::HsvImage;

const HSV_SHIFT: i32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);
const HUE_RANGE: i32 = 180;

/// Fixed-point reciprocals for saturation and hue
struct DivTables {
    sat: [i32; 256],
    hue: [i32; 256],
}

fn div_tables() -> &'static DivTables {
    static TABLES: OnceLock<DivTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut sat = [0i32; 256];
        let mut hue = [0i32; 256];
        for i in 1..256 {
            sat[i] = ((255 << HSV_SHIFT) as f64 / i as f64).round() as i32;
            hue[i] = ((HUE_RANGE << HSV_SHIFT) as f64 / (6.0 * i as f64)).round() as i32;
        }
        DivTables { sat, hue }
    })
}

/// Convert one RGB pixel to 8-bit HSV (hue halved to fit [0, 180))
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let tables = div_tables();
    let (r, g, b) = (r as i32, g as i32, b as i32);

    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = (diff * tables.sat[v as usize] + HSV_ROUND) >> HSV_SHIFT;

    let h = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (h * tables.hue[diff as usize] + HSV_ROUND) >> HSV_SHIFT;
    if h < 0 {
        h += HUE_RANGE;
    }

    [h as u8, s as u8, v as u8]
}

/// Convert an RGB frame into the HSV representation used by both pipelines
pub fn to_hsv(frame: &RgbImage) -> HsvImage {
    let _span = tracing::debug_span!("to_hsv").entered();

    let (width, height) = frame.dimensions();
    let mut hsv = HsvImage::new(width, height);
    for (src, dst) in frame.pixels().zip(hsv.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv(src[0], src[1], src[2]));
    }
    hsv
}

/// Split a 3-channel image into its planes
pub fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (width, height) = image.dimensions();
    let mut planes = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];
    for (x, y, pixel) in image.enumerate_pixels() {
        for (c, plane) in planes.iter_mut().enumerate() {
            plane.put_pixel(x, y, Luma([pixel[c]]));
        }
    }
    planes
}

/// Inverse of [`split_channels`]; planes must share dimensions
pub fn merge_channels(planes: &[GrayImage; 3]) -> RgbImage {
    let (width, height) = planes[0].dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            planes[0].get_pixel(x, y)[0],
            planes[1].get_pixel(x, y)[0],
            planes[2].get_pixel(x, y)[0],
        ])
    })
}
