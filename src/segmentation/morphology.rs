//! Erosion, dilation and median smoothing for masks
//!
//! Out-of-image neighbours are ignored by erosion and dilation; the median
//! filter replicates the border pixels.

use image::{GrayImage, Luma};
use imageproc::filter::median_filter;
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask as Footprint};

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    Rect,
    Ellipse,
}

/// Structuring element, stored as offsets relative to its centre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    width: u32,
    height: u32,
    offsets: Vec<(i32, i32)>,
}

impl Kernel {
    /// Kernel of the given shape, anchored at its centre
    pub fn new(shape: KernelShape, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (ax, ay) = ((width / 2) as i32, (height / 2) as i32);

        let mut offsets = Vec::new();
        match shape {
            KernelShape::Rect => {
                for i in 0..height as i32 {
                    for j in 0..width as i32 {
                        offsets.push((j - ax, i - ay));
                    }
                }
            }
            KernelShape::Ellipse => {
                let r = ay;
                let c = ax;
                let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
                for i in 0..height as i32 {
                    let dy = i - r;
                    let (j1, j2) = if dy.abs() <= r {
                        let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
                        ((c - dx).max(0), (c + dx + 1).min(width as i32))
                    } else {
                        (0, 0)
                    };
                    for j in j1..j2 {
                        offsets.push((j - ax, i - ay));
                    }
                }
            }
        }

        Self {
            width,
            height,
            offsets,
        }
    }

    /// Square kernel of side `2 * radius + 1`
    pub fn rect_radius(radius: u32) -> Self {
        Self::new(KernelShape::Rect, 2 * radius + 1, 2 * radius + 1)
    }

    pub fn ellipse(size: u32) -> Self {
        Self::new(KernelShape::Ellipse, size, size)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of active cells
    pub fn area(&self) -> usize {
        self.offsets.len()
    }

    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        self.offsets.contains(&(dx, dy))
    }

    /// Footprint image of the active cells, anchored at the kernel centre
    fn footprint(&self) -> Footprint {
        let (ax, ay) = (self.width / 2, self.height / 2);
        let mut image = GrayImage::new(self.width, self.height);
        for &(dx, dy) in &self.offsets {
            image.put_pixel((dx + ax as i32) as u32, (dy + ay as i32) as u32, Luma([255]));
        }
        Footprint::from_image(&image, ax as u8, ay as u8)
    }
}

/// Local minimum under the kernel
pub fn erode(src: &GrayImage, kernel: &Kernel) -> GrayImage {
    grayscale_erode(src, &kernel.footprint())
}

/// Local maximum under the kernel
pub fn dilate(src: &GrayImage, kernel: &Kernel) -> GrayImage {
    grayscale_dilate(src, &kernel.footprint())
}

/// Median over a `size x size` window; even sizes are bumped to the next odd one
pub fn median_blur(src: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 || src.is_empty() {
        return src.clone();
    }
    let radius = (size | 1) / 2;
    median_filter(src, radius, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::threshold::count_foreground;
    use image::Luma;

    #[test]
    fn test_rect_kernel() {
        let k = Kernel::rect_radius(1);
        assert_eq!(k.dimensions(), (3, 3));
        assert_eq!(k.area(), 9);
        assert_eq!(Kernel::rect_radius(0).area(), 1);
    }

    #[test]
    fn test_ellipse_kernel_5x5() {
        let k = Kernel::ellipse(5);
        // corners of the top and bottom rows are off, the middle rows are full
        assert_eq!(k.area(), 17);
        assert!(k.contains(0, -2));
        assert!(!k.contains(-1, -2));
        assert!(k.contains(-2, 0));
        assert!(k.contains(2, 1));
        assert!(!k.contains(2, 2));
    }

    #[test]
    fn test_erode_removes_speckle() {
        let mut src = GrayImage::new(7, 7);
        src.put_pixel(3, 3, Luma([255]));
        let eroded = erode(&src, &Kernel::rect_radius(1));
        assert_eq!(count_foreground(&eroded), 0);
    }

    #[test]
    fn test_dilate_grows_block() {
        let mut src = GrayImage::new(7, 7);
        src.put_pixel(3, 3, Luma([255]));
        let dilated = dilate(&src, &Kernel::rect_radius(1));
        assert_eq!(count_foreground(&dilated), 9);
    }

    #[test]
    fn test_erode_ignores_border() {
        let src = GrayImage::from_pixel(4, 4, Luma([255]));
        let eroded = erode(&src, &Kernel::rect_radius(2));
        assert_eq!(count_foreground(&eroded), 16);
    }

    #[test]
    fn test_ellipse_close_keeps_block() {
        // a 5x5 block survives ellipse dilate/erode unchanged; corners are off the footprint
        let mut src = GrayImage::new(11, 11);
        for y in 3..8 {
            for x in 3..8 {
                src.put_pixel(x, y, Luma([255]));
            }
        }
        let kernel = Kernel::ellipse(5);
        assert_eq!(erode(&dilate(&src, &kernel), &kernel), src);

        // a lone pixel dilated by the ellipse covers exactly its 17 cells
        let mut dot = GrayImage::new(9, 9);
        dot.put_pixel(4, 4, Luma([255]));
        assert_eq!(count_foreground(&dilate(&dot, &kernel)), 17);
    }

    #[test]
    fn test_wide_rect_kernel() {
        let mut src = GrayImage::new(64, 64);
        src.put_pixel(32, 32, Luma([255]));
        let dilated = dilate(&src, &Kernel::rect_radius(21));
        assert_eq!(count_foreground(&dilated), 43 * 43);
    }

    #[test]
    fn test_median_fills_hole() {
        let mut src = GrayImage::from_pixel(9, 9, Luma([255]));
        src.put_pixel(4, 4, Luma([0]));
        let smoothed = median_blur(&src, 5);
        assert_eq!(smoothed.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn test_median_removes_salt() {
        let mut src = GrayImage::new(9, 9);
        src.put_pixel(0, 0, Luma([255]));
        src.put_pixel(6, 2, Luma([255]));
        assert_eq!(count_foreground(&median_blur(&src, 5)), 0);
    }
}
