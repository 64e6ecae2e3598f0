//! Page image preprocessing for OCR.
//!
//! Every step keeps the image dimensions; nothing is cropped or rescaled.

use image::{DynamicImage, GrayImage, Luma, imageops};
use tracing::debug;

/// Image preprocessor for the OCR path.
///
/// Pipeline: grayscale, median denoise, adaptive threshold, light closing,
/// contrast and sharpening.
pub struct ImagePreprocessor {
    /// Median filter radius (1 = 3x3 window).
    median_radius: u32,
    /// Adaptive threshold window size.
    block_size: u32,
    /// Constant subtracted from the local mean.
    threshold_offset: i32,
    /// Contrast adjustment passed to `imageops::contrast`.
    contrast: f32,
    /// Unsharp mask sigma.
    sharpen_sigma: f32,
    /// Unsharp mask threshold.
    sharpen_threshold: i32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            median_radius: 1,
            block_size: 31,
            threshold_offset: 10,
            contrast: 30.0,
            sharpen_sigma: 1.0,
            sharpen_threshold: 2,
        }
    }

    /// Set the adaptive threshold window size (forced odd).
    pub fn with_block_size(mut self, size: u32) -> Self {
        self.block_size = size.max(3) | 1;
        self
    }

    /// Run the full pipeline.
    pub fn preprocess(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        debug!("Preprocessing {}x{} page image", width, height);

        let denoised = median_filter(&gray, self.median_radius);
        let binary = adaptive_threshold(&denoised, self.block_size, self.threshold_offset);
        let closed = close_dark_strokes(&binary);
        let contrasted = imageops::contrast(&closed, self.contrast);
        let sharpened = imageops::unsharpen(&contrasted, self.sharpen_sigma, self.sharpen_threshold);

        DynamicImage::ImageLuma8(sharpened)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Median filter over a square window; removes speckle while keeping edges.
fn median_filter(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    let mut window: Vec<u8> = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);

    for y in 0..height {
        for x in 0..width {
            window.clear();
            let y_start = y.saturating_sub(radius);
            let y_end = (y + radius + 1).min(height);
            let x_start = x.saturating_sub(radius);
            let x_end = (x + radius + 1).min(width);

            for ly in y_start..y_end {
                for lx in x_start..x_end {
                    window.push(image.get_pixel(lx, ly)[0]);
                }
            }

            window.sort_unstable();
            result.put_pixel(x, y, Luma([window[window.len() / 2]]));
        }
    }

    result
}

/// Mean-C adaptive threshold using a summed-area table.
fn adaptive_threshold(image: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return result;
    }

    let stride = (width + 1) as usize;
    let mut integral = vec![0u64; stride * (height + 1) as usize];
    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let half_block = block_size / 2;
    for y in 0..height {
        for x in 0..width {
            let y0 = y.saturating_sub(half_block) as usize;
            let y1 = (y + half_block + 1).min(height) as usize;
            let x0 = x.saturating_sub(half_block) as usize;
            let x1 = (x + half_block + 1).min(width) as usize;

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;

            let mean = (sum / count) as i32;
            let pixel_value = image.get_pixel(x, y)[0] as i32;
            let output = if pixel_value > mean - c { 255 } else { 0 };
            result.put_pixel(x, y, Luma([output]));
        }
    }

    result
}

/// Morphological closing of the dark foreground with a 3x3 cross.
fn close_dark_strokes(image: &GrayImage) -> GrayImage {
    let dilated = cross_filter(image, |a, b| a.min(b));
    cross_filter(&dilated, |a, b| a.max(b))
}

fn cross_filter(image: &GrayImage, pick: impl Fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut value = image.get_pixel(x, y)[0];
            if x > 0 {
                value = pick(value, image.get_pixel(x - 1, y)[0]);
            }
            if x + 1 < width {
                value = pick(value, image.get_pixel(x + 1, y)[0]);
            }
            if y > 0 {
                value = pick(value, image.get_pixel(x, y - 1)[0]);
            }
            if y + 1 < height {
                value = pick(value, image.get_pixel(x, y + 1)[0]);
            }
            result.put_pixel(x, y, Luma([value]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn page_with_bar() -> DynamicImage {
        let mut img = GrayImage::from_pixel(60, 40, Luma([230]));
        for y in 15..25 {
            for x in 10..50 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_preprocess_keeps_geometry() {
        let input = page_with_bar();
        let output = ImagePreprocessor::new().preprocess(&input);
        assert_eq!(output.dimensions(), input.dimensions());
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let input = page_with_bar();
        let pre = ImagePreprocessor::new();
        assert_eq!(pre.preprocess(&input).to_luma8(), pre.preprocess(&input).to_luma8());
    }

    #[test]
    fn test_dark_text_stays_dark() {
        let output = ImagePreprocessor::new().preprocess(&page_with_bar()).to_luma8();
        assert!(output.get_pixel(30, 20)[0] < 128);
        assert!(output.get_pixel(2, 2)[0] > 128);
    }

    #[test]
    fn test_median_removes_speckle() {
        let mut img = GrayImage::from_pixel(5, 5, Luma([255]));
        img.put_pixel(2, 2, Luma([0]));
        let filtered = median_filter(&img, 1);
        assert_eq!(filtered.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_closing_bridges_one_pixel_gap() {
        let mut img = GrayImage::from_pixel(7, 3, Luma([255]));
        for x in [1, 2, 4, 5] {
            img.put_pixel(x, 1, Luma([0]));
        }
        let closed = close_dark_strokes(&img);
        assert_eq!(closed.get_pixel(3, 1)[0], 0);
    }

    #[test]
    fn test_block_size_forced_odd() {
        let pre = ImagePreprocessor::new().with_block_size(20);
        assert_eq!(pre.block_size, 21);
    }
}
