//! Image preprocessing for formula recognition uploads.
//!
//! This module implements the deterministic transform from a raw RGB
//! capture to the binary image the recognition service performs best on:
//!
//! 1. Size validation (at least 32x32)
//! 2. Downscale to fit 800x800 with an area-averaging filter (never upscale)
//! 3. Grayscale conversion with the standard luminance weights
//! 4. Unsharp masking (gaussian blur sigma 3, `1.2*gray - 0.2*blurred`)
//! 5. Adaptive gaussian thresholding (11x11 window, offset 2)
//!
//! The transform is pure and synchronous; it owns no shared state and
//! reads the input without mutating it.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::core::constants::{
    ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET, MAX_UPLOAD_DIMENSION, MIN_INPUT_DIMENSION, UNSHARP_BLUR_WEIGHT,
    UNSHARP_IMAGE_WEIGHT, UNSHARP_SIGMA,
};
use crate::core::errors::PreprocessError;
use crate::domain::{PreprocessedImage, RawImage};
use crate::utils::rgb_from_raw;

/// Transforms a raw capture into the binary image uploaded for recognition.
///
/// The output buffer is single-channel, contiguous, and never larger than
/// the input in either dimension.
///
/// # Errors
///
/// * [`PreprocessError::TooSmall`] - if the image is empty or either
///   dimension is below 32 pixels; no further work happens in that case.
/// * [`PreprocessError::ConversionFailed`] - if the pixel buffer does not
///   match its declared dimensions and stride.
pub fn preprocess(raw: &RawImage) -> Result<PreprocessedImage, PreprocessError> {
    if raw.is_empty() || raw.width() < MIN_INPUT_DIMENSION || raw.height() < MIN_INPUT_DIMENSION {
        return Err(PreprocessError::TooSmall {
            width: raw.width(),
            height: raw.height(),
        });
    }

    let rgb = rgb_from_raw(raw)?;
    let (width, height) = rgb.dimensions();

    let scale = (MAX_UPLOAD_DIMENSION as f64 / width as f64)
        .min(MAX_UPLOAD_DIMENSION as f64 / height as f64);
    let rgb = if scale < 1.0 {
        let dst_width = ((width as f64 * scale).round() as u32).max(1);
        let dst_height = ((height as f64 * scale).round() as u32).max(1);
        debug!("downscaling {width}x{height} to {dst_width}x{dst_height}");
        area_downscale(&rgb, dst_width, dst_height)
    } else {
        rgb
    };

    let gray = to_luminance(&rgb);
    let sharpened = unsharp_mask(&gray);

    // The global Otsu level is not used to gate the adaptive result; it is
    // surfaced for diagnostics only.
    let otsu = otsu_level(&sharpened);
    debug!(
        "global otsu level {otsu} for {}x{} upload",
        sharpened.width(),
        sharpened.height()
    );

    let binary = adaptive_threshold_gaussian(&sharpened, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);

    // GrayImage buffers are contiguous by construction; stride equals width.
    Ok(PreprocessedImage::new(binary))
}

/// Downscales with an area-averaging filter: every destination pixel is
/// the mean of its source footprint, with fractional coverage at the
/// footprint edges.
fn area_downscale(src: &RgbImage, dst_width: u32, dst_height: u32) -> RgbImage {
    let (src_width, src_height) = src.dimensions();
    let x_ratio = src_width as f64 / dst_width as f64;
    let y_ratio = src_height as f64 / dst_height as f64;

    let mut dst = RgbImage::new(dst_width, dst_height);
    for dy in 0..dst_height {
        let y0 = dy as f64 * y_ratio;
        let y1 = ((dy + 1) as f64 * y_ratio).min(src_height as f64);
        for dx in 0..dst_width {
            let x0 = dx as f64 * x_ratio;
            let x1 = ((dx + 1) as f64 * x_ratio).min(src_width as f64);

            let mut acc = [0.0f64; 3];
            let mut area = 0.0f64;
            let mut sy = y0.floor() as u32;
            while (sy as f64) < y1 {
                let cover_y = (y1.min((sy + 1) as f64) - y0.max(sy as f64)).max(0.0);
                let mut sx = x0.floor() as u32;
                while (sx as f64) < x1 {
                    let cover_x = (x1.min((sx + 1) as f64) - x0.max(sx as f64)).max(0.0);
                    let weight = cover_x * cover_y;
                    let pixel = src.get_pixel(sx.min(src_width - 1), sy.min(src_height - 1));
                    acc[0] += pixel[0] as f64 * weight;
                    acc[1] += pixel[1] as f64 * weight;
                    acc[2] += pixel[2] as f64 * weight;
                    area += weight;
                    sx += 1;
                }
                sy += 1;
            }

            let pixel = if area > 0.0 {
                Rgb([
                    (acc[0] / area).round() as u8,
                    (acc[1] / area).round() as u8,
                    (acc[2] / area).round() as u8,
                ])
            } else {
                Rgb([0, 0, 0])
            };
            dst.put_pixel(dx, dy, pixel);
        }
    }
    dst
}

/// Converts to grayscale with the standard luminance weights
/// `0.299*R + 0.587*G + 0.114*B`.
fn to_luminance(src: &RgbImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in src.enumerate_pixels() {
        let luma = 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    gray
}

/// Sharpens by unsharp masking: `1.2*gray - 0.2*blurred`, clamped to
/// `[0, 255]`, with a sigma-3 gaussian as the blur.
fn unsharp_mask(gray: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, UNSHARP_SIGMA);
    let (width, height) = gray.dimensions();
    let mut sharpened = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = UNSHARP_IMAGE_WEIGHT * pixel[0] as f32
            - UNSHARP_BLUR_WEIGHT * blurred.get_pixel(x, y)[0] as f32;
        sharpened.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }
    sharpened
}

/// Binarizes against a local gaussian-weighted mean: a pixel turns white
/// when it exceeds the mean of its `block`-sized neighborhood minus
/// `offset`. Borders are replicated, and the gaussian window uses the
/// conventional sigma for its size (`0.3*((block-1)*0.5 - 1) + 0.8`).
fn adaptive_threshold_gaussian(src: &GrayImage, block: u32, offset: f32) -> GrayImage {
    debug_assert!(block % 2 == 1, "adaptive threshold window must be odd");
    let (width, height) = src.dimensions();
    let window = gaussian_window(block);
    let radius = (block / 2) as i64;

    // Separable filter: horizontal pass into a float buffer, then the
    // vertical pass feeds the comparison directly.
    let mut rows = vec![0.0f32; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width as i64 {
            let mut acc = 0.0f32;
            for (k, weight) in window.iter().enumerate() {
                let sx = (x + k as i64 - radius).clamp(0, width as i64 - 1);
                acc += weight * src.get_pixel(sx as u32, y)[0] as f32;
            }
            rows[(y as usize) * width as usize + x as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width {
            let mut mean = 0.0f32;
            for (k, weight) in window.iter().enumerate() {
                let sy = (y + k as i64 - radius).clamp(0, height as i64 - 1);
                mean += weight * rows[(sy as usize) * width as usize + x as usize];
            }
            let pixel = src.get_pixel(x, y as u32)[0];
            let value = if pixel as f32 > mean - offset { 255 } else { 0 };
            out.put_pixel(x, y as u32, Luma([value]));
        }
    }
    out
}

/// Normalized 1-D gaussian weights for a window of the given odd size.
fn gaussian_window(block: u32) -> Vec<f32> {
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (block / 2) as i32;
    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|d| (-((d * d) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for weight in &mut weights {
        *weight /= sum;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a raw test image filled with a single RGB value.
    fn create_test_image(width: u32, height: u32, value: u8) -> RawImage {
        RawImage::new(width, height, vec![value; (width * height * 3) as usize])
    }

    #[test]
    fn rejects_empty_input() {
        let raw = RawImage::new(0, 0, Vec::new());
        assert!(matches!(
            preprocess(&raw),
            Err(PreprocessError::TooSmall { .. })
        ));
    }

    #[test]
    fn rejects_undersized_input() {
        for (w, h) in [(31, 100), (100, 31), (31, 31)] {
            let raw = create_test_image(w, h, 128);
            assert_eq!(
                preprocess(&raw).unwrap_err(),
                PreprocessError::TooSmall {
                    width: w,
                    height: h
                }
            );
        }
    }

    #[test]
    fn output_is_single_channel_and_binary() {
        let raw = create_test_image(64, 48, 200);
        let processed = preprocess(&raw).unwrap();
        assert_eq!(processed.width(), 64);
        assert_eq!(processed.height(), 48);
        assert_eq!(processed.as_bytes().len(), 64 * 48);
        assert!(processed.as_bytes().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn uniform_input_binarizes_white() {
        // Every pixel equals its local mean, so each sits above mean - 2.
        let raw = create_test_image(40, 40, 77);
        let processed = preprocess(&raw).unwrap();
        assert!(processed.as_bytes().iter().all(|&v| v == 255));
    }

    #[test]
    fn small_images_are_not_resized() {
        let raw = create_test_image(800, 800, 10);
        let processed = preprocess(&raw).unwrap();
        assert_eq!((processed.width(), processed.height()), (800, 800));
    }

    #[test]
    fn oversized_images_scale_uniformly() {
        let raw = create_test_image(1600, 800, 10);
        let processed = preprocess(&raw).unwrap();
        assert_eq!((processed.width(), processed.height()), (800, 400));

        let raw = create_test_image(801, 100, 10);
        let processed = preprocess(&raw).unwrap();
        assert_eq!((processed.width(), processed.height()), (800, 100));
    }

    #[test]
    fn output_never_exceeds_input_dimensions() {
        for (w, h) in [(32, 32), (100, 2000), (2000, 100), (900, 900)] {
            let raw = create_test_image(w, h, 90);
            let processed = preprocess(&raw).unwrap();
            assert!(processed.width() <= w);
            assert!(processed.height() <= h);
        }
    }

    #[test]
    fn strided_input_is_accepted() {
        // 64 pixels per row plus 8 bytes of padding.
        let stride = 64 * 3 + 8;
        let raw = RawImage::with_stride(64, 64, stride, vec![120; stride * 64]);
        let processed = preprocess(&raw).unwrap();
        assert_eq!((processed.width(), processed.height()), (64, 64));
    }

    #[test]
    fn area_downscale_averages_blocks() {
        // 4x2 image of two 2x2 uniform blocks; halving must recover them.
        let mut src = RgbImage::new(4, 2);
        for y in 0..2 {
            for x in 0..2 {
                src.put_pixel(x, y, Rgb([40, 40, 40]));
                src.put_pixel(x + 2, y, Rgb([200, 200, 200]));
            }
        }
        let dst = area_downscale(&src, 2, 1);
        assert_eq!(dst.get_pixel(0, 0), &Rgb([40, 40, 40]));
        assert_eq!(dst.get_pixel(1, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn area_downscale_handles_fractional_footprints() {
        // 3 -> 2: each destination pixel covers 1.5 source pixels.
        let mut src = RgbImage::new(3, 1);
        src.put_pixel(0, 0, Rgb([0, 0, 0]));
        src.put_pixel(1, 0, Rgb([90, 90, 90]));
        src.put_pixel(2, 0, Rgb([180, 180, 180]));
        let dst = area_downscale(&src, 2, 1);
        // (0*1 + 90*0.5) / 1.5 = 30, (90*0.5 + 180*1) / 1.5 = 150
        assert_eq!(dst.get_pixel(0, 0), &Rgb([30, 30, 30]));
        assert_eq!(dst.get_pixel(1, 0), &Rgb([150, 150, 150]));
    }

    #[test]
    fn luminance_uses_standard_weights() {
        let mut src = RgbImage::new(1, 1);
        src.put_pixel(0, 0, Rgb([255, 0, 0]));
        assert_eq!(to_luminance(&src).get_pixel(0, 0)[0], 76); // 0.299 * 255
    }

    #[test]
    fn gaussian_window_is_normalized_and_symmetric() {
        let window = gaussian_window(ADAPTIVE_BLOCK_SIZE);
        assert_eq!(window.len(), 11);
        let sum: f32 = window.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..window.len() / 2 {
            assert!((window[i] - window[window.len() - 1 - i]).abs() < 1e-6);
        }
        assert!(window[5] > window[0]);
    }

    #[test]
    fn adaptive_threshold_separates_dark_stroke() {
        // A dark stroke on a light background must come out black on white.
        let mut gray = GrayImage::from_pixel(40, 40, Luma([230]));
        for x in 10..30 {
            gray.put_pixel(x, 20, Luma([20]));
        }
        let binary = adaptive_threshold_gaussian(&gray, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
        assert_eq!(binary.get_pixel(20, 20)[0], 0);
        assert_eq!(binary.get_pixel(20, 5)[0], 255);
    }
}
