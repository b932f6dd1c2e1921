//! Conversions between caller-supplied pixel buffers and working images.
//!
//! The recognition pipeline works on [`image`] buffers internally; this
//! module normalizes the raw (possibly strided) RGB data handed in by the
//! caller and provides a small file-loading convenience for callers that
//! start from a path instead of a capture buffer.

use std::path::Path;

use image::RgbImage;

use crate::core::errors::PreprocessError;
use crate::domain::RawImage;

/// Converts a [`RawImage`] into a tightly packed [`RgbImage`].
///
/// Rows are copied individually when the source stride exceeds
/// `3 * width`; a buffer that is already tight is handed to the image
/// buffer constructor without a per-row pass.
///
/// # Arguments
///
/// * `raw` - The raw image to convert.
///
/// # Returns
///
/// * `Ok(RgbImage)` - The packed RGB image.
/// * `Err(PreprocessError::ConversionFailed)` - If the stride is smaller
///   than a pixel row or the buffer does not cover `stride * height` bytes.
pub fn rgb_from_raw(raw: &RawImage) -> Result<RgbImage, PreprocessError> {
    let width = raw.width();
    let height = raw.height();
    let row_bytes = width as usize * 3;

    if raw.stride() < row_bytes {
        return Err(PreprocessError::ConversionFailed(format!(
            "stride {} is smaller than a {width}-pixel row",
            raw.stride()
        )));
    }
    if raw.data().len() < raw.stride() * height as usize {
        return Err(PreprocessError::ConversionFailed(format!(
            "buffer holds {} bytes, expected at least {}",
            raw.data().len(),
            raw.stride() * height as usize
        )));
    }

    let data = if raw.stride() == row_bytes {
        raw.data()[..row_bytes * height as usize].to_vec()
    } else {
        let mut packed = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * raw.stride();
            packed.extend_from_slice(&raw.data()[start..start + row_bytes]);
        }
        packed
    };

    RgbImage::from_raw(width, height, data).ok_or_else(|| {
        PreprocessError::ConversionFailed(format!(
            "cannot build {width}x{height} image from packed buffer"
        ))
    })
}

/// Loads an image from a file path into a [`RawImage`].
///
/// Any format supported by the image crate is accepted; the decoded image
/// is converted to 8-bit RGB.
///
/// # Arguments
///
/// * `path` - A reference to the path of the image file to load.
///
/// # Returns
///
/// * `Ok(RawImage)` - The loaded image with a tight stride.
/// * `Err(PreprocessError::ConversionFailed)` - If the file cannot be
///   decoded.
pub fn load_raw_image(path: &Path) -> Result<RawImage, PreprocessError> {
    let img = image::open(path)
        .map_err(|err| PreprocessError::ConversionFailed(err.to_string()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(RawImage::new(width, height, img.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_buffer_round_trips() {
        let data: Vec<u8> = (0..24).collect();
        let raw = RawImage::new(4, 2, data.clone());
        let rgb = rgb_from_raw(&raw).unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
        assert_eq!(rgb.as_raw().as_slice(), data.as_slice());
    }

    #[test]
    fn strided_buffer_drops_row_padding() {
        // 2x2 image, 8 bytes per row: 6 pixel bytes + 2 padding bytes.
        let data = vec![
            1, 1, 1, 2, 2, 2, 0xAA, 0xAA, //
            3, 3, 3, 4, 4, 4, 0xAA, 0xAA,
        ];
        let raw = RawImage::with_stride(2, 2, 8, data);
        let rgb = rgb_from_raw(&raw).unwrap();
        assert_eq!(
            rgb.as_raw().as_slice(),
            &[1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]
        );
    }

    #[test]
    fn short_buffer_is_rejected() {
        let raw = RawImage::new(4, 2, vec![0; 10]);
        assert!(matches!(
            rgb_from_raw(&raw),
            Err(PreprocessError::ConversionFailed(_))
        ));
    }

    #[test]
    fn undersized_stride_is_rejected() {
        let raw = RawImage::with_stride(4, 2, 8, vec![0; 32]);
        assert!(matches!(
            rgb_from_raw(&raw),
            Err(PreprocessError::ConversionFailed(_))
        ));
    }
}
