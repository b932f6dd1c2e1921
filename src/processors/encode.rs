//! JPEG encoding of the preprocessed image.

use image::codecs::jpeg::JpegEncoder;

use crate::core::errors::PreprocessError;
use crate::domain::PreprocessedImage;

/// Encodes the preprocessed image as JPEG at the given quality.
///
/// The resulting bytes are what the upload carries as its file part.
///
/// # Errors
///
/// Returns [`PreprocessError::EncodingFailed`] if the encoder rejects the
/// buffer.
pub fn encode_jpeg(image: &PreprocessedImage, quality: u8) -> Result<Vec<u8>, PreprocessError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image.as_gray())
        .map_err(|err| PreprocessError::EncodingFailed(err.to_string()))?;
    Ok(bytes)
}
