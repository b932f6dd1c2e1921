//! Domain types for the recognition pipeline.
//!
//! These types model the data handed between pipeline stages: the raw
//! image supplied by the caller, the preprocessed single-channel image,
//! the encoded upload payload, and the terminal outcome of one
//! recognition attempt. Buffers are moved from stage to stage, never
//! shared; no two stages need the same buffer at the same time.

use image::GrayImage;

use crate::core::errors::{PreprocessError, TransportError};

/// A raw 3-channel interleaved RGB image as supplied by the caller
/// (screen capture, file load, drag-and-drop).
///
/// The buffer may be strided: `stride` is the number of bytes per row and
/// must be at least `3 * width`. The image is immutable once constructed
/// and is consumed by [`RecognitionClient::recognize`](crate::pipeline::RecognitionClient::recognize).
#[derive(Debug, Clone)]
pub struct RawImage {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl RawImage {
    /// Creates a raw image with a tight stride (`3 * width` bytes per row).
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * 3,
            data,
        }
    }

    /// Creates a raw image with an explicit row stride in bytes.
    pub fn with_stride(width: u32, height: u32, stride: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride,
            data,
        }
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the image holds no pixel data at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }
}

/// A preprocessed single-channel 8-bit image ready for encoding.
///
/// The backing buffer is contiguous; the stride equals the width. The
/// type carries no reference back to the raw image it was derived from.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    image: GrayImage,
}

impl PreprocessedImage {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self { image }
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The contiguous pixel buffer, one byte per pixel in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// The backing grayscale image buffer.
    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }
}

/// The encoded upload: compressed image bytes plus the text form fields
/// accompanying them.
///
/// Owned by the request lifecycle that consumes it; the bytes are moved
/// into the HTTP body when the request is built.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Compressed (JPEG) image bytes.
    pub bytes: Vec<u8>,
    /// Text form fields sent alongside the image part.
    pub fields: Vec<(String, String)>,
}

/// The terminal, exactly-once result of one recognition attempt.
///
/// For a given request exactly one of these is ever produced, regardless
/// of how network completion, the timeout, and cancellation interleave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// The service recognized a formula.
    Success(String),
    /// The service answered but rejected the image, with its message.
    ServiceError(String),
    /// The transfer failed below the service level.
    Transport(TransportError),
    /// The deadline elapsed before the transfer finished.
    Timeout,
    /// The caller cancelled the request before it finished.
    Cancelled,
    /// The service answered with a body this client cannot interpret.
    Malformed(String),
    /// The image never left the machine: preprocessing failed.
    Preprocess(PreprocessError),
}

impl RecognitionOutcome {
    /// Whether this outcome carries a recognized formula.
    pub fn is_success(&self) -> bool {
        matches!(self, RecognitionOutcome::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_image_default_stride_is_tight() {
        let img = RawImage::new(4, 2, vec![0; 24]);
        assert_eq!(img.stride(), 12);
        assert!(!img.is_empty());
    }

    #[test]
    fn empty_raw_image_is_detected() {
        assert!(RawImage::new(0, 0, Vec::new()).is_empty());
        assert!(RawImage::new(4, 2, Vec::new()).is_empty());
    }

    #[test]
    fn outcome_success_predicate() {
        assert!(RecognitionOutcome::Success("x".into()).is_success());
        assert!(!RecognitionOutcome::Timeout.is_success());
    }
}
