//! Error types for the recognition pipeline.
//!
//! Each layer of the pipeline owns its error taxonomy: preprocessing
//! failures never reach the network layer, transport failures are produced
//! only by the request lifecycle, and parse failures only by the response
//! parser. All of them are terminal outcomes delivered through the same
//! single-outcome channel as success; none of them panics across the
//! component boundary.

use thiserror::Error;

/// Errors produced while preparing an image for upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    /// The input image is empty or below the minimum accepted size.
    #[error("image too small: {width}x{height}, minimum is 32x32")]
    TooSmall {
        /// Width of the rejected image in pixels.
        width: u32,
        /// Height of the rejected image in pixels.
        height: u32,
    },

    /// The pixel buffer could not be converted to the working layout.
    #[error("pixel conversion failed: {0}")]
    ConversionFailed(String),

    /// The processed image could not be encoded for upload.
    #[error("image encoding failed: {0}")]
    EncodingFailed(String),
}

/// Errors produced by the network transfer itself.
///
/// Service-level failures (the endpoint answered, but rejected the image)
/// are not transport errors; they surface as
/// [`RecognitionOutcome::ServiceError`](crate::domain::RecognitionOutcome::ServiceError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection to the endpoint could not be established.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The transfer started but did not finish cleanly.
    #[error("transfer aborted: {0}")]
    Aborted(String),
}

impl TransportError {
    /// Classifies a [`reqwest::Error`] into a transport error kind.
    pub(crate) fn classify(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::ConnectFailed(err.to_string())
        } else {
            TransportError::Aborted(err.to_string())
        }
    }
}
