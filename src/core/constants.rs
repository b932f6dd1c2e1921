//! Constants used throughout the recognition pipeline.

/// Minimum accepted width and height of an input image, in pixels.
///
/// The recognition service produces unusable results below this size, so
/// smaller inputs are rejected before any processing happens.
pub const MIN_INPUT_DIMENSION: u32 = 32;

/// Maximum width and height of the uploaded image, in pixels.
///
/// Larger inputs are downscaled uniformly so that both dimensions fit;
/// inputs already within the limit are never resized.
pub const MAX_UPLOAD_DIMENSION: u32 = 800;

/// Sigma of the gaussian blur used by the unsharp mask.
pub const UNSHARP_SIGMA: f32 = 3.0;

/// Weight of the unblurred grayscale image in the unsharp mask.
pub const UNSHARP_IMAGE_WEIGHT: f32 = 1.2;

/// Weight of the blurred copy subtracted by the unsharp mask.
pub const UNSHARP_BLUR_WEIGHT: f32 = 0.2;

/// Side length of the gaussian window used by adaptive thresholding.
/// Must be odd.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the local gaussian mean when thresholding.
pub const ADAPTIVE_OFFSET: f32 = 2.0;

/// Default deadline for one recognition request, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default JPEG quality for the uploaded image.
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Name of the authentication header expected by the recognition service.
pub const AUTH_HEADER: &str = "token";

/// Form field name of the image part in the multipart upload.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// File name reported for the image part.
pub const UPLOAD_FILE_NAME: &str = "formula.jpg";

/// MIME type of the image part.
pub const UPLOAD_MIME: &str = "image/jpeg";
