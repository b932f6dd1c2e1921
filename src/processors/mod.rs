//! Image processing for the recognition pipeline.
//!
//! # Modules
//!
//! * `preprocess` - The raw-capture-to-binary-image transform
//! * `encode` - JPEG encoding of the preprocessed image

mod encode;
mod preprocess;

pub use encode::encode_jpeg;
pub use preprocess::preprocess;
