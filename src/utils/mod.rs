//! Utility functions for image buffers.

mod image;

pub use image::{load_raw_image, rgb_from_raw};
