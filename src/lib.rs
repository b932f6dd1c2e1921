//! # Formula OCR
//!
//! A Rust client library for remote mathematical formula recognition.
//! It turns a raw image believed to contain a formula into an upload the
//! recognition service performs best on, submits it over HTTP, and
//! delivers the parsed result (or a precise failure) exactly once,
//! tolerating slow or hanging responses without leaking resources or
//! running stale callbacks.
//!
//! ## Components
//!
//! - **Preprocessing**: deterministic transform from raw RGB capture to
//!   a sharpened, adaptively binarized grayscale image
//! - **Request lifecycle**: one in-flight attempt with a deadline, a
//!   cancellation handle, and a single-writer validity gate guaranteeing
//!   at-most-one terminal outcome
//! - **Response parsing**: typed decoding of the service's JSON answers
//!
//! ## Modules
//!
//! * [`core`] - Configuration, constants, and error handling
//! * [`domain`] - Data types handed between pipeline stages
//! * [`processors`] - Image preprocessing and encoding
//! * [`pipeline`] - Client, request lifecycle, and response parsing
//! * [`utils`] - Image buffer helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formula_ocr::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://service.example/api/latex_ocr", "secret");
//! let client = RecognitionClient::new(config)?;
//!
//! let image = RawImage::new(640, 480, vec![255; 640 * 480 * 3]);
//! let request = client.recognize(image);
//!
//! match request.outcome().await {
//!     RecognitionOutcome::Success(latex) => println!("{latex}"),
//!     other => eprintln!("recognition failed: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Requests can be cancelled at any time; cancellation races completion
//! and the deadline under the same gate, so the caller still observes
//! exactly one outcome:
//!
//! ```rust,no_run
//! # use formula_ocr::prelude::*;
//! # async fn run(client: RecognitionClient, image: RawImage) {
//! let request = client.recognize(image);
//! request.cancel();
//! assert_eq!(request.outcome().await, RecognitionOutcome::Cancelled);
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

pub use crate::core::init_tracing;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use formula_ocr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{ClientConfig, ConfigError, PreprocessError, TransportError};
    pub use crate::domain::{RawImage, RecognitionOutcome};
    pub use crate::pipeline::{RecognitionClient, RecognitionRequest};
    pub use crate::processors::preprocess;
    pub use crate::utils::load_raw_image;
}
