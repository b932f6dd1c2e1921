//! The recognition pipeline module.
//!
//! This module combines the pieces of one recognition attempt: the
//! client that drives preprocessing and dispatch, the request lifecycle
//! that races completion, timeout, and cancellation under a single
//! validity gate, and the transport-independent response parser.

mod client;
mod request;
mod response;

pub use client::RecognitionClient;
pub use request::RecognitionRequest;
pub use response::parse_response;
