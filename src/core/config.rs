//! Client configuration.
//!
//! Endpoint, credentials, and tuning knobs are injected here instead of
//! living as compiled-in literals. The configuration is deserializable
//! from JSON and validated before a client is built.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_TIMEOUT_MS};

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that the endpoint URL is missing.
    #[error("endpoint URL must not be empty")]
    EmptyEndpoint,

    /// Error indicating that the access token is missing.
    #[error("access token must not be empty")]
    EmptyToken,

    /// Error indicating an out-of-range JPEG quality.
    #[error("jpeg quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),

    /// Error indicating a zero request deadline.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// Error indicating that the HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Configuration for a [`RecognitionClient`](crate::pipeline::RecognitionClient).
///
/// All fields except `endpoint` and `token` have working defaults, so a
/// JSON configuration only needs to provide those two:
///
/// ```
/// use formula_ocr::core::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"
/// {
///   "endpoint": "https://service.example/api/latex_ocr",
///   "token": "secret"
/// }
/// "#).unwrap();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL of the recognition endpoint.
    pub endpoint: String,
    /// Value of the authentication header sent with every request.
    pub token: String,
    /// Deadline for one recognition request, in milliseconds.
    pub timeout_ms: u64,
    /// JPEG quality of the uploaded image (1..=100).
    pub jpeg_quality: u8,
    /// Whether the service should treat the image as mathematical content.
    pub math_mode: bool,
    /// Formula type selector forwarded to the service.
    pub formula_type: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            math_mode: true,
            formula_type: 0,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with the given endpoint and token and
    /// defaults for everything else.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Returns the request deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Text form fields accompanying the image part of the upload.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("math".to_string(), self.math_mode.to_string()),
            ("formula_type".to_string(), self.formula_type.to_string()),
        ]
    }
}
