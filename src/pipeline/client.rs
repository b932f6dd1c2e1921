//! The recognition client orchestrating the pipeline.
//!
//! One client owns the HTTP connection pool and the injected
//! configuration. Each call to [`RecognitionClient::recognize`] is
//! independent: preprocessing and encoding run synchronously on the
//! caller's thread, and the network phase runs on spawned tasks with its
//! own request handle, so concurrent calls share no mutable state.

use tracing::{debug, warn};

use crate::core::config::{ClientConfig, ConfigError};
use crate::domain::{EncodedPayload, RawImage, RecognitionOutcome};
use crate::pipeline::request::{RecognitionRequest, dispatch};
use crate::processors::{encode_jpeg, preprocess};

/// Client for a remote formula recognition service.
pub struct RecognitionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RecognitionClient {
    /// Builds a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        // Deadlines are enforced per request by the lifecycle timer, not
        // by a client-wide timeout.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submits an image for recognition.
    ///
    /// The image is preprocessed and encoded before anything touches the
    /// network; a preprocessing failure resolves the returned request
    /// immediately with [`RecognitionOutcome::Preprocess`]. Must be
    /// called from within a tokio runtime.
    pub fn recognize(&self, image: RawImage) -> RecognitionRequest {
        let encoded = preprocess(&image)
            .and_then(|processed| encode_jpeg(&processed, self.config.jpeg_quality));
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("image rejected before upload: {err}");
                return RecognitionRequest::resolved(RecognitionOutcome::Preprocess(err));
            }
        };

        debug!(
            "dispatching {} byte upload to {}",
            bytes.len(),
            self.config.endpoint
        );
        let payload = EncodedPayload {
            bytes,
            fields: self.config.form_fields(),
        };
        dispatch(self.http.clone(), &self.config, payload)
    }
}
