//! Parsing of recognition service responses.
//!
//! The service answers with a JSON object carrying a boolean `status`, a
//! `message` on failure, and on success a nested `res` object with the
//! recognized `latex` text. Parsing is independent of the transport; it
//! sees only the response bytes.

use serde::Deserialize;

use crate::domain::RecognitionOutcome;

#[derive(Deserialize)]
struct ServiceResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    res: Option<RecognitionPayload>,
}

#[derive(Deserialize)]
struct RecognitionPayload {
    #[serde(default)]
    latex: Option<String>,
}

/// Parses raw response bytes into a terminal outcome.
///
/// * Bytes that are not a well-formed response object yield
///   [`RecognitionOutcome::Malformed`].
/// * `status == false` yields [`RecognitionOutcome::ServiceError`] with
///   the service's message (empty if the field is absent).
/// * `status == true` requires a nested `res` object with a non-empty
///   `latex` field; anything else is malformed.
pub fn parse_response(bytes: &[u8]) -> RecognitionOutcome {
    let response: ServiceResponse = match serde_json::from_slice(bytes) {
        Ok(response) => response,
        Err(err) => return RecognitionOutcome::Malformed(err.to_string()),
    };

    if !response.status {
        return RecognitionOutcome::ServiceError(response.message.unwrap_or_default());
    }

    match response.res.and_then(|res| res.latex) {
        Some(latex) if !latex.is_empty() => RecognitionOutcome::Success(latex),
        _ => RecognitionOutcome::Malformed("missing formula".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_response() {
        let outcome = parse_response(br#"{"status":true,"res":{"latex":"x^2"}}"#);
        assert_eq!(outcome, RecognitionOutcome::Success("x^2".to_string()));
    }

    #[test]
    fn parses_service_rejection() {
        let outcome = parse_response(br#"{"status":false,"message":"bad image"}"#);
        assert_eq!(
            outcome,
            RecognitionOutcome::ServiceError("bad image".to_string())
        );
    }

    #[test]
    fn rejection_without_message_is_tolerated() {
        let outcome = parse_response(br#"{"status":false}"#);
        assert_eq!(outcome, RecognitionOutcome::ServiceError(String::new()));
    }

    #[test]
    fn empty_result_object_is_malformed() {
        let outcome = parse_response(br#"{"status":true,"res":{}}"#);
        assert_eq!(
            outcome,
            RecognitionOutcome::Malformed("missing formula".to_string())
        );
    }

    #[test]
    fn empty_formula_is_malformed() {
        let outcome = parse_response(br#"{"status":true,"res":{"latex":""}}"#);
        assert_eq!(
            outcome,
            RecognitionOutcome::Malformed("missing formula".to_string())
        );
    }

    #[test]
    fn missing_result_object_is_malformed() {
        let outcome = parse_response(br#"{"status":true}"#);
        assert_eq!(
            outcome,
            RecognitionOutcome::Malformed("missing formula".to_string())
        );
    }

    #[test]
    fn non_object_result_is_malformed() {
        let outcome = parse_response(br#"{"status":true,"res":"x^2"}"#);
        assert!(matches!(outcome, RecognitionOutcome::Malformed(_)));
    }

    #[test]
    fn non_json_bytes_are_malformed() {
        let outcome = parse_response(b"<html>502 Bad Gateway</html>");
        assert!(matches!(outcome, RecognitionOutcome::Malformed(_)));
    }
}
