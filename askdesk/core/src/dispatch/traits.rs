//! Dispatch Traits
//!
//! Trait and data definitions shared by the dispatcher and its transports.
//! The dispatcher only needs "POST this JSON, tell me the status and body";
//! everything provider-specific lives behind [`Transport`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters kept from an error body
pub const BODY_EXCERPT_CHARS: usize = 100;

/// Cause reported when every attempt was used up without a terminal response
pub const RETRIES_EXHAUSTED: &str = "retries exhausted";

/// One logical request to the answer endpoint
///
/// The body shape is decided by the caller; the dispatcher never looks inside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// JSON body sent on every attempt
    pub body: serde_json::Value,
}

impl RequestSpec {
    /// Create a request with the given body
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }
}

/// Status and body of a response, before any interpretation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a raw response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport-level failures (nothing usable came back from the server)
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the server (DNS, refused, reset)
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request did not complete in time
    #[error("request timed out")]
    Timeout,
    /// Any other failure while sending or reading the body
    #[error("request failed: {0}")]
    Request(String),
}

/// Result of one logical request, after retries
///
/// Exactly one variant is produced per `send`, and it is never mutated
/// afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The server answered with a 2xx status
    Success {
        /// Parsed response body (`null` for an empty body)
        payload: serde_json::Value,
    },
    /// The server answered with a non-retried, non-success status
    HttpFailure {
        /// HTTP status code
        status: u16,
        /// First [`BODY_EXCERPT_CHARS`] characters of the body
        body_excerpt: String,
        /// `error` string from a JSON error body, if there was one
        server_error: Option<String>,
    },
    /// No terminal response: transport failure or retries exhausted
    NetworkFailure {
        /// Human-readable cause
        cause: String,
    },
}

impl DispatchOutcome {
    /// Build an `HttpFailure` from a full error body
    pub fn http_failure(status: u16, body: &str) -> Self {
        let server_error = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from));

        Self::HttpFailure {
            status,
            body_excerpt: excerpt(body),
            server_error,
        }
    }

    /// Build a `NetworkFailure`
    pub fn network_failure(cause: impl Into<String>) -> Self {
        Self::NetworkFailure {
            cause: cause.into(),
        }
    }

    /// Whether this is a `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether this failure came from running out of attempts
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::NetworkFailure { cause } if cause == RETRIES_EXHAUSTED)
    }
}

/// Keep the first [`BODY_EXCERPT_CHARS`] characters of a body
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Transport trait
///
/// Implement this to send requests somewhere other than a real HTTP server
/// (tests, recording proxies, etc.).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// POST `body` as JSON to `url`
    ///
    /// Any status code, including errors, is `Ok`. `Err` means no response
    /// was received at all.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let body = "あ".repeat(150);
        let cut = excerpt(&body);
        assert_eq!(cut.chars().count(), BODY_EXCERPT_CHARS);

        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_http_failure_reads_server_error() {
        let outcome =
            DispatchOutcome::http_failure(500, r#"{"error": "OpenAI API Key not set."}"#);
        match outcome {
            DispatchOutcome::HttpFailure {
                status,
                server_error,
                ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(server_error.as_deref(), Some("OpenAI API Key not set."));
            }
            other => panic!("Expected HttpFailure, got {other:?}"),
        }

        let outcome = DispatchOutcome::http_failure(502, "<html>Bad Gateway</html>");
        assert!(matches!(
            outcome,
            DispatchOutcome::HttpFailure { server_error: None, .. }
        ));
    }

    #[test]
    fn test_raw_response_classification() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(301, "").is_success());
        assert!(RawResponse::new(429, "").is_rate_limited());
        assert!(!RawResponse::new(503, "").is_rate_limited());
    }

    #[test]
    fn test_retries_exhausted_marker() {
        assert!(DispatchOutcome::network_failure(RETRIES_EXHAUSTED).is_retries_exhausted());
        assert!(!DispatchOutcome::network_failure("connection refused").is_retries_exhausted());
    }
}
