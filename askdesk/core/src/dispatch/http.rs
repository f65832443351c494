//! HTTP Transport
//!
//! `reqwest`-backed [`Transport`]. It reports every status code as-is and
//! only turns "nothing came back" into a [`TransportError`]; deciding what a
//! status means is the dispatcher's job.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{RawResponse, Transport, TransportError};

/// Default per-attempt timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP transport client
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a per-attempt timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("askdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, TransportError> {
        // .json() sets Content-Type: application/json
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(&e))?;

        Ok(RawResponse { status, body })
    }
}
