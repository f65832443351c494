//! Resilient Dispatcher
//!
//! Sends one logical request, retrying transport failures and 429s with
//! exponential backoff. Every other response ends the loop immediately.
//!
//! `send` never fails: whatever happens is folded into a [`DispatchOutcome`].

use std::sync::Arc;

use super::retry::RetryPolicy;
use super::traits::{DispatchOutcome, RawResponse, RequestSpec, Transport, RETRIES_EXHAUSTED};

/// Retrying front for a [`Transport`]
pub struct Dispatcher<T: Transport> {
    /// Underlying transport
    transport: Arc<T>,
    /// Retry configuration
    policy: RetryPolicy,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher with the given retry policy
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            policy,
        }
    }

    /// Create a dispatcher sharing an existing transport
    pub fn from_shared(transport: Arc<T>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Retry configuration in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send with the policy's attempt budget
    pub async fn send(&self, url: &str, request: &RequestSpec) -> DispatchOutcome {
        self.send_with_attempts(url, request, self.policy.max_attempts)
            .await
    }

    /// Send with an explicit attempt budget (0 is treated as 1)
    pub async fn send_with_attempts(
        &self,
        url: &str,
        request: &RequestSpec,
        max_attempts: u32,
    ) -> DispatchOutcome {
        let max_attempts = max_attempts.max(1);
        let transport = self.transport.name();

        for attempt in 0..max_attempts {
            let is_last = attempt + 1 == max_attempts;

            tracing::debug!(
                transport,
                url,
                attempt = attempt + 1,
                max_attempts,
                "Dispatching request"
            );

            match self.transport.post_json(url, &request.body).await {
                Ok(response) if response.is_rate_limited() && !is_last => {
                    self.wait_before_retry(attempt, "rate limited").await;
                }
                Ok(response) if response.is_rate_limited() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        "Rate limited on final attempt, giving up"
                    );
                }
                Ok(response) => return Self::terminal_outcome(response),
                Err(err) if is_last => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %err,
                        "Transport failure on final attempt"
                    );
                    return DispatchOutcome::network_failure(err.to_string());
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Transport failure");
                    self.wait_before_retry(attempt, "transport failure").await;
                }
            }
        }

        DispatchOutcome::network_failure(RETRIES_EXHAUSTED)
    }

    async fn wait_before_retry(&self, attempt: u32, reason: &'static str) {
        let delay = self.policy.backoff_for_attempt(attempt);
        tracing::warn!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            reason,
            "Retrying request after backoff"
        );
        tokio::time::sleep(delay).await;
    }

    fn terminal_outcome(response: RawResponse) -> DispatchOutcome {
        if !response.is_success() {
            tracing::debug!(status = response.status, "Non-retryable HTTP status");
            return DispatchOutcome::http_failure(response.status, &response.body);
        }

        if response.body.trim().is_empty() {
            return DispatchOutcome::Success {
                payload: serde_json::Value::Null,
            };
        }

        match serde_json::from_str(&response.body) {
            Ok(payload) => DispatchOutcome::Success { payload },
            Err(e) => {
                tracing::warn!(error = %e, "Success status with malformed JSON body");
                DispatchOutcome::network_failure(format!("malformed response body: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::dispatch::traits::TransportError;

    /// Replays a fixed script of results, then repeats the last one
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        calls: Mutex<u32>,
        attempted_at: Mutex<Vec<tokio::time::Instant>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<RawResponse, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
                attempted_at: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }

        /// Time between consecutive attempts
        fn gaps(&self) -> Vec<Duration> {
            self.attempted_at
                .lock()
                .windows(2)
                .map(|pair| pair[1] - pair[0])
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn post_json(
            &self,
            _url: &str,
            _body: &serde_json::Value,
        ) -> Result<RawResponse, TransportError> {
            *self.calls.lock() += 1;
            self.attempted_at.lock().push(tokio::time::Instant::now());
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_jitter_ms: 0,
        }
    }

    fn request() -> RequestSpec {
        RequestSpec::new(json!({"query": "hi"}))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(200, r#"{"answer":"hi"}"#))]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Success {
                payload: json!({"answer": "hi"})
            }
        );
        assert_eq!(dispatcher.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_always_rate_limited_exhausts_attempts() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(429, "slow down"))]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert!(outcome.is_retries_exhausted());
        assert_eq!(dispatcher.transport().calls(), 3);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(
                500,
                r#"{"error":"OpenAI API Key not set."}"#,
            ))]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert_eq!(dispatcher.transport().calls(), 1);
        match outcome {
            DispatchOutcome::HttpFailure {
                status,
                body_excerpt,
                server_error,
            } => {
                assert_eq!(status, 500);
                assert!(body_excerpt.starts_with("{\"error\""));
                assert_eq!(server_error.as_deref(), Some("OpenAI API Key not set."));
            }
            other => panic!("Expected HttpFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_on_last_attempt_reports_cause() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Err(TransportError::Timeout)]),
            fast_policy(2),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert_eq!(
            outcome,
            DispatchOutcome::network_failure("request timed out")
        );
        assert_eq!(dispatcher.transport().calls(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![
                Ok(RawResponse::new(429, "")),
                Ok(RawResponse::new(200, r#"{"text":"ok"}"#)),
            ]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert!(outcome.is_success());
        assert_eq!(dispatcher.transport().calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_sends_once() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(200, "{}"))]),
            fast_policy(3),
        );

        let outcome = dispatcher
            .send_with_attempts("http://x", &request(), 0)
            .await;

        assert!(outcome.is_success());
        assert_eq!(dispatcher.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null_payload() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(204, ""))]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Success {
                payload: serde_json::Value::Null
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_not_retried() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Ok(RawResponse::new(200, "<html>"))]),
            fast_policy(3),
        );

        let outcome = dispatcher.send("http://x", &request()).await;

        assert_eq!(dispatcher.transport().calls(), 1);
        match outcome {
            DispatchOutcome::NetworkFailure { cause } => {
                assert!(cause.starts_with("malformed response body"));
            }
            other => panic!("Expected NetworkFailure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![
                Err(TransportError::Connect("refused".to_string())),
                Err(TransportError::Connect("refused".to_string())),
                Ok(RawResponse::new(200, r#"{"answer":"late"}"#)),
            ]),
            RetryPolicy::default(),
        );

        let start = tokio::time::Instant::now();
        let outcome = dispatcher.send("http://x", &request()).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert_eq!(dispatcher.transport().calls(), 3);

        // 2^attempt * 1000 base, each with jitter in [0, 1000)
        let gaps = dispatcher.transport().gaps();
        assert_eq!(gaps.len(), 2);
        assert!(gaps[0] >= Duration::from_millis(1000), "{gaps:?}");
        assert!(gaps[0] < Duration::from_millis(2000), "{gaps:?}");
        assert!(gaps[1] >= Duration::from_millis(2000), "{gaps:?}");
        assert!(gaps[1] < Duration::from_millis(3000), "{gaps:?}");

        assert!(elapsed >= Duration::from_millis(3000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(5000), "{elapsed:?}");
    }
}
