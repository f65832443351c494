//! Session Controller
//!
//! Runs one request/response cycle at a time and keeps [`SessionState`]
//! consistent:
//!
//! 1. validate input and build the request body,
//! 2. apply `SubmitStarted` (the optimistic user message lands here),
//! 3. dispatch,
//! 4. apply `Resolved`.
//!
//! State is only locked to apply an event, never across an await. Updates
//! are pushed to the surface channel while the lock is held, so the channel
//! order is the state order even when several tasks share one controller.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{AskdeskConfig, ConfigError, DEFAULT_MAX_INPUT_CHARS};
use crate::dispatch::{DispatchOutcome, Dispatcher, RequestSpec, Transport};
use crate::messages::SessionUpdate;
use crate::session::{SessionEvent, SessionMode, SessionState};
use crate::strings::Locale;

/// Key wrapping user JSON in single-shot mode
pub const QUERY_KEY: &str = "query";

/// Key carrying chat text
pub const PROMPT_KEY: &str = "prompt";

/// Failure cause recorded when a submit future is dropped mid-flight
pub const SUBMIT_CANCELLED: &str = "request cancelled";

/// Why a submission was not dispatched
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Another submission is still in flight
    #[error("a request is already in flight")]
    Busy,

    /// Input was empty or whitespace
    #[error("input is empty")]
    EmptyInput,

    /// Single-shot input did not parse as JSON
    #[error("input is not valid JSON: {0}")]
    InvalidJson(String),

    /// Input exceeded the configured length
    #[error("input exceeds {max} characters")]
    InputTooLong {
        /// Configured limit
        max: usize,
    },
}

/// Settings the controller needs besides its dispatcher
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Answer endpoint URL
    pub endpoint: String,
    /// Input interpretation mode
    pub mode: SessionMode,
    /// Display language
    pub locale: Locale,
    /// Maximum input length in characters
    pub max_input_chars: usize,
}

impl ControllerSettings {
    /// Settings with default limits
    pub fn new(endpoint: impl Into<String>, mode: SessionMode) -> Self {
        Self {
            endpoint: endpoint.into(),
            mode,
            locale: Locale::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Set locale
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set input length limit
    #[must_use]
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Pull settings out of a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is missing or invalid.
    pub fn from_config(config: &AskdeskConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: config.endpoint_url()?.to_string(),
            mode: config.mode,
            locale: config.locale,
            max_input_chars: config.max_input_chars,
        })
    }
}

/// Owns one session's state and drives it through submissions
pub struct SessionController<T: Transport> {
    /// Retrying dispatcher
    dispatcher: Dispatcher<T>,
    /// Endpoint and limits
    settings: ControllerSettings,
    /// Session state; only this controller mutates it
    state: Arc<Mutex<SessionState>>,
    /// Channel to the rendering surface
    tx: Option<mpsc::UnboundedSender<SessionUpdate>>,
}

impl<T: Transport> SessionController<T> {
    /// Create a controller with a fresh session
    pub fn new(dispatcher: Dispatcher<T>, settings: ControllerSettings) -> Self {
        let state = SessionState::new(settings.mode, settings.locale);
        Self {
            dispatcher,
            settings,
            state: Arc::new(Mutex::new(state)),
            tx: None,
        }
    }

    /// Publish every state change on `tx`
    #[must_use]
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Whether a request is in flight
    pub fn is_pending(&self) -> bool {
        self.state.lock().is_pending()
    }

    /// Interpretation mode
    pub fn mode(&self) -> SessionMode {
        self.settings.mode
    }

    /// Endpoint requests go to
    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }

    /// Dispatcher in use
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Submit raw user input
    ///
    /// `Ok` means the request was dispatched and its outcome (success or
    /// failure) has been folded into state. `Err` means nothing was sent.
    ///
    /// Dropping the returned future mid-flight (a `timeout`, a losing
    /// `select!` branch, an aborted task) resolves the session with a
    /// [`SUBMIT_CANCELLED`] network failure, so `pending` never sticks.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while another submission is pending (state is
    /// left untouched), or a validation error for unusable input.
    pub async fn submit(&self, raw_input: &str) -> Result<(), SubmitError> {
        let request = self.begin(raw_input)?;
        let in_flight = InFlight {
            controller: self,
            resolved: false,
        };

        tracing::debug!(
            endpoint = %self.settings.endpoint,
            mode = %self.settings.mode,
            "Submitting request"
        );
        let outcome = self.dispatcher.send(&self.settings.endpoint, &request).await;

        match &outcome {
            DispatchOutcome::Success { .. } => tracing::debug!("Request succeeded"),
            DispatchOutcome::HttpFailure { status, .. } => {
                tracing::info!(status, "Request failed with HTTP error");
            }
            DispatchOutcome::NetworkFailure { cause } => {
                tracing::info!(cause = %cause, "Request failed without a response");
            }
        }

        in_flight.resolve(outcome);
        Ok(())
    }

    /// Validate and mark the session pending, all under one lock
    fn begin(&self, raw_input: &str) -> Result<RequestSpec, SubmitError> {
        let mut state = self.state.lock();

        if state.is_pending() {
            tracing::debug!("Rejecting submit while a request is in flight");
            return Err(SubmitError::Busy);
        }

        match build_request(self.settings.mode, raw_input, self.settings.max_input_chars) {
            Ok(request) => {
                self.apply(
                    &mut state,
                    SessionEvent::SubmitStarted {
                        input: raw_input.to_string(),
                    },
                );
                Ok(request)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Rejecting invalid input");
                let error = self.validation_message(&err);
                self.apply(&mut state, SessionEvent::ValidationFailed { error });
                Err(err)
            }
        }
    }

    fn validation_message(&self, err: &SubmitError) -> Option<String> {
        let strings = self.settings.locale.strings();
        match err {
            SubmitError::EmptyInput => match self.settings.mode {
                SessionMode::SingleShot => Some(strings.empty_input.to_string()),
                SessionMode::Chat => None,
            },
            SubmitError::InvalidJson(detail) => Some(strings.format_invalid_json(detail)),
            SubmitError::InputTooLong { max } => Some(strings.format_input_too_long(*max)),
            SubmitError::Busy => None,
        }
    }

    fn apply(&self, state: &mut SessionState, event: SessionEvent) {
        for update in state.apply(event) {
            if let Some(ref tx) = self.tx {
                if tx.send(update).is_err() {
                    tracing::debug!("Surface dropped its update receiver");
                }
            }
        }
    }
}

/// Releases `pending` if a submit is dropped before its outcome lands
struct InFlight<'a, T: Transport> {
    controller: &'a SessionController<T>,
    resolved: bool,
}

impl<T: Transport> InFlight<'_, T> {
    fn resolve(mut self, outcome: DispatchOutcome) {
        self.resolved = true;
        let mut state = self.controller.state.lock();
        self.controller
            .apply(&mut state, SessionEvent::Resolved { outcome });
    }
}

impl<T: Transport> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        tracing::warn!("Submit dropped before resolution, releasing pending state");
        let mut state = self.controller.state.lock();
        self.controller.apply(
            &mut state,
            SessionEvent::Resolved {
                outcome: DispatchOutcome::network_failure(SUBMIT_CANCELLED),
            },
        );
    }
}

/// Turn raw input into the request body for `mode`
///
/// # Errors
///
/// Returns a validation error; nothing about the session is touched.
pub fn build_request(
    mode: SessionMode,
    raw_input: &str,
    max_input_chars: usize,
) -> Result<RequestSpec, SubmitError> {
    if raw_input.trim().is_empty() {
        return Err(SubmitError::EmptyInput);
    }

    if raw_input.chars().count() > max_input_chars {
        return Err(SubmitError::InputTooLong {
            max: max_input_chars,
        });
    }

    let body = match mode {
        SessionMode::SingleShot => {
            let parsed: serde_json::Value = serde_json::from_str(raw_input)
                .map_err(|e| SubmitError::InvalidJson(e.to_string()))?;
            json!({ QUERY_KEY: parsed })
        }
        SessionMode::Chat => json!({ PROMPT_KEY: raw_input }),
    };

    Ok(RequestSpec::new(body))
}
