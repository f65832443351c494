//! Session State
//!
//! UI-facing state for one session and the reducer that moves it between
//! submissions. The reducer does no I/O: every transition is a plain
//! [`SessionState::apply`] call, so the whole state machine can be driven
//! from a test without a transport or a surface.
//!
//! ```text
//! Idle ──submit──▶ Validating ──bad input──▶ Idle (error set)
//!                      │
//!                      └──SubmitStarted──▶ Dispatching ──Resolved──▶ Idle
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchOutcome;
use crate::messages::{ChatMessage, SessionId, SessionUpdate};
use crate::reconcile;
use crate::strings::Locale;

/// How input is interpreted and results are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Raw JSON in, one pretty-printed response out
    #[default]
    SingleShot,
    /// Text in, append-only transcript out
    Chat,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleShot => write!(f, "single_shot"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single_shot" | "single" | "json" => Ok(Self::SingleShot),
            "chat" => Ok(Self::Chat),
            other => Err(format!(
                "unknown mode '{other}' (expected 'single_shot' or 'chat')"
            )),
        }
    }
}

/// Last single-shot response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseView {
    /// Payload exactly as received
    pub payload: serde_json::Value,
    /// Pretty-printed value picked for display
    pub display: String,
}

/// Events that drive the session reducer
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Input was rejected before anything was sent
    ValidationFailed {
        /// Banner text, or `None` to reject silently
        error: Option<String>,
    },
    /// Input was accepted and is about to be dispatched
    SubmitStarted {
        /// Raw user input
        input: String,
    },
    /// The dispatcher came back
    Resolved {
        /// What it returned
        outcome: DispatchOutcome,
    },
}

/// State owned by one session controller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session ID
    pub id: SessionId,
    /// Interpretation mode
    mode: SessionMode,
    /// Language for generated text
    locale: Locale,
    /// A request is in flight
    pending: bool,
    /// Current error banner
    last_error: Option<String>,
    /// Single-shot result
    last_response: Option<ResponseView>,
    /// Chat history, append-only
    transcript: Vec<ChatMessage>,
}

impl SessionState {
    /// Create an empty session
    pub fn new(mode: SessionMode, locale: Locale) -> Self {
        Self {
            id: SessionId::new(),
            mode,
            locale,
            pending: false,
            last_error: None,
            last_response: None,
            transcript: Vec::new(),
        }
    }

    /// Interpretation mode
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Language for generated text
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Whether a request is in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Current error banner
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Last single-shot response
    pub fn last_response(&self) -> Option<&ResponseView> {
        self.last_response.as_ref()
    }

    /// Chat transcript in display order
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Apply one event and return the updates a surface should render
    pub fn apply(&mut self, event: SessionEvent) -> Vec<SessionUpdate> {
        match event {
            SessionEvent::ValidationFailed { error } => self.on_validation_failed(error),
            SessionEvent::SubmitStarted { input } => self.on_submit_started(input),
            SessionEvent::Resolved { outcome } => self.on_resolved(outcome),
        }
    }

    fn on_validation_failed(&mut self, error: Option<String>) -> Vec<SessionUpdate> {
        match error {
            Some(error) => {
                self.last_error = Some(error.clone());
                vec![SessionUpdate::Error { error: Some(error) }]
            }
            None => Vec::new(),
        }
    }

    fn on_submit_started(&mut self, input: String) -> Vec<SessionUpdate> {
        if self.pending {
            tracing::warn!(session = %self.id.0, "Submit started while pending, ignoring");
            return Vec::new();
        }

        let mut updates = Vec::with_capacity(3);

        if self.mode == SessionMode::Chat {
            updates.push(self.append(ChatMessage::user(input)));
        }

        self.pending = true;
        updates.push(SessionUpdate::Pending { pending: true });

        if self.last_error.take().is_some() {
            updates.push(SessionUpdate::Error { error: None });
        }

        updates
    }

    fn on_resolved(&mut self, outcome: DispatchOutcome) -> Vec<SessionUpdate> {
        if !self.pending {
            tracing::warn!(session = %self.id.0, "Resolution without a pending submit, ignoring");
            return Vec::new();
        }

        let mut updates = match self.mode {
            SessionMode::SingleShot => self.resolve_single_shot(&outcome),
            SessionMode::Chat => self.resolve_chat(&outcome),
        };

        self.pending = false;
        updates.push(SessionUpdate::Pending { pending: false });
        updates.push(SessionUpdate::Resolved { outcome });
        updates
    }

    fn resolve_single_shot(&mut self, outcome: &DispatchOutcome) -> Vec<SessionUpdate> {
        match outcome {
            DispatchOutcome::Success { payload } => {
                let display = reconcile::single_shot_display(payload);
                self.last_response = Some(ResponseView {
                    payload: payload.clone(),
                    display: display.clone(),
                });
                vec![SessionUpdate::ResponseUpdated { display }]
            }
            failure => {
                let error = self.describe_failure(failure);
                self.last_error = Some(error.clone());
                vec![SessionUpdate::Error { error: Some(error) }]
            }
        }
    }

    fn resolve_chat(&mut self, outcome: &DispatchOutcome) -> Vec<SessionUpdate> {
        let strings = self.locale.strings();
        let message = match outcome {
            DispatchOutcome::Success { payload } => {
                let text = reconcile::chat_answer(payload)
                    .unwrap_or_else(|| strings.empty_answer.to_string());
                ChatMessage::agent(text).with_source_count(reconcile::source_count(payload))
            }
            failure => ChatMessage::agent_error(strings.tag_error(&self.describe_failure(failure))),
        };
        vec![self.append(message)]
    }

    fn describe_failure(&self, outcome: &DispatchOutcome) -> String {
        let strings = self.locale.strings();
        match outcome {
            DispatchOutcome::HttpFailure {
                status,
                body_excerpt,
                ..
            } => strings.format_http_failure(*status, body_excerpt),
            DispatchOutcome::NetworkFailure { cause } => strings.format_network_failure(cause),
            DispatchOutcome::Success { .. } => String::new(),
        }
    }

    fn append(&mut self, message: ChatMessage) -> SessionUpdate {
        self.transcript.push(message.clone());
        SessionUpdate::MessageAppended { message }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionMode::default(), Locale::default())
    }
}
