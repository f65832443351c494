//! Request Dispatch
//!
//! Everything needed to get one JSON request to the answer endpoint and one
//! [`DispatchOutcome`] back, retrying transient failures on the way.
//!
//! # Usage
//!
//! ```ignore
//! use askdesk_core::dispatch::{Dispatcher, HttpTransport, RequestSpec, RetryPolicy};
//!
//! let transport = HttpTransport::new(DEFAULT_REQUEST_TIMEOUT)?;
//! let dispatcher = Dispatcher::new(transport, RetryPolicy::default());
//! let outcome = dispatcher
//!     .send("https://example.com/ask", &RequestSpec::new(json!({"prompt": "hi"})))
//!     .await;
//! ```

mod dispatcher;
mod http;
mod retry;
mod traits;

pub use dispatcher::Dispatcher;
pub use http::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_JITTER_MS};
pub use traits::{
    excerpt, DispatchOutcome, RawResponse, RequestSpec, Transport, TransportError,
    BODY_EXCERPT_CHARS, RETRIES_EXHAUSTED,
};
