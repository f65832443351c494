//! Askdesk Core - Headless Request Dispatch for askdesk
//!
//! This crate holds everything askdesk does that is not drawing pixels:
//! sending a prompt to the answer endpoint with retries, and folding the
//! answer (or the failure) into session state a view can render. It can
//! drive a browser view, a terminal, or a test harness.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surfaces                              │
//! │     ┌──────────┐    ┌──────────┐    ┌───────────────────┐     │
//! │     │ Browser  │    │   CLI    │    │ Tests / Headless  │     │
//! │     └────┬─────┘    └────┬─────┘    └─────────┬─────────┘     │
//! │          └───────────────┴────────────────────┘               │
//! │                 submit(raw)  ▲  SessionUpdate                 │
//! └──────────────────────────────┼────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼────────────────────────────────┐
//! │                       ASKDESK CORE                            │
//! │  ┌───────────────────────────┴─────────────────────────────┐  │
//! │  │                  SessionController                       │  │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐ │  │
//! │  │   │ SessionState │   │  reconcile   │   │ Dispatcher  │ │  │
//! │  │   │  (reducer)   │   │ (payload→UI) │   │  (retries)  │ │  │
//! │  │   └──────────────┘   └──────────────┘   └──────┬──────┘ │  │
//! │  └────────────────────────────────────────────────┼────────┘  │
//! └───────────────────────────────────────────────────┼───────────┘
//!                                                     ▼
//!                                           POST <endpoint> (JSON)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use askdesk_core::{
//!     load_config, ControllerSettings, Dispatcher, HttpTransport, SessionController,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let transport = HttpTransport::new(config.request_timeout)?;
//!     let dispatcher = Dispatcher::new(transport, config.retry.clone());
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let controller = SessionController::new(dispatcher, ControllerSettings::from_config(&config)?)
//!         .with_updates(tx);
//!
//!     controller.submit(r#"{"question": "What is KnowledgeBot?"}"#).await?;
//!     while let Ok(update) = rx.try_recv() {
//!         // Render update
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`dispatch`]: Transport trait, HTTP transport, retry policy, dispatcher
//! - [`session`]: Session state and its reducer
//! - [`controller`]: Session controller (validation, dispatch, resolution)
//! - [`reconcile`]: Payload-to-display extraction
//! - [`messages`]: Transcript entries and surface updates
//! - [`strings`]: Localized text
//! - [`config`]: TOML/env configuration
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod messages;
pub mod reconcile;
pub mod session;
pub mod strings;

// Re-exports for convenience
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, AskdeskConfig,
    AskdeskToml, ConfigError, ConfigOverrides, ConfigSource,
};
pub use controller::{
    build_request, ControllerSettings, SessionController, SubmitError, SUBMIT_CANCELLED,
};
pub use dispatch::{
    DispatchOutcome, Dispatcher, HttpTransport, RawResponse, RequestSpec, RetryPolicy, Transport,
    TransportError,
};
pub use messages::{ChatMessage, MessageId, MessageKind, Sender, SessionId, SessionUpdate};
pub use session::{ResponseView, SessionEvent, SessionMode, SessionState};
pub use strings::{Locale, Strings};
