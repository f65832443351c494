//! askdesk - terminal surface
//!
//! Sends prompts to the configured answer endpoint and prints what comes back.
//!
//! # Usage
//!
//! ```bash
//! # One JSON query, pretty-printed result
//! askdesk --endpoint http://localhost:7071/api/ask '{"question": "What is KnowledgeBot?"}'
//!
//! # Chat, one prompt per stdin line
//! askdesk --mode chat
//!
//! # With verbose logging
//! RUST_LOG=debug askdesk --mode chat
//! ```
//!
//! # Environment Variables
//!
//! - `ASKDESK_ENDPOINT`: Answer endpoint URL
//! - `ASKDESK_MODE`: `single_shot` or `chat`
//! - `ASKDESK_LOCALE`: `en` or `ja`
//! - `ASKDESK_MAX_ATTEMPTS`: Dispatch attempts per request
//! - `ASKDESK_TIMEOUT_SECS`: Per-attempt timeout
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Files
//!
//! - Config: `$XDG_CONFIG_HOME/askdesk/askdesk.toml`

mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use askdesk_core::{
    default_config_path, load_config_from_path, ConfigOverrides, ControllerSettings,
    Dispatcher, HttpTransport, Locale, SessionController, SessionMode, SessionUpdate, SubmitError,
};

use crate::render::{render_update, Line, DEFAULT_WIDTH};

/// Log directives used when `RUST_LOG` is unset or unusable
const DEFAULT_LOG_DIRECTIVES: &str = "askdesk=info,askdesk_core=info";

/// `RUST_LOG` wins outright; the defaults only apply without it
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

#[derive(Debug, Parser)]
#[command(name = "askdesk", version, about = "Ask the answer endpoint from a terminal")]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Answer endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Input mode: single_shot or chat
    #[arg(long)]
    mode: Option<SessionMode>,

    /// Display language: en or ja
    #[arg(long)]
    locale: Option<Locale>,

    /// Dispatch attempts per request
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Wrap width for chat replies
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,

    /// Submit this input once and exit; otherwise read stdin line by line
    input: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref endpoint) = self.endpoint {
            overrides = overrides.with_endpoint(endpoint.clone());
        }
        if let Some(mode) = self.mode {
            overrides = overrides.with_mode(mode);
        }
        if let Some(locale) = self.locale {
            overrides = overrides.with_locale(locale);
        }
        if let Some(max_attempts) = self.max_attempts {
            overrides = overrides.with_max_attempts(max_attempts);
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so answers on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);

    let settings = ControllerSettings::from_config(&config)
        .context("No usable endpoint; pass --endpoint or set ASKDESK_ENDPOINT")?;
    info!(
        endpoint = %settings.endpoint,
        mode = %settings.mode,
        max_attempts = config.retry.max_attempts,
        "Starting askdesk"
    );

    let transport =
        HttpTransport::new(config.request_timeout).context("Failed to build HTTP client")?;
    let dispatcher = Dispatcher::new(transport, config.retry.clone());

    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<SessionUpdate>();
    let controller = SessionController::new(dispatcher, settings).with_updates(update_tx);

    let width = args.width;
    let printer = tokio::spawn(async move {
        let mut failed = false;
        while let Some(update) = update_rx.recv().await {
            if let SessionUpdate::Resolved { ref outcome } = update {
                failed = !outcome.is_success();
            }
            match render_update(&update, width) {
                Some(Line::Out(text)) => println!("{text}"),
                Some(Line::Err(text)) => eprintln!("{text}"),
                None => {}
            }
        }
        failed
    });

    let mut rejected = false;
    match args.input {
        Some(ref input) => rejected = !submit(&controller, input).await,
        None => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                submit(&controller, &line).await;
            }
        }
    }

    // Dropping the controller closes the update channel
    drop(controller);
    let failed = printer.await.context("Update printer panicked")?;

    if args.input.is_some() && (rejected || failed) {
        anyhow::bail!("request did not succeed");
    }
    Ok(())
}

/// Submit one input; `false` if it was rejected before dispatch
async fn submit(controller: &SessionController<HttpTransport>, input: &str) -> bool {
    match controller.submit(input).await {
        Ok(()) => true,
        Err(SubmitError::EmptyInput) => {
            debug!("Skipping empty input");
            false
        }
        Err(e) => {
            debug!(error = %e, "Input rejected");
            false
        }
    }
}
