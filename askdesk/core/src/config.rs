//! TOML Configuration File Support
//!
//! Loads client configuration from `~/.config/askdesk/askdesk.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [endpoint]
//! url = "https://us-central1-example.cloudfunctions.net/rag_api_handler"
//! request_timeout_secs = 60
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! max_jitter_ms = 1000
//!
//! [session]
//! mode = "chat"
//! locale = "ja"
//! max_input_chars = 32768
//! ```
//!
//! # Environment Variables
//!
//! - `ASKDESK_ENDPOINT`: endpoint URL
//! - `ASKDESK_TIMEOUT_SECS`: per-attempt timeout
//! - `ASKDESK_MAX_ATTEMPTS`: attempts per request
//! - `ASKDESK_MODE`: `single_shot` or `chat`
//! - `ASKDESK_LOCALE`: `en` or `ja`

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{RetryPolicy, DEFAULT_REQUEST_TIMEOUT};
use crate::session::SessionMode;
use crate::strings::Locale;

/// Default cap on input length, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 32768;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Endpoint section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointToml {
    /// Answer endpoint URL
    pub url: Option<String>,

    /// Per-attempt timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Retry section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryToml {
    /// Attempts per request, first try included
    pub max_attempts: Option<u32>,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: Option<u64>,

    /// Jitter upper bound in milliseconds
    pub max_jitter_ms: Option<u64>,
}

/// Session section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Input interpretation mode
    pub mode: Option<SessionMode>,

    /// Display language
    pub locale: Option<Locale>,

    /// Maximum input length in characters
    pub max_input_chars: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AskdeskToml {
    /// Endpoint configuration section
    pub endpoint: EndpointToml,

    /// Retry configuration section
    pub retry: RetryToml,

    /// Session configuration section
    pub session: SessionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct AskdeskConfig {
    /// Answer endpoint URL (deployment-time constant)
    pub endpoint: Option<String>,

    /// Per-attempt transport timeout
    pub request_timeout: Duration,

    /// Retry policy for the dispatcher
    pub retry: RetryPolicy,

    /// Input interpretation mode
    pub mode: SessionMode,

    /// Display language
    pub locale: Locale,

    /// Maximum input length in characters
    pub max_input_chars: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for AskdeskConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            mode: SessionMode::default(),
            locale: Locale::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl AskdeskConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Validated endpoint URL
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or it is not an
    /// `http`/`https` URL.
    pub fn endpoint_url(&self) -> Result<&str, ConfigError> {
        let raw = self.endpoint.as_deref().ok_or_else(|| {
            ConfigError::ValidationError(
                "no endpoint configured (set [endpoint] url or ASKDESK_ENDPOINT)".to_string(),
            )
        })?;

        let url = reqwest::Url::parse(raw)
            .map_err(|e| ConfigError::ValidationError(format!("endpoint '{raw}': {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(raw),
            other => Err(ConfigError::ValidationError(format!(
                "endpoint '{raw}': unsupported scheme '{other}'"
            ))),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/askdesk/askdesk.toml` or
/// `~/.config/askdesk/askdesk.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("askdesk").join("askdesk.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<AskdeskConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then apply the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AskdeskConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or holds an invalid value.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<AskdeskConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AskdeskConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: AskdeskToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut AskdeskConfig, toml: &AskdeskToml) -> Result<(), ConfigError> {
    if toml.endpoint.url.is_some() {
        config.endpoint = toml.endpoint.url.clone();
    }
    if let Some(secs) = toml.endpoint.request_timeout_secs {
        if secs == 0 {
            return Err(ConfigError::ValidationError(
                "endpoint.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(attempts) = toml.retry.max_attempts {
        if attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        config.retry.max_attempts = attempts;
    }
    if let Some(delay) = toml.retry.base_delay_ms {
        config.retry.base_delay_ms = delay;
    }
    if let Some(jitter) = toml.retry.max_jitter_ms {
        config.retry.max_jitter_ms = jitter;
    }

    if let Some(mode) = toml.session.mode {
        config.mode = mode;
    }
    if let Some(locale) = toml.session.locale {
        config.locale = locale;
    }
    if let Some(max) = toml.session.max_input_chars {
        config.max_input_chars = max;
    }

    Ok(())
}

/// Apply environment variable overrides to the config
///
/// Unparseable values are logged and skipped.
fn apply_env_config<F>(config: &mut AskdeskConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("ASKDESK_ENDPOINT") {
        config.endpoint = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("ASKDESK_TIMEOUT_SECS") {
        match timeout.parse::<u64>() {
            Ok(secs) if secs > 0 => {
                config.request_timeout = Duration::from_secs(secs);
                config.source = ConfigSource::Env;
            }
            _ => tracing::warn!(value = %timeout, "Ignoring invalid ASKDESK_TIMEOUT_SECS"),
        }
    }
    if let Some(attempts) = env("ASKDESK_MAX_ATTEMPTS") {
        match attempts.parse::<u32>() {
            Ok(n) if n > 0 => {
                config.retry.max_attempts = n;
                config.source = ConfigSource::Env;
            }
            _ => tracing::warn!(value = %attempts, "Ignoring invalid ASKDESK_MAX_ATTEMPTS"),
        }
    }
    if let Some(mode) = env("ASKDESK_MODE") {
        match mode.parse::<SessionMode>() {
            Ok(m) => {
                config.mode = m;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid ASKDESK_MODE"),
        }
    }
    if let Some(locale) = env("ASKDESK_LOCALE") {
        match locale.parse::<Locale>() {
            Ok(l) => {
                config.locale = l;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid ASKDESK_LOCALE"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,

    /// Mode override
    pub mode: Option<SessionMode>,

    /// Locale override
    pub locale: Option<Locale>,

    /// Attempt budget override
    pub max_attempts: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set mode override
    #[must_use]
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set locale override
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Set attempt budget override
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut AskdeskConfig) {
        if self.endpoint.is_some()
            || self.mode.is_some()
            || self.locale.is_some()
            || self.max_attempts.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
    }
}
