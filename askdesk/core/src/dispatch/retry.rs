//! Retry Policy
//!
//! Exponential backoff with additive jitter:
//!
//! ```text
//! delay(attempt) = 2^attempt * base_delay + uniform(0, max_jitter)
//! ```
//!
//! `attempt` is zero-indexed. The only bound is `max_attempts`; there is no
//! overall deadline. A caller that needs one should wrap `send` in
//! `tokio::time::timeout`, which only ever makes the contract stricter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default number of attempts per logical request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay (first retry waits at least this long)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Default upper bound (exclusive) of the random jitter
pub const DEFAULT_MAX_JITTER_MS: u64 = 1000;

/// Retry configuration for dispatched requests
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, first try included
    pub max_attempts: u32,

    /// Delay multiplied by `2^attempt`
    pub base_delay_ms: u64,

    /// Exclusive upper bound of the added jitter (0 = no jitter)
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_jitter_ms: DEFAULT_MAX_JITTER_MS,
        }
    }
}

impl RetryPolicy {
    /// Policy with a different attempt budget and default delays
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Attempts actually performed; zero is treated as one
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Calculate backoff duration for attempt N (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        };
        self.backoff_with_jitter(attempt, jitter)
    }

    /// Deterministic part of the formula, with an explicit jitter sample
    pub fn backoff_with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let base = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(base.saturating_add(jitter_ms))
    }
}
