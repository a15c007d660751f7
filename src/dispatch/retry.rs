//! Retry policy for delivery attempts.
//!
//! Encapsulates retry configuration so backoff behavior can be tested and
//! reasoned about independently of the dispatcher.

use std::time::Duration;

use serde::Deserialize;

/// Retry policy for delivery attempts.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of delivery attempts before giving up.
    ///
    /// Default: 3 attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (in seconds).
    ///
    /// The delay after attempt `n` is `base * 2^(n - 1)`: 5s, 10s, 20s, ...
    ///
    /// Default: 5 seconds
    #[serde(default = "defaults::base_delay_secs")]
    pub base_delay_secs: u64,

    /// Maximum delay between attempts (in seconds).
    ///
    /// Caps the exponential backoff to prevent excessively long delays.
    ///
    /// Default: 300 seconds (5 minutes)
    #[serde(default = "defaults::max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_secs: defaults::base_delay_secs(),
            max_delay_secs: defaults::max_delay_secs(),
        }
    }
}

impl RetryPolicy {
    /// Check if another attempt should be made after `attempt_count`
    /// attempts have already failed.
    #[must_use]
    pub const fn should_retry(&self, attempt_count: u32) -> bool {
        attempt_count < self.max_attempts
    }

    /// The backoff delay to sleep after failed attempt number `attempt`
    /// (1-based): `base * 2^(attempt - 1)`, capped at `max_delay_secs`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay = self.base_delay_secs.saturating_mul(1_u64 << exponent);
        Duration::from_secs(delay.min(self.max_delay_secs))
    }

    /// Get the number of remaining attempts after `attempt_count` attempts.
    #[must_use]
    pub const fn remaining_attempts(&self, attempt_count: u32) -> u32 {
        self.max_attempts.saturating_sub(attempt_count)
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn base_delay_secs() -> u64 {
        5
    }

    pub const fn max_delay_secs() -> u64 {
        300 // 5 minutes
    }
}
