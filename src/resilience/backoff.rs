//! Exponential backoff with jitter for notification delivery.

use std::time::Duration;

use rand::Rng;

use crate::config::EmailConfig;

/// Delay policy between delivery attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            base: Duration::from_millis(config.base_delay_ms),
            max: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Wait before retrying after failed attempt `attempt` (1-based).
    ///
    /// Doubles from `base`, capped at `max`, plus up to 10% jitter so queued
    /// notifications do not retry in lockstep.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        let capped = self.base.saturating_mul(factor).min(self.max);

        let jitter_ms = capped.as_millis() as u64 / 10;
        let jitter = if jitter_ms > 0 {
            rand::thread_rng().gen_range(0..jitter_ms)
        } else {
            0
        };

        capped + Duration::from_millis(jitter)
    }
}
