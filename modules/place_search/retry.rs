use std::time::Duration;

use serde::Deserialize;

use crate::settings::RetrySettings;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Delay doubles per attempt.
    Exponential,
}

/// Bounded retry budget shared by rate limits and transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: Backoff,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Fixed-delay policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
            max_delay: Duration::MAX,
        }
    }

    /// Sets the backoff mode.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Caps every delay.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Builds the policy from `[retry]`.
    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, Duration::from_millis(settings.delay_ms))
            .with_backoff(settings.backoff)
            .with_max_delay(Duration::from_millis(settings.max_delay_ms))
    }

    /// Attempts allowed per page.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt follows `attempt` (1-based).
    #[must_use]
    pub const fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after failed `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(31);
                self.delay.saturating_mul(1_u32 << shift)
            }
        };
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}
