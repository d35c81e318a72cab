//! Named retry and backoff policies.
//!
//! Fixed delays used while provisioning (service start polling, probe
//! retries, settling time between installs) are expressed as values of
//! [`RetryPolicy`] instead of inline constants, so callers and tests can
//! tune them independently.

use std::time::Duration;

/// A fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Always at least 1.
    pub attempts: u32,
    /// Delay between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `attempts` is raised to 1 if zero.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }

    /// A single attempt with no delay.
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Whether another attempt is allowed after `attempt` (1-based).
    pub const fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.attempts
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn total_delay(&self) -> Duration {
        self.delay * self.attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}
