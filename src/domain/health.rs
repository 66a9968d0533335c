//! Health verification domain types.

use std::time::Duration;

/// Default wait between health probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default total budget for health verification.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(720);

/// Retry discipline for the health poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between consecutive probes.
    pub interval: Duration,
    /// Consecutive failures after which the poller gives up.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Derive `max_attempts` from a total budget: `budget / interval`,
    /// with a floor of one attempt.
    #[must_use]
    pub fn from_budget(interval: Duration, budget: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            u32::try_from(budget.as_secs() / interval.as_secs().max(1)).unwrap_or(u32::MAX)
        };
        Self {
            interval,
            max_attempts: attempts.max(1),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_budget(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_BUDGET)
    }
}

/// Outcome of one health-verification run. Probe failures never escape the
/// poller; they are folded into this status.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Probes issued, including the successful one if any.
    pub attempts: u32,
    /// Detail of the last failed probe, when unhealthy.
    pub last_error: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn healthy(attempts: u32) -> Self {
        Self {
            healthy: true,
            attempts,
            last_error: None,
        }
    }

    #[must_use]
    pub fn exhausted(attempts: u32, last_error: Option<String>) -> Self {
        Self {
            healthy: false,
            attempts,
            last_error,
        }
    }
}
