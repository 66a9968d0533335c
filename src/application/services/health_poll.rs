//! Health verification: bounded-retry polling of the remote daemon.

use crate::application::ports::{DaemonEndpoint, DaemonProbe};
use crate::domain::health::{HealthStatus, PollPolicy};

/// Poll the daemon endpoint until one probe succeeds or the retry budget is
/// exhausted. Sleeps `policy.interval` before every probe, so a run that
/// exhausts waits roughly `max_attempts × interval` in total.
///
/// This function never fails past its own boundary: every probe error —
/// network failures and not-yet-materialized credentials alike — is logged
/// and folded into the returned [`HealthStatus`].
pub async fn poll_until_healthy(
    probe: &impl DaemonProbe,
    endpoint: &DaemonEndpoint<'_>,
    policy: &PollPolicy,
) -> HealthStatus {
    let mut last_error = None;
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        tracing::info!("pinging {}:{}", endpoint.dns, endpoint.port);
        match probe.probe(endpoint).await {
            Ok(()) => {
                tracing::info!("docker host {} is healthy", endpoint.dns);
                return HealthStatus::healthy(attempt);
            }
            Err(err) => {
                tracing::error!(
                    "failed to reach {}:{} (attempt {attempt}/{}), retrying in {}s",
                    endpoint.dns,
                    endpoint.port,
                    policy.max_attempts,
                    policy.interval.as_secs()
                );
                last_error = Some(format!("{err:#}"));
            }
        }
    }
    HealthStatus::exhausted(policy.max_attempts, last_error)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
