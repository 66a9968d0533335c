//! Local docker client context activation with its retry discipline.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{ContextStore, DaemonEndpoint};
use crate::domain::error::ContextError;
use crate::domain::host;

/// Switch attempts before giving up. Exhaustion fails the whole run.
pub const SWITCH_ATTEMPTS: u32 = 5;

/// Local client state may not reflect a just-created context immediately.
const CREATE_SETTLE: Duration = Duration::from_secs(2);

/// Delay between failed switch attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Create the named TLS context for `endpoint` and make it the active one.
///
/// The switch is retried on any non-zero exit status, up to
/// [`SWITCH_ATTEMPTS`] times. Exhaustion surfaces as an error — the caller
/// is left with a healthy, running host whose record is already persisted
/// but no active context pointing at it.
///
/// # Errors
///
/// Returns an error when the context cannot be created, or the switch never
/// exits zero within the retry budget.
pub async fn activate(contexts: &impl ContextStore, endpoint: &DaemonEndpoint<'_>) -> Result<()> {
    let name = host::context_name(endpoint.instance_type, endpoint.instance_id);
    contexts
        .create(&name, endpoint)
        .await
        .with_context(|| format!("creating docker context {name}"))?;
    tokio::time::sleep(CREATE_SETTLE).await;

    for attempt in 1..=SWITCH_ATTEMPTS {
        let status = contexts
            .switch(&name)
            .await
            .with_context(|| format!("switching docker context to {name}"))?;
        if status.success() {
            tracing::info!("docker context {name} is active");
            return Ok(());
        }
        tracing::error!(
            "unable to switch context (exit code {:?}, attempt {attempt}/{SWITCH_ATTEMPTS}), retrying",
            status.code()
        );
        if attempt < SWITCH_ATTEMPTS {
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }
    Err(ContextError::SwitchExhausted {
        name,
        attempts: SWITCH_ATTEMPTS,
    }
    .into())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
