//! Host termination and the rollback path for unhealthy hosts.

use anyhow::{Context, Result};

use crate::application::ports::{ContextStore, Ec2Api, HostStateStore};
use crate::domain::error::ConfigError;
use crate::domain::host::HostRecord;

/// Terminate `instance_id`, then clean up local client state.
///
/// The local cleanup — reset the active context to default, remove every
/// context whose name contains the instance id — runs unconditionally, even
/// when the terminate call fails. The terminate outcome is surfaced only
/// after cleanup completed.
///
/// # Errors
///
/// Returns the terminate call's error, if any.
pub async fn terminate_host(
    ec2: &impl Ec2Api,
    contexts: &impl ContextStore,
    instance_id: &str,
) -> Result<()> {
    let result = ec2.terminate_instance(instance_id).await;
    if let Err(err) = &result {
        tracing::error!("terminate call for {instance_id} failed: {err:#}");
    }
    cleanup_contexts(contexts, instance_id).await;
    result.with_context(|| format!("terminating instance {instance_id}"))
}

/// Terminate the host named by the persisted record and return the record
/// for reporting. The record itself is left in place; the terminate API is
/// idempotent for already-gone instance ids.
///
/// # Errors
///
/// Returns [`ConfigError::NoActiveHost`] when no record exists, or the
/// terminate call's error.
pub async fn terminate_current(
    ec2: &impl Ec2Api,
    contexts: &impl ContextStore,
    store: &impl HostStateStore,
) -> Result<HostRecord> {
    let record = store
        .load()
        .await
        .context("reading active host record")?
        .ok_or(ConfigError::NoActiveHost)?;
    terminate_host(ec2, contexts, &record.instance_id).await?;
    Ok(record)
}

/// Roll back a host that never became healthy. The caller is already on a
/// failure path, so the terminate outcome is logged and swallowed — local
/// cleanup must not be blocked by it.
pub async fn rollback(ec2: &impl Ec2Api, contexts: &impl ContextStore, instance_id: &str) {
    if terminate_host(ec2, contexts, instance_id).await.is_err() {
        tracing::error!("rollback of {instance_id} could not confirm termination");
    }
}

/// Context cleanup failures are logged, never escalated: nothing here may
/// mask the terminate outcome.
async fn cleanup_contexts(contexts: &impl ContextStore, instance_id: &str) {
    tracing::info!("resetting docker context to default");
    if let Err(err) = contexts.switch_default().await {
        tracing::error!("switching to default context failed: {err:#}");
    }
    if let Err(err) = contexts.remove_matching(instance_id).await {
        tracing::error!("removing contexts matching {instance_id} failed: {err:#}");
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
