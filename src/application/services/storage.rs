//! Mount-target access: ensure the storage-access group is attached.

use anyhow::{Context, Result};

use crate::application::ports::EfsApi;

/// Ensure `new_group` is part of the mount target's security-group set.
///
/// A no-op (zero mutating calls) when the group is already attached.
/// Otherwise the set is replaced with the union — a last-write-wins replace,
/// not an atomic add, so concurrent runs can lose each other's additions.
///
/// # Errors
///
/// Returns an error when the replace call fails.
pub async fn ensure_mount_access(
    efs: &impl EfsApi,
    mount_target_id: &str,
    current: &[String],
    new_group: &str,
) -> Result<()> {
    if current.iter().any(|g| g == new_group) {
        tracing::info!("{new_group} already attached to {mount_target_id}");
        return Ok(());
    }
    let mut groups = current.to_vec();
    groups.push(new_group.to_string());
    efs.replace_mount_target_security_groups(mount_target_id, &groups)
        .await
        .with_context(|| format!("attaching {new_group} to mount target {mount_target_id}"))
}

// ── Unit tests ───────────────────────────────────────────────────────────────
