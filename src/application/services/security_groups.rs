//! Security-group provisioning: create-if-absent with rule attachment.
//!
//! Identity is (name, VPC); lookup-before-create keeps repeated runs from
//! ever creating a second group. Groups are created once per VPC and reused
//! indefinitely — nothing here deletes them.

use anyhow::{Context, Result};

use crate::application::ports::{Ec2Api, PeerRef, SecurityGroupSpec};

/// Ensure the group named in `spec` exists in `vpc_id` and return its id.
///
/// An existing group is returned unchanged — no rules are touched. A
/// duplicate-create error is a benign race with a concurrent run: the winner
/// already attached the rules, so the loser re-looks-up and returns the
/// winner's id. Every other cloud error aborts the run; cleanup is the
/// caller's responsibility.
///
/// # Errors
///
/// Returns an error for any cloud failure other than the duplicate race.
pub async fn ensure_security_group(
    ec2: &impl Ec2Api,
    vpc_id: &str,
    spec: &SecurityGroupSpec<'_>,
) -> Result<String> {
    tracing::info!("checking {} security group exists", spec.name);
    if let Some(group_id) = ec2
        .find_security_group(spec.name, vpc_id)
        .await
        .with_context(|| format!("looking up security group {}", spec.name))?
    {
        tracing::info!("found {} security group {group_id}", spec.name);
        return Ok(group_id);
    }

    tracing::info!("creating {} security group", spec.name);
    let group_id = match ec2
        .create_security_group(spec.name, spec.description, vpc_id)
        .await
    {
        Ok(group_id) => group_id,
        Err(err) if err.is_duplicate() => {
            tracing::info!("{} was created concurrently, reusing it", spec.name);
            return ec2
                .find_security_group(spec.name, vpc_id)
                .await?
                .with_context(|| {
                    format!("security group {} vanished after duplicate-create race", spec.name)
                });
        }
        Err(err) => {
            return Err(anyhow::Error::new(err))
                .with_context(|| format!("creating security group {}", spec.name));
        }
    };

    let peer = match spec.peer {
        PeerRef::Group(id) => id,
        PeerRef::SelfGroup => group_id.as_str(),
    };

    if spec.lockdown_egress {
        ec2.revoke_default_egress(&group_id)
            .await
            .with_context(|| format!("revoking default egress on {group_id}"))?;
        ec2.authorize_egress(&group_id, peer, spec.port_range, spec.description)
            .await
            .with_context(|| format!("authorizing egress on {group_id}"))?;
    }
    ec2.authorize_ingress(&group_id, peer, spec.port_range, spec.description)
        .await
        .with_context(|| format!("authorizing ingress on {group_id}"))?;

    tracing::info!("security group id: {group_id}");
    Ok(group_id)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
