//! The `create-host` pipeline.
//!
//! One linear run: resolve subnet → security groups → mount access →
//! bootstrap payload → launch → health verification → persist record and
//! activate the local context, or roll the host back when it never became
//! healthy. There is no internal parallelism; every step is a blocking round
//! trip and the health loop may hold the run for its whole budget.

use anyhow::{Context, Result};

use crate::application::ports::{
    ContextStore, DaemonEndpoint, DaemonProbe, Ec2Api, EfsApi, HostStateStore, LaunchSpec,
    PeerRef, ProgressReporter, SecurityGroupSpec,
};
use crate::application::services::{
    context, health_poll, launch, security_groups, storage, terminate,
};
use crate::bootstrap::{BootstrapHooks, UserData};
use crate::domain::config::ProvisioningConfig;
use crate::domain::error::HealthError;
use crate::domain::health::PollPolicy;
use crate::domain::host::HostRecord;

/// Name of the security group guarding the daemon TLS port.
pub const HOST_GROUP_NAME: &str = "DockerHost";

/// Name of the security group guarding storage access.
pub const STORAGE_GROUP_NAME: &str = "EFSDockerHost";

const NFS_PORT: u16 = 2049;

/// Per-invocation inputs assembled by the command layer.
#[derive(Debug, Clone)]
pub struct CreateHostRequest<'a> {
    pub instance_type: &'a str,
    /// Explicit subnet from the CLI, validated against the configured set.
    pub subnet_id: Option<&'a str>,
    /// Effective home directory, shared between the bootstrap payload and
    /// the credential path contract.
    pub home: &'a str,
    pub hooks: &'a BootstrapHooks,
}

/// Provision a new docker host and make it the active one.
///
/// On successful health verification the host record is persisted before the
/// context switch, so a failed switch leaves a usable record behind. On
/// health exhaustion the instance is rolled back and the run fails without
/// ever writing a record.
///
/// # Errors
///
/// Returns an error for invalid configuration, any fatal cloud call, health
/// exhaustion (after rollback), or context-switch exhaustion.
#[allow(clippy::too_many_arguments)] // one port per collaborator, wired by the command layer
pub async fn create_host(
    ec2: &impl Ec2Api,
    efs: &impl EfsApi,
    probe: &impl DaemonProbe,
    contexts: &impl ContextStore,
    store: &impl HostStateStore,
    reporter: &impl ProgressReporter,
    cfg: &ProvisioningConfig,
    policy: &PollPolicy,
    req: &CreateHostRequest<'_>,
) -> Result<HostRecord> {
    let subnet_id = cfg.select_subnet(req.subnet_id)?;

    reporter.step("preparing security groups...");
    let mut security_group_ids = cfg.host_security_groups.clone();
    if security_group_ids.is_empty() {
        let peer = cfg
            .security_groups
            .first()
            .map(String::as_str)
            .context("no client security group configured")?;
        let host_group = security_groups::ensure_security_group(
            ec2,
            &cfg.vpc_id,
            &SecurityGroupSpec {
                name: HOST_GROUP_NAME,
                description: "Docker host security group",
                peer: PeerRef::Group(peer),
                port_range: (0, 65535),
                lockdown_egress: false,
            },
        )
        .await?;
        security_group_ids.push(host_group);
    }
    let storage_group = security_groups::ensure_security_group(
        ec2,
        &cfg.vpc_id,
        &SecurityGroupSpec {
            name: STORAGE_GROUP_NAME,
            description: "EFS security group used with Docker host",
            peer: PeerRef::SelfGroup,
            port_range: (NFS_PORT, NFS_PORT),
            lockdown_egress: true,
        },
    )
    .await?;
    storage::ensure_mount_access(
        efs,
        &cfg.mount_target_id,
        &cfg.mount_target_security_groups,
        &storage_group,
    )
    .await?;
    security_group_ids.push(storage_group);
    reporter.success("security groups ready");

    let runtime = launch::select_runtime_image(ec2, req.instance_type, cfg).await?;
    let user_data = UserData {
        home: req.home,
        efs_ip_address: &cfg.efs_ip_address,
        user_uid: &cfg.user_uid,
        port: cfg.port,
        docker_image: &runtime.image_uri,
        gpu_option: runtime.gpu_option,
        additional_ports: &cfg.additional_ports,
        hooks: req.hooks,
    }
    .render();

    reporter.step("launching docker host...");
    let tags = cfg.launch_tags();
    let launched = launch::launch(
        ec2,
        &LaunchSpec {
            image_id: &cfg.image_id,
            instance_type: req.instance_type,
            security_group_ids: &security_group_ids,
            subnet_id,
            key_name: cfg.key.as_deref(),
            instance_profile_arn: cfg.instance_profile_arn.as_deref(),
            tags: &tags,
            volume_size_gb: cfg.ebs_volume_size_gb,
            user_data: &user_data,
        },
    )
    .await?;
    reporter.success(&format!(
        "launched docker host on instance {} ({})",
        launched.instance_id, launched.private_dns
    ));

    reporter.step("waiting for the docker daemon to come up...");
    let endpoint = DaemonEndpoint {
        dns: &launched.private_dns,
        port: cfg.port,
        instance_type: req.instance_type,
        instance_id: &launched.instance_id,
    };
    let health = health_poll::poll_until_healthy(probe, &endpoint, policy).await;
    if !health.healthy {
        reporter.warn("docker daemon never became reachable; terminating the instance");
        if let Some(detail) = &health.last_error {
            tracing::error!("not able to reach the docker daemon on the host: {detail}");
        }
        terminate::rollback(ec2, contexts, &launched.instance_id).await;
        return Err(HealthError::Exhausted {
            endpoint: format!("{}:{}", launched.private_dns, cfg.port),
            attempts: health.attempts,
        }
        .into());
    }
    reporter.success("docker host is ready");

    let record = HostRecord {
        instance_id: launched.instance_id.clone(),
        instance_dns: launched.private_dns.clone(),
        port: cfg.port,
        instance_type: req.instance_type.to_string(),
    };
    store
        .save(&record)
        .await
        .context("persisting active host record")?;

    context::activate(contexts, &endpoint).await?;
    reporter.success(&format!(
        "docker context now points at {}:{}",
        record.instance_dns, record.port
    ));
    Ok(record)
}
