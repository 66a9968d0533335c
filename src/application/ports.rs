//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::ExitStatus;

use anyhow::Result;

use crate::domain::config::Tag;
use crate::domain::error::CloudApiError;
use crate::domain::host::HostRecord;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Peer reference for a security-group rule: an existing group, or the group
/// being created itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRef<'a> {
    Group(&'a str),
    SelfGroup,
}

/// Parameters for ensuring one security group exists with its rules.
#[derive(Debug, Clone)]
pub struct SecurityGroupSpec<'a> {
    /// Group name; identity is (name, VPC).
    pub name: &'a str,
    pub description: &'a str,
    /// Source of the ingress rule (and egress rule under lockdown).
    pub peer: PeerRef<'a>,
    /// Inclusive TCP port range the rules cover.
    pub port_range: (u16, u16),
    /// Replace the default allow-all egress with a rule scoped like the
    /// ingress rule. Used for the storage-access group, which must only
    /// reach the storage service.
    pub lockdown_egress: bool,
}

/// One-shot launch parameters. Built fresh per launch, never persisted.
#[derive(Debug, Clone)]
pub struct LaunchSpec<'a> {
    pub image_id: &'a str,
    pub instance_type: &'a str,
    pub security_group_ids: &'a [String],
    pub subnet_id: &'a str,
    pub key_name: Option<&'a str>,
    pub instance_profile_arn: Option<&'a str>,
    pub tags: &'a [Tag],
    pub volume_size_gb: u32,
    /// Opaque bootstrap payload handed to the instance as user data.
    pub user_data: &'a str,
}

/// The launch API's acknowledgment of a new instance. The instance's
/// bootstrap runs asynchronously after this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedInstance {
    pub instance_id: String,
    pub private_dns: String,
}

/// Address of a remote docker daemon plus the identity needed to resolve its
/// credential paths (see `domain::host`).
#[derive(Debug, Clone, Copy)]
pub struct DaemonEndpoint<'a> {
    pub dns: &'a str,
    pub port: u16,
    pub instance_type: &'a str,
    pub instance_id: &'a str,
}

// ── Cloud API Ports ───────────────────────────────────────────────────────────

/// Compute and network-policy operations.
#[allow(async_fn_in_trait)]
pub trait Ec2Api {
    /// Look up a security group by (name, VPC). `Ok(None)` when absent.
    async fn find_security_group(&self, name: &str, vpc_id: &str) -> Result<Option<String>>;

    /// Create a security group and return its id. The typed error lets
    /// callers recognize a duplicate-create race.
    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, CloudApiError>;

    /// Authorize a TCP ingress rule from `peer_group_id`.
    async fn authorize_ingress(
        &self,
        group_id: &str,
        peer_group_id: &str,
        port_range: (u16, u16),
        description: &str,
    ) -> Result<()>;

    /// Authorize a TCP egress rule to `peer_group_id`.
    async fn authorize_egress(
        &self,
        group_id: &str,
        peer_group_id: &str,
        port_range: (u16, u16),
        description: &str,
    ) -> Result<()>;

    /// Revoke the default allow-all egress rule.
    async fn revoke_default_egress(&self, group_id: &str) -> Result<()>;

    /// Whether the instance type carries an accelerator capability.
    async fn instance_has_gpu(&self, instance_type: &str) -> Result<bool>;

    /// Launch exactly one instance. Callers must never retry this call: a
    /// retry risks a duplicate launch.
    async fn run_instance(&self, spec: &LaunchSpec<'_>) -> Result<LaunchedInstance>;

    /// Terminate an instance by id.
    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;
}

/// Shared-filesystem mount-target operations.
#[allow(async_fn_in_trait)]
pub trait EfsApi {
    /// Replace the mount target's security-group set (last write wins).
    async fn replace_mount_target_security_groups(
        &self,
        mount_target_id: &str,
        groups: &[String],
    ) -> Result<()>;
}

// ── Health Probe Port ─────────────────────────────────────────────────────────

/// One mutually-authenticated TLS request to the remote daemon's version
/// endpoint. A missing credential file is an ordinary probe failure — the
/// bootstrap writes credentials out of band onto the shared filesystem.
#[allow(async_fn_in_trait)]
pub trait DaemonProbe {
    async fn probe(&self, endpoint: &DaemonEndpoint<'_>) -> Result<()>;
}

// ── Client Context Port ───────────────────────────────────────────────────────

/// Local docker client context management. Every operation is an external
/// process whose exit status is the only feedback channel; output goes to
/// the log file and is never parsed by this process.
#[allow(async_fn_in_trait)]
pub trait ContextStore {
    /// Create a named context pointing at the remote TLS endpoint.
    async fn create(&self, name: &str, endpoint: &DaemonEndpoint<'_>) -> Result<ExitStatus>;

    /// Switch the active context to `name`.
    async fn switch(&self, name: &str) -> Result<ExitStatus>;

    /// Reset the active context to the default one.
    async fn switch_default(&self) -> Result<ExitStatus>;

    /// Remove every context whose name contains `needle`.
    async fn remove_matching(&self, needle: &str) -> Result<ExitStatus>;
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Persistence for the single active-host record.
#[allow(async_fn_in_trait)]
pub trait HostStateStore {
    /// Load the current record, `None` when no host was ever recorded.
    async fn load(&self) -> Result<Option<HostRecord>>;

    /// Persist `record`, overwriting any previous one.
    async fn save(&self, record: &HostRecord) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit milestones without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
