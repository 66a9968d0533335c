//! Strongly-typed provisioning configuration.
//!
//! The configuration object is immutable for the duration of one run and is
//! validated once at load time; orchestration code never re-checks fields.

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Port the remote docker daemon is published on when none is configured.
pub const DEFAULT_DAEMON_PORT: u16 = 1111;

/// Root EBS volume size in GB when none is configured.
pub const DEFAULT_VOLUME_SIZE_GB: u32 = 400;

/// Daemon container image for CPU instance types.
pub const DEFAULT_CPU_IMAGE: &str = "docker:dind";

/// Daemon container image for GPU instance types.
pub const DEFAULT_GPU_IMAGE: &str = "brandsight/dind:nvidia-docker";

/// Auxiliary port always published alongside the daemon TLS port.
pub const AUX_PORT: u16 = 8080;

// ── Config schema ────────────────────────────────────────────────────────────

/// An instance tag propagated to the launched host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Provisioning configuration, read from `~/.dockhost/config.json`.
///
/// Wire format uses PascalCase keys (`Region`, `VpcId`, `SubnetIds`, …).
/// Optional fields fall back to the documented defaults; required fields are
/// checked by [`ProvisioningConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProvisioningConfig {
    /// Cloud region every API call is issued against.
    pub region: String,
    /// VPC that scopes security-group identity.
    pub vpc_id: String,
    /// Subnets a host may be launched into; the first is the default.
    pub subnet_ids: Vec<String>,
    /// Client-side security groups; the first one is the peer reference for
    /// the host group's ingress rule.
    pub security_groups: Vec<String>,
    /// IP address of the shared filesystem's mount target.
    pub efs_ip_address: String,
    /// Mount target whose access policy is extended with the storage group.
    pub mount_target_id: String,
    /// Security groups currently attached to the mount target.
    pub mount_target_security_groups: Vec<String>,
    /// Filesystem export path component for the current user.
    pub user_uid: String,
    /// AMI the host instance boots from.
    pub image_id: String,
    /// Port the remote daemon's TLS endpoint is published on.
    pub port: u16,
    /// Root EBS volume size in GB.
    #[serde(rename = "EBSVolumeSize")]
    pub ebs_volume_size_gb: u32,
    /// Optional SSH key pair name.
    pub key: Option<String>,
    /// Optional instance profile attached to the host.
    pub instance_profile_arn: Option<String>,
    /// Caller-supplied host security groups; when non-empty, host group
    /// provisioning is skipped entirely.
    #[serde(rename = "HostSGs")]
    pub host_security_groups: Vec<String>,
    /// Daemon container image for CPU instance types.
    #[serde(rename = "DockerImageURI")]
    pub docker_image_uri: String,
    /// Daemon container image for GPU instance types.
    #[serde(rename = "DockerImageNvidiaURI")]
    pub docker_image_nvidia_uri: String,
    /// Extra ports published 1:1 on the host, besides the daemon port and
    /// the fixed auxiliary port.
    pub additional_ports: Vec<u16>,
    /// Tags propagated to the instance (a `Name=DockerHost` tag is appended
    /// at launch).
    pub tags: Vec<Tag>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            vpc_id: String::new(),
            subnet_ids: Vec::new(),
            security_groups: Vec::new(),
            efs_ip_address: String::new(),
            mount_target_id: String::new(),
            mount_target_security_groups: Vec::new(),
            user_uid: String::new(),
            image_id: String::new(),
            port: DEFAULT_DAEMON_PORT,
            ebs_volume_size_gb: DEFAULT_VOLUME_SIZE_GB,
            key: None,
            instance_profile_arn: None,
            host_security_groups: Vec::new(),
            docker_image_uri: DEFAULT_CPU_IMAGE.to_string(),
            docker_image_nvidia_uri: DEFAULT_GPU_IMAGE.to_string(),
            additional_ports: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl ProvisioningConfig {
    /// Check that every required field is present and sane.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("Region", &self.region),
            ("VpcId", &self.vpc_id),
            ("EfsIpAddress", &self.efs_ip_address),
            ("MountTargetId", &self.mount_target_id),
            ("UserUid", &self.user_uid),
            ("ImageId", &self.image_id),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }
        if self.subnet_ids.is_empty() {
            return Err(ConfigError::MissingField("SubnetIds"));
        }
        if self.security_groups.is_empty() && self.host_security_groups.is_empty() {
            return Err(ConfigError::MissingField("SecurityGroups"));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidField {
                field: "Port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.ebs_volume_size_gb == 0 {
            return Err(ConfigError::InvalidField {
                field: "EBSVolumeSize",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Drop duplicates and the always-published auxiliary port from
    /// `additional_ports`.
    pub fn normalize(&mut self) {
        self.additional_ports.retain(|p| *p != AUX_PORT);
        self.additional_ports.dedup();
    }

    /// Resolve the target subnet: an explicit request must be in the allowed
    /// set, otherwise the first configured subnet is used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSubnet`] when the requested subnet is
    /// not part of the configured set.
    pub fn select_subnet(&self, requested: Option<&str>) -> Result<&str, ConfigError> {
        match requested {
            Some(subnet_id) => self
                .subnet_ids
                .iter()
                .find(|s| s.as_str() == subnet_id)
                .map(String::as_str)
                .ok_or_else(|| ConfigError::InvalidSubnet {
                    subnet_id: subnet_id.to_string(),
                    vpc_id: self.vpc_id.clone(),
                }),
            None => self
                .subnet_ids
                .first()
                .map(String::as_str)
                .ok_or(ConfigError::MissingField("SubnetIds")),
        }
    }

    /// Tags for the launch call: the configured tags plus `Name=DockerHost`.
    #[must_use]
    pub fn launch_tags(&self) -> Vec<Tag> {
        let mut tags = self.tags.clone();
        tags.push(Tag {
            key: "Name".to_string(),
            value: "DockerHost".to_string(),
        });
        tags
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
