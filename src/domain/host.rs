//! Active-host record and the per-instance credential path contract.
//!
//! The credential directory layout is a contract between the bootstrap
//! payload (which generates certificates on the remote host, onto the shared
//! filesystem) and the local TLS probe / context switcher (which consume
//! them once they appear). Both sides derive paths from the helpers here —
//! never from ad-hoc string formatting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Directory under the home directory holding all local state.
pub const STATE_DIR: &str = ".dockhost";

/// First standard mount point for the shared filesystem on the host.
pub const ROOT_MOUNT: &str = "/root";

/// Second standard mount point for the shared filesystem on the host.
pub const STUDIO_MOUNT: &str = "/home/studio-user";

// ── Persisted state ──────────────────────────────────────────────────────────

/// The single persisted pointer to the currently provisioned docker host.
/// Written on successful health verification, read by
/// `terminate-current-host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostRecord {
    pub instance_id: String,
    /// Private DNS name of the instance.
    pub instance_dns: String,
    pub port: u16,
    pub instance_type: String,
}

/// On-disk shape of `~/.dockhost/hosts.json`. This version always carries
/// exactly one entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveHostsFile {
    #[serde(rename = "ActiveHosts")]
    pub active_hosts: Vec<HostRecord>,
}

impl ActiveHostsFile {
    /// Wrap a single record in the file shape.
    #[must_use]
    pub fn single(record: HostRecord) -> Self {
        Self {
            active_hosts: vec![record],
        }
    }
}

// ── Credential path contract ─────────────────────────────────────────────────

/// Name of the docker context (and credential directory) for a host.
#[must_use]
pub fn context_name(instance_type: &str, instance_id: &str) -> String {
    format!("{instance_type}_{instance_id}")
}

/// Per-instance certificate directory. `instance_type` and `instance_id` may
/// be literal values or shell variable references (the bootstrap payload
/// passes `${instance_type}`/`${instance_id}` resolved on the remote host).
#[must_use]
pub fn credentials_dir(home: &str, instance_type: &str, instance_id: &str) -> String {
    format!(
        "{home}/{STATE_DIR}/{}/certs",
        context_name(instance_type, instance_id)
    )
}

/// Resolved local paths to the mutual-TLS client material for one host.
#[derive(Debug, Clone)]
pub struct CredentialPaths {
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub ca_cert: PathBuf,
}

/// Resolve the client certificate, key, and CA paths for a host.
#[must_use]
pub fn credential_paths(home: &str, instance_type: &str, instance_id: &str) -> CredentialPaths {
    let dir = PathBuf::from(credentials_dir(home, instance_type, instance_id));
    CredentialPaths {
        client_cert: dir.join("client").join("cert.pem"),
        client_key: dir.join("client").join("key.pem"),
        ca_cert: dir.join("ca").join("cert.pem"),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
