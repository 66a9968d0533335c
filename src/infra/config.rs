//! Configuration and hook-script loading.
//!
//! The JSON config file is parsed and validated once; orchestration code
//! receives an already-checked [`ProvisioningConfig`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::bootstrap::{BootstrapHooks, normalize_hook_script};
use crate::domain::config::ProvisioningConfig;
use crate::domain::host::STATE_DIR;

/// Config path: `DOCKHOST_CONFIG` override, else `~/.dockhost/config.json`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(val) = std::env::var("DOCKHOST_CONFIG") {
        return Ok(PathBuf::from(val));
    }
    Ok(config_dir()?.join("config.json"))
}

/// Directory holding the config file, hook scripts, state, and log.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(STATE_DIR))
}

/// Load, normalize, and validate the provisioning configuration.
///
/// # Errors
///
/// Returns an error when the file is missing, unparseable, or fails
/// validation.
pub fn load() -> Result<ProvisioningConfig> {
    load_from(&config_path()?)
}

/// Load from an explicit path (used in tests).
///
/// # Errors
///
/// Returns an error when the file is missing, unparseable, or fails
/// validation.
pub fn load_from(path: &Path) -> Result<ProvisioningConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut cfg: ProvisioningConfig = serde_json::from_str(&content)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    cfg.normalize();
    cfg.validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

/// Load the caller-supplied bootstrap hook scripts from `dir`.
///
/// The pre/post hooks are optional and degrade to empty sections; the
/// certificate-generation hook is required — without it the daemon can never
/// come up TLS-enabled.
///
/// # Errors
///
/// Returns an error when the certificate-generation hook is missing.
pub fn load_hooks(dir: &Path) -> Result<BootstrapHooks> {
    let create_certs_path = dir.join("create-certs.sh");
    let create_certs = std::fs::read_to_string(&create_certs_path).with_context(|| {
        format!(
            "cannot read certificate-generation hook {}",
            create_certs_path.display()
        )
    })?;
    Ok(BootstrapHooks {
        pre: optional_hook(&dir.join("pre-bootstrap.sh")),
        create_certs: normalize_hook_script(&create_certs),
        post: optional_hook(&dir.join("post-bootstrap.sh")),
    })
}

fn optional_hook(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(raw) => normalize_hook_script(&raw),
        Err(err) => {
            tracing::warn!("no hook at {}: {err}", path.display());
            String::new()
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
