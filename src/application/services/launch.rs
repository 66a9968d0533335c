//! Host launch: runtime image selection and the one-shot launch call.

use anyhow::{Context, Result};

use crate::application::ports::{Ec2Api, LaunchSpec, LaunchedInstance};
use crate::domain::config::ProvisioningConfig;

/// Docker launch option that passes accelerators through to the daemon
/// container.
pub const GPU_OPTION: &str = "--gpus all";

/// Daemon container image plus the launch option it needs, chosen per
/// instance type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeImage {
    pub image_uri: String,
    pub gpu_option: Option<&'static str>,
}

/// Pick the daemon image for `instance_type`: an accelerator capability in
/// the type descriptor selects the GPU image and the passthrough option.
///
/// # Errors
///
/// Returns an error when the instance-type descriptor cannot be read.
pub async fn select_runtime_image(
    ec2: &impl Ec2Api,
    instance_type: &str,
    cfg: &ProvisioningConfig,
) -> Result<RuntimeImage> {
    let has_gpu = ec2
        .instance_has_gpu(instance_type)
        .await
        .with_context(|| format!("describing instance type {instance_type}"))?;
    Ok(if has_gpu {
        RuntimeImage {
            image_uri: cfg.docker_image_nvidia_uri.clone(),
            gpu_option: Some(GPU_OPTION),
        }
    } else {
        RuntimeImage {
            image_uri: cfg.docker_image_uri.clone(),
            gpu_option: None,
        }
    })
}

/// Issue the single launch call. Never retried: a second call could launch a
/// duplicate instance, so any failure here is fatal for the run. The
/// instance's bootstrap executes asynchronously after the API accepts the
/// launch.
///
/// # Errors
///
/// Returns an error when the launch call fails.
pub async fn launch(ec2: &impl Ec2Api, spec: &LaunchSpec<'_>) -> Result<LaunchedInstance> {
    let launched = ec2
        .run_instance(spec)
        .await
        .context("launching docker host instance")?;
    tracing::info!(
        "successfully launched instance {} with private DNS {}",
        launched.instance_id,
        launched.private_dns
    );
    Ok(launched)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
