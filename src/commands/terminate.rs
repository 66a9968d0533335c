//! `terminate-host` / `terminate-current-host` command handlers.

use anyhow::{Context, Result};
use clap::Args;

use crate::application::services::terminate;
use crate::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::aws_cli::AwsEc2Cli;
use crate::infra::config;
use crate::infra::state::StateFile;
use crate::output::OutputContext;

#[derive(Args)]
pub struct TerminateHostArgs {
    /// Instance id of the host to terminate
    #[arg(long)]
    pub instance_id: String,
}

/// Terminate the host named by the persisted record.
///
/// # Errors
///
/// Returns an error when no host is recorded or the terminate call fails.
pub async fn run_current(ctx: &OutputContext) -> Result<()> {
    let home = super::home_dir()?;
    let cfg = config::load()?;
    let ec2 = AwsEc2Cli::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), cfg.region.clone());
    let contexts = super::context_store(&home)?;
    let store = StateFile::new()?;

    let record = terminate::terminate_current(&ec2, &contexts, &store)
        .await
        .context("terminate-current-host failed")?;
    if !ctx.quiet {
        println!(
            "Successfully terminated instance {} with private DNS {}",
            record.instance_id, record.instance_dns
        );
    }
    Ok(())
}

/// Terminate a caller-specified instance, independent of persisted state.
///
/// # Errors
///
/// Returns an error when the terminate call fails.
pub async fn run_by_id(ctx: &OutputContext, args: &TerminateHostArgs) -> Result<()> {
    let home = super::home_dir()?;
    let cfg = config::load()?;
    let ec2 = AwsEc2Cli::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), cfg.region.clone());
    let contexts = super::context_store(&home)?;

    terminate::terminate_host(&ec2, &contexts, &args.instance_id)
        .await
        .context("terminate-host failed")?;
    if !ctx.quiet {
        println!("Successfully terminated instance {}", args.instance_id);
    }
    Ok(())
}
