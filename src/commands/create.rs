//! `create-host` command handler.

use anyhow::{Context, Result};
use clap::Args;

use crate::application::services::create_host::{self, CreateHostRequest};
use crate::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::domain::health::PollPolicy;
use crate::infra::aws_cli::{AwsEc2Cli, AwsEfsCli};
use crate::infra::config;
use crate::infra::probe::TlsDaemonProbe;
use crate::infra::state::StateFile;
use crate::output::{OutputContext, TerminalReporter};

#[derive(Args)]
pub struct CreateHostArgs {
    /// Instance type for the docker host (e.g. m5.large, p3.2xlarge)
    #[arg(long)]
    pub instance_type: String,

    /// Subnet to launch into; must be one of the configured subnets
    #[arg(long)]
    pub subnet_id: Option<String>,
}

/// # Errors
///
/// Returns an error when configuration is invalid or any provisioning step
/// fails.
pub async fn run(ctx: &OutputContext, args: &CreateHostArgs) -> Result<()> {
    let home = super::home_dir()?;
    let cfg = config::load()?;
    let hooks = config::load_hooks(&config::config_dir()?)?;

    let ec2 = AwsEc2Cli::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), cfg.region.clone());
    let efs = AwsEfsCli::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), cfg.region.clone());
    let probe = TlsDaemonProbe::new(home.clone());
    let contexts = super::context_store(&home)?;
    let store = StateFile::new()?;
    let reporter = TerminalReporter::new(ctx);

    let record = create_host::create_host(
        &ec2,
        &efs,
        &probe,
        &contexts,
        &store,
        &reporter,
        &cfg,
        &PollPolicy::default(),
        &CreateHostRequest {
            instance_type: &args.instance_type,
            subnet_id: args.subnet_id.as_deref(),
            home: &home,
            hooks: &hooks,
        },
    )
    .await
    .context("create-host failed")?;

    if !ctx.quiet {
        println!(
            "Successfully launched docker host on instance {} with private DNS {}",
            record.instance_id, record.instance_dns
        );
    }
    Ok(())
}
