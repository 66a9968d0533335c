//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::output::OutputContext;

/// Transient TLS-secured remote Docker hosts
#[derive(Parser)]
#[command(
    name = "dockhost",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a remote docker host and switch the local context to it
    CreateHost(commands::create::CreateHostArgs),

    /// Terminate the currently active docker host
    TerminateCurrentHost,

    /// Terminate a specific docker host instance
    TerminateHost(commands::terminate::TerminateHostArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            command,
        } = self;
        let ctx = OutputContext::new(no_color, quiet);
        match command {
            Command::CreateHost(args) => commands::create::run(&ctx, &args).await,
            Command::TerminateCurrentHost => commands::terminate::run_current(&ctx).await,
            Command::TerminateHost(args) => commands::terminate::run_by_id(&ctx, &args).await,
        }
    }
}
