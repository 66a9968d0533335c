//! Dockhost CLI - transient TLS-secured remote Docker hosts

use clap::Parser;

use dockhost::cli::Cli;
use dockhost::infra::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match logging::default_log_path() {
        Ok(path) => {
            if let Err(e) = logging::init(&path) {
                eprintln!("Warning: logging disabled: {e:#}");
            }
        }
        Err(e) => eprintln!("Warning: logging disabled: {e:#}"),
    }
    if let Err(e) = cli.run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
