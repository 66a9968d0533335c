//! Command handlers — assemble infrastructure and call services.

pub mod create;
pub mod terminate;

use anyhow::Result;

use crate::command_runner::{DEFAULT_CONTEXT_TIMEOUT, TokioCommandRunner};
use crate::infra::docker_context::DockerContextCli;
use crate::infra::logging;

/// Effective home directory as a string path.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub(crate) fn home_dir() -> Result<String> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.to_string_lossy().into_owned())
}

/// Build the docker-context adapter used by every command.
pub(crate) fn context_store(home: &str) -> Result<DockerContextCli<TokioCommandRunner>> {
    Ok(DockerContextCli::new(
        TokioCommandRunner::new(DEFAULT_CONTEXT_TIMEOUT),
        home,
        logging::default_log_path()?,
    ))
}
