//! Local docker context management via the `docker` CLI.
//!
//! Exit status is the only feedback channel. Captured stdout/stderr is
//! appended to the log file for later inspection and never parsed here —
//! matching-context removal happens inside a `sh` pipeline for the same
//! reason.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitStatus;

use anyhow::{Context, Result};

use crate::application::ports::{ContextStore, DaemonEndpoint};
use crate::command_runner::CommandRunner;
use crate::domain::host;

/// `ContextStore` adapter shelling out to the `docker` CLI.
pub struct DockerContextCli<R: CommandRunner> {
    runner: R,
    /// Home directory used to resolve credential paths for `create`.
    home: String,
    /// Subprocess output is appended here.
    log_path: PathBuf,
}

impl<R: CommandRunner> DockerContextCli<R> {
    pub fn new(runner: R, home: impl Into<String>, log_path: PathBuf) -> Self {
        Self {
            runner,
            home: home.into(),
            log_path,
        }
    }

    async fn run_logged(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        let output = self
            .runner
            .run(program, args)
            .await
            .with_context(|| format!("running {program} {}", args.join(" ")))?;
        // Logging must never fail the operation itself.
        if let Err(err) = self.append_log(program, args, &output.stdout, &output.stderr) {
            tracing::warn!("could not append to {}: {err}", self.log_path.display());
        }
        Ok(output.status)
    }

    fn append_log(
        &self,
        program: &str,
        args: &[&str],
        stdout: &[u8],
        stderr: &[u8],
    ) -> std::io::Result<()> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "$ {program} {}", args.join(" "))?;
        file.write_all(stdout)?;
        file.write_all(stderr)?;
        Ok(())
    }
}

impl<R: CommandRunner> ContextStore for DockerContextCli<R> {
    async fn create(&self, name: &str, endpoint: &DaemonEndpoint<'_>) -> Result<ExitStatus> {
        let paths =
            host::credential_paths(&self.home, endpoint.instance_type, endpoint.instance_id);
        let docker_spec = format!(
            "host=tcp://{}:{},ca={},cert={},key={}",
            endpoint.dns,
            endpoint.port,
            paths.ca_cert.display(),
            paths.client_cert.display(),
            paths.client_key.display(),
        );
        self.run_logged(
            "docker",
            &["context", "create", name, "--docker", &docker_spec],
        )
        .await
    }

    async fn switch(&self, name: &str) -> Result<ExitStatus> {
        self.run_logged("docker", &["context", "use", name]).await
    }

    async fn switch_default(&self) -> Result<ExitStatus> {
        self.run_logged("docker", &["context", "use", "default"])
            .await
    }

    async fn remove_matching(&self, needle: &str) -> Result<ExitStatus> {
        // Resolved inside the shell so context names are never parsed here.
        let pipeline =
            format!("docker context rm $(docker context ls -q | grep \"{needle}\")");
        self.run_logged("sh", &["-c", &pipeline]).await
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
