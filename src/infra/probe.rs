//! Mutually-authenticated TLS probe of the remote docker daemon.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{DaemonEndpoint, DaemonProbe};
use crate::domain::host;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Probes `https://<dns>:<port>/version` with the per-instance client
/// certificate, key, and pinned CA from the credential path contract.
///
/// The bootstrap payload generates that material on the remote host, onto
/// the shared filesystem, so the files appear locally out of band. Until
/// they do, probes fail like any network error and the poller retries.
pub struct TlsDaemonProbe {
    home: String,
}

impl TlsDaemonProbe {
    pub fn new(home: impl Into<String>) -> Self {
        Self { home: home.into() }
    }

    async fn read_pem(path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }
}

impl DaemonProbe for TlsDaemonProbe {
    async fn probe(&self, endpoint: &DaemonEndpoint<'_>) -> Result<()> {
        let paths =
            host::credential_paths(&self.home, endpoint.instance_type, endpoint.instance_id);
        let ca = Self::read_pem(&paths.ca_cert).await?;
        let client_cert = Self::read_pem(&paths.client_cert).await?;
        let client_key = Self::read_pem(&paths.client_key).await?;

        let identity_pem = [client_cert, client_key].concat();
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .add_root_certificate(
                reqwest::Certificate::from_pem(&ca).context("parsing CA certificate")?,
            )
            .identity(
                reqwest::Identity::from_pem(&identity_pem).context("parsing client identity")?,
            )
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("building TLS client")?;

        let url = format!("https://{}:{}/version", endpoint.dns, endpoint.port);
        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .context("daemon returned an error status")?;
        // A healthy daemon answers with a well-formed version document.
        let _: serde_json::Value = response
            .json()
            .await
            .context("daemon returned a malformed version payload")?;
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
