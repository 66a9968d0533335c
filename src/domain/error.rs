//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Errors raised while validating provisioning configuration. These are
/// reported before any cloud call is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("InvalidSubnetId: {subnet_id} is either an invalid subnet id or not part of {vpc_id}")]
    InvalidSubnet { subnet_id: String, vpc_id: String },

    #[error("Invalid value for configuration field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("No active host recorded. Run 'dockhost create-host' first.")]
    NoActiveHost,
}

// ── Cloud API errors ──────────────────────────────────────────────────────────

/// A failed cloud API call, with the provider error code when one could be
/// recognized in the response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CloudApiError {
    /// Provider error code (e.g. `InvalidGroup.Duplicate`), if recognized.
    pub code: Option<String>,
    /// Full error text as reported by the provider.
    pub message: String,
}

impl CloudApiError {
    /// The create raced another run that won; callers treat this as benign.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.code.as_deref() == Some("InvalidGroup.Duplicate")
    }

    /// The looked-up object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some("InvalidGroup.NotFound")
    }
}

// ── Health verification errors ────────────────────────────────────────────────

/// Errors raised when a launched host never becomes reachable.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error(
        "failed to establish connection with the docker daemon at {endpoint} \
         after {attempts} attempts"
    )]
    Exhausted { endpoint: String, attempts: u32 },
}

// ── Client context errors ─────────────────────────────────────────────────────

/// Errors raised while repointing the local docker client.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("unable to switch docker context to '{name}' after {attempts} attempts")]
    SwitchExhausted { name: String, attempts: u32 },
}
