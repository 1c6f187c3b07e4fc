//! services/cli/src/error.rs
//!
//! Defines the primary error type for the command-line client.

use crate::config::ConfigError;
use legalyze_core::{ChatError, FailureReason, PortError};

/// The primary error type for the `legalyze` client.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The environment held an unusable value.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the Analysis API port.
    #[error("Analysis API error: {0}")]
    Port(#[from] PortError),

    /// The upload workflow ended in a failure state.
    #[error("Upload workflow failed: {0}")]
    Workflow(#[from] FailureReason),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Represents an error building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading the file to upload).
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// The health check failed; the warning has already been shown.
    #[error("the Analysis API is unreachable")]
    Unreachable,

    /// The command line could not be understood.
    #[error("{0}")]
    Usage(String),

    /// Interruption, cancellation and other failures with no better home.
    #[error("Stopped: {0}")]
    Internal(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }

    /// Whether the user already saw this failure as a notification or in the
    /// chat transcript.
    pub fn already_shown(&self) -> bool {
        matches!(
            self,
            CliError::Workflow(_) | CliError::Chat(_) | CliError::Port(_) | CliError::Unreachable
        )
    }
}
