//! Error types for shipyard

use std::time::Duration;

use thiserror::Error;

use crate::models::deployment::ReadyState;

/// Main error type for shipyard
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Hosting platform error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for LaunchError {
    fn from(err: anyhow::Error) -> Self {
        LaunchError::Internal(err.to_string())
    }
}

/// Terminal failure of one deployment attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployFailure {
    /// Project lookup/create or deployment submission failed
    #[error("{0}")]
    Upstream(String),

    /// The platform finished the build in a failed state
    #[error("Deployment {state}")]
    BuildFailed { state: ReadyState },

    #[error("Deployment timed out after {}s", waited.as_secs())]
    Timeout { waited: Duration },
}

impl DeployFailure {
    /// Machine-readable reason carried on the client `error` event
    pub fn reason(&self) -> &'static str {
        match self {
            DeployFailure::Upstream(_) => "upstream",
            DeployFailure::BuildFailed { .. } => "build_failed",
            DeployFailure::Timeout { .. } => "timeout",
        }
    }
}

impl From<LaunchError> for DeployFailure {
    fn from(err: LaunchError) -> Self {
        DeployFailure::Upstream(err.to_string())
    }
}
