//! Deployment models

use std::fmt;

use openapi_client::{DeploymentResponse, ProjectResponse};

/// Build state reported by the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyState {
    Queued,
    Initializing,
    Building,
    Ready,
    Error,
    Canceled,
    /// Any value the platform reports that we do not know
    Unknown(String),
}

impl ReadyState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => ReadyState::Queued,
            "INITIALIZING" => ReadyState::Initializing,
            "BUILDING" => ReadyState::Building,
            "READY" => ReadyState::Ready,
            "ERROR" => ReadyState::Error,
            "CANCELED" | "CANCELLED" => ReadyState::Canceled,
            _ => ReadyState::Unknown(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadyState::Ready | ReadyState::Error | ReadyState::Canceled)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyState::Queued => f.write_str("QUEUED"),
            ReadyState::Initializing => f.write_str("INITIALIZING"),
            ReadyState::Building => f.write_str("BUILDING"),
            ReadyState::Ready => f.write_str("READY"),
            ReadyState::Error => f.write_str("ERROR"),
            ReadyState::Canceled => f.write_str("CANCELED"),
            ReadyState::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// A named project on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProject {
    pub id: String,
    pub name: String,
}

impl From<ProjectResponse> for RemoteProject {
    fn from(resp: ProjectResponse) -> Self {
        Self {
            id: resp.id,
            name: resp.name,
        }
    }
}

/// One build-and-publish attempt on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub id: String,
    pub ready_state: ReadyState,
    /// Default hostname assigned by the platform
    pub url: Option<String>,
    pub alias: Vec<String>,
}

impl Deployment {
    /// Public URL: first alias, else the default hostname
    pub fn public_url(&self) -> Option<String> {
        self.alias
            .iter()
            .chain(self.url.iter())
            .find(|host| !host.trim().is_empty())
            .map(|host| with_scheme(host))
    }
}

impl From<DeploymentResponse> for Deployment {
    fn from(resp: DeploymentResponse) -> Self {
        Self {
            id: resp.id,
            ready_state: resp
                .ready_state
                .as_deref()
                .map(ReadyState::parse)
                .unwrap_or(ReadyState::Queued),
            url: resp.url,
            alias: resp.alias,
        }
    }
}

/// Prefix `https://` unless the host already carries a scheme
pub fn with_scheme(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
