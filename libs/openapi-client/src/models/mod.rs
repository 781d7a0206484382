//! API models

use serde::{Deserialize, Serialize};

/// Build settings attached to a project or a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub framework: String,
    pub build_command: String,
    pub output_directory: String,
    pub install_command: String,
}

/// Project creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(flatten)]
    pub settings: ProjectSettings,
}

/// Project as returned by lookup and create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
}

/// One inline file of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentFile {
    pub file: String,
    pub data: String,
    pub encoding: String,
}

/// Deployment creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub name: String,
    pub files: Vec<DeploymentFile>,
    pub project_settings: ProjectSettings,
    pub target: String,
}

/// Deployment as returned by create and status lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResponse {
    pub id: String,
    #[serde(default)]
    pub ready_state: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alias: Vec<String>,
}

/// Domain attach request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDomainRequest {
    pub name: String,
}

/// Domain attach response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDomainResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Error envelope returned by the platform on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
