//! Hosting platform HTTP client

use std::time::Duration;

use async_trait::async_trait;
use openapi_client::{
    AddDomainRequest, AddDomainResponse, CreateDeploymentRequest, CreateProjectRequest,
    DeploymentResponse, ErrorEnvelope, ProjectResponse, ProjectSettings,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::errors::LaunchError;
use crate::http::deployments::wire_files;
use crate::models::deployment::{Deployment, RemoteProject};
use crate::models::project::DeployBatch;
use crate::storage::settings::HostingSettings;

/// Credentials and endpoint for the hosting platform
#[derive(Debug)]
pub struct HostingConfig {
    pub api_base_url: Url,
    pub token: SecretString,
    pub team_id: Option<String>,
    pub timeout: Duration,
}

impl HostingConfig {
    /// Validate settings. Fails when the token is missing or the base URL is malformed.
    pub fn from_settings(settings: &HostingSettings) -> Result<Self, LaunchError> {
        let token = settings
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                LaunchError::ConfigError("hosting token is not configured".to_string())
            })?;

        let api_base_url = Url::parse(settings.api_base_url.trim_end_matches('/')).map_err(|e| {
            LaunchError::ConfigError(format!(
                "invalid hosting api_base_url '{}': {}",
                settings.api_base_url, e
            ))
        })?;

        Ok(Self {
            api_base_url,
            token: SecretString::from(token.to_string()),
            team_id: settings
                .team_id
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
        })
    }
}

/// Result of attaching a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainStatus {
    pub verified: bool,
}

/// Operations the pipeline needs from the hosting platform
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Look a project up by name. `Ok(None)` when it does not exist.
    async fn get_project(&self, name: &str) -> Result<Option<RemoteProject>, LaunchError>;

    async fn create_project(
        &self,
        name: &str,
        settings: &ProjectSettings,
    ) -> Result<RemoteProject, LaunchError>;

    async fn create_deployment(
        &self,
        project_name: &str,
        batch: &DeployBatch,
        settings: &ProjectSettings,
        target: &str,
    ) -> Result<Deployment, LaunchError>;

    async fn get_deployment(&self, id: &str) -> Result<Deployment, LaunchError>;

    async fn add_domain(&self, project_id: &str, domain: &str)
        -> Result<DomainStatus, LaunchError>;
}

/// HTTP client for the hosting platform. Performs no retries.
pub struct HostingClient {
    client: Client,
    base_url: Url,
    token: SecretString,
    team_id: Option<String>,
}

impl HostingClient {
    pub fn new(config: &HostingConfig) -> Result<Self, LaunchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            token: SecretString::from(config.token.expose_secret().to_owned()),
            team_id: config.team_id.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an API path, carrying the team scope when configured
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, LaunchError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}{}", base, path))
            .map_err(|e| LaunchError::Internal(format!("bad endpoint {}: {}", path, e)))?;
        if let Some(team_id) = &self.team_id {
            url.query_pairs_mut().append_pair("teamId", team_id);
        }
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        debug!("GET {}", url);
        self.client.get(url)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        debug!("POST {}", url);
        self.client.post(url)
    }

    /// Send with the bearer credential and decode a 2xx body
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, LaunchError> {
        let response = request.bearer_auth(self.token.expose_secret()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = remote_message(status, &body);
            if status != StatusCode::NOT_FOUND {
                error!("Hosting request failed: {} - {}", status, message);
            }
            return Err(LaunchError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// The platform's error message when the body parses, else the raw body
pub fn remote_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl HostingApi for HostingClient {
    async fn get_project(&self, name: &str) -> Result<Option<RemoteProject>, LaunchError> {
        let url = self.endpoint(&format!("/v9/projects/{}", name))?;
        match self.send::<ProjectResponse>(self.get(url)).await {
            Ok(project) => Ok(Some(project.into())),
            Err(LaunchError::Remote { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_project(
        &self,
        name: &str,
        settings: &ProjectSettings,
    ) -> Result<RemoteProject, LaunchError> {
        let url = self.endpoint("/v10/projects")?;
        let body = CreateProjectRequest {
            name: name.to_string(),
            settings: settings.clone(),
        };
        let project: ProjectResponse = self.send(self.post(url).json(&body)).await?;
        Ok(project.into())
    }

    async fn create_deployment(
        &self,
        project_name: &str,
        batch: &DeployBatch,
        settings: &ProjectSettings,
        target: &str,
    ) -> Result<Deployment, LaunchError> {
        let url = self.endpoint("/v13/deployments")?;
        let body = CreateDeploymentRequest {
            name: project_name.to_string(),
            files: wire_files(batch),
            project_settings: settings.clone(),
            target: target.to_string(),
        };
        let deployment: DeploymentResponse = self.send(self.post(url).json(&body)).await?;
        Ok(deployment.into())
    }

    async fn get_deployment(&self, id: &str) -> Result<Deployment, LaunchError> {
        let url = self.endpoint(&format!("/v13/deployments/{}", id))?;
        let deployment: DeploymentResponse = self.send(self.get(url)).await?;
        Ok(deployment.into())
    }

    async fn add_domain(
        &self,
        project_id: &str,
        domain: &str,
    ) -> Result<DomainStatus, LaunchError> {
        let url = self.endpoint(&format!("/v10/projects/{}/domains", project_id))?;
        let body = AddDomainRequest {
            name: domain.to_string(),
        };
        let response: AddDomainResponse = self.send(self.post(url).json(&body)).await?;
        Ok(DomainStatus {
            verified: response.verified,
        })
    }
}
