//! Deployment record store

pub mod json;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::LaunchError;
use crate::models::deployment::RemoteProject;

pub use json::JsonRecordStore;
pub use memory::MemoryRecordStore;

pub const STATUS_READY: &str = "ready";

/// Link between a logical project, its remote project and the last deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub owner: String,
    /// Logical project name as given by the caller
    pub name: String,
    pub remote_project_id: String,
    pub remote_project_name: String,
    pub url: Option<String>,
    pub custom_domain: Option<String>,
    pub last_deployment_id: Option<String>,
    pub status: String,
    pub artifact_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>, LaunchError>;

    async fn find_by_owner_and_remote_id(
        &self,
        owner: &str,
        remote_project_id: &str,
    ) -> Result<Option<DeploymentRecord>, LaunchError>;

    /// Insert or replace by `id`
    async fn put(&self, record: DeploymentRecord) -> Result<(), LaunchError>;

    async fn find_url_by_remote_id(
        &self,
        owner: &str,
        remote_project_id: &str,
    ) -> Result<Option<String>, LaunchError> {
        Ok(self
            .find_by_owner_and_remote_id(owner, remote_project_id)
            .await?
            .and_then(|record| record.url))
    }
}

/// Outcome of a successful user-visible deployment
#[derive(Debug, Clone)]
pub struct DeploymentSuccess<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub remote: &'a RemoteProject,
    pub url: &'a str,
    pub custom_domain: Option<&'a str>,
    pub deployment_id: &'a str,
    pub artifact_id: Option<&'a str>,
    /// Record id the caller already holds
    pub record_id: Option<&'a str>,
}

impl DeploymentSuccess<'_> {
    fn apply(&self, record: &mut DeploymentRecord) {
        record.remote_project_id = self.remote.id.clone();
        record.remote_project_name = self.remote.name.clone();
        record.url = Some(self.url.to_string());
        if let Some(domain) = self.custom_domain {
            record.custom_domain = Some(domain.to_string());
        }
        record.last_deployment_id = Some(self.deployment_id.to_string());
        record.status = STATUS_READY.to_string();
        if let Some(artifact_id) = self.artifact_id {
            record.artifact_id = Some(artifact_id.to_string());
        }
        record.updated_at = Utc::now();
    }
}

/// Write the outcome of a successful deployment.
///
/// A caller-supplied record id wins and that row is updated without touching
/// its name. Otherwise the row for `(owner, remote project id)` is updated, or
/// a new one is inserted.
pub async fn upsert(
    store: &dyn RecordStore,
    success: &DeploymentSuccess<'_>,
) -> Result<DeploymentRecord, LaunchError> {
    if let Some(id) = success.record_id {
        match store.get(id).await? {
            Some(mut record) if record.owner == success.owner => {
                success.apply(&mut record);
                store.put(record.clone()).await?;
                debug!("Updated deployment record {}", record.id);
                return Ok(record);
            }
            Some(_) => warn!(
                "Deployment record {} belongs to another owner, ignoring it",
                id
            ),
            None => warn!("Deployment record {} not found", id),
        }
    }

    let existing = store
        .find_by_owner_and_remote_id(success.owner, &success.remote.id)
        .await?;
    let record = match existing {
        Some(mut record) => {
            success.apply(&mut record);
            record.name = success.name.to_string();
            record
        }
        None => {
            let mut record = DeploymentRecord {
                id: Uuid::new_v4().to_string(),
                owner: success.owner.to_string(),
                name: success.name.to_string(),
                remote_project_id: String::new(),
                remote_project_name: String::new(),
                url: None,
                custom_domain: None,
                last_deployment_id: None,
                status: String::new(),
                artifact_id: None,
                updated_at: Utc::now(),
            };
            success.apply(&mut record);
            record
        }
    };

    store.put(record.clone()).await?;
    debug!("Saved deployment record {}", record.id);
    Ok(record)
}
