//! File-backed record store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::LaunchError;
use crate::filesys::file::File;
use crate::records::{DeploymentRecord, RecordStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordsDocument {
    #[serde(default)]
    records: Vec<DeploymentRecord>,
}

/// All records in one JSON document, rewritten atomically on every put
pub struct JsonRecordStore {
    file: File,
    records: Mutex<Vec<DeploymentRecord>>,
}

impl JsonRecordStore {
    pub async fn open(file: File) -> Result<Self, LaunchError> {
        let document: RecordsDocument = file
            .read_json_opt()
            .await
            .map_err(|e| {
                LaunchError::StorageError(format!(
                    "cannot read records from {}: {}",
                    file.path().display(),
                    e
                ))
            })?
            .unwrap_or_default();
        info!(
            "Loaded {} deployment records from {}",
            document.records.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            records: Mutex::new(document.records),
        })
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>, LaunchError> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_owner_and_remote_id(
        &self,
        owner: &str,
        remote_project_id: &str,
    ) -> Result<Option<DeploymentRecord>, LaunchError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.owner == owner && r.remote_project_id == remote_project_id)
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), LaunchError> {
        let mut records = self.records.lock().await;

        let mut next = records.clone();
        match next.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => next.push(record),
        }

        let document = RecordsDocument { records: next };
        self.file
            .write_json_atomic(&document)
            .await
            .map_err(|e| LaunchError::StorageError(format!("cannot save records: {}", e)))?;
        *records = document.records;
        Ok(())
    }
}
