//! In-memory record store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::LaunchError;
use crate::records::{DeploymentRecord, RecordStore};

#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, DeploymentRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records
    pub fn all(&self) -> Vec<DeploymentRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>, LaunchError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(id).cloned())
    }

    async fn find_by_owner_and_remote_id(
        &self,
        owner: &str,
        remote_project_id: &str,
    ) -> Result<Option<DeploymentRecord>, LaunchError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .values()
            .filter(|r| r.owner == owner && r.remote_project_id == remote_project_id)
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), LaunchError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(record.id.clone(), record);
        Ok(())
    }
}
