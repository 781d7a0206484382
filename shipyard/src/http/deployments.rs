//! Deployment upload wire format

use openapi_client::DeploymentFile;

use crate::models::project::DeployBatch;

/// Files as the platform expects them, paths relative
pub fn wire_files(batch: &DeployBatch) -> Vec<DeploymentFile> {
    batch
        .files()
        .map(|f| DeploymentFile {
            file: f.path().to_string(),
            data: f.wire_data(),
            encoding: f.encoding().as_str().to_string(),
        })
        .collect()
}
