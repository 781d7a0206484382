//! Application state management

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::fsm::FsmSettings;
use crate::deploy::pipeline::{Pipeline, PipelineConfig};
use crate::errors::LaunchError;
use crate::http::client::{HostingApi, HostingClient};
use crate::records::{JsonRecordStore, RecordStore};
use crate::seo::{BasicSeo, SeoProcessor};
use crate::workers::reconciler::{ReconcileReport, Reconciler};

/// Main application state
pub struct AppState {
    /// Deployment pipeline shared by all requests
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Initialize application state. Also returns the receiving end of the
    /// reconciliation reports, for the log worker.
    pub async fn init(
        options: &AppOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ReconcileReport>), LaunchError> {
        info!("Initializing application state...");

        let hosting = HostingClient::new(&options.hosting)?;
        info!("Hosting platform at {}", hosting.base_url());

        let records =
            JsonRecordStore::open(options.storage.layout.records_file()).await?;

        Ok(Self::from_parts(
            Arc::new(hosting),
            Arc::new(records),
            Arc::new(BasicSeo::new()),
            options.pipeline.clone(),
            options.reconcile.clone(),
        ))
    }

    /// Assemble state from ready-made collaborators
    pub fn from_parts(
        hosting: Arc<dyn HostingApi>,
        records: Arc<dyn RecordStore>,
        seo: Arc<dyn SeoProcessor>,
        pipeline_config: PipelineConfig,
        reconcile: FsmSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ReconcileReport>) {
        let (reconciler, reports) = Reconciler::new(hosting.clone(), reconcile);
        let pipeline = Arc::new(Pipeline::new(
            hosting,
            records,
            seo,
            reconciler,
            pipeline_config,
        ));

        (Self { pipeline }, reports)
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), LaunchError> {
        info!("Shutting down application state...");
        Ok(())
    }
}
