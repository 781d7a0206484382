//! Background redeploy that replaces the placeholder site URL
//!
//! A reconciliation runs after the user-visible deployment reached `READY`,
//! against the same remote project, with no progress events, no domain step
//! and no record write. Its outcome only reaches the log drain below.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use openapi_client::ProjectSettings;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::deploy::attempt::{run_attempt, AttemptRequest};
use crate::deploy::fsm::FsmSettings;
use crate::deploy::site_url::SiteUrlDecision;
use crate::errors::DeployFailure;
use crate::http::client::HostingApi;
use crate::models::project::{DeployBatch, ProjectFile};
use crate::progress::Silent;

/// Extensions of files whose placeholder URL gets replaced
pub const TEXT_LIKE_EXTENSIONS: &[&str] = &["xml", "txt", "html", "json"];

fn is_text_like(file: &ProjectFile) -> bool {
    file.extension()
        .is_some_and(|ext| TEXT_LIKE_EXTENSIONS.contains(&ext.as_str()))
}

/// True iff the decision used a placeholder and a text-like file still carries it
pub fn should_reconcile(decision: &SiteUrlDecision, batch: &DeployBatch) -> bool {
    let Some(placeholder) = decision.placeholder() else {
        return false;
    };
    batch
        .files()
        .filter(|f| is_text_like(f))
        .filter_map(ProjectFile::as_text)
        .any(|text| text.contains(placeholder))
}

/// New batch with every occurrence of `placeholder` in text-like files replaced
pub fn substitute_placeholder(batch: &DeployBatch, placeholder: &str, real_url: &str) -> DeployBatch {
    let mut out = batch.clone();
    for file in batch.files().filter(|f| is_text_like(f)) {
        if let Some(text) = file.as_text().filter(|t| t.contains(placeholder)) {
            out.upsert(file.with_text(text.replace(placeholder, real_url)));
        }
    }
    out
}

/// Everything a background redeploy needs, owned so it can outlive the request
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    pub project_name: String,
    pub batch: DeployBatch,
    pub build: ProjectSettings,
    pub target: String,
    pub real_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileReport {
    Succeeded {
        project_name: String,
        deployment_id: String,
        url: String,
    },
    Failed {
        project_name: String,
        failure: DeployFailure,
    },
}

/// Launches background redeploys and forwards their outcomes to a log drain
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn HostingApi>,
    settings: FsmSettings,
    reports: mpsc::UnboundedSender<ReconcileReport>,
}

impl Reconciler {
    pub fn new(
        api: Arc<dyn HostingApi>,
        settings: FsmSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ReconcileReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                settings,
                reports,
            },
            rx,
        )
    }

    /// Build a job for a successful attempt, `None` when no placeholder needs replacing
    pub fn prepare(
        decision: &SiteUrlDecision,
        batch: &DeployBatch,
        real_url: &str,
        project_name: &str,
        build: &ProjectSettings,
        target: &str,
    ) -> Option<ReconcileJob> {
        if !should_reconcile(decision, batch) {
            return None;
        }
        let placeholder = decision.placeholder()?;
        Some(ReconcileJob {
            project_name: project_name.to_string(),
            batch: substitute_placeholder(batch, placeholder, real_url),
            build: build.clone(),
            target: target.to_string(),
            real_url: real_url.to_string(),
        })
    }

    /// Start a job on its own task. Callers never await the handle on the request path.
    pub fn detach(&self, job: ReconcileJob) -> JoinHandle<()> {
        let api = self.api.clone();
        let settings = self.settings.clone();
        let reports = self.reports.clone();

        info!(
            "Scheduling reconciliation of {} with {}",
            job.project_name, job.real_url
        );
        tokio::spawn(async move {
            let request = AttemptRequest {
                project_name: &job.project_name,
                batch: &job.batch,
                build: &job.build,
                target: &job.target,
            };
            let report = match run_attempt(api.as_ref(), request, &settings, &Silent).await {
                Ok(outcome) => ReconcileReport::Succeeded {
                    project_name: job.project_name.clone(),
                    deployment_id: outcome.deployment_id,
                    url: outcome.url,
                },
                Err(failure) => ReconcileReport::Failed {
                    project_name: job.project_name.clone(),
                    failure,
                },
            };
            if reports.send(report).is_err() {
                debug!("Reconcile log drain is gone, report dropped");
            }
        })
    }
}

/// Drain reconciliation reports into the log until shutdown or until every sender is gone
pub async fn run(
    mut reports: mpsc::UnboundedReceiver<ReconcileReport>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Reconcile log worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Reconcile log worker shutting down...");
                return;
            }
            report = reports.recv() => {
                match report {
                    Some(ReconcileReport::Succeeded { project_name, deployment_id, url }) => {
                        info!(
                            "Reconciled {}: deployment {} live at {}",
                            project_name, deployment_id, url
                        );
                    }
                    Some(ReconcileReport::Failed { project_name, failure }) => {
                        warn!(
                            "Reconciliation of {} failed ({}): {}",
                            project_name,
                            failure.reason(),
                            failure
                        );
                    }
                    None => {
                        info!("Reconcile log worker: no more senders");
                        return;
                    }
                }
            }
        }
    }
}
