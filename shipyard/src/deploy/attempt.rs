//! Submit a batch and poll the deployment to a terminal state

use openapi_client::ProjectSettings;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::deploy::fsm::{AttemptEvent, AttemptState, DeploymentFsm, FsmSettings};
use crate::errors::DeployFailure;
use crate::http::client::HostingApi;
use crate::models::deployment::Deployment;
use crate::models::project::DeployBatch;
use crate::progress::milestone::{Milestone, PipelineObserver};

/// What to deploy and where
#[derive(Debug, Clone, Copy)]
pub struct AttemptRequest<'a> {
    pub project_name: &'a str,
    pub batch: &'a DeployBatch,
    pub build: &'a ProjectSettings,
    pub target: &'a str,
}

/// A deployment that reached `READY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub deployment_id: String,
    pub url: String,
    /// Status checks made, failed ones included
    pub polls: u32,
}

/// Submit the batch once, then poll until `READY`, a failed state, or the deadline.
///
/// Submission failures abort immediately. Failed status checks are logged and
/// polling continues; only the deadline ends a run of failed checks.
pub async fn run_attempt(
    api: &dyn HostingApi,
    request: AttemptRequest<'_>,
    settings: &FsmSettings,
    observer: &dyn PipelineObserver,
) -> Result<AttemptOutcome, DeployFailure> {
    let mut fsm = DeploymentFsm::new();

    observer.observe(&Milestone::Uploading {
        files: request.batch.len(),
    });
    let deployment = api
        .create_deployment(request.project_name, request.batch, request.build, request.target)
        .await?;
    fsm.process(AttemptEvent::Submitted)
        .map_err(DeployFailure::Upstream)?;
    info!(
        "Deployment {} submitted for {} ({} files)",
        deployment.id,
        request.project_name,
        request.batch.len()
    );
    observer.observe(&Milestone::Uploaded {
        deployment_id: deployment.id.clone(),
    });

    let url = watch(api, &deployment.id, settings, &mut fsm, observer).await?;
    Ok(AttemptOutcome {
        deployment_id: deployment.id,
        url,
        polls: fsm.polls(),
    })
}

async fn watch(
    api: &dyn HostingApi,
    deployment_id: &str,
    settings: &FsmSettings,
    fsm: &mut DeploymentFsm,
    observer: &dyn PipelineObserver,
) -> Result<String, DeployFailure> {
    let started = Instant::now();
    let deadline = started + settings.deadline;

    loop {
        if Instant::now() >= deadline {
            fsm.process(AttemptEvent::DeadlineElapsed)
                .map_err(DeployFailure::Upstream)?;
            warn!(
                "Deployment {} timed out after {} checks",
                deployment_id,
                fsm.polls()
            );
            return Err(DeployFailure::Timeout {
                waited: started.elapsed(),
            });
        }

        time::sleep(settings.poll_interval).await;

        // A hanging check must not outlive the deadline
        let remaining = deadline.saturating_duration_since(Instant::now());
        let checked: Option<Deployment> =
            match time::timeout(remaining, api.get_deployment(deployment_id)).await {
                Ok(Ok(deployment)) => Some(deployment),
                Ok(Err(e)) => {
                    warn!("Status check for {} failed: {}", deployment_id, e);
                    None
                }
                Err(_) => {
                    warn!("Status check for {} did not finish in time", deployment_id);
                    None
                }
            };

        let Some(deployment) = checked else {
            fsm.process(AttemptEvent::CheckFailed)
                .map_err(DeployFailure::Upstream)?;
            continue;
        };

        debug!("Deployment {} is {}", deployment_id, deployment.ready_state);
        fsm.process(AttemptEvent::Observed(deployment.ready_state.clone()))
            .map_err(DeployFailure::Upstream)?;

        match fsm.state() {
            AttemptState::Ready => {
                return deployment.public_url().ok_or_else(|| {
                    DeployFailure::Upstream(format!(
                        "Deployment {} is ready but has no URL",
                        deployment_id
                    ))
                });
            }
            AttemptState::Failed(state) => {
                return Err(DeployFailure::BuildFailed {
                    state: state.clone(),
                });
            }
            _ => observer.observe(&Milestone::Polled {
                state: deployment.ready_state,
                percent: fsm.percent(),
            }),
        }
    }
}
