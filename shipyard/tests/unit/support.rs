//! Scripted hosting platform and helpers shared by the unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use openapi_client::ProjectSettings;

use shipyard::deploy::fsm::FsmSettings;
use shipyard::deploy::pipeline::{Pipeline, PipelineConfig};
use shipyard::errors::LaunchError;
use shipyard::http::client::{DomainStatus, HostingApi};
use shipyard::models::deployment::{Deployment, ReadyState, RemoteProject};
use shipyard::models::project::{DeployBatch, ProjectFile};
use shipyard::progress::{Milestone, PipelineObserver};
use shipyard::records::MemoryRecordStore;
use shipyard::seo::BasicSeo;
use shipyard::storage::settings::PipelineSettings;
use shipyard::workers::reconciler::{ReconcileReport, Reconciler};
use tokio::sync::mpsc;

pub const DEPLOYMENT_HOST: &str = "my-app-abc123.vercel.app";

/// Result of one status check
#[derive(Debug, Clone)]
pub enum Step {
    State(ReadyState),
    Fail,
    Hang,
}

pub struct FakeHosting {
    pub project: Mutex<Option<RemoteProject>>,
    pub script: Mutex<VecDeque<Step>>,
    /// Used once the script runs out
    pub fallback: ReadyState,
    pub fail_lookup: bool,
    pub fail_submit: bool,
    pub fail_domain: bool,
    pub submissions: Mutex<Vec<(String, DeployBatch)>>,
    pub created: Mutex<Vec<String>>,
    pub checks: Mutex<u32>,
}

impl Default for FakeHosting {
    fn default() -> Self {
        Self {
            project: Mutex::new(None),
            script: Mutex::new(VecDeque::new()),
            fallback: ReadyState::Ready,
            fail_lookup: false,
            fail_submit: false,
            fail_domain: false,
            submissions: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            checks: Mutex::new(0),
        }
    }
}

impl FakeHosting {
    pub fn scripted(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_project(self, id: &str, name: &str) -> Self {
        *self.project.lock().unwrap() = Some(RemoteProject {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn submissions(&self) -> Vec<(String, DeployBatch)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn checks(&self) -> u32 {
        *self.checks.lock().unwrap()
    }

    fn remote_error(message: &str) -> LaunchError {
        LaunchError::Remote {
            status: 500,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn get_project(&self, name: &str) -> Result<Option<RemoteProject>, LaunchError> {
        if self.fail_lookup {
            return Err(Self::remote_error("lookup unavailable"));
        }
        let project = self.project.lock().unwrap().clone();
        Ok(project.filter(|p| p.name == name))
    }

    async fn create_project(
        &self,
        name: &str,
        _settings: &ProjectSettings,
    ) -> Result<RemoteProject, LaunchError> {
        self.created.lock().unwrap().push(name.to_string());
        let project = RemoteProject {
            id: format!("prj_{}", name),
            name: name.to_string(),
        };
        *self.project.lock().unwrap() = Some(project.clone());
        Ok(project)
    }

    async fn create_deployment(
        &self,
        project_name: &str,
        batch: &DeployBatch,
        _settings: &ProjectSettings,
        _target: &str,
    ) -> Result<Deployment, LaunchError> {
        if self.fail_submit {
            return Err(Self::remote_error("quota exceeded"));
        }
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push((project_name.to_string(), batch.clone()));
        Ok(Deployment {
            id: format!("dpl_{}", submissions.len()),
            ready_state: ReadyState::Queued,
            url: None,
            alias: vec![],
        })
    }

    async fn get_deployment(&self, id: &str) -> Result<Deployment, LaunchError> {
        *self.checks.lock().unwrap() += 1;
        let step = self.script.lock().unwrap().pop_front();
        let state = match step {
            Some(Step::State(state)) => state,
            Some(Step::Fail) => return Err(Self::remote_error("bad gateway")),
            Some(Step::Hang) => return std::future::pending().await,
            None => self.fallback.clone(),
        };
        Ok(Deployment {
            id: id.to_string(),
            ready_state: state,
            url: Some(DEPLOYMENT_HOST.to_string()),
            alias: vec![],
        })
    }

    async fn add_domain(&self, _project_id: &str, _domain: &str) -> Result<DomainStatus, LaunchError> {
        if self.fail_domain {
            return Err(Self::remote_error("domain taken"));
        }
        Ok(DomainStatus { verified: false })
    }
}

/// Observer that keeps every milestone
#[derive(Default)]
pub struct Recorder {
    pub milestones: Mutex<Vec<Milestone>>,
}

impl Recorder {
    pub fn percents(&self) -> Vec<u8> {
        self.milestones.lock().unwrap().iter().map(Milestone::percent).collect()
    }

    pub fn all(&self) -> Vec<Milestone> {
        self.milestones.lock().unwrap().clone()
    }
}

impl PipelineObserver for Recorder {
    fn observe(&self, milestone: &Milestone) {
        self.milestones.lock().unwrap().push(milestone.clone());
    }
}

pub fn fast_settings() -> FsmSettings {
    FsmSettings {
        poll_interval: Duration::from_secs(1),
        deadline: Duration::from_secs(30),
    }
}

pub fn build_settings() -> ProjectSettings {
    PipelineConfig::from_settings(&PipelineSettings::default()).build
}

pub struct Harness {
    pub api: Arc<FakeHosting>,
    pub store: Arc<MemoryRecordStore>,
    pub pipeline: Arc<Pipeline>,
    pub reports: mpsc::UnboundedReceiver<ReconcileReport>,
}

pub fn harness(api: FakeHosting) -> Harness {
    let api = Arc::new(api);
    let store = Arc::new(MemoryRecordStore::new());
    let mut config = PipelineConfig::from_settings(&PipelineSettings::default());
    config.attempt = fast_settings();

    let (reconciler, reports) = Reconciler::new(api.clone(), fast_settings());
    let pipeline = Arc::new(Pipeline::new(
        api.clone(),
        store.clone(),
        Arc::new(BasicSeo::new()),
        reconciler,
        config,
    ));
    Harness {
        api,
        store,
        pipeline,
        reports,
    }
}

pub fn batch(files: &[(&str, &str)]) -> DeployBatch {
    DeployBatch::from_files(files.iter().map(|(p, c)| ProjectFile::text(p, *c))).unwrap()
}
