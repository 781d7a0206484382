//! Pipeline milestones and how they map to client progress

use openapi_server::{EventType, ProgressEvent};

use crate::models::deployment::ReadyState;

/// A stage transition reported by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Milestone {
    Started { files: usize },
    Scaffolded { added: usize, patched: usize },
    ProjectLookedUp { name: String, exists: bool },
    SeoAnalyzed { score: u8, issues: usize },
    SeoFixed { applied: usize },
    SeoArtifacts { generated: usize },
    ProjectReady { name: String, created: bool },
    Uploading { files: usize },
    Uploaded { deployment_id: String },
    /// A status check result, with its percent already inside the poll band
    Polled { state: ReadyState, percent: u8 },
    Live { url: String },
    DomainConfigured { domain: String, verified: bool },
    DomainFailed { domain: String },
    Finalizing,
}

impl Milestone {
    pub fn stage(&self) -> &'static str {
        match self {
            Milestone::Started { .. } => "validate",
            Milestone::Scaffolded { .. } => "scaffold",
            Milestone::ProjectLookedUp { .. } => "project",
            Milestone::SeoAnalyzed { .. } | Milestone::SeoFixed { .. } => "seo",
            Milestone::SeoArtifacts { .. } => "seo",
            Milestone::ProjectReady { .. } => "project",
            Milestone::Uploading { .. } | Milestone::Uploaded { .. } => "upload",
            Milestone::Polled { .. } => "build",
            Milestone::Live { .. } => "build",
            Milestone::DomainConfigured { .. } | Milestone::DomainFailed { .. } => "domain",
            Milestone::Finalizing => "finalize",
        }
    }

    /// Progress percent. Stage bands: analysis 0-18, upload 18-55, build 55-90, finalize 90-100.
    pub fn percent(&self) -> u8 {
        match self {
            Milestone::Started { .. } => 2,
            Milestone::Scaffolded { .. } => 8,
            Milestone::ProjectLookedUp { .. } => 10,
            Milestone::SeoAnalyzed { .. } => 14,
            Milestone::SeoFixed { .. } => 16,
            Milestone::SeoArtifacts { .. } => 18,
            Milestone::ProjectReady { .. } => 22,
            Milestone::Uploading { .. } => 25,
            Milestone::Uploaded { .. } => 50,
            Milestone::Polled { percent, .. } => *percent,
            Milestone::Live { .. } => 90,
            Milestone::DomainConfigured { .. } | Milestone::DomainFailed { .. } => 94,
            Milestone::Finalizing => 97,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Milestone::Started { files } => format!("Preparing {} files", files),
            Milestone::Scaffolded { added, patched } => {
                format!("Build configuration ready ({} added, {} patched)", added, patched)
            }
            Milestone::ProjectLookedUp { name, exists: true } => {
                format!("Found existing project {}", name)
            }
            Milestone::ProjectLookedUp { name, exists: false } => {
                format!("Project {} will be created", name)
            }
            Milestone::SeoAnalyzed { score, issues } => {
                format!("SEO score {} with {} issues", score, issues)
            }
            Milestone::SeoFixed { applied } => format!("Applied {} SEO fixes", applied),
            Milestone::SeoArtifacts { generated } => {
                format!("Generated {} SEO artifacts", generated)
            }
            Milestone::ProjectReady { name, created: true } => format!("Created project {}", name),
            Milestone::ProjectReady { name, created: false } => format!("Using project {}", name),
            Milestone::Uploading { files } => format!("Uploading {} files", files),
            Milestone::Uploaded { deployment_id } => {
                format!("Deployment {} created", deployment_id)
            }
            Milestone::Polled { state, .. } => build_message(state),
            Milestone::Live { url } => format!("Deployment ready at {}", url),
            Milestone::DomainConfigured { domain, verified: true } => {
                format!("Domain {} configured", domain)
            }
            Milestone::DomainConfigured { domain, verified: false } => {
                format!("Domain {} added, pending DNS verification", domain)
            }
            Milestone::DomainFailed { domain } => {
                format!("Could not configure domain {}", domain)
            }
            Milestone::Finalizing => "Saving deployment".to_string(),
        }
    }

    /// Wire event for this milestone
    pub fn to_event(&self) -> ProgressEvent {
        let event_type = match self {
            Milestone::SeoAnalyzed { .. } => EventType::SeoAnalysis,
            _ => EventType::Progress,
        };
        let mut event = ProgressEvent::new(event_type, self.stage(), self.message(), self.percent());
        match self {
            Milestone::SeoAnalyzed { score, issues } => {
                event.seo_score = Some(*score);
                event.seo_issues = Some(*issues);
            }
            Milestone::Uploaded { deployment_id } => {
                event.deployment_id = Some(deployment_id.clone());
            }
            Milestone::Live { url } => event.url = Some(url.clone()),
            _ => {}
        }
        event
    }
}

fn build_message(state: &ReadyState) -> String {
    match state {
        ReadyState::Queued => "Waiting in build queue".to_string(),
        ReadyState::Initializing => "Initializing build".to_string(),
        ReadyState::Building => "Building project".to_string(),
        other => format!("Deployment status: {}", other),
    }
}

/// Receives milestones as the pipeline reaches them
pub trait PipelineObserver: Send + Sync {
    fn observe(&self, milestone: &Milestone);
}

/// Observer that discards everything, for runs nobody is watching
pub struct Silent;

impl PipelineObserver for Silent {
    fn observe(&self, _milestone: &Milestone) {}
}
