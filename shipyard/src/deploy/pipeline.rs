//! Deployment pipeline: scaffold, SEO, project upsert, deploy, record, reconcile
//!
//! The pipeline returns values and typed failures only. Progress leaves it as
//! [`Milestone`]s through a [`PipelineObserver`]; mapping those to wire events
//! is the emitter's job.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use openapi_client::ProjectSettings;
use openapi_server::{DeployRequest, SeoConfig};
use tracing::{debug, info, warn};

use crate::deploy::attempt::{run_attempt, AttemptRequest};
use crate::deploy::fsm::FsmSettings;
use crate::deploy::naming::{provisional_url, sanitize_project_name};
use crate::deploy::site_url::SiteUrlDecision;
use crate::errors::{DeployFailure, LaunchError};
use crate::http::client::HostingApi;
use crate::models::deployment::{with_scheme, RemoteProject};
use crate::models::project::{DeployBatch, ProjectFile};
use crate::progress::milestone::{Milestone, PipelineObserver};
use crate::records::{self, DeploymentSuccess, RecordStore};
use crate::scaffold::{self, ScaffoldContext};
use crate::seo::{SeoContext, SeoFix, SeoProcessor, SitemapOptions};
use crate::storage::settings::PipelineSettings;
use crate::workers::reconciler::Reconciler;

pub const SITEMAP_PATH: &str = "public/sitemap.xml";
pub const ROBOTS_PATH: &str = "public/robots.txt";
const ENTRY_HTML: &str = "index.html";
const DEFAULT_CHANGE_FREQUENCY: &str = "weekly";

/// Fixed parts of every run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub build: ProjectSettings,
    pub target: String,
    pub provisional_domain_suffix: String,
    pub attempt: FsmSettings,
}

impl PipelineConfig {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            build: ProjectSettings {
                framework: settings.framework.clone(),
                build_command: settings.build_command.clone(),
                output_directory: settings.output_directory.clone(),
                install_command: settings.install_command.clone(),
            },
            target: settings.target.clone(),
            provisional_domain_suffix: settings.provisional_domain_suffix.clone(),
            attempt: FsmSettings {
                poll_interval: std::time::Duration::from_millis(settings.poll_interval_ms),
                deadline: std::time::Duration::from_secs(settings.deploy_timeout_secs),
            },
        }
    }
}

/// A validated deploy request
#[derive(Debug, Clone)]
pub struct DeployInput {
    pub owner: String,
    pub files: DeployBatch,
    pub project_name: String,
    pub artifact_id: Option<String>,
    pub artifact_title: Option<String>,
    pub custom_domain: Option<String>,
    pub seo_config: SeoConfig,
    pub run_seo_analysis: bool,
    pub auto_fix_seo: bool,
    /// Record id the caller got from an earlier deployment
    pub record_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DeployInput {
    /// Validate a client request. Runs before any event is streamed.
    pub fn from_request(owner: &str, request: DeployRequest) -> Result<Self, LaunchError> {
        if request.files.is_empty() {
            return Err(LaunchError::ValidationError("missing files".to_string()));
        }
        if request.project_name.trim().is_empty() {
            return Err(LaunchError::ValidationError(
                "missing projectName".to_string(),
            ));
        }

        let files = request
            .files
            .iter()
            .map(|f| ProjectFile::decode(&f.path, &f.content, f.encoding.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            owner: owner.to_string(),
            files: DeployBatch::from_files(files)?,
            project_name: request.project_name.trim().to_string(),
            artifact_id: non_blank(request.artifact_id),
            artifact_title: non_blank(request.artifact_title),
            custom_domain: non_blank(request.custom_domain),
            seo_config: request.seo_config.unwrap_or_default(),
            run_seo_analysis: request.run_seo_analysis.unwrap_or(true),
            auto_fix_seo: request.auto_fix_seo.unwrap_or(false),
            record_id: non_blank(request.project_id),
        })
    }

    fn title(&self) -> &str {
        self.artifact_title.as_deref().unwrap_or(&self.project_name)
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub url: String,
    pub deployment_id: String,
    pub project: RemoteProject,
    /// Deployment record written for this run, if the store accepted it
    pub record_id: Option<String>,
    pub seo_score: Option<u8>,
    pub reconciliation_scheduled: bool,
}

pub struct Pipeline {
    api: Arc<dyn HostingApi>,
    store: Arc<dyn RecordStore>,
    seo: Arc<dyn SeoProcessor>,
    reconciler: Reconciler,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn HostingApi>,
        store: Arc<dyn RecordStore>,
        seo: Arc<dyn SeoProcessor>,
        reconciler: Reconciler,
        config: PipelineConfig,
    ) -> Self {
        Self {
            api,
            store,
            seo,
            reconciler,
            config,
        }
    }

    pub async fn run(
        &self,
        input: DeployInput,
        observer: &dyn PipelineObserver,
    ) -> Result<DeployOutcome, DeployFailure> {
        let name = sanitize_project_name(&input.project_name);
        info!(
            "Deploying {} as {} for {} ({} files)",
            input.project_name,
            name,
            input.owner,
            input.files.len()
        );
        observer.observe(&Milestone::Started {
            files: input.files.len(),
        });

        let synthesis = scaffold::synthesize(
            input.files.clone(),
            &ScaffoldContext {
                package_name: name.clone(),
                title: input.title().to_string(),
            },
        );
        observer.observe(&Milestone::Scaffolded {
            added: synthesis.added.len(),
            patched: synthesis.patched.len(),
        });
        let mut batch = synthesis.batch;

        let existing = self.api.get_project(&name).await?;
        observer.observe(&Milestone::ProjectLookedUp {
            name: name.clone(),
            exists: existing.is_some(),
        });

        let recorded_url = match &existing {
            Some(project) => self.recorded_url(&input, project).await,
            None => None,
        };
        let decision = SiteUrlDecision::resolve(
            input.custom_domain.as_deref(),
            recorded_url.as_deref(),
            &provisional_url(&name, &self.config.provisional_domain_suffix),
        );
        debug!("Site URL for {}: {} ({:?})", name, decision.url, decision.source);

        let seo_score = self.seo_step(&mut batch, &input, &name, &decision, observer);

        let (project, created) = match existing {
            Some(project) => (project, false),
            None => (self.api.create_project(&name, &self.config.build).await?, true),
        };
        observer.observe(&Milestone::ProjectReady {
            name: project.name.clone(),
            created,
        });

        let attempt = run_attempt(
            self.api.as_ref(),
            AttemptRequest {
                project_name: &project.name,
                batch: &batch,
                build: &self.config.build,
                target: &self.config.target,
            },
            &self.config.attempt,
            observer,
        )
        .await?;
        observer.observe(&Milestone::Live {
            url: attempt.url.clone(),
        });

        let mut url = attempt.url.clone();
        if let Some(domain) = input.custom_domain.as_deref() {
            if self.configure_domain(&project, domain, observer).await {
                url = with_scheme(domain);
            }
        }

        observer.observe(&Milestone::Finalizing);
        let record_id = self
            .save_record(&input, &project, &url, &attempt.deployment_id)
            .await;

        let job = Reconciler::prepare(
            &decision,
            &batch,
            &attempt.url,
            &project.name,
            &self.config.build,
            &self.config.target,
        );
        let reconciliation_scheduled = job.is_some();
        if let Some(job) = job {
            // Not awaited: the reconciliation outlives this request
            let _ = self.reconciler.detach(job);
        }

        info!("Deployment {} of {} is live at {}", attempt.deployment_id, name, url);
        Ok(DeployOutcome {
            url,
            deployment_id: attempt.deployment_id,
            project,
            record_id,
            seo_score,
            reconciliation_scheduled,
        })
    }

    /// URL stored for this remote project by an earlier run
    async fn recorded_url(&self, input: &DeployInput, project: &RemoteProject) -> Option<String> {
        if let Some(id) = input.record_id.as_deref() {
            match self.store.get(id).await {
                Ok(Some(record))
                    if record.owner == input.owner && record.remote_project_id == project.id =>
                {
                    if record.url.is_some() {
                        return record.url;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Record lookup for {} failed: {}", id, e),
            }
        }

        match self
            .store
            .find_url_by_remote_id(&input.owner, &project.id)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                warn!("Recorded URL lookup for {} failed: {}", project.id, e);
                None
            }
        }
    }

    /// Analysis, fixes and artifacts. Never fails the run.
    fn seo_step(
        &self,
        batch: &mut DeployBatch,
        input: &DeployInput,
        name: &str,
        decision: &SiteUrlDecision,
        observer: &dyn PipelineObserver,
    ) -> Option<u8> {
        let ctx = SeoContext {
            project_name: name,
            title: input.title(),
            deploy_url: Some(&decision.url),
            config: &input.seo_config,
        };

        let mut score = None;
        if input.run_seo_analysis {
            match self.seo.analyze(batch, &ctx) {
                Ok(analysis) => {
                    observer.observe(&Milestone::SeoAnalyzed {
                        score: analysis.score,
                        issues: analysis.issues.len(),
                    });
                    score = Some(analysis.score);
                    if input.auto_fix_seo {
                        let fixes = self.seo.auto_fixable_issues(&analysis);
                        let applied = self.apply_fixes(batch, &fixes, &ctx);
                        observer.observe(&Milestone::SeoFixed { applied });
                    }
                }
                Err(e) => warn!("SEO analysis of {} failed: {}", name, e),
            }
        }

        let generated = self.write_artifacts(batch, &ctx, &decision.url);
        observer.observe(&Milestone::SeoArtifacts { generated });
        score
    }

    fn apply_fixes(&self, batch: &mut DeployBatch, fixes: &[SeoFix], ctx: &SeoContext<'_>) -> usize {
        let mut by_path: BTreeMap<&str, Vec<SeoFix>> = BTreeMap::new();
        for fix in fixes {
            by_path.entry(fix.path.as_str()).or_default().push(fix.clone());
        }

        let mut applied = 0;
        for (path, fixes) in by_path {
            let Some(file) = batch.get(path).cloned() else {
                continue;
            };
            let Some(html) = file.as_text() else {
                continue;
            };
            match self.seo.apply_fixes(html, &fixes, ctx) {
                Ok(fixed) if fixed.applied > 0 => {
                    applied += fixed.applied;
                    batch.upsert(file.with_text(fixed.html));
                }
                Ok(_) => {}
                Err(e) => warn!("SEO fixes for {} failed: {}", path, e),
            }
        }
        applied
    }

    /// Sitemap, robots.txt and entry page tags. Returns the number of files written.
    fn write_artifacts(&self, batch: &mut DeployBatch, ctx: &SeoContext<'_>, site_url: &str) -> usize {
        let mut generated = 0;
        let config = ctx.config;

        let paths: Vec<&str> = batch.paths().collect();
        let options = SitemapOptions {
            change_frequency: config
                .change_frequency
                .clone()
                .unwrap_or_else(|| DEFAULT_CHANGE_FREQUENCY.to_string()),
            extra_routes: config.extra_routes.clone(),
            lastmod: Utc::now().date_naive(),
        };
        let sitemap = self.seo.generate_sitemap(&paths, site_url, &options);
        match sitemap {
            Ok(sitemap) => {
                debug!("Sitemap has {} URLs", sitemap.count);
                batch.upsert(ProjectFile::text(SITEMAP_PATH, sitemap.content));
                generated += 1;
            }
            Err(e) => warn!("Sitemap generation failed: {}", e),
        }

        match self.seo.generate_robots_txt(site_url, &config.disallow) {
            Ok(robots) => {
                batch.upsert(ProjectFile::text(ROBOTS_PATH, robots.content));
                generated += 1;
            }
            Err(e) => warn!("robots.txt generation failed: {}", e),
        }

        let entry = batch.get(ENTRY_HTML).cloned();
        if let Some((file, html)) = entry.as_ref().and_then(|f| f.as_text().map(|h| (f, h))) {
            match self.seo.enhance_html(html, ctx) {
                Ok(enhanced) if !enhanced.changes.is_empty() => {
                    debug!("Enhanced {} with {:?}", ENTRY_HTML, enhanced.changes);
                    batch.upsert(file.with_text(enhanced.html));
                }
                Ok(_) => {}
                Err(e) => warn!("HTML enhancement failed: {}", e),
            }
        }

        generated
    }

    /// Attach the custom domain. Returns whether it was attached.
    async fn configure_domain(
        &self,
        project: &RemoteProject,
        domain: &str,
        observer: &dyn PipelineObserver,
    ) -> bool {
        match self.api.add_domain(&project.id, domain).await {
            Ok(status) => {
                observer.observe(&Milestone::DomainConfigured {
                    domain: domain.to_string(),
                    verified: status.verified,
                });
                true
            }
            Err(e) => {
                warn!("Adding domain {} to {} failed: {}", domain, project.name, e);
                observer.observe(&Milestone::DomainFailed {
                    domain: domain.to_string(),
                });
                false
            }
        }
    }

    async fn save_record(
        &self,
        input: &DeployInput,
        project: &RemoteProject,
        url: &str,
        deployment_id: &str,
    ) -> Option<String> {
        let success = DeploymentSuccess {
            owner: &input.owner,
            name: &input.project_name,
            remote: project,
            url,
            custom_domain: input.custom_domain.as_deref(),
            deployment_id,
            artifact_id: input.artifact_id.as_deref(),
            record_id: input.record_id.as_deref(),
        };
        match records::upsert(self.store.as_ref(), &success).await {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!("Saving deployment record for {} failed: {}", project.name, e);
                None
            }
        }
    }
}
