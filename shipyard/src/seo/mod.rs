//! SEO post-processing collaborator

pub mod basic;

use chrono::NaiveDate;
use openapi_server::SeoConfig;

use crate::errors::LaunchError;
use crate::models::project::DeployBatch;

pub use basic::BasicSeo;

/// Inputs shared by analysis and enhancement
#[derive(Debug, Clone, Copy)]
pub struct SeoContext<'a> {
    pub project_name: &'a str,
    /// Display title, e.g. the artifact title
    pub title: &'a str,
    pub deploy_url: Option<&'a str>,
    pub config: &'a SeoConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    MissingTitle,
    MissingDescription,
    MissingViewport,
    MissingCharset,
    MissingLang,
    MissingCanonical,
    MissingH1,
    ImageWithoutAlt,
}

impl IssueKind {
    /// Score penalty per occurrence
    pub fn weight(&self) -> u8 {
        match self {
            IssueKind::MissingTitle => 20,
            IssueKind::MissingDescription => 15,
            IssueKind::MissingViewport => 10,
            IssueKind::MissingCanonical => 10,
            IssueKind::MissingH1 => 10,
            IssueKind::MissingCharset => 5,
            IssueKind::MissingLang => 5,
            IssueKind::ImageWithoutAlt => 5,
        }
    }

    pub fn is_auto_fixable(&self) -> bool {
        !matches!(self, IssueKind::MissingH1 | IssueKind::ImageWithoutAlt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoIssue {
    pub kind: IssueKind,
    /// HTML file the issue was found in
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoAnalysis {
    /// 0-100
    pub score: u8,
    pub issues: Vec<SeoIssue>,
}

/// A fix the processor can apply without user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoFix {
    pub path: String,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHtml {
    pub html: String,
    pub applied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapOptions {
    pub change_frequency: String,
    pub extra_routes: Vec<String>,
    pub lastmod: NaiveDate,
}

/// Generated text artifact and the number of entries it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub content: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedHtml {
    pub html: String,
    /// Names of the tags added
    pub changes: Vec<String>,
}

/// Analyzes and rewrites HTML/XML artifacts of a batch
pub trait SeoProcessor: Send + Sync {
    fn analyze(&self, batch: &DeployBatch, ctx: &SeoContext<'_>) -> Result<SeoAnalysis, LaunchError>;

    fn auto_fixable_issues(&self, analysis: &SeoAnalysis) -> Vec<SeoFix>;

    fn apply_fixes(
        &self,
        html: &str,
        fixes: &[SeoFix],
        ctx: &SeoContext<'_>,
    ) -> Result<FixedHtml, LaunchError>;

    fn generate_sitemap(
        &self,
        paths: &[&str],
        site_url: &str,
        options: &SitemapOptions,
    ) -> Result<Generated, LaunchError>;

    fn generate_robots_txt(&self, site_url: &str, disallow: &[String]) -> Result<Generated, LaunchError>;

    fn enhance_html(&self, html: &str, ctx: &SeoContext<'_>) -> Result<EnhancedHtml, LaunchError>;
}
