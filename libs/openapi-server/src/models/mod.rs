//! Deploy endpoint models

use serde::{Deserialize, Serialize};

/// One file submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFile {
    pub path: String,
    pub content: String,
    /// `utf-8` (default) or `base64`
    #[serde(default)]
    pub encoding: Option<String>,
}

/// SEO settings supplied with a deploy request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub twitter_handle: Option<String>,
    pub site_name: Option<String>,
    pub locale: Option<String>,
    /// Routes added to the sitemap besides the HTML pages
    pub extra_routes: Vec<String>,
    /// Paths disallowed in robots.txt
    pub disallow: Vec<String>,
    pub change_frequency: Option<String>,
}

/// Streamed deploy request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployRequest {
    pub files: Vec<InputFile>,
    pub project_name: String,
    pub artifact_id: Option<String>,
    pub artifact_title: Option<String>,
    pub custom_domain: Option<String>,
    pub seo_config: Option<SeoConfig>,
    pub run_seo_analysis: Option<bool>,
    pub auto_fix_seo: Option<bool>,
    /// Previously stored deployment record id
    pub project_id: Option<String>,
}

/// Progress event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Progress,
    SeoAnalysis,
    Complete,
    Error,
}

impl EventType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventType::Complete | EventType::Error)
    }
}

/// Progress event streamed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub stage: String,
    pub message: String,
    pub percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_issues: Option<usize>,
}

impl ProgressEvent {
    pub fn new(event_type: EventType, stage: &str, message: impl Into<String>, percent: u8) -> Self {
        Self {
            event_type,
            stage: stage.to_string(),
            message: message.into(),
            percent,
            url: None,
            deployment_id: None,
            project_id: None,
            reason: None,
            seo_score: None,
            seo_issues: None,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}
