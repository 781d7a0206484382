//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::LaunchError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

pub const TOKEN_ENV: &str = "SHIPYARD_HOSTING_TOKEN";
pub const TEAM_ID_ENV: &str = "SHIPYARD_HOSTING_TEAM_ID";

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Directory for rolling log files (stdout only when absent)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Hosting platform configuration
    #[serde(default)]
    pub hosting: HostingSettings,

    /// Pipeline timing and build profile
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            hosting: HostingSettings::default(),
            pipeline: PipelineSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it does not exist
    pub async fn load(file: &File) -> Result<Self, LaunchError> {
        if !file.exists().await {
            return Ok(Self::default());
        }
        file.read_json()
            .await
            .map_err(|e| LaunchError::ConfigError(format!("{}: {}", file.path().display(), e)))
    }

    /// Apply overrides from environment variables
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.hosting.token = Some(token);
        }
        if let Some(team_id) = lookup(TEAM_ID_ENV) {
            self.hosting.team_id = Some(team_id);
        }
        self
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Hosting platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingSettings {
    /// Base URL for the hosting API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Optional team scope
    #[serde(default)]
    pub team_id: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.vercel.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            team_id: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Deployment target environment
    #[serde(default = "default_target")]
    pub target: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_deploy_timeout_secs")]
    pub deploy_timeout_secs: u64,

    #[serde(default = "default_reconcile_poll_interval_ms")]
    pub reconcile_poll_interval_ms: u64,

    #[serde(default = "default_reconcile_timeout_secs")]
    pub reconcile_timeout_secs: u64,

    /// Domain the platform assigns to projects, e.g. `vercel.app`
    #[serde(default = "default_provisional_domain_suffix")]
    pub provisional_domain_suffix: String,

    #[serde(default = "default_framework")]
    pub framework: String,

    #[serde(default = "default_build_command")]
    pub build_command: String,

    #[serde(default = "default_output_directory")]
    pub output_directory: String,

    #[serde(default = "default_install_command")]
    pub install_command: String,
}

fn default_target() -> String {
    "production".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_deploy_timeout_secs() -> u64 {
    300
}

fn default_reconcile_poll_interval_ms() -> u64 {
    2000
}

fn default_reconcile_timeout_secs() -> u64 {
    120
}

fn default_provisional_domain_suffix() -> String {
    "vercel.app".to_string()
}

fn default_framework() -> String {
    "vite".to_string()
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_output_directory() -> String {
    "dist".to_string()
}

fn default_install_command() -> String {
    "npm install".to_string()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            poll_interval_ms: default_poll_interval_ms(),
            deploy_timeout_secs: default_deploy_timeout_secs(),
            reconcile_poll_interval_ms: default_reconcile_poll_interval_ms(),
            reconcile_timeout_secs: default_reconcile_timeout_secs(),
            provisional_domain_suffix: default_provisional_domain_suffix(),
            framework: default_framework(),
            build_command: default_build_command(),
            output_directory: default_output_directory(),
            install_command: default_install_command(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Base directory for records and logs (platform default when absent)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}
