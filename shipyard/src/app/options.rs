//! Application configuration options

use std::time::Duration;

use crate::deploy::fsm::FsmSettings;
use crate::deploy::pipeline::PipelineConfig;
use crate::errors::LaunchError;
use crate::http::client::HostingConfig;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Hosting platform credentials
    pub hosting: HostingConfig,

    /// Build profile, target and user-visible attempt timing
    pub pipeline: PipelineConfig,

    /// Background reconciliation timing
    pub reconcile: FsmSettings,
}

impl AppOptions {
    /// Fails when the hosting credentials are missing or malformed, or when the
    /// background timing is not tighter than the user-visible timing
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Result<Self, LaunchError> {
        let timing = &settings.pipeline;
        if timing.reconcile_poll_interval_ms >= timing.poll_interval_ms {
            return Err(LaunchError::ConfigError(format!(
                "reconcile_poll_interval_ms ({}) must be below poll_interval_ms ({})",
                timing.reconcile_poll_interval_ms, timing.poll_interval_ms
            )));
        }
        if timing.reconcile_timeout_secs >= timing.deploy_timeout_secs {
            return Err(LaunchError::ConfigError(format!(
                "reconcile_timeout_secs ({}) must be below deploy_timeout_secs ({})",
                timing.reconcile_timeout_secs, timing.deploy_timeout_secs
            )));
        }

        Ok(Self {
            lifecycle: LifecycleOptions::default(),
            storage: StorageOptions { layout },
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            hosting: HostingConfig::from_settings(&settings.hosting)?,
            pipeline: PipelineConfig::from_settings(&settings.pipeline),
            reconcile: FsmSettings {
                poll_interval: Duration::from_millis(settings.pipeline.reconcile_poll_interval_ms),
                deadline: Duration::from_secs(settings.pipeline.reconcile_timeout_secs),
            },
        })
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
