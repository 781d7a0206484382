//! Deployment module

pub mod attempt;
pub mod fsm;
pub mod naming;
pub mod pipeline;
pub mod site_url;

pub use pipeline::{DeployInput, DeployOutcome, Pipeline, PipelineConfig};
