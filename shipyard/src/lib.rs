//! Shipyard library
//!
//! Deployment pipeline that completes a generated project, ships it to the
//! hosting platform and streams progress to the caller.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod progress;
pub mod records;
pub mod scaffold;
pub mod seo;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
