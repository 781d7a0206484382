//! Deploy endpoint models

pub mod models;

pub use models::*;
