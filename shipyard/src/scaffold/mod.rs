//! Scaffold synthesis for the single Vite + React build profile

pub mod detect;
pub mod synth;
pub mod templates;

pub use synth::{synthesize, ScaffoldContext, Synthesis};
