pub mod emitter;
pub mod milestone;

pub use emitter::{ProgressEmitter, StreamItem};
pub use milestone::{Milestone, PipelineObserver, Silent};
