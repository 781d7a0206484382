//! Channel adapter from pipeline milestones to client events

use std::sync::Mutex;

use openapi_server::{EventType, ProgressEvent};
use tokio::sync::mpsc;
use tracing::debug;

use crate::deploy::pipeline::DeployOutcome;
use crate::errors::DeployFailure;
use crate::progress::milestone::{Milestone, PipelineObserver};

/// One item on the client stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(ProgressEvent),
    /// Explicit end-of-stream marker
    End,
}

#[derive(Debug, Default)]
struct EmitterState {
    last_percent: u8,
    closed: bool,
}

/// Single-writer event stream for one deployment attempt.
///
/// Percentages are clamped so they never decrease. A `complete` or `error`
/// event is always followed by [`StreamItem::End`]; nothing is sent after it.
pub struct ProgressEmitter {
    tx: mpsc::UnboundedSender<StreamItem>,
    state: Mutex<EmitterState>,
}

impl ProgressEmitter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let emitter = Self {
            tx,
            state: Mutex::new(EmitterState::default()),
        };
        (emitter, rx)
    }

    pub fn emit(&self, mut event: ProgressEvent) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.closed {
            return;
        }
        event.percent = event.percent.max(state.last_percent).min(100);
        state.last_percent = event.percent;

        let terminal = event.event_type.is_terminal();
        self.send(StreamItem::Event(event));
        if terminal {
            state.closed = true;
            self.send(StreamItem::End);
        }
    }

    pub fn complete(&self, outcome: &DeployOutcome) {
        let mut event = ProgressEvent::new(
            EventType::Complete,
            "complete",
            format!("Deployment is live at {}", outcome.url),
            100,
        );
        event.url = Some(outcome.url.clone());
        event.deployment_id = Some(outcome.deployment_id.clone());
        event.project_id = outcome.record_id.clone();
        event.seo_score = outcome.seo_score;
        self.emit(event);
    }

    pub fn fail(&self, failure: &DeployFailure) {
        let mut event = ProgressEvent::new(EventType::Error, "error", failure.to_string(), 0);
        event.reason = Some(failure.reason().to_string());
        self.emit(event);
    }

    /// Send the end marker if no terminal event did
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.closed {
            state.closed = true;
            self.send(StreamItem::End);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    fn send(&self, item: StreamItem) {
        // The client may have gone away; the pipeline keeps running regardless
        if self.tx.send(item).is_err() {
            debug!("Progress receiver dropped, event discarded");
        }
    }
}

impl PipelineObserver for ProgressEmitter {
    fn observe(&self, milestone: &Milestone) {
        self.emit(milestone.to_event());
    }
}

impl Drop for ProgressEmitter {
    fn drop(&mut self) {
        self.close();
    }
}
