//! Finite State Machine for one deployment attempt

use std::time::Duration;

use crate::models::deployment::ReadyState;

/// Lower bound of the poll progress band
pub const POLL_BAND_START: u8 = 55;
/// Upper bound of the poll progress band
pub const POLL_BAND_END: u8 = 90;

/// FSM settings
#[derive(Debug, Clone)]
pub struct FsmSettings {
    /// Delay before each status check
    pub poll_interval: Duration,

    /// Give up after this long without a terminal state
    pub deadline: Duration,
}

impl FsmSettings {
    /// User-visible attempt: minutes-long deadline
    pub fn interactive() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            deadline: Duration::from_secs(300),
        }
    }

    /// Silent reconciliation attempt: shorter interval and deadline
    pub fn background() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(120),
        }
    }
}

impl Default for FsmSettings {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Attempt state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// Nothing submitted yet
    Pending,

    /// Deployment accepted, no status seen yet
    Submitted,

    /// Last observed non-terminal platform state
    InProgress(ReadyState),

    /// Build finished and the deployment is live
    Ready,

    /// Build ended in `ERROR` or `CANCELED`
    Failed(ReadyState),

    /// Deadline elapsed before a terminal state
    TimedOut,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Ready | AttemptState::Failed(_) | AttemptState::TimedOut
        )
    }
}

/// Attempt event
#[derive(Debug, Clone)]
pub enum AttemptEvent {
    /// The platform accepted the deployment
    Submitted,

    /// A status check returned this state
    Observed(ReadyState),

    /// A status check failed (network, 5xx)
    CheckFailed,

    /// The deadline elapsed
    DeadlineElapsed,
}

/// Approximate progress for a platform state, within the poll band
pub fn poll_percent(state: &ReadyState) -> u8 {
    match state {
        ReadyState::Queued => 60,
        ReadyState::Initializing => 65,
        ReadyState::Building => 75,
        ReadyState::Ready => POLL_BAND_END,
        ReadyState::Error | ReadyState::Canceled => POLL_BAND_START,
        ReadyState::Unknown(_) => 70,
    }
}

/// Deployment attempt FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: AttemptState,
    polls: u32,
    failed_checks: u32,
    percent: u8,
}

impl DeploymentFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: AttemptState::Pending,
            polls: 0,
            failed_checks: 0,
            percent: POLL_BAND_START,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Status checks made, failed ones included
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn failed_checks(&self) -> u32 {
        self.failed_checks
    }

    /// Highest progress reached; never decreases
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: AttemptEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            (AttemptState::Pending, AttemptEvent::Submitted) => AttemptState::Submitted,

            (
                AttemptState::Submitted | AttemptState::InProgress(_),
                AttemptEvent::Observed(observed),
            ) => {
                self.polls += 1;
                self.percent = self.percent.max(poll_percent(observed));
                match observed {
                    ReadyState::Ready => AttemptState::Ready,
                    ReadyState::Error | ReadyState::Canceled => {
                        AttemptState::Failed(observed.clone())
                    }
                    other => AttemptState::InProgress(other.clone()),
                }
            }

            (
                AttemptState::Submitted | AttemptState::InProgress(_),
                AttemptEvent::CheckFailed,
            ) => {
                self.polls += 1;
                self.failed_checks += 1;
                self.state.clone()
            }

            (
                AttemptState::Submitted | AttemptState::InProgress(_),
                AttemptEvent::DeadlineElapsed,
            ) => AttemptState::TimedOut,

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
