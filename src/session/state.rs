//! Authorization session states.
//!
//! Both timers are read off the state rather than stored beside it: the
//! frame pump runs exactly while `Streaming`, the hand-off timer is armed
//! exactly while `Authorized`. Neither can be active in any other state,
//! and they can never be active together.

use crate::recognition::Identity;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// State of one authorization session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No timers running, source closed.
    #[default]
    Idle,
    /// Frame pump armed, source open.
    Streaming {
        /// Reads that failed since the last good frame.
        consecutive_failures: u32,
    },
    /// Source released, identity recorded, hand-off armed.
    Authorized {
        /// Who was recognized.
        identity: Identity,
        /// When the authorizing frame was processed.
        since: Instant,
    },
    /// The host transition is running; the session resets right after.
    HandingOff,
}

/// Data-free view of [`SessionState`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// See [`SessionState::Idle`].
    Idle,
    /// See [`SessionState::Streaming`].
    Streaming,
    /// See [`SessionState::Authorized`].
    Authorized,
    /// See [`SessionState::HandingOff`].
    HandingOff,
}

impl Phase {
    /// Numeric code exported as a gauge.
    pub fn code(self) -> i64 {
        match self {
            Phase::Idle => 0,
            Phase::Streaming => 1,
            Phase::Authorized => 2,
            Phase::HandingOff => 3,
        }
    }
}

impl SessionState {
    /// Entry state of a freshly started stream.
    pub fn streaming() -> Self {
        SessionState::Streaming {
            consecutive_failures: 0,
        }
    }

    /// Drops the state data.
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Streaming { .. } => Phase::Streaming,
            SessionState::Authorized { .. } => Phase::Authorized,
            SessionState::HandingOff => Phase::HandingOff,
        }
    }

    /// True while the frame pump should fire.
    pub fn pump_armed(&self) -> bool {
        matches!(self, SessionState::Streaming { .. })
    }

    /// When the hand-off timer fires, if it is armed.
    pub fn handoff_deadline(&self, delay: Duration) -> Option<Instant> {
        match self {
            SessionState::Authorized { since, .. } => Some(*since + delay),
            _ => None,
        }
    }

    /// True if the pump may be (re)armed from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Streaming { .. })
    }
}
