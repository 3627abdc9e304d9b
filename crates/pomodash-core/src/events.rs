use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{TimerMode, TimerSnapshot};

/// Every state change in the engine produces one or more Events.
/// The controller fans them out to the session recorder, the notifier,
/// and any front-end subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from_mode: TimerMode,
        to_mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// A mode ran down to zero and the engine advanced.
    TimerCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        session_count: u32,
        /// The next mode should be started after the auto-start delay.
        auto_start: bool,
        /// Engine epoch right after the completion; an auto-start only
        /// applies while the engine is still at this epoch.
        epoch: u64,
        at: DateTime<Utc>,
    },
    InterruptionRecorded {
        mode: TimerMode,
        interruptions: u32,
        at: DateTime<Utc>,
    },
    /// A session record was opened locally.
    SessionOpened {
        local_id: Uuid,
        mode: TimerMode,
        start_time: DateTime<Utc>,
        interruptions: u32,
    },
    /// The open session record was closed.
    SessionClosed {
        local_id: Uuid,
        mode: TimerMode,
        end_time: DateTime<Utc>,
        completed: bool,
        interruptions: u32,
    },
    StateSnapshot {
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine-readable name, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::TimerSkipped { .. } => "timer_skipped",
            Event::TimerCompleted { .. } => "timer_completed",
            Event::InterruptionRecorded { .. } => "interruption_recorded",
            Event::SessionOpened { .. } => "session_opened",
            Event::SessionClosed { .. } => "session_closed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
