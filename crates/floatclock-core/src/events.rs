use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mode::Mode;
use crate::sinks::Notice;
use crate::timer::PomodoroPhase;

/// Every state change in the engine produces an Event.
/// Commands return `None` when they were a no-op; the render layer
/// re-reads the snapshot after any `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        remaining_secs: u64,
        total_secs: u64,
        /// True when the run continued from a pause.
        resumed: bool,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownReset {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownCompleted {
        total_secs: u64,
        notice: Notice,
        /// A restart is queued behind the grace delay.
        auto_repeat: bool,
        at: DateTime<Utc>,
    },
    PomodoroStarted {
        phase: PomodoroPhase,
        session: u32,
        remaining_secs: u64,
        resumed: bool,
        at: DateTime<Utc>,
    },
    PomodoroPaused {
        phase: PomodoroPhase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PomodoroReset {
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        from: PomodoroPhase,
        to: PomodoroPhase,
        /// Session number after the transition.
        session: u32,
        notice: Notice,
        /// Completed through `skip` rather than by running out.
        skipped: bool,
        auto_start: bool,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: Mode,
        to: Mode,
        at: DateTime<Utc>,
    },
    ClockTicked {
        display: String,
        at: DateTime<Utc>,
    },
    SettingChanged {
        key: String,
        value: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Notice attached to a completion that should reach the sinks.
    ///
    /// Skipped phases carry a notice for the log but stay silent.
    pub fn alert(&self) -> Option<&Notice> {
        match self {
            Event::CountdownCompleted { notice, .. } => Some(notice),
            Event::PhaseCompleted {
                notice,
                skipped: false,
                ..
            } => Some(notice),
            _ => None,
        }
    }
}
