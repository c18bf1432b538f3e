//! Countdown and Pomodoro engines.
//!
//! Both engines are tick-driven state machines: they never read the wall
//! clock. Starting an engine enqueues a repeating [`Message::Tick`] on the
//! shared [`TaskQueue`](crate::scheduler::TaskQueue); every tick carries the
//! engine's epoch at scheduling time. Anything that invalidates the running
//! tick source (pause, reset, completion, a fresh start) bumps the epoch, so
//! stale ticks and stale auto-restarts drop on arrival.
//!
//! [`Message::Tick`]: crate::scheduler::Message::Tick

pub mod countdown;
pub mod pomodoro;

use std::time::Duration;

use crate::events::Event;

pub use countdown::{CountdownEngine, CountdownState};
pub use pomodoro::{PomodoroConfig, PomodoroEngine, PomodoroPhase, PomodoroState};

/// Engine tick cadence.
pub const TICK: Duration = Duration::from_secs(1);

/// Pause between a completion and an automatic restart.
pub const GRACE_DELAY: Duration = Duration::from_secs(1);

/// Result of delivering a tick to an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Epoch mismatch or engine not running; nothing changed.
    Stale,
    /// One tick unit elapsed.
    Advanced { remaining: Duration },
    /// Remaining hit zero.
    Completed(Event),
}

/// `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// 0.0 .. 1.0 elapsed fraction.
pub(crate) fn progress(total: Duration, remaining: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (1.0 - remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// Minutes to a duration; zero means "use the default".
pub(crate) fn minutes_or(minutes: u32, default: Duration) -> Duration {
    if minutes == 0 {
        default
    } else {
        Duration::from_secs(u64::from(minutes) * 60)
    }
}
