//! Single-phase countdown with optional auto-repeat.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> (completion) -> Idle
//!                                              |
//!                                  auto_repeat: Running after GRACE_DELAY
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{format_remaining, minutes_or, progress, TickOutcome, GRACE_DELAY, TICK};
use crate::events::Event;
use crate::scheduler::{Message, TaskQueue, Target};
use crate::sinks::Notice;

/// Countdown length when nothing else is configured.
pub const DEFAULT_TOTAL: Duration = Duration::from_secs(25 * 60);

pub const COMPLETE_TITLE: &str = "Countdown Complete";
const COMPLETE_BODY: &str = "Your countdown timer has finished.";

/// Published countdown state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownState {
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub remaining_text: String,
    pub running: bool,
    pub paused: bool,
    pub auto_repeat: bool,
    pub progress: f64,
}

#[derive(Debug, Clone)]
pub struct CountdownEngine {
    total: Duration,
    remaining: Duration,
    running: bool,
    paused: bool,
    auto_repeat: bool,
    /// Bumped whenever the current tick source becomes invalid.
    epoch: u64,
}

impl CountdownEngine {
    /// A zero `total` falls back to [`DEFAULT_TOTAL`].
    pub fn new(total: Duration, auto_repeat: bool) -> Self {
        let total = normalize(total);
        Self {
            total,
            remaining: total,
            running: false,
            paused: false,
            auto_repeat,
            epoch: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn auto_repeat(&self) -> bool {
        self.auto_repeat
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> CountdownState {
        CountdownState {
            total_secs: self.total.as_secs(),
            remaining_secs: self.remaining.as_secs(),
            remaining_text: format_remaining(self.remaining),
            running: self.running,
            paused: self.paused,
            auto_repeat: self.auto_repeat,
            progress: progress(self.total, self.remaining),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resume from a pause, or start a fresh run from `total`.
    /// No-op while already running.
    pub fn start(&mut self, queue: &mut TaskQueue) -> Option<Event> {
        if self.running {
            return None;
        }
        let resumed = self.paused;
        if !resumed {
            self.remaining = self.total;
        }
        self.running = true;
        self.paused = false;
        self.epoch += 1;
        queue.schedule_after(TICK, self.tick_message());
        tracing::debug!(remaining = self.remaining.as_secs(), resumed, "countdown started");
        Some(Event::CountdownStarted {
            remaining_secs: self.remaining.as_secs(),
            total_secs: self.total.as_secs(),
            resumed,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.paused = true;
        self.epoch += 1;
        tracing::debug!(remaining = self.remaining.as_secs(), "countdown paused");
        Some(Event::CountdownPaused {
            remaining_secs: self.remaining.as_secs(),
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.paused = false;
        self.remaining = self.total;
        self.epoch += 1;
        Some(Event::CountdownReset {
            total_secs: self.total.as_secs(),
            at: Utc::now(),
        })
    }

    /// Set the length in whole minutes and reset. Zero means the default.
    pub fn set_preset(&mut self, minutes: u32) -> Option<Event> {
        self.set_total(minutes_or(minutes, DEFAULT_TOTAL))
    }

    pub fn set_total(&mut self, total: Duration) -> Option<Event> {
        self.total = normalize(total);
        self.reset()
    }

    pub fn set_auto_repeat(&mut self, auto_repeat: bool) {
        self.auto_repeat = auto_repeat;
    }

    // ── Queue handlers ───────────────────────────────────────────────

    pub fn on_tick(&mut self, epoch: u64, queue: &mut TaskQueue) -> TickOutcome {
        if epoch != self.epoch || !self.running {
            return TickOutcome::Stale;
        }
        self.remaining = self.remaining.saturating_sub(TICK);
        if self.remaining.is_zero() {
            return TickOutcome::Completed(self.complete(queue));
        }
        queue.schedule_after(TICK, self.tick_message());
        TickOutcome::Advanced {
            remaining: self.remaining,
        }
    }

    /// Restart queued by a completion. Abstains if anything happened since.
    pub fn on_auto_restart(&mut self, epoch: u64, queue: &mut TaskQueue) -> Option<Event> {
        if epoch != self.epoch || self.running || self.paused || !self.auto_repeat {
            tracing::debug!(epoch, current = self.epoch, "stale countdown restart dropped");
            return None;
        }
        self.start(queue)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, queue: &mut TaskQueue) -> Event {
        self.running = false;
        self.paused = false;
        self.epoch += 1;
        if self.auto_repeat {
            queue.schedule_after(
                GRACE_DELAY,
                Message::AutoRestart {
                    target: Target::Countdown,
                    epoch: self.epoch,
                },
            );
        }
        tracing::info!(total = self.total.as_secs(), auto_repeat = self.auto_repeat, "countdown complete");
        Event::CountdownCompleted {
            total_secs: self.total.as_secs(),
            notice: Notice::new(COMPLETE_TITLE, COMPLETE_BODY),
            auto_repeat: self.auto_repeat,
            at: Utc::now(),
        }
    }

    fn tick_message(&self) -> Message {
        Message::Tick {
            target: Target::Countdown,
            epoch: self.epoch,
        }
    }
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL, false)
    }
}

fn normalize(total: Duration) -> Duration {
    if total.is_zero() {
        DEFAULT_TOTAL
    } else {
        total
    }
}
