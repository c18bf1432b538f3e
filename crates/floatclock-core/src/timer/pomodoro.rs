//! Pomodoro work/break cycle.
//!
//! ## Phase Transitions
//!
//! ```text
//! Work --(session < N)--> ShortBreak --(session += 1)--> Work
//! Work --(session >= N)-> LongBreak  --(session = 1)---> Work
//! ```
//!
//! The cycle has no terminal state. `N` is `sessions_before_long`, never
//! below [`MIN_SESSIONS_BEFORE_LONG`].

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{format_remaining, minutes_or, progress, TickOutcome, GRACE_DELAY, TICK};
use crate::events::Event;
use crate::scheduler::{Message, TaskQueue, Target};
use crate::sinks::Notice;

pub const DEFAULT_WORK: Duration = Duration::from_secs(25 * 60);
pub const DEFAULT_SHORT_BREAK: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LONG_BREAK: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_SESSIONS_BEFORE_LONG: u32 = 4;
pub const MIN_SESSIONS_BEFORE_LONG: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroPhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroPhase {
    pub fn label(self) -> &'static str {
        match self {
            PomodoroPhase::Work => "Work",
            PomodoroPhase::ShortBreak => "Short Break",
            PomodoroPhase::LongBreak => "Long Break",
        }
    }
}

/// Construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PomodoroConfig {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    pub sessions_before_long: u32,
    pub auto_start: bool,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK,
            short_break: DEFAULT_SHORT_BREAK,
            long_break: DEFAULT_LONG_BREAK,
            sessions_before_long: DEFAULT_SESSIONS_BEFORE_LONG,
            auto_start: false,
        }
    }
}

/// Published Pomodoro state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroState {
    pub phase: PomodoroPhase,
    pub phase_label: String,
    pub current_session: u32,
    pub sessions_before_long: u32,
    pub remaining_secs: u64,
    pub remaining_text: String,
    pub phase_secs: u64,
    pub running: bool,
    pub paused: bool,
    pub auto_start: bool,
    pub progress: f64,
}

#[derive(Debug, Clone)]
pub struct PomodoroEngine {
    work: Duration,
    short_break: Duration,
    long_break: Duration,
    sessions_before_long: u32,
    current_session: u32,
    phase: PomodoroPhase,
    running: bool,
    paused: bool,
    remaining: Duration,
    auto_start: bool,
    epoch: u64,
}

impl PomodoroEngine {
    /// Zero durations fall back to defaults; the session threshold is
    /// clamped to [`MIN_SESSIONS_BEFORE_LONG`].
    pub fn new(config: PomodoroConfig) -> Self {
        let work = or_default(config.work, DEFAULT_WORK);
        Self {
            work,
            short_break: or_default(config.short_break, DEFAULT_SHORT_BREAK),
            long_break: or_default(config.long_break, DEFAULT_LONG_BREAK),
            sessions_before_long: clamp_sessions(config.sessions_before_long),
            current_session: 1,
            phase: PomodoroPhase::Work,
            running: false,
            paused: false,
            remaining: work,
            auto_start: config.auto_start,
            epoch: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> PomodoroPhase {
        self.phase
    }

    pub fn current_session(&self) -> u32 {
        self.current_session
    }

    pub fn sessions_before_long(&self) -> u32 {
        self.sessions_before_long
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

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn duration_of(&self, phase: PomodoroPhase) -> Duration {
        match phase {
            PomodoroPhase::Work => self.work,
            PomodoroPhase::ShortBreak => self.short_break,
            PomodoroPhase::LongBreak => self.long_break,
        }
    }

    pub fn state(&self) -> PomodoroState {
        let phase_total = self.duration_of(self.phase);
        PomodoroState {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            current_session: self.current_session,
            sessions_before_long: self.sessions_before_long,
            remaining_secs: self.remaining.as_secs(),
            remaining_text: format_remaining(self.remaining),
            phase_secs: phase_total.as_secs(),
            running: self.running,
            paused: self.paused,
            auto_start: self.auto_start,
            progress: progress(phase_total, self.remaining),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resume from a pause, or start the current phase from its full length.
    pub fn start(&mut self, queue: &mut TaskQueue) -> Option<Event> {
        if self.running {
            return None;
        }
        let resumed = self.paused;
        if !resumed {
            self.remaining = self.duration_of(self.phase);
        }
        self.running = true;
        self.paused = false;
        self.epoch += 1;
        queue.schedule_after(TICK, self.tick_message());
        tracing::debug!(phase = ?self.phase, session = self.current_session, resumed, "pomodoro started");
        Some(Event::PomodoroStarted {
            phase: self.phase,
            session: self.current_session,
            remaining_secs: self.remaining.as_secs(),
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
        Some(Event::PomodoroPaused {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            at: Utc::now(),
        })
    }

    /// Back to `(Work, session 1)`, idle.
    pub fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.paused = false;
        self.phase = PomodoroPhase::Work;
        self.current_session = 1;
        self.remaining = self.work;
        self.epoch += 1;
        Some(Event::PomodoroReset { at: Utc::now() })
    }

    /// Finish the current phase now. Same transition as running out, but
    /// silent and without auto-start.
    pub fn skip(&mut self) -> Option<Event> {
        self.epoch += 1;
        self.running = false;
        self.paused = false;
        Some(self.advance(true))
    }

    pub fn set_work(&mut self, work: Duration) {
        self.work = or_default(work, DEFAULT_WORK);
        self.refit(PomodoroPhase::Work);
    }

    pub fn set_short_break(&mut self, short_break: Duration) {
        self.short_break = or_default(short_break, DEFAULT_SHORT_BREAK);
        self.refit(PomodoroPhase::ShortBreak);
    }

    pub fn set_long_break(&mut self, long_break: Duration) {
        self.long_break = or_default(long_break, DEFAULT_LONG_BREAK);
        self.refit(PomodoroPhase::LongBreak);
    }

    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.set_work(minutes_or(minutes, DEFAULT_WORK));
    }

    pub fn set_short_break_minutes(&mut self, minutes: u32) {
        self.set_short_break(minutes_or(minutes, DEFAULT_SHORT_BREAK));
    }

    pub fn set_long_break_minutes(&mut self, minutes: u32) {
        self.set_long_break(minutes_or(minutes, DEFAULT_LONG_BREAK));
    }

    pub fn set_sessions_before_long(&mut self, sessions: u32) {
        self.sessions_before_long = clamp_sessions(sessions);
        self.current_session = self.current_session.min(self.sessions_before_long);
    }

    pub fn set_auto_start(&mut self, auto_start: bool) {
        self.auto_start = auto_start;
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

    pub fn on_auto_restart(&mut self, epoch: u64, queue: &mut TaskQueue) -> Option<Event> {
        if epoch != self.epoch || self.running || self.paused || !self.auto_start {
            tracing::debug!(epoch, current = self.epoch, "stale pomodoro restart dropped");
            return None;
        }
        self.start(queue)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, queue: &mut TaskQueue) -> Event {
        self.running = false;
        self.paused = false;
        self.epoch += 1;
        if self.auto_start {
            queue.schedule_after(
                GRACE_DELAY,
                Message::AutoRestart {
                    target: Target::Pomodoro,
                    epoch: self.epoch,
                },
            );
        }
        self.advance(false)
    }

    /// Apply the transition table and load the next phase's duration.
    fn advance(&mut self, skipped: bool) -> Event {
        let from = self.phase;
        let (to, session) = match from {
            PomodoroPhase::Work if self.current_session >= self.sessions_before_long => {
                (PomodoroPhase::LongBreak, self.current_session)
            }
            PomodoroPhase::Work => (PomodoroPhase::ShortBreak, self.current_session),
            PomodoroPhase::ShortBreak => (
                PomodoroPhase::Work,
                (self.current_session + 1).min(self.sessions_before_long),
            ),
            PomodoroPhase::LongBreak => (PomodoroPhase::Work, 1),
        };
        let notice = phase_notice(from, to, self.current_session, self.sessions_before_long);
        self.phase = to;
        self.current_session = session;
        self.remaining = self.duration_of(to);
        tracing::info!(?from, ?to, session, skipped, "pomodoro phase complete");
        Event::PhaseCompleted {
            from,
            to,
            session,
            notice,
            skipped,
            auto_start: self.auto_start && !skipped,
            at: Utc::now(),
        }
    }

    /// Keep `remaining <= duration_of(phase)` after a duration change.
    /// An idle engine shows the new length right away.
    fn refit(&mut self, changed: PomodoroPhase) {
        if self.phase != changed {
            return;
        }
        let full = self.duration_of(changed);
        if self.running || self.paused {
            self.remaining = self.remaining.min(full);
        } else {
            self.remaining = full;
        }
    }

    fn tick_message(&self) -> Message {
        Message::Tick {
            target: Target::Pomodoro,
            epoch: self.epoch,
        }
    }
}

impl Default for PomodoroEngine {
    fn default() -> Self {
        Self::new(PomodoroConfig::default())
    }
}

/// Notification copy for a phase transition. `session` is the number of the
/// session that was in progress before the transition.
fn phase_notice(from: PomodoroPhase, to: PomodoroPhase, session: u32, total: u32) -> Notice {
    match (from, to) {
        (PomodoroPhase::Work, PomodoroPhase::LongBreak) => Notice::new(
            "Long Break",
            format!("All {total} sessions done. Step away for a long break."),
        ),
        (PomodoroPhase::Work, _) => Notice::new(
            "Short Break",
            format!("Session {session} of {total} done. Take a short break."),
        ),
        (PomodoroPhase::LongBreak, _) => Notice::new(
            "Fresh Cycle",
            "Long break is over. A new cycle starts with session 1.",
        ),
        (PomodoroPhase::ShortBreak, _) => Notice::new(
            "Back to Work",
            format!("Break's over. Session {} of {total} is up.", (session + 1).min(total)),
        ),
    }
}

fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

fn clamp_sessions(sessions: u32) -> u32 {
    sessions.max(MIN_SESSIONS_BEFORE_LONG)
}
