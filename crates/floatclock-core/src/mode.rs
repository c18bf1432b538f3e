//! Mode selection and command routing.
//!
//! [`ModeController`] is the single entry point for UI commands. It owns the
//! active [`Mode`], both engines, the clock, the work queue and the settings
//! gateway. Commands go to the engine behind the active mode; time moves
//! forward only through [`ModeController::advance_to`].
//!
//! The engine behind a non-active mode keeps counting if it was running.
//! Its completions and auto-restarts still happen but stay silent. Only a
//! mode switch during the grace delay cancels a pending restart.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::clock::{ClockFormat, ClockSource, CLOCK_TICK};
use crate::error::Result;
use crate::events::Event;
use crate::scheduler::{Message, Millis, TaskQueue, Target};
use crate::settings::{self, Settings, SettingsGateway};
use crate::sinks::Alerts;
use crate::timer::{
    CountdownEngine, CountdownState, PomodoroEngine, PomodoroPhase, PomodoroState, TickOutcome,
};

/// Default cadence of the best-effort settings flush.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Clock,
    Countdown,
    Pomodoro,
}

impl Mode {
    /// Declared cycling order.
    pub const ALL: [Mode; 3] = [Mode::Clock, Mode::Countdown, Mode::Pomodoro];

    pub fn next(self) -> Mode {
        match self {
            Mode::Clock => Mode::Countdown,
            Mode::Countdown => Mode::Pomodoro,
            Mode::Pomodoro => Mode::Clock,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Clock => "clock",
            Mode::Countdown => "countdown",
            Mode::Pomodoro => "pomodoro",
        }
    }

    fn owns(self, target: Target) -> bool {
        matches!(
            (self, target),
            (Mode::Countdown, Target::Countdown) | (Mode::Pomodoro, Target::Pomodoro)
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clock" => Ok(Mode::Clock),
            "countdown" => Ok(Mode::Countdown),
            "pomodoro" => Ok(Mode::Pomodoro),
            other => Err(format!("unknown mode '{other}' (expected clock, countdown or pomodoro)")),
        }
    }
}

/// Everything the render layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Bumped on every published change.
    pub revision: u64,
    pub mode: Mode,
    /// Running flag of the engine behind the active mode.
    pub running: bool,
    pub clock: String,
    pub countdown: CountdownState,
    pub pomodoro: PomodoroState,
}

impl Snapshot {
    /// Serialize for the CLI and other JSON consumers.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The text the overlay shows for the active mode.
    pub fn headline(&self) -> String {
        match self.mode {
            Mode::Clock => self.clock.clone(),
            Mode::Countdown => self.countdown.remaining_text.clone(),
            Mode::Pomodoro => format!(
                "{} {}/{} {}",
                self.pomodoro.phase_label,
                self.pomodoro.current_session,
                self.pomodoro.sessions_before_long,
                self.pomodoro.remaining_text
            ),
        }
    }
}

pub struct ModeController {
    mode: Mode,
    countdown: CountdownEngine,
    pomodoro: PomodoroEngine,
    clock: ClockSource,
    queue: TaskQueue,
    alerts: Alerts,
    gateway: SettingsGateway,
    settings: Settings,
    revision: u64,
    flush_interval: Option<Duration>,
}

impl ModeController {
    /// Build every engine from `settings`. Nothing is scheduled yet.
    pub fn new(settings: Settings, gateway: SettingsGateway, mut alerts: Alerts) -> Self {
        alerts.set_sound_enabled(settings.sound_enabled);
        Self {
            mode: settings.mode,
            countdown: CountdownEngine::new(settings.countdown_total(), settings.countdown.auto_repeat),
            pomodoro: PomodoroEngine::new(settings.pomodoro.config()),
            clock: ClockSource::new(settings.clock),
            queue: TaskQueue::new(),
            alerts,
            gateway,
            settings,
            revision: 0,
            flush_interval: None,
        }
    }

    /// Load settings through `gateway`, then build.
    pub fn load(gateway: SettingsGateway, alerts: Alerts) -> Self {
        let settings = gateway.load();
        tracing::debug!(mode = %settings.mode, "settings loaded");
        Self::new(settings, gateway, alerts)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Running flag of the engine behind the active mode. Always false for
    /// the clock.
    pub fn is_running(&self) -> bool {
        match self.mode {
            Mode::Clock => false,
            Mode::Countdown => self.countdown.is_running(),
            Mode::Pomodoro => self.pomodoro.is_running(),
        }
    }

    pub fn countdown(&self) -> &CountdownEngine {
        &self.countdown
    }

    pub fn pomodoro(&self) -> &PomodoroEngine {
        &self.pomodoro
    }

    pub fn clock(&self) -> &ClockSource {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current position on the queue timeline.
    pub fn now(&self) -> Millis {
        self.queue.now()
    }

    /// When the next queued message falls due.
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.next_due()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            mode: self.mode,
            running: self.is_running(),
            clock: self.clock.display(),
            countdown: self.countdown.state(),
            pomodoro: self.pomodoro.state(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or pause the active engine. No-op under the clock.
    pub fn toggle_start_pause(&mut self) -> Option<Event> {
        let event = match self.mode {
            Mode::Clock => None,
            Mode::Countdown if self.countdown.is_running() => self.countdown.pause(),
            Mode::Countdown => self.countdown.start(&mut self.queue),
            Mode::Pomodoro if self.pomodoro.is_running() => self.pomodoro.pause(),
            Mode::Pomodoro => self.pomodoro.start(&mut self.queue),
        };
        self.publish(event)
    }

    /// Reset the active engine. No-op under the clock.
    pub fn reset_current(&mut self) -> Option<Event> {
        let event = match self.mode {
            Mode::Clock => None,
            Mode::Countdown => self.countdown.reset(),
            Mode::Pomodoro => self.pomodoro.reset(),
        };
        self.publish(event)
    }

    /// Clock -> Countdown -> Pomodoro -> Clock. Engine timers are untouched.
    pub fn cycle_mode(&mut self) -> Option<Event> {
        self.set_mode(self.mode.next())
    }

    /// Jump straight to `mode`. Pending auto-restarts are dropped.
    pub fn set_mode(&mut self, mode: Mode) -> Option<Event> {
        if mode == self.mode {
            return None;
        }
        let from = self.mode;
        self.mode = mode;
        let dropped = self
            .queue
            .cancel_where(|m| matches!(m, Message::AutoRestart { .. }));
        if dropped > 0 {
            tracing::debug!(dropped, "mode switch cancelled pending restarts");
        }
        self.settings.mode = mode;
        self.persist();
        tracing::debug!(%from, to = %mode, "mode changed");
        self.publish(Some(Event::ModeChanged {
            from,
            to: mode,
            at: Utc::now(),
        }))
    }

    /// Finish the current Pomodoro phase early. Pomodoro mode only.
    pub fn skip_phase(&mut self) -> Option<Event> {
        let event = match self.mode {
            Mode::Pomodoro => self.pomodoro.skip(),
            _ => None,
        };
        self.publish(event)
    }

    // ── Settings mutators ────────────────────────────────────────────

    /// Countdown length in minutes; resets the countdown.
    pub fn set_countdown_preset(&mut self, minutes: u32) -> Option<Event> {
        let event = self.countdown.set_preset(minutes);
        self.settings.countdown.total_secs = self.countdown.total().as_secs();
        self.persist();
        self.publish(event)
    }

    pub fn set_countdown_auto_repeat(&mut self, enabled: bool) -> Option<Event> {
        self.countdown.set_auto_repeat(enabled);
        self.settings.countdown.auto_repeat = enabled;
        self.setting_changed(settings::KEY_COUNTDOWN_AUTO_REPEAT)
    }

    pub fn set_work_minutes(&mut self, minutes: u32) -> Option<Event> {
        self.pomodoro.set_work_minutes(minutes);
        self.settings.pomodoro.work_secs = self.pomodoro.duration_of(PomodoroPhase::Work).as_secs();
        self.setting_changed(settings::KEY_WORK)
    }

    pub fn set_short_break_minutes(&mut self, minutes: u32) -> Option<Event> {
        self.pomodoro.set_short_break_minutes(minutes);
        self.settings.pomodoro.short_break_secs = self
            .pomodoro
            .duration_of(PomodoroPhase::ShortBreak)
            .as_secs();
        self.setting_changed(settings::KEY_SHORT_BREAK)
    }

    pub fn set_long_break_minutes(&mut self, minutes: u32) -> Option<Event> {
        self.pomodoro.set_long_break_minutes(minutes);
        self.settings.pomodoro.long_break_secs = self
            .pomodoro
            .duration_of(PomodoroPhase::LongBreak)
            .as_secs();
        self.setting_changed(settings::KEY_LONG_BREAK)
    }

    pub fn set_sessions_before_long(&mut self, sessions: u32) -> Option<Event> {
        self.pomodoro.set_sessions_before_long(sessions);
        self.settings.pomodoro.sessions_before_long = self.pomodoro.sessions_before_long();
        self.setting_changed(settings::KEY_SESSIONS)
    }

    pub fn set_pomodoro_auto_start(&mut self, enabled: bool) -> Option<Event> {
        self.pomodoro.set_auto_start(enabled);
        self.settings.pomodoro.auto_start = enabled;
        self.setting_changed(settings::KEY_AUTO_START)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Option<Event> {
        self.alerts.set_sound_enabled(enabled);
        self.settings.sound_enabled = enabled;
        self.setting_changed(settings::KEY_SOUND)
    }

    pub fn set_use_24_hour(&mut self, enabled: bool) -> Option<Event> {
        self.update_clock_format(settings::KEY_24_HOUR, |f| f.use_24_hour = enabled)
    }

    pub fn set_show_seconds(&mut self, enabled: bool) -> Option<Event> {
        self.update_clock_format(settings::KEY_SECONDS, |f| f.show_seconds = enabled)
    }

    pub fn set_show_date(&mut self, enabled: bool) -> Option<Event> {
        self.update_clock_format(settings::KEY_DATE, |f| f.show_date = enabled)
    }

    /// Write current settings through the gateway (best effort).
    pub fn persist(&mut self) {
        self.gateway.save(&self.settings);
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Begin the 0.5 s clock refresh. Idempotent.
    pub fn start_clock(&mut self) {
        if self.queue.contains(|m| matches!(m, Message::ClockTick)) {
            return;
        }
        self.clock.tick();
        self.queue.schedule_after(CLOCK_TICK, Message::ClockTick);
    }

    /// Save settings every `interval` from now on.
    pub fn enable_periodic_flush(&mut self, interval: Duration) {
        let already = self.flush_interval.is_some();
        self.flush_interval = Some(interval);
        if !already {
            self.queue.schedule_after(interval, Message::Flush);
        }
    }

    /// Deliver everything due up to `until`, in order.
    pub fn advance_to(&mut self, until: Millis) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(message) = self.queue.pop_due(until) {
            if let Some(event) = self.dispatch(message) {
                events.push(event);
            }
        }
        self.queue.settle(until);
        events
    }

    pub fn advance_by(&mut self, elapsed: Duration) -> Vec<Event> {
        let until = self.queue.now().saturating_add(elapsed.as_millis() as u64);
        self.advance_to(until)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, message: Message) -> Option<Event> {
        match message {
            Message::Tick { target, epoch } => {
                let outcome = match target {
                    Target::Countdown => self.countdown.on_tick(epoch, &mut self.queue),
                    Target::Pomodoro => self.pomodoro.on_tick(epoch, &mut self.queue),
                };
                match outcome {
                    TickOutcome::Stale => None,
                    TickOutcome::Advanced { .. } => {
                        if self.mode.owns(target) {
                            self.revision += 1;
                        }
                        None
                    }
                    TickOutcome::Completed(event) => {
                        if self.mode.owns(target) {
                            if let Some(notice) = event.alert() {
                                self.alerts.fire(notice);
                            }
                        } else {
                            tracing::debug!(?target, "background completion kept silent");
                        }
                        self.publish(Some(event))
                    }
                }
            }
            Message::AutoRestart { target, epoch } => {
                if !self.mode.owns(target) {
                    tracing::debug!(?target, "background engine restarting quietly");
                }
                let event = match target {
                    Target::Countdown => self.countdown.on_auto_restart(epoch, &mut self.queue),
                    Target::Pomodoro => self.pomodoro.on_auto_restart(epoch, &mut self.queue),
                };
                self.publish(event)
            }
            Message::ClockTick => {
                self.clock.tick();
                self.queue.schedule_after(CLOCK_TICK, Message::ClockTick);
                if self.mode != Mode::Clock {
                    return None;
                }
                self.publish(Some(Event::ClockTicked {
                    display: self.clock.display(),
                    at: Utc::now(),
                }))
            }
            Message::Flush => {
                self.persist();
                if let Some(interval) = self.flush_interval {
                    self.queue.schedule_after(interval, Message::Flush);
                }
                None
            }
        }
    }

    fn update_clock_format(
        &mut self,
        key: &'static str,
        update: impl FnOnce(&mut ClockFormat),
    ) -> Option<Event> {
        update(&mut self.settings.clock);
        self.clock.set_format(self.settings.clock);
        self.setting_changed(key)
    }

    fn setting_changed(&mut self, key: &'static str) -> Option<Event> {
        self.persist();
        let value = self.settings.get(key).unwrap_or_default();
        self.publish(Some(Event::SettingChanged {
            key: key.to_string(),
            value,
            at: Utc::now(),
        }))
    }

    fn publish(&mut self, event: Option<Event>) -> Option<Event> {
        if event.is_some() {
            self.revision += 1;
        }
        event
    }
}

impl fmt::Debug for ModeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode)
            .field("countdown", &self.countdown)
            .field("pomodoro", &self.pomodoro)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::Recorder;
    use crate::storage::MemoryStore;

    fn controller(settings: Settings) -> (ModeController, Recorder, MemoryStore) {
        let recorder = Recorder::new();
        let store = MemoryStore::new();
        let alerts = Alerts::new(recorder.clone(), recorder.clone(), true);
        let controller = ModeController::new(settings, SettingsGateway::new(store.clone()), alerts);
        (controller, recorder, store)
    }

    fn in_mode(mode: Mode) -> Settings {
        Settings {
            mode,
            ..Settings::default()
        }
    }

    #[test]
    fn modes_cycle_in_declared_order() {
        let (mut c, _, _) = controller(Settings::default());
        let mut seen = vec![c.mode()];
        for _ in 0..3 {
            c.cycle_mode();
            seen.push(c.mode());
        }
        assert_eq!(seen, vec![Mode::Clock, Mode::Countdown, Mode::Pomodoro, Mode::Clock]);
    }

    #[test]
    fn clock_mode_commands_are_noops() {
        let (mut c, _, _) = controller(Settings::default());
        let revision = c.revision();
        assert!(c.toggle_start_pause().is_none());
        assert!(c.reset_current().is_none());
        assert!(c.skip_phase().is_none());
        assert!(!c.is_running());
        assert_eq!(c.revision(), revision);
    }

    #[test]
    fn toggle_routes_to_active_engine() {
        let (mut c, _, _) = controller(in_mode(Mode::Countdown));
        assert!(matches!(c.toggle_start_pause(), Some(Event::CountdownStarted { .. })));
        assert!(c.is_running());
        assert!(!c.pomodoro().is_running());
        assert!(matches!(c.toggle_start_pause(), Some(Event::CountdownPaused { .. })));
        assert!(c.countdown().is_paused());
    }

    #[test]
    fn background_engine_keeps_counting() {
        let (mut c, recorder, _) = controller(in_mode(Mode::Countdown));
        c.set_countdown_preset(1);
        c.toggle_start_pause();
        c.advance_by(Duration::from_secs(10));
        c.cycle_mode();
        assert_eq!(c.mode(), Mode::Pomodoro);
        assert!(!c.is_running());

        c.advance_by(Duration::from_secs(20));
        assert!(c.countdown().is_running());
        assert_eq!(c.countdown().remaining(), Duration::from_secs(30));

        // Completion in the background changes state but stays silent.
        c.advance_by(Duration::from_secs(30));
        assert!(!c.countdown().is_running());
        assert_eq!(c.countdown().remaining(), Duration::ZERO);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn background_auto_repeat_keeps_cycling() {
        let mut settings = in_mode(Mode::Countdown);
        settings.countdown.total_secs = 3;
        settings.countdown.auto_repeat = true;
        let (mut c, recorder, _) = controller(settings);
        c.toggle_start_pause();
        c.cycle_mode();

        // Complete at 3 s, restart after the grace delay at 4 s.
        c.advance_by(Duration::from_secs(5));
        assert!(c.countdown().is_running());
        assert_eq!(c.countdown().remaining(), Duration::from_secs(2));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn background_ticks_leave_revision_alone() {
        let (mut c, _, _) = controller(in_mode(Mode::Countdown));
        c.toggle_start_pause();
        c.cycle_mode();
        let revision = c.revision();
        c.advance_by(Duration::from_secs(5));
        assert_eq!(c.revision(), revision);
        assert_eq!(c.countdown().remaining(), Duration::from_secs(25 * 60 - 5));
    }

    #[test]
    fn mode_switch_during_grace_delay_cancels_restart() {
        let mut settings = in_mode(Mode::Countdown);
        settings.countdown.total_secs = 1;
        settings.countdown.auto_repeat = true;
        let (mut c, recorder, _) = controller(settings);
        c.toggle_start_pause();
        c.advance_by(Duration::from_secs(1));
        assert_eq!(recorder.notification_titles(), vec!["Countdown Complete"]);

        c.cycle_mode();
        c.cycle_mode();
        c.cycle_mode();
        assert_eq!(c.mode(), Mode::Countdown);
        c.advance_by(Duration::from_secs(5));
        assert!(!c.countdown().is_running());
    }

    #[test]
    fn foreground_completion_fires_sinks_once() {
        let mut settings = in_mode(Mode::Countdown);
        settings.countdown.total_secs = 3;
        let (mut c, recorder, _) = controller(settings);
        c.toggle_start_pause();
        let events = c.advance_by(Duration::from_secs(10));
        assert_eq!(events.len(), 1);
        assert_eq!(recorder.sound_count(), 1);
        assert_eq!(recorder.notification_titles(), vec!["Countdown Complete"]);
    }

    #[test]
    fn sound_flag_gates_chime() {
        let mut settings = in_mode(Mode::Countdown);
        settings.countdown.total_secs = 1;
        settings.sound_enabled = false;
        let (mut c, recorder, _) = controller(settings);
        c.toggle_start_pause();
        c.advance_by(Duration::from_secs(1));
        assert_eq!(recorder.sound_count(), 0);
        assert_eq!(recorder.notification_titles().len(), 1);
    }

    #[test]
    fn mutators_persist() {
        let (mut c, _, store) = controller(Settings::default());
        c.set_work_minutes(50);
        c.set_sessions_before_long(1);
        c.set_countdown_preset(10);
        c.cycle_mode();

        let reloaded = SettingsGateway::new(store).load();
        assert_eq!(reloaded.pomodoro.work_secs, 50 * 60);
        assert_eq!(reloaded.pomodoro.sessions_before_long, 2);
        assert_eq!(reloaded.countdown.total_secs, 600);
        assert_eq!(reloaded.mode, Mode::Countdown);
    }

    #[test]
    fn ticks_bump_revision() {
        let (mut c, _, _) = controller(in_mode(Mode::Pomodoro));
        c.toggle_start_pause();
        let before = c.revision();
        c.advance_by(Duration::from_secs(3));
        assert_eq!(c.revision(), before + 3);
        assert_eq!(c.pomodoro().remaining(), Duration::from_secs(25 * 60 - 3));
    }

    #[test]
    fn clock_ticks_every_half_second() {
        let (mut c, _, _) = controller(Settings::default());
        c.start_clock();
        c.start_clock();
        let events = c.advance_by(Duration::from_secs(2));
        let ticks = events
            .iter()
            .filter(|e| matches!(e, Event::ClockTicked { .. }))
            .count();
        assert_eq!(ticks, 4);
    }

    #[test]
    fn periodic_flush_saves() {
        let (mut c, _, store) = controller(in_mode(Mode::Pomodoro));
        c.enable_periodic_flush(Duration::from_secs(30));
        assert!(store.is_empty());
        c.advance_by(Duration::from_secs(30));
        assert!(!store.is_empty());
    }

    #[test]
    fn snapshot_headline_follows_mode() {
        let (mut c, _, _) = controller(in_mode(Mode::Countdown));
        assert_eq!(c.snapshot().headline(), "25:00");
        c.cycle_mode();
        assert_eq!(c.snapshot().headline(), "Work 1/4 25:00");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Pomodoro".parse::<Mode>(), Ok(Mode::Pomodoro));
        assert!("stopwatch".parse::<Mode>().is_err());
    }
}
