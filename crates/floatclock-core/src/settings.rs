//! Durable settings and the gateway that round-trips them.
//!
//! Stores user preferences including:
//! - The active mode
//! - Countdown length and auto-repeat
//! - Pomodoro durations, long-break threshold and auto-start
//! - Sound and clock display preferences
//!
//! Values are normalized rather than rejected: non-positive durations and
//! thresholds fall back to defaults and a threshold of 1 is raised to 2.
//! Persistence failures are logged and swallowed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::ClockFormat;
use crate::error::StorageError;
use crate::mode::Mode;
use crate::storage::SettingsStore;
use crate::timer::{countdown, pomodoro, PomodoroConfig};

pub const KEY_MODE: &str = "mode";
pub const KEY_COUNTDOWN_TOTAL: &str = "countdown.total_secs";
pub const KEY_COUNTDOWN_AUTO_REPEAT: &str = "countdown.auto_repeat";
pub const KEY_WORK: &str = "pomodoro.work_secs";
pub const KEY_SHORT_BREAK: &str = "pomodoro.short_break_secs";
pub const KEY_LONG_BREAK: &str = "pomodoro.long_break_secs";
pub const KEY_SESSIONS: &str = "pomodoro.sessions_before_long";
pub const KEY_AUTO_START: &str = "pomodoro.auto_start";
pub const KEY_SOUND: &str = "sound.enabled";
pub const KEY_24_HOUR: &str = "clock.use_24_hour";
pub const KEY_SECONDS: &str = "clock.show_seconds";
pub const KEY_DATE: &str = "clock.show_date";

/// Every key the gateway reads and writes, in file order.
pub const KEYS: [&str; 12] = [
    KEY_MODE,
    KEY_COUNTDOWN_TOTAL,
    KEY_COUNTDOWN_AUTO_REPEAT,
    KEY_WORK,
    KEY_SHORT_BREAK,
    KEY_LONG_BREAK,
    KEY_SESSIONS,
    KEY_AUTO_START,
    KEY_SOUND,
    KEY_24_HOUR,
    KEY_SECONDS,
    KEY_DATE,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSettings {
    pub total_secs: u64,
    pub auto_repeat: bool,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            total_secs: countdown::DEFAULT_TOTAL.as_secs(),
            auto_repeat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    pub work_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub sessions_before_long: u32,
    pub auto_start: bool,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_secs: pomodoro::DEFAULT_WORK.as_secs(),
            short_break_secs: pomodoro::DEFAULT_SHORT_BREAK.as_secs(),
            long_break_secs: pomodoro::DEFAULT_LONG_BREAK.as_secs(),
            sessions_before_long: pomodoro::DEFAULT_SESSIONS_BEFORE_LONG,
            auto_start: false,
        }
    }
}

impl PomodoroSettings {
    pub fn config(&self) -> PomodoroConfig {
        PomodoroConfig {
            work: Duration::from_secs(self.work_secs),
            short_break: Duration::from_secs(self.short_break_secs),
            long_break: Duration::from_secs(self.long_break_secs),
            sessions_before_long: self.sessions_before_long,
            auto_start: self.auto_start,
        }
    }
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub countdown: CountdownSettings,
    #[serde(default)]
    pub pomodoro: PomodoroSettings,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub clock: ClockFormat,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Clock,
            countdown: CountdownSettings::default(),
            pomodoro: PomodoroSettings::default(),
            sound_enabled: true,
            clock: ClockFormat::default(),
        }
    }
}

impl Settings {
    pub fn countdown_total(&self) -> Duration {
        Duration::from_secs(self.countdown.total_secs)
    }

    /// Current value of `key` as stored text.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            KEY_MODE => self.mode.as_str().to_string(),
            KEY_COUNTDOWN_TOTAL => self.countdown.total_secs.to_string(),
            KEY_COUNTDOWN_AUTO_REPEAT => self.countdown.auto_repeat.to_string(),
            KEY_WORK => self.pomodoro.work_secs.to_string(),
            KEY_SHORT_BREAK => self.pomodoro.short_break_secs.to_string(),
            KEY_LONG_BREAK => self.pomodoro.long_break_secs.to_string(),
            KEY_SESSIONS => self.pomodoro.sessions_before_long.to_string(),
            KEY_AUTO_START => self.pomodoro.auto_start.to_string(),
            KEY_SOUND => self.sound_enabled.to_string(),
            KEY_24_HOUR => self.clock.use_24_hour.to_string(),
            KEY_SECONDS => self.clock.show_seconds.to_string(),
            KEY_DATE => self.clock.show_date.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// All keys with their current values.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|&key| self.get(key).map(|v| (key, v)))
            .collect()
    }

    /// Parse `raw` into the field behind `key`, repairing out-of-range
    /// numbers.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the text does not parse.
    pub fn apply(&mut self, key: &str, raw: &str) -> Result<(), StorageError> {
        let raw = raw.trim();
        match key {
            KEY_MODE => {
                self.mode = raw.parse::<Mode>().map_err(|message| invalid(key, message))?;
            }
            KEY_COUNTDOWN_TOTAL => {
                self.countdown.total_secs =
                    parse_secs(key, raw, countdown::DEFAULT_TOTAL)?;
            }
            KEY_COUNTDOWN_AUTO_REPEAT => self.countdown.auto_repeat = parse_bool(key, raw)?,
            KEY_WORK => {
                self.pomodoro.work_secs = parse_secs(key, raw, pomodoro::DEFAULT_WORK)?;
            }
            KEY_SHORT_BREAK => {
                self.pomodoro.short_break_secs =
                    parse_secs(key, raw, pomodoro::DEFAULT_SHORT_BREAK)?;
            }
            KEY_LONG_BREAK => {
                self.pomodoro.long_break_secs =
                    parse_secs(key, raw, pomodoro::DEFAULT_LONG_BREAK)?;
            }
            KEY_SESSIONS => self.pomodoro.sessions_before_long = parse_sessions(key, raw)?,
            KEY_AUTO_START => self.pomodoro.auto_start = parse_bool(key, raw)?,
            KEY_SOUND => self.sound_enabled = parse_bool(key, raw)?,
            KEY_24_HOUR => self.clock.use_24_hour = parse_bool(key, raw)?,
            KEY_SECONDS => self.clock.show_seconds = parse_bool(key, raw)?,
            KEY_DATE => self.clock.show_date = parse_bool(key, raw)?,
            _ => return Err(StorageError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> StorageError {
    StorageError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_int(key: &str, raw: &str) -> Result<i64, StorageError> {
    raw.parse::<i64>()
        .map_err(|e| invalid(key, format!("cannot parse '{raw}' as integer: {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, StorageError> {
    raw.parse::<bool>()
        .map_err(|_| invalid(key, format!("cannot parse '{raw}' as bool")))
}

/// Non-positive seconds become `default`.
fn parse_secs(key: &str, raw: &str, default: Duration) -> Result<u64, StorageError> {
    let secs = parse_int(key, raw)?;
    if secs <= 0 {
        tracing::debug!(key, secs, "non-positive duration repaired to default");
        return Ok(default.as_secs());
    }
    Ok(secs as u64)
}

/// Non-positive becomes the default threshold; 1 is raised to the minimum.
fn parse_sessions(key: &str, raw: &str) -> Result<u32, StorageError> {
    let sessions = parse_int(key, raw)?;
    let repaired = if sessions <= 0 {
        pomodoro::DEFAULT_SESSIONS_BEFORE_LONG
    } else {
        u32::try_from(sessions)
            .unwrap_or(u32::MAX)
            .max(pomodoro::MIN_SESSIONS_BEFORE_LONG)
    };
    if i64::from(repaired) != sessions {
        tracing::debug!(key, sessions, repaired, "session threshold repaired");
    }
    Ok(repaired)
}

/// Reads and writes [`Settings`] through a [`SettingsStore`].
pub struct SettingsGateway {
    store: Box<dyn SettingsStore>,
}

impl SettingsGateway {
    pub fn new(store: impl SettingsStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Defaults overlaid with whatever the store holds. Unreadable or
    /// unparsable values keep their defaults.
    pub fn load(&self) -> Settings {
        let mut settings = Settings::default();
        for key in KEYS {
            match self.store.get(key) {
                Ok(Some(raw)) => {
                    if let Err(e) = settings.apply(key, &raw) {
                        tracing::warn!(key, error = %e, "ignoring stored setting");
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(key, error = %e, "settings store read failed"),
            }
        }
        settings
    }

    /// Best-effort save. Failures are logged, never returned.
    pub fn save(&mut self, settings: &Settings) {
        if let Err(e) = self.try_save(settings) {
            tracing::warn!(error = %e, "settings save failed");
        }
    }

    /// Save and report failures, for callers that want to surface them.
    ///
    /// # Errors
    /// Returns the first store error encountered.
    pub fn try_save(&mut self, settings: &Settings) -> Result<(), StorageError> {
        for (key, value) in settings.pairs() {
            self.store.set(key, &value)?;
        }
        self.store.commit()
    }

    /// Drop every stored key so the next load yields defaults.
    ///
    /// # Errors
    /// Returns the first store error encountered.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        for key in KEYS {
            self.store.remove(key)?;
        }
        self.store.commit()
    }
}

impl std::fmt::Debug for SettingsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsGateway").finish_non_exhaustive()
    }
}
