//! Wall-clock display source.
//!
//! Purely informational: the clock never completes and never alerts. It is
//! refreshed every [`CLOCK_TICK`] and rendered through a [`ClockFormat`].

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Clock refresh cadence.
pub const CLOCK_TICK: Duration = Duration::from_millis(500);

/// Display preferences for the clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockFormat {
    #[serde(default = "default_true")]
    pub use_24_hour: bool,
    #[serde(default = "default_true")]
    pub show_seconds: bool,
    #[serde(default)]
    pub show_date: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ClockFormat {
    fn default() -> Self {
        Self {
            use_24_hour: true,
            show_seconds: true,
            show_date: false,
        }
    }
}

impl ClockFormat {
    /// strftime pattern for this format.
    pub fn pattern(&self) -> String {
        let mut pattern = String::new();
        if self.show_date {
            pattern.push_str("%a %b %-d ");
        }
        pattern.push_str(if self.use_24_hour { "%H:%M" } else { "%-I:%M" });
        if self.show_seconds {
            pattern.push_str(":%S");
        }
        if !self.use_24_hour {
            pattern.push_str(" %p");
        }
        pattern
    }

    pub fn render<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        at.format(&self.pattern()).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ClockSource {
    format: ClockFormat,
    now: DateTime<Local>,
}

impl ClockSource {
    pub fn new(format: ClockFormat) -> Self {
        Self {
            format,
            now: Local::now(),
        }
    }

    /// Sample the system clock.
    pub fn tick(&mut self) -> DateTime<Local> {
        self.tick_at(Local::now())
    }

    /// Record an externally supplied time.
    pub fn tick_at(&mut self, at: DateTime<Local>) -> DateTime<Local> {
        self.now = at;
        at
    }

    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    pub fn format(&self) -> ClockFormat {
        self.format
    }

    pub fn set_format(&mut self, format: ClockFormat) {
        self.format = format;
    }

    /// Last observed time, formatted.
    pub fn display(&self) -> String {
        self.format.render(&self.now)
    }
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::new(ClockFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn afternoon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 14, 5, 9).unwrap()
    }

    #[test]
    fn twenty_four_hour_with_seconds() {
        let format = ClockFormat::default();
        assert_eq!(format.render(&afternoon()), "14:05:09");
    }

    #[test]
    fn twelve_hour_without_seconds() {
        let format = ClockFormat {
            use_24_hour: false,
            show_seconds: false,
            show_date: false,
        };
        assert_eq!(format.render(&afternoon()), "2:05 PM");
    }

    #[test]
    fn date_prefix() {
        let format = ClockFormat {
            use_24_hour: true,
            show_seconds: false,
            show_date: true,
        };
        assert_eq!(format.render(&afternoon()), "Mon Jan 5 14:05");
    }

    #[test]
    fn tick_at_updates_observed_time() {
        let mut clock = ClockSource::default();
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(clock.tick_at(at), at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.display(), "09:30:00");
    }
}
