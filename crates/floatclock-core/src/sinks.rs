//! Completion side effects.
//!
//! Sound and notification delivery live outside the engine. Both sinks are
//! fire-and-forget: nothing is returned, nothing is retried.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Title and body of a completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Plays the completion chime.
pub trait SoundSink {
    fn play(&mut self);
}

/// Delivers a user-visible notification.
pub trait NotificationSink {
    fn send(&mut self, title: &str, body: &str);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SoundSink for NullSink {
    fn play(&mut self) {}
}

impl NotificationSink for NullSink {
    fn send(&mut self, _title: &str, _body: &str) {}
}

/// One observed sink invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Sound,
    Notification { title: String, body: String },
}

/// Sink that records calls into a shared log.
///
/// Clones share the log, so a test can hand one clone to [`Alerts`] and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<SinkCall>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.borrow().clone()
    }

    pub fn sound_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, SinkCall::Sound))
            .count()
    }

    pub fn notification_titles(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                SinkCall::Notification { title, .. } => Some(title.clone()),
                SinkCall::Sound => None,
            })
            .collect()
    }
}

impl SoundSink for Recorder {
    fn play(&mut self) {
        self.calls.borrow_mut().push(SinkCall::Sound);
    }
}

impl NotificationSink for Recorder {
    fn send(&mut self, title: &str, body: &str) {
        self.calls.borrow_mut().push(SinkCall::Notification {
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

/// The pair of sinks plus the sound-enabled flag.
pub struct Alerts {
    sound: Box<dyn SoundSink>,
    notifier: Box<dyn NotificationSink>,
    sound_enabled: bool,
}

impl Alerts {
    pub fn new(
        sound: impl SoundSink + 'static,
        notifier: impl NotificationSink + 'static,
        sound_enabled: bool,
    ) -> Self {
        Self {
            sound: Box::new(sound),
            notifier: Box::new(notifier),
            sound_enabled,
        }
    }

    /// Alerts that go nowhere.
    pub fn silent() -> Self {
        Self::new(NullSink, NullSink, false)
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Play the chime (when enabled) and send the notice.
    pub fn fire(&mut self, notice: &Notice) {
        tracing::info!(title = %notice.title, "completion alert");
        if self.sound_enabled {
            self.sound.play();
        }
        self.notifier.send(&notice.title, &notice.body);
    }
}

impl std::fmt::Debug for Alerts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alerts")
            .field("sound_enabled", &self.sound_enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_respects_sound_flag() {
        let recorder = Recorder::new();
        let mut alerts = Alerts::new(recorder.clone(), recorder.clone(), false);
        alerts.fire(&Notice::new("Countdown Complete", "Done."));
        assert_eq!(recorder.sound_count(), 0);
        assert_eq!(recorder.notification_titles(), vec!["Countdown Complete"]);

        alerts.set_sound_enabled(true);
        alerts.fire(&Notice::new("Countdown Complete", "Done."));
        assert_eq!(recorder.sound_count(), 1);
        assert_eq!(recorder.calls().len(), 3);
    }
}
