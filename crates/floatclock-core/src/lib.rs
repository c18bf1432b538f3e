//! # floatclock Core Library
//!
//! Timing logic behind the floatclock overlay: a wall clock, a countdown and
//! a Pomodoro cycle, plus the policy for when completions chime, notify and
//! restart. Presentation lives elsewhere; the overlay (or the CLI) only
//! issues commands and re-reads the published [`Snapshot`].
//!
//! ## Architecture
//!
//! - **Engines**: tick-driven state machines with no threads and no clock
//!   reads of their own
//! - **Work queue**: a single-threaded timed queue carrying ticks, grace-delay
//!   restarts and settings flushes; the caller maps it onto real time
//! - **Mode controller**: routes UI commands to the engine behind the active
//!   mode
//! - **Settings**: a get/set store behind a gateway that repairs bad values
//!   and never lets a storage failure reach the timer
//!
//! ## Key Components
//!
//! - [`ModeController`]: command entry point and composition of everything
//! - [`CountdownEngine`] / [`PomodoroEngine`]: the two timers
//! - [`SettingsGateway`]: durable settings round-trip
//! - [`Alerts`]: sound and notification sinks

pub mod clock;
pub mod error;
pub mod events;
pub mod mode;
pub mod scheduler;
pub mod settings;
pub mod sinks;
pub mod storage;
pub mod timer;

pub use clock::{ClockFormat, ClockSource};
pub use error::{CoreError, StorageError};
pub use events::Event;
pub use mode::{Mode, ModeController, Snapshot};
pub use scheduler::{Message, Millis, TaskQueue, Target};
pub use settings::{Settings, SettingsGateway};
pub use sinks::{Alerts, NotificationSink, Notice, NullSink, Recorder, SoundSink};
pub use storage::{MemoryStore, SettingsStore, TomlFileStore};
pub use timer::{CountdownEngine, PomodoroConfig, PomodoroEngine, PomodoroPhase, TickOutcome};
