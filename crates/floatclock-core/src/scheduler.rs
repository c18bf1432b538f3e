//! Single-threaded timed work queue.
//!
//! Every delayed action in the engine (repeating ticks, the grace-delay
//! restart, the periodic settings flush) is a [`Message`] with a due time on
//! the queue's own millisecond timeline. The queue never sleeps; the driver
//! decides how virtual time maps to the wall clock. Tests advance it
//! directly, the CLI sleeps until [`TaskQueue::next_due`].
//!
//! Messages that share a due time are delivered in the order they were
//! scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Milliseconds on the queue timeline.
pub type Millis = u64;

/// Engine a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Countdown,
    Pomodoro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// One repeating tick. Dropped unless `epoch` still matches the engine.
    Tick { target: Target, epoch: u64 },
    /// Restart after the grace delay. Same epoch guard as ticks.
    AutoRestart { target: Target, epoch: u64 },
    /// Wall-clock refresh for the clock display.
    ClockTick,
    /// Best-effort settings flush.
    Flush,
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: Millis,
    seq: u64,
    message: Message,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first (BinaryHeap is a max-heap), then FIFO.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    now: Millis,
    next_seq: u64,
    heap: BinaryHeap<Scheduled>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position on the queue timeline.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Enqueue `message` to fire `delay` after the current time.
    pub fn schedule_after(&mut self, delay: Duration, message: Message) {
        let due = self.now.saturating_add(delay.as_millis() as u64);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { due, seq, message });
    }

    /// Due time of the earliest pending message.
    pub fn next_due(&self) -> Option<Millis> {
        self.heap.peek().map(|s| s.due)
    }

    /// Pop the earliest message due at or before `until`, moving the
    /// timeline forward to its due time.
    pub fn pop_due(&mut self, until: Millis) -> Option<Message> {
        if self.heap.peek()?.due > until {
            return None;
        }
        let scheduled = self.heap.pop()?;
        self.now = self.now.max(scheduled.due);
        Some(scheduled.message)
    }

    /// Move the timeline to `until` once nothing earlier is pending.
    pub fn settle(&mut self, until: Millis) {
        let limit = self.next_due().unwrap_or(Millis::MAX);
        self.now = self.now.max(until.min(limit));
    }

    /// Drop every pending message matching `pred`. Returns how many went.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&Message) -> bool) -> usize {
        let before = self.heap.len();
        self.heap.retain(|s| !pred(&s.message));
        before - self.heap.len()
    }

    /// Whether any pending message matches `pred`.
    pub fn contains(&self, mut pred: impl FnMut(&Message) -> bool) -> bool {
        self.heap.iter().any(|s| pred(&s.message))
    }
}
