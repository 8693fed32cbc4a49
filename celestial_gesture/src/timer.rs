//! Frame-polled timers.
//!
//! Nothing here schedules a callback.  Each timer only stores timestamps and
//! is asked "has it happened yet?" once per frame with the current time, so
//! a torn-down scene simply stops asking.  Time comes from a [`Clock`] so
//! tests can drive it by hand.

use std::cell::Cell;
use std::time::{Duration, Instant};

// ════════════════════════════════════════════════════════════════════════════
// Clock
// ════════════════════════════════════════════════════════════════════════════

/// Source of "now", measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self { Self::new() }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration { self.origin.elapsed() }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self { Self::default() }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration { self.now.get() }
}

// ════════════════════════════════════════════════════════════════════════════
// Deadline — one-shot
// ════════════════════════════════════════════════════════════════════════════

/// A one-shot deadline: disarmed, or armed to fire at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Duration>,
}

impl Deadline {
    pub const fn disarmed() -> Self {
        Deadline { at: None }
    }

    /// Arm to fire `after` from `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Duration, after: Duration) {
        self.at = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// True while armed and not yet reached.
    pub fn is_pending(&self, now: Duration) -> bool {
        matches!(self.at, Some(at) if now < at)
    }

    /// Returns true exactly once, on the first poll at or after the deadline,
    /// and disarms.
    pub fn fire(&mut self, now: Duration) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.at.map(|at| at.saturating_sub(now))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Refractory — cooldown gate
// ════════════════════════════════════════════════════════════════════════════

/// Lets an event through at most once per `period`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refractory {
    period: Duration,
    last: Option<Duration>,
}

impl Refractory {
    pub fn new(period: Duration) -> Self {
        Refractory { period, last: None }
    }

    pub fn period(&self) -> Duration { self.period }

    /// True when the gate would let an event through at `now`.
    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.period,
        }
    }

    /// Let an event through if the cooldown has elapsed; records `now`.
    pub fn try_trigger(&mut self, now: Duration) -> bool {
        if self.is_ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn last_trigger(&self) -> Option<Duration> { self.last }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
