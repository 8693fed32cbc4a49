//! Heart-pose debouncing.
//!
//! The raw two-hand detector flickers from frame to frame.  The debouncer
//! turns it into a stable "show the heart" signal: a detection triggers at
//! most once per refractory period, and each trigger keeps the heart visible
//! for a fixed window no matter what the detector does in the meantime.

use std::time::Duration;

use log::debug;

use crate::classifier::HeartDetection;
use crate::timer::{Deadline, Refractory};

/// Minimum gap between two triggers.
pub const HEART_REFRACTORY: Duration = Duration::from_millis(500);

/// How long one trigger keeps the heart visible.
pub const HEART_VISIBLE_FOR: Duration = Duration::from_millis(2000);

#[derive(Clone, Debug)]
pub struct HeartDebouncer {
    gate:        Refractory,
    visible_for: Duration,
    hide:        Deadline,
    position:    Option<(f32, f32)>,
}

impl HeartDebouncer {
    pub fn new() -> Self {
        Self::with_timing(HEART_REFRACTORY, HEART_VISIBLE_FOR)
    }

    pub fn with_timing(refractory: Duration, visible_for: Duration) -> Self {
        HeartDebouncer {
            gate: Refractory::new(refractory),
            visible_for,
            hide: Deadline::disarmed(),
            position: None,
        }
    }

    /// Feed one frame's detection.  Returns true when this call triggered.
    pub fn update(&mut self, detection: &HeartDetection, now: Duration) -> bool {
        // expire first so a retrigger at the boundary reads as a new show
        if self.hide.fire(now) {
            debug!("heart gesture hidden");
        }

        if !detection.detected || !self.gate.try_trigger(now) {
            return false;
        }

        self.position = detection.position;
        self.hide.arm(now, self.visible_for);
        debug!("heart gesture triggered at {:?}", detection.position);
        true
    }

    /// True while inside the visibility window of the latest trigger.
    pub fn is_visible(&self, now: Duration) -> bool {
        self.hide.is_pending(now)
    }

    /// Position reported by the latest trigger.
    pub fn position(&self) -> Option<(f32, f32)> {
        self.position
    }

    /// Drop the pending hide deadline and the visibility it implies.
    pub fn cancel(&mut self) {
        self.hide.cancel();
    }
}

impl Default for HeartDebouncer {
    fn default() -> Self { Self::new() }
}
