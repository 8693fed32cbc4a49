//! Hand trackers for the desktop viewer: the keyboard/mouse simulator and,
//! behind the `leap` feature, a real LeapMotion controller.
//!
//! Both implement [`HandTracker`], so the scene cannot tell them apart.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use celestial_gesture::synthetic;
use celestial_gesture::{FrameSink, HandTracker, Landmark, TrackingFrame};
use log::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// Simulated input
// ════════════════════════════════════════════════════════════════════════════

/// Hand pose the simulator is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    /// No hand in view.
    Hidden,
    Fist,
    Open,
    /// Between fist and open; keeps the current expansion.
    Relaxed,
    /// Relaxed hand with thumb and index `pinch` apart.
    Pinch,
    /// Both hands in the heart pose.
    Heart,
}

impl SimPose {
    pub fn label(&self) -> &'static str {
        match self {
            SimPose::Hidden  => "hidden",
            SimPose::Fist    => "fist",
            SimPose::Open    => "open",
            SimPose::Relaxed => "relaxed",
            SimPose::Pinch   => "pinch",
            SimPose::Heart   => "heart",
        }
    }
}

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    Pose(SimPose),
    /// Mouse position in normalised window coordinates.
    Pointer(f32, f32),
    PinchWider,
    PinchNarrower,
    Quit,
}

pub const PINCH_MIN:     f32 = 0.02;
pub const PINCH_MAX:     f32 = 0.25;
pub const PINCH_STEP:    f32 = 0.01;
const PINCH_DEFAULT:     f32 = 0.10;

/// State of the simulated hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHand {
    pub pose:    SimPose,
    /// Wrist position, normalised image coordinates.
    pub pointer: (f32, f32),
    /// Thumb ↔ index distance while pinching.
    pub pinch:   f32,
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { pose: SimPose::Hidden, pointer: (0.5, 0.6), pinch: PINCH_DEFAULT }
    }
}

impl SimHand {
    /// Apply one input.  Returns false on `Quit`.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Pose(pose)      => self.pose = pose,
            SimInput::Pointer(x, y)   => {
                self.pointer = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
            }
            SimInput::PinchWider      => {
                self.pinch = (self.pinch + PINCH_STEP).min(PINCH_MAX);
            }
            SimInput::PinchNarrower   => {
                self.pinch = (self.pinch - PINCH_STEP).max(PINCH_MIN);
            }
            SimInput::Quit            => return false,
        }
        true
    }

    /// Landmarks for the current pose.
    pub fn frame(&self, captured_at: Duration) -> TrackingFrame {
        let wrist = self.pointer;
        let hands = match self.pose {
            SimPose::Hidden  => Vec::new(),
            SimPose::Fist    => vec![synthetic::fist_hand(wrist)],
            SimPose::Open    => vec![synthetic::open_hand(wrist)],
            SimPose::Relaxed => vec![synthetic::hand_with_ratio(wrist, 1.5)],
            SimPose::Pinch   => vec![synthetic::pinch_hand(wrist, self.pinch)],
            SimPose::Heart   => {
                let (l, r) = synthetic::heart_pair(wrist);
                vec![l, r]
            }
        };
        TrackingFrame::new(hands, captured_at)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandTracker
// ════════════════════════════════════════════════════════════════════════════

/// Synthesises landmark frames at a camera-like rate from [`SimInput`]
/// events sent by the visualizer window.
pub struct SimHandTracker {
    rx:     Receiver<SimInput>,
    period: Duration,
    hand:   SimHand,
}

impl SimHandTracker {
    /// ~30 frames per second, like a webcam.
    pub fn new(rx: Receiver<SimInput>) -> Self {
        Self::with_period(rx, Duration::from_millis(33))
    }

    pub fn with_period(rx: Receiver<SimInput>, period: Duration) -> Self {
        SimHandTracker { rx, period, hand: SimHand::default() }
    }
}

impl HandTracker for SimHandTracker {
    fn name(&self) -> &str {
        "keyboard simulator"
    }

    fn run(self: Box<Self>, sink: FrameSink) {
        let SimHandTracker { rx, period, mut hand } = *self;
        if !sink.ready() {
            return;
        }

        let start = Instant::now();
        let mut next = start;
        loop {
            if sink.should_stop() {
                return;
            }
            let wait = next.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(input) => {
                    if !hand.apply(input) {
                        info!("simulator quit");
                        return;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("simulator input closed");
                    return;
                }
            }
            next += period;
            if !sink.frame(hand.frame(start.elapsed())) {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapMotion → landmark mapping
// ════════════════════════════════════════════════════════════════════════════

/// Half width of the interaction box, mm.
const LEAP_HALF_WIDTH: f32 = 200.0;
/// Lowest tracked palm height, mm.
const LEAP_FLOOR:      f32 = 50.0;
/// Height and depth span mapped onto one image unit, mm.
const LEAP_SPAN:       f32 = 400.0;

/// Map a LeapMotion position (mm, device space, y up) to image-space
/// landmark coordinates (y down, origin top-left).
pub fn leap_landmark(x: f32, y: f32, z: f32) -> Landmark {
    Landmark::new(
        (x + LEAP_HALF_WIDTH) / LEAP_SPAN,
        1.0 - (y - LEAP_FLOOR) / LEAP_SPAN,
        z / LEAP_SPAN,
    )
}

/// Gesture source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Each digit contributes four landmarks (the joints at the base of its
/// proximal, intermediate and distal bones, then the tip), the first bone of
/// the middle finger stands in for the wrist.
#[cfg(feature = "leap")]
pub struct LeapHandTracker;

#[cfg(feature = "leap")]
impl HandTracker for LeapHandTracker {
    fn name(&self) -> &str {
        "LeapMotion"
    }

    fn run(self: Box<Self>, sink: FrameSink) {
        use celestial_gesture::TrackingError;
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                sink.failed(TrackingError::Unavailable(format!("LeapC connection: {:?}", e)));
                return;
            }
        };
        if let Err(e) = connection.open() {
            sink.failed(TrackingError::Unavailable(format!("LeapMotion device: {:?}", e)));
            return;
        }
        if !sink.ready() {
            return;
        }

        let start = Instant::now();
        while !sink.should_stop() {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame
                    .hands()
                    .map(|h| leap_hand(&h))
                    .take(celestial_gesture::MAX_HANDS)
                    .collect();
                if !sink.frame(TrackingFrame::new(hands, start.elapsed())) {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> celestial_gesture::HandFrame {
    let to_landmark = |v: leaprs::LeapVector| leap_landmark(v.x, v.y, v.z);

    let digits: Vec<_> = hand.digits().collect();
    let mut points = vec![Landmark::default(); celestial_gesture::LANDMARK_COUNT];
    if let Some(middle) = digits.get(2) {
        points[celestial_gesture::landmark::WRIST] = to_landmark(middle.metacarpal().prev_joint());
    }
    for (f, digit) in digits.iter().take(5).enumerate() {
        let base = 1 + f * 4;
        points[base]     = to_landmark(digit.proximal().prev_joint());
        points[base + 1] = to_landmark(digit.intermediate().prev_joint());
        points[base + 2] = to_landmark(digit.distal().prev_joint());
        points[base + 3] = to_landmark(digit.distal().next_joint());
    }
    celestial_gesture::HandFrame::new(points)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
