//! # celestial_gesture
//!
//! Hand-landmark input for the celestial particle scene: normalised landmark
//! frames, a geometric gesture classifier, a debounced two-hand heart pose,
//! and the provider contract that hand trackers implement.
//!
//! ## Gestures
//!
//! | Gesture | Hands | Reading |
//! |---|---|---|
//! | Fist | one | `HandPose::Fist`: collapse toward the heart and detonate |
//! | Open palm | one | `HandPose::Open`: expand toward the galaxy |
//! | Pinch | one | thumb ↔ index distance, eased into a camera depth |
//! | Hand position / roll | one | rotation targets and a particle attractor |
//! | Heart | two | thumbs and index fingers interlocked, middles apart |
//!
//! ## Providers
//!
//! A [`HandTracker`] runs on its own thread and pushes frames into a
//! [`TrackingSession`]; the render loop reads only the newest one each tick.
//! [`ScriptedTracker`] replays a fixed sequence, and [`synthetic`] builds
//! hands in known poses for simulators and tests.

pub mod classifier;
pub mod error;
pub mod heart;
pub mod landmark;
pub mod synthetic;
pub mod timer;
pub mod tracking;

pub use classifier::{
    GestureClassifier, GestureReading, GestureThresholds, HandPose, HeartDetection,
};
pub use error::TrackingError;
pub use heart::HeartDebouncer;
pub use landmark::{HandFrame, Landmark, TrackingFrame, LANDMARK_COUNT, MAX_HANDS};
pub use timer::{Clock, Deadline, ManualClock, MonotonicClock, Refractory};
pub use tracking::{
    FrameSink, HandTracker, ScriptedTracker, TrackingEvent, TrackingSession, TrackingStatus,
};
