//! Landmark normalisation.
//!
//! Hand-tracking providers hand us loosely-typed point lists.  This module
//! wraps them in [`HandFrame`] / [`TrackingFrame`] with accessors that return
//! `None` instead of panicking when a provider delivers a short hand, so the
//! classifier above never has to index raw slices.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ════════════════════════════════════════════════════════════════════════════
// Hand topology
// ════════════════════════════════════════════════════════════════════════════

/// Number of points in the standard hand topology.
pub const LANDMARK_COUNT: usize = 21;

/// Providers cap detection at two hands.
pub const MAX_HANDS: usize = 2;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Bone connections, used by renderers that draw the tracked hand.
pub const HAND_SKELETON: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked hand joint.
///
/// `x` and `y` are normalised image coordinates in `[0, 1]` with the origin
/// at the top-left; `z` is relative depth, negative toward the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance in all three axes.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance in the image plane, ignoring depth.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// The landmark set for one detected hand.
///
/// A frame may be short (fewer than [`LANDMARK_COUNT`] points) when a provider
/// misbehaves; it is kept as-is and every accessor for a missing or
/// non-finite point returns `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    points: Vec<Landmark>,
}

impl HandFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        let mut points = points;
        points.truncate(LANDMARK_COUNT);
        HandFrame { points }
    }

    pub fn from_slice(points: &[Landmark]) -> Self {
        HandFrame::new(points.to_vec())
    }

    /// True when all 21 points are present.
    pub fn is_complete(&self) -> bool {
        self.points.len() == LANDMARK_COUNT
    }

    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn points(&self) -> &[Landmark] { &self.points }

    /// Landmark at `index`, or `None` if missing or non-finite.
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied().filter(Landmark::is_finite)
    }

    pub fn wrist(&self)      -> Option<Landmark> { self.get(WRIST) }
    pub fn thumb_tip(&self)  -> Option<Landmark> { self.get(THUMB_TIP) }
    pub fn index_mcp(&self)  -> Option<Landmark> { self.get(INDEX_MCP) }
    pub fn index_tip(&self)  -> Option<Landmark> { self.get(INDEX_TIP) }
    pub fn middle_mcp(&self) -> Option<Landmark> { self.get(MIDDLE_MCP) }
    pub fn middle_tip(&self) -> Option<Landmark> { self.get(MIDDLE_TIP) }
    pub fn pinky_mcp(&self)  -> Option<Landmark> { self.get(PINKY_MCP) }

    /// 3D distance between two indexed landmarks.
    pub fn distance(&self, a: usize, b: usize) -> Option<f32> {
        Some(self.get(a)?.distance(&self.get(b)?))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingFrame
// ════════════════════════════════════════════════════════════════════════════

/// Everything one tracking callback produced: zero, one or two hands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackingFrame {
    hands: Vec<HandFrame>,
    /// Capture time relative to the provider's start.
    pub captured_at: Duration,
}

impl TrackingFrame {
    /// Frame with no hands visible.
    pub fn empty(captured_at: Duration) -> Self {
        TrackingFrame { hands: Vec::new(), captured_at }
    }

    /// Build from hand frames; anything past [`MAX_HANDS`] is dropped.
    pub fn new(hands: Vec<HandFrame>, captured_at: Duration) -> Self {
        let mut hands = hands;
        hands.truncate(MAX_HANDS);
        TrackingFrame { hands, captured_at }
    }

    /// Parse a flat `[x, y, z, x, y, z, …]` buffer holding `num_hands`
    /// consecutive 21-point hands.  A buffer that runs short yields short
    /// hands rather than an error.
    pub fn from_flat(data: &[f32], num_hands: usize, captured_at: Duration) -> Self {
        let stride = LANDMARK_COUNT * 3;
        let hands = (0..num_hands.min(MAX_HANDS))
            .map(|h| {
                let start = (h * stride).min(data.len());
                let end = (start + stride).min(data.len());
                let points = data[start..end]
                    .chunks_exact(3)
                    .map(|c| Landmark::new(c[0], c[1], c[2]))
                    .collect();
                HandFrame::new(points)
            })
            .filter(|hand| !hand.is_empty())
            .collect();
        TrackingFrame { hands, captured_at }
    }

    pub fn hands(&self) -> &[HandFrame] { &self.hands }
    pub fn hand_count(&self) -> usize { self.hands.len() }
    pub fn has_hands(&self) -> bool { !self.hands.is_empty() }

    /// The hand every single-hand gesture is read from.
    pub fn primary(&self) -> Option<&HandFrame> { self.hands.first() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
