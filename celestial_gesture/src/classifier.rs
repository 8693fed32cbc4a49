//! Geometric gesture classification.
//!
//! Everything here is a pure function of one [`TrackingFrame`]; smoothing
//! and debouncing happen in the layers above.
//!
//! | Signal | Source | Rule |
//! |---|---|---|
//! | Fist / Open | hand 0 | `|wrist→middle tip| / |wrist→middle MCP|` against two thresholds |
//! | Pinch | hand 0 | 3D thumb-tip ↔ index-tip distance |
//! | Roll | hand 0 | angle of the index-MCP → pinky-MCP line |
//! | Heart | both hands | five simultaneous distance constraints |

use serde::{Deserialize, Serialize};

use crate::landmark::{
    HandFrame, Landmark, TrackingFrame, INDEX_TIP, THUMB_TIP, WRIST,
};

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Tuning values for the classifier.  None of the exact numbers are
/// load-bearing; they only need to produce stable transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Ratio below which the hand counts as a fist.
    pub fist_ratio: f32,
    /// Ratio above which the hand counts as open.
    pub open_ratio: f32,
    /// How far detection sensitivity may move each ratio threshold.
    pub sensitivity_span: f32,
    /// Pinch distance mapped to the nearest camera depth.
    pub pinch_min_distance: f32,
    /// Pinch distance mapped to the farthest camera depth.
    pub pinch_max_distance: f32,
    /// Per-hand thumb–index distance window for the heart pose.
    pub heart_pinch_min: f32,
    pub heart_pinch_max: f32,
    /// Index tip of one hand to thumb tip of the other.
    pub heart_cross_max: f32,
    /// Middle tips must be at least this far apart.
    pub heart_middle_min: f32,
    /// Wrists must be closer than this.
    pub heart_wrist_max: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            fist_ratio:         1.35,
            open_ratio:         1.75,
            sensitivity_span:   0.15,
            pinch_min_distance: 0.02,
            pinch_max_distance: 0.15,
            heart_pinch_min:    0.03,
            heart_pinch_max:    0.15,
            heart_cross_max:    0.1,
            heart_middle_min:   0.15,
            heart_wrist_max:    0.3,
        }
    }
}

impl GestureThresholds {
    /// Fist/open thresholds after applying detection sensitivity
    /// (0–100, 50 = unchanged).  Higher sensitivity narrows the
    /// hysteresis band so gestures register sooner.
    pub fn ratio_band(&self, sensitivity: u8) -> (f32, f32) {
        let s = (sensitivity.min(100) as f32 - 50.0) / 50.0;
        let shift = s * self.sensitivity_span;
        let fist = self.fist_ratio + shift;
        let open = (self.open_ratio - shift).max(fist);
        (fist, open)
    }

    /// Clamp a raw pinch distance into `[0, 1]` and apply the ease-out curve
    /// `1 - (1 - t)²`.
    pub fn pinch_amount(&self, distance: f32) -> f32 {
        let span = (self.pinch_max_distance - self.pinch_min_distance).max(f32::EPSILON);
        let t = ((distance - self.pinch_min_distance) / span).clamp(0.0, 1.0);
        1.0 - (1.0 - t) * (1.0 - t)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Readings
// ════════════════════════════════════════════════════════════════════════════

/// Discrete pose of the primary hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    /// No usable hand in the frame.
    Absent,
    Fist,
    Open,
    /// Inside the hysteresis band, or the ratio could not be measured.
    Neutral,
}

/// Outcome of the two-hand heart check for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeartDetection {
    pub detected: bool,
    /// Mean image position of the four thumb/index tips.
    pub position: Option<(f32, f32)>,
}

/// Everything the classifier derives from one tracking frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureReading {
    pub hands: usize,
    pub pose: HandPose,
    pub fist_ratio: Option<f32>,
    pub pinch_distance: Option<f32>,
    pub heart: HeartDetection,
    pub wrist: Option<Landmark>,
    pub index_tip: Option<Landmark>,
    pub hand_roll: Option<f32>,
}

impl GestureReading {
    /// Reading for a frame with nothing in view.
    pub fn absent() -> Self {
        GestureReading {
            hands: 0,
            pose: HandPose::Absent,
            fist_ratio: None,
            pinch_distance: None,
            heart: HeartDetection::default(),
            wrist: None,
            index_tip: None,
            hand_roll: None,
        }
    }

    pub fn is_fist(&self) -> bool { self.pose == HandPose::Fist }
    pub fn is_open(&self) -> bool { self.pose == HandPose::Open }

    /// A hand is steering the scene only when its wrist and index tip
    /// are both usable.
    pub fn hand_active(&self) -> bool {
        self.wrist.is_some() && self.index_tip.is_some()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Primitive measurements
// ════════════════════════════════════════════════════════════════════════════

/// `|wrist→middle tip| / |wrist→middle MCP|` in the image plane.
pub fn fist_ratio(hand: &HandFrame) -> Option<f32> {
    let wrist = hand.wrist()?;
    let tip = hand.middle_tip()?;
    let mcp = hand.middle_mcp()?;
    let base = wrist.planar_distance(&mcp);
    if base < 1e-6 {
        return None;
    }
    Some(wrist.planar_distance(&tip) / base)
}

/// Classify a ratio against a `(fist, open)` band.
pub fn classify_ratio(ratio: f32, band: (f32, f32)) -> HandPose {
    let (fist, open) = band;
    if ratio < fist {
        HandPose::Fist
    } else if ratio > open {
        HandPose::Open
    } else {
        HandPose::Neutral
    }
}

/// Thumb-tip ↔ index-tip distance.
pub fn pinch_distance(hand: &HandFrame) -> Option<f32> {
    hand.distance(THUMB_TIP, INDEX_TIP)
}

/// Angle of the knuckle line, radians.
pub fn hand_roll(hand: &HandFrame) -> Option<f32> {
    let index = hand.index_mcp()?;
    let pinky = hand.pinky_mcp()?;
    Some((pinky.y - index.y).atan2(pinky.x - index.x))
}

/// Two-hand heart pose: thumbs and index fingers of both hands interlock
/// while the middle fingers splay apart.
pub fn detect_heart(hands: &[HandFrame], t: &GestureThresholds) -> HeartDetection {
    let (h1, h2) = match hands {
        [a, b, ..] => (a, b),
        _ => return HeartDetection::default(),
    };

    let points = (|| {
        Some((
            h1.thumb_tip()?, h1.index_tip()?, h1.middle_tip()?, h1.get(WRIST)?,
            h2.thumb_tip()?, h2.index_tip()?, h2.middle_tip()?, h2.get(WRIST)?,
        ))
    })();
    let (t1, i1, m1, w1, t2, i2, m2, w2) = match points {
        Some(p) => p,
        None => return HeartDetection::default(),
    };

    let in_window = |d: f32| d > t.heart_pinch_min && d < t.heart_pinch_max;
    let forming  = in_window(t1.distance(&i1)) && in_window(t2.distance(&i2));
    let crossing = i1.distance(&t2) < t.heart_cross_max && i2.distance(&t1) < t.heart_cross_max;
    let splayed  = m1.distance(&m2) > t.heart_middle_min;
    let close    = w1.distance(&w2) < t.heart_wrist_max;

    if forming && crossing && splayed && close {
        HeartDetection {
            detected: true,
            position: Some((
                (t1.x + i1.x + t2.x + i2.x) / 4.0,
                (t1.y + i1.y + t2.y + i2.y) / 4.0,
            )),
        }
    } else {
        HeartDetection::default()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Stateless classifier bundling thresholds with the user's sensitivity.
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
    sensitivity: u8,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        GestureClassifier { thresholds, sensitivity: 50 }
    }

    pub fn thresholds(&self) -> &GestureThresholds { &self.thresholds }
    pub fn sensitivity(&self) -> u8 { self.sensitivity }

    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        self.sensitivity = sensitivity.min(100);
    }

    pub fn classify(&self, frame: &TrackingFrame) -> GestureReading {
        let hand = match frame.primary() {
            Some(h) => h,
            None => return GestureReading::absent(),
        };

        let ratio = fist_ratio(hand);
        let pose = match ratio {
            Some(r) => classify_ratio(r, self.thresholds.ratio_band(self.sensitivity)),
            None => HandPose::Neutral,
        };

        GestureReading {
            hands: frame.hand_count(),
            pose,
            fist_ratio: ratio,
            pinch_distance: pinch_distance(hand),
            heart: detect_heart(frame.hands(), &self.thresholds),
            wrist: hand.wrist(),
            index_tip: hand.index_tip(),
            hand_roll: hand_roll(hand),
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self { Self::new(GestureThresholds::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;
    use std::time::Duration;

    fn frame(hands: Vec<HandFrame>) -> TrackingFrame {
        TrackingFrame::new(hands, Duration::ZERO)
    }

    #[test]
    fn ratio_one_is_fist() {
        let hand = synthetic::hand_with_ratio((0.5, 0.5), 1.0);
        let r = GestureClassifier::default().classify(&frame(vec![hand]));
        assert!((r.fist_ratio.unwrap() - 1.0).abs() < 1e-4);
        assert!(r.is_fist());
        assert!(!r.is_open());
    }

    #[test]
    fn ratio_two_is_open() {
        let hand = synthetic::hand_with_ratio((0.5, 0.5), 2.0);
        let r = GestureClassifier::default().classify(&frame(vec![hand]));
        assert!(r.is_open());
        assert!(!r.is_fist());
    }

    #[test]
    fn ratio_inside_band_is_neutral() {
        let hand = synthetic::hand_with_ratio((0.5, 0.5), 1.5);
        let r = GestureClassifier::default().classify(&frame(vec![hand]));
        assert_eq!(r.pose, HandPose::Neutral);
        assert!(!r.is_fist() && !r.is_open());
    }

    #[test]
    fn sensitivity_narrows_band() {
        let t = GestureThresholds::default();
        let (f50, o50) = t.ratio_band(50);
        let (f100, o100) = t.ratio_band(100);
        let (f0, o0) = t.ratio_band(0);
        assert_eq!((f50, o50), (t.fist_ratio, t.open_ratio));
        assert!(f100 > f50 && o100 < o50 && f100 <= o100);
        assert!(f0 < f50 && o0 > o50);
    }

    #[test]
    fn pinch_amount_endpoints_and_clamp() {
        let t = GestureThresholds::default();
        assert!(t.pinch_amount(0.02).abs() < 1e-6);
        assert!((t.pinch_amount(0.15) - 1.0).abs() < 1e-6);
        assert_eq!(t.pinch_amount(0.0), 0.0);
        assert_eq!(t.pinch_amount(0.5), 1.0);
        // ease-out: midpoint maps above linear
        assert!(t.pinch_amount(0.085) > 0.5);
    }

    #[test]
    fn pinch_distance_is_three_dimensional() {
        let hand = synthetic::pinch_hand((0.5, 0.5), 0.08);
        assert!((pinch_distance(&hand).unwrap() - 0.08).abs() < 1e-5);
    }

    #[test]
    fn no_hands_is_absent() {
        let r = GestureClassifier::default().classify(&TrackingFrame::empty(Duration::ZERO));
        assert_eq!(r, GestureReading::absent());
        assert!(!r.hand_active());
    }

    #[test]
    fn short_hand_degrades_to_no_signal() {
        let full = synthetic::open_hand((0.5, 0.5));
        let short = HandFrame::from_slice(&full.points()[..5]);
        let r = GestureClassifier::default().classify(&frame(vec![short]));
        assert_eq!(r.pose, HandPose::Neutral);
        assert!(r.pinch_distance.is_none());
        assert!(!r.hand_active());
    }

    #[test]
    fn heart_detected_for_interlocked_hands() {
        let (a, b) = synthetic::heart_pair((0.5, 0.5));
        let h = detect_heart(&[a, b], &GestureThresholds::default());
        assert!(h.detected);
        let (x, y) = h.position.unwrap();
        assert!((x - 0.5).abs() < 1e-4 && (y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn heart_rejected_when_middle_tips_close() {
        let (a, b) = synthetic::heart_pair_with_middle_gap((0.5, 0.5), 0.05);
        assert!(!detect_heart(&[a, b], &GestureThresholds::default()).detected);
    }

    #[test]
    fn heart_rejected_when_wrists_far() {
        let (a, b) = synthetic::heart_pair((0.5, 0.5));
        let b = synthetic::moved(&b, synthetic::WRIST_ONLY, (0.4, 0.0));
        assert!(!detect_heart(&[a, b], &GestureThresholds::default()).detected);
    }

    #[test]
    fn heart_rejected_for_tight_pinch() {
        let (a, b) = synthetic::heart_pair((0.5, 0.5));
        // collapse hand 1's thumb onto its index tip
        let idx = a.index_tip().unwrap();
        let mut pts = a.points().to_vec();
        pts[THUMB_TIP] = Landmark::new(idx.x, idx.y + 0.01, idx.z);
        let a = HandFrame::new(pts);
        assert!(!detect_heart(&[a, b], &GestureThresholds::default()).detected);
    }

    #[test]
    fn heart_rejected_when_not_crossing() {
        let (a, b) = synthetic::heart_pair((0.5, 0.5));
        let mut pts = b.points().to_vec();
        pts[THUMB_TIP].x += 0.12;
        pts[INDEX_TIP].x += 0.12;
        let b = HandFrame::new(pts);
        assert!(!detect_heart(&[a, b], &GestureThresholds::default()).detected);
    }

    #[test]
    fn heart_needs_two_hands() {
        let (a, _) = synthetic::heart_pair((0.5, 0.5));
        assert!(!detect_heart(&[a], &GestureThresholds::default()).detected);
    }

    #[test]
    fn roll_of_level_hand_is_zero() {
        let hand = synthetic::open_hand((0.5, 0.5));
        assert!(hand_roll(&hand).unwrap().abs() < 1e-6);
    }
}
