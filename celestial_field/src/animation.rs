//! Smoothed morph state driven by gesture readings.
//!
//! One [`AnimationState`] lives in the render loop.  Each frame it is fed
//! the current [`GestureReading`] and eases its scalars toward the targets
//! the reading implies:
//!
//! | Reading | expansion | pulse | rotation |
//! |---|---|---|---|
//! | fist | → 0 | set to 1 if still above the arm level | follows wrist + roll |
//! | open | → 1 | — | follows wrist + roll |
//! | neutral | held | — | follows wrist + roll |
//! | no hand | → 1 slowly | — | auto-rotate + gentle nod |
//!
//! The pulse decays every frame regardless.

use std::f32::consts::PI;

use celestial_gesture::{GestureReading, HandPose};
use glam::Vec3;

use crate::config::{FieldConfig, MorphConfig, MAX_RATE_SCALE};
use crate::field::FieldInputs;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Explicit morph state; the only mutable input to the field transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    /// 0 = heart, 1 = galaxy.
    pub expansion:   f32,
    pub pulse:       f32,
    pub rotation_x:  f32,
    pub rotation_y:  f32,
    /// World-space attractor, present while a hand is tracked.
    pub hand_target: Option<Vec3>,

    morph:      MorphConfig,
    hand_span:  [f32; 3],
    rate_scale: f32,
}

impl AnimationState {
    pub fn new(morph: MorphConfig, field: &FieldConfig) -> Self {
        AnimationState {
            expansion:   1.0,
            pulse:       0.0,
            rotation_x:  0.0,
            rotation_y:  0.0,
            hand_target: None,
            morph,
            hand_span:   field.hand_span,
            rate_scale:  1.0,
        }
    }

    /// Scale every smoothing rate (from the gesture smoothing setting).
    pub fn set_rate_scale(&mut self, scale: f32) {
        self.rate_scale = scale.clamp(0.0, MAX_RATE_SCALE);
    }

    pub fn rate_scale(&self) -> f32 { self.rate_scale }

    fn rate(&self, base: f32) -> f32 {
        (base * self.rate_scale).clamp(0.0, 1.0)
    }

    /// Advance one frame.  `elapsed` is scene time in seconds.
    pub fn update(&mut self, reading: &GestureReading, elapsed: f32) {
        let m = self.morph.clone();

        match (reading.wrist, reading.index_tip) {
            (Some(wrist), Some(index)) => {
                let [sx, sy, sz] = self.hand_span;
                self.hand_target = Some(Vec3::new(
                    (index.x - 0.5) * sx,
                    (index.y - 0.5) * sy,
                    index.z * sz,
                ));

                match reading.pose {
                    HandPose::Fist => {
                        if self.expansion > m.pulse_arm_above {
                            self.pulse = 1.0;
                        }
                        self.expansion = lerp(self.expansion, 0.0, self.rate(m.fist_rate));
                    }
                    HandPose::Open => {
                        self.expansion = lerp(self.expansion, 1.0, self.rate(m.open_rate));
                    }
                    HandPose::Neutral | HandPose::Absent => {}
                }

                let roll = reading.hand_roll.unwrap_or(0.0);
                let target_y = (wrist.x - 0.5) * PI * 4.0 + roll * m.roll_gain;
                let target_x = (wrist.y - 0.5) * -PI * 0.8;
                self.rotation_y = lerp(self.rotation_y, target_y, self.rate(m.follow_y_rate));
                self.rotation_x = lerp(self.rotation_x, target_x, self.rate(m.follow_x_rate));
            }
            _ => {
                self.hand_target = None;
                self.expansion = lerp(self.expansion, 1.0, self.rate(m.idle_rate));
                self.rotation_y += m.auto_rotate;
                let nod = (elapsed * 0.4).sin() * 0.15;
                self.rotation_x = lerp(self.rotation_x, nod, self.rate(m.idle_tilt_rate));
            }
        }

        self.pulse = lerp(self.pulse, 0.0, self.rate(m.pulse_decay));
        self.expansion = self.expansion.clamp(0.0, 1.0);
        self.pulse = self.pulse.clamp(0.0, 1.0);
    }

    /// Field inputs for this frame.
    pub fn inputs(&self, elapsed: f32) -> FieldInputs {
        FieldInputs {
            expansion:   self.expansion,
            pulse:       self.pulse,
            hand_target: self.hand_target,
            elapsed,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use celestial_gesture::{synthetic, GestureClassifier, TrackingFrame};
    use std::time::Duration;

    fn state() -> AnimationState {
        AnimationState::new(MorphConfig::default(), &FieldConfig::default())
    }

    fn read(hands: Vec<celestial_gesture::HandFrame>) -> GestureReading {
        GestureClassifier::default().classify(&TrackingFrame::new(hands, Duration::ZERO))
    }

    #[test]
    fn starts_as_galaxy() {
        let s = state();
        assert_eq!(s.expansion, 1.0);
        assert_eq!(s.pulse, 0.0);
    }

    #[test]
    fn idle_drifts_to_galaxy_and_rotates() {
        let mut s = state();
        s.expansion = 0.0;
        let none = GestureReading::absent();
        for k in 0..300 {
            s.update(&none, k as f32 / 60.0);
        }
        // 1 - 0.985^300 ≈ 0.989
        assert!(s.expansion > 0.98);
        assert!((s.rotation_y - 300.0 * 0.004).abs() < 1e-3);
        assert!(s.hand_target.is_none());
    }

    #[test]
    fn fist_collapses_and_fires_pulse() {
        let mut s = state();
        let fist = read(vec![synthetic::fist_hand((0.5, 0.5))]);
        s.update(&fist, 0.0);
        // pulse set to 1 then decayed once
        assert!((s.pulse - 0.95).abs() < 1e-5);
        assert!((s.expansion - 0.92).abs() < 1e-5);
        for _ in 0..200 {
            s.update(&fist, 0.0);
        }
        assert!(s.expansion < 0.01);
        assert!(s.hand_target.is_some());
    }

    #[test]
    fn pulse_not_rearmed_below_level() {
        let mut s = state();
        s.expansion = 0.3;
        let fist = read(vec![synthetic::fist_hand((0.5, 0.5))]);
        s.update(&fist, 0.0);
        assert_eq!(s.pulse, 0.0);
    }

    #[test]
    fn open_expands_neutral_holds() {
        let mut s = state();
        s.expansion = 0.2;
        let open = read(vec![synthetic::open_hand((0.5, 0.5))]);
        s.update(&open, 0.0);
        assert!((s.expansion - 0.24).abs() < 1e-5);

        let neutral = read(vec![synthetic::hand_with_ratio((0.5, 0.5), 1.5)]);
        let before = s.expansion;
        s.update(&neutral, 0.0);
        assert_eq!(s.expansion, before);
    }

    #[test]
    fn pulse_decays_without_hands() {
        let mut s = state();
        s.pulse = 1.0;
        s.update(&GestureReading::absent(), 0.0);
        assert!((s.pulse - 0.95).abs() < 1e-6);
    }

    #[test]
    fn hand_steers_rotation() {
        let mut s = state();
        let right = read(vec![synthetic::open_hand((0.75, 0.5))]);
        for _ in 0..200 {
            s.update(&right, 0.0);
        }
        // wrist.x = 0.75 → 0.25·4π = π, level hand has zero roll
        assert!((s.rotation_y - PI).abs() < 1e-2);
        assert!(s.rotation_x.abs() < 1e-3);
    }

    #[test]
    fn lower_smoothing_slows_morph() {
        let mut fast = state();
        let mut slow = state();
        slow.set_rate_scale(0.5);
        fast.expansion = 0.0;
        slow.expansion = 0.0;
        let open = read(vec![synthetic::open_hand((0.5, 0.5))]);
        fast.update(&open, 0.0);
        slow.update(&open, 0.0);
        assert!((fast.expansion - 0.05).abs() < 1e-6);
        assert!((slow.expansion - 0.025).abs() < 1e-6);
    }

    #[test]
    fn higher_smoothing_speeds_morph_up_to_one() {
        let mut quick = state();
        quick.set_rate_scale(4.0);
        quick.expansion = 0.0;
        quick.update(&read(vec![synthetic::open_hand((0.5, 0.5))]), 0.0);
        assert!((quick.expansion - 0.2).abs() < 1e-6);

        let mut snap = state();
        snap.set_rate_scale(MAX_RATE_SCALE * 3.0);
        assert_eq!(snap.rate_scale(), MAX_RATE_SCALE);
        assert!(snap.rate(0.5) <= 1.0);
    }

    #[test]
    fn hand_target_maps_index_tip() {
        let mut s = state();
        let r = read(vec![synthetic::open_hand((0.5, 0.5))]);
        s.update(&r, 0.0);
        let tip = r.index_tip.unwrap();
        let t = s.hand_target.unwrap();
        assert!((t.x - (tip.x - 0.5) * -28.0).abs() < 1e-5);
        assert!((t.y - (tip.y - 0.5) * -20.0).abs() < 1e-5);
    }
}
