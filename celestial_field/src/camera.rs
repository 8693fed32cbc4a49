//! Zoom / camera controller.
//!
//! Fuses the pinch amount and scroll-wheel input into one smoothed camera
//! depth, derives field of view, shake and tilt from it, and latches the
//! explosion event when the camera dives into the core.
//!
//! Target priority, highest first:
//!
//! ```text
//! auto zoom-out (after an explosion)  >  pinch  >  wheel  >  default depth
//! ```
//!
//! The wheel accumulator doubles as the fallback: once it has been idle for
//! `wheel_hold_secs` it decays toward the default depth on its own.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use celestial_gesture::Deadline;

use crate::animation::lerp;
use crate::config::{timer_duration, ZoomConfig};

// ════════════════════════════════════════════════════════════════════════════
// Pure helpers
// ════════════════════════════════════════════════════════════════════════════

/// `1 - (1 - p)³`, clamped to `[0, 1]`.
pub fn ease_out_cubic(p: f32) -> f32 {
    let q = 1.0 - p.clamp(0.0, 1.0);
    1.0 - q * q * q
}

/// Normalized depth: 0 at the far limit, 1 at the nearest.
pub fn closeness(zoom: f32, cfg: &ZoomConfig) -> f32 {
    let span = cfg.max_camera_z - cfg.min_camera_z;
    if span <= 0.0 {
        return 0.0;
    }
    ((cfg.max_camera_z - zoom) / span).clamp(0.0, 1.0)
}

/// Field of view the camera eases toward at closeness `c`.
pub fn target_fov(c: f32, cfg: &ZoomConfig) -> f32 {
    let ramp = 1.0 - cfg.fov_ramp_start;
    let k = if ramp <= 0.0 { 0.0 } else { ((c - cfg.fov_ramp_start) / ramp).clamp(0.0, 1.0) };
    cfg.fov_far + (cfg.fov_near - cfg.fov_far) * k
}

/// Camera depth for an eased pinch amount in `[0, 1]`.
pub fn pinch_depth(amount: f32, cfg: &ZoomConfig) -> f32 {
    cfg.min_camera_z + amount.clamp(0.0, 1.0) * (cfg.max_camera_z - cfg.min_camera_z)
}

// ════════════════════════════════════════════════════════════════════════════
// CameraRig
// ════════════════════════════════════════════════════════════════════════════

/// Everything the controller writes to the backend camera each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraRig {
    pub depth:       f32,
    pub fov_degrees: f32,
    pub offset_x:    f32,
    pub offset_y:    f32,
    pub roll:        f32,
    pub pitch:       f32,
    pub yaw:         f32,
    pub closeness:   f32,
}

// ════════════════════════════════════════════════════════════════════════════
// WheelZoom
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct WheelZoom {
    value:      f32,
    last_touch: Option<Duration>,
    hold:       Duration,
    default:    f32,
    min:        f32,
    max:        f32,
    speed:      f32,
    decay:      f32,
}

impl WheelZoom {
    pub fn new(cfg: &ZoomConfig) -> Self {
        WheelZoom {
            value:      cfg.default_camera_z,
            last_touch: None,
            hold:       timer_duration(cfg.wheel_hold_secs),
            default:    cfg.default_camera_z,
            min:        cfg.min_camera_z,
            max:        cfg.max_camera_z,
            speed:      cfg.wheel_speed,
            decay:      cfg.default_decay,
        }
    }

    pub fn value(&self) -> f32 { self.value }

    pub fn scroll(&mut self, delta: f32, now: Duration) {
        if delta == 0.0 || !delta.is_finite() {
            return;
        }
        self.value = (self.value + delta * self.speed).clamp(self.min, self.max);
        self.last_touch = Some(now);
    }

    /// True while the last scroll is recent enough to hold its value.
    pub fn is_held(&self, now: Duration) -> bool {
        matches!(self.last_touch, Some(t) if now.saturating_sub(t) < self.hold)
    }

    /// Decay toward the default when idle; returns the current value.
    pub fn update(&mut self, now: Duration) -> f32 {
        if !self.is_held(now) {
            self.value = lerp(self.value, self.default, self.decay);
        }
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.default;
        self.last_touch = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ExplosionLatch
// ════════════════════════════════════════════════════════════════════════════

/// Edge trigger with hysteresis: fires once on reaching the threshold,
/// re-arms only past `threshold + margin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplosionLatch {
    armed:     bool,
    threshold: f32,
    margin:    f32,
}

impl ExplosionLatch {
    pub fn new(threshold: f32, margin: f32) -> Self {
        ExplosionLatch { armed: true, threshold, margin }
    }

    pub fn is_armed(&self) -> bool { self.armed }

    pub fn update(&mut self, zoom: f32) -> bool {
        if self.armed && zoom <= self.threshold {
            self.armed = false;
            return true;
        }
        if !self.armed && zoom > self.threshold + self.margin {
            self.armed = true;
            debug!("explosion latch re-armed at zoom {:.2}", zoom);
        }
        false
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AutoZoomOut
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AutoZoomStep {
    Idle,
    /// Delay running; the caller holds its zoom.
    Waiting,
    /// Zoom this frame.
    Animating(f32),
    /// Last frame of the animation, at the target depth.
    Finished(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Waiting,
    Animating { from: f32, started: Duration },
}

#[derive(Clone, Debug)]
pub struct AutoZoomOut {
    phase:    Phase,
    delay:    Deadline,
    wait:     Duration,
    duration: Duration,
    target:   f32,
}

impl AutoZoomOut {
    pub fn new(cfg: &ZoomConfig) -> Self {
        AutoZoomOut {
            phase:    Phase::Idle,
            delay:    Deadline::disarmed(),
            wait:     timer_duration(cfg.auto_zoom_delay_secs),
            duration: timer_duration(cfg.auto_zoom_duration_secs),
            target:   cfg.default_camera_z,
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.phase = Phase::Waiting;
        self.delay.arm(now, self.wait);
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
        self.delay.cancel();
    }

    pub fn is_active(&self) -> bool { self.phase != Phase::Idle }

    pub fn step(&mut self, now: Duration, current: f32) -> AutoZoomStep {
        if self.phase == Phase::Waiting {
            if !self.delay.fire(now) {
                return AutoZoomStep::Waiting;
            }
            info!("auto zoom-out from {:.2} to {:.2}", current, self.target);
            self.phase = Phase::Animating { from: current, started: now };
        }

        match self.phase {
            Phase::Idle | Phase::Waiting => AutoZoomStep::Idle,
            Phase::Animating { from, started } => {
                let secs = self.duration.as_secs_f32();
                let p = if secs <= 0.0 { 1.0 } else { now.saturating_sub(started).as_secs_f32() / secs };
                if p >= 1.0 {
                    self.phase = Phase::Idle;
                    AutoZoomStep::Finished(self.target)
                } else {
                    AutoZoomStep::Animating(from + (self.target - from) * ease_out_cubic(p))
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ZoomController
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoomInput {
    /// Eased pinch amount in `[0, 1]` while a hand is tracked.
    pub pinch:       Option<f32>,
    pub wheel_delta: f32,
    pub now:         Duration,
    /// Scene time in seconds, drives the tilt oscillation.
    pub elapsed:     f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomUpdate {
    pub rig:                CameraRig,
    pub zoom_delta:         f32,
    /// The explosion latch fired this frame.
    pub exploded:           bool,
    pub auto_zoom_finished: bool,
}

pub struct ZoomController {
    cfg:    ZoomConfig,
    zoom:   f32,
    fov:    f32,
    shake:  (f32, f32),
    roll:   f32,
    pitch:  f32,
    yaw:    f32,
    wheel:  WheelZoom,
    latch:  ExplosionLatch,
    auto:   AutoZoomOut,
    rng:    StdRng,
}

impl ZoomController {
    pub fn new(cfg: ZoomConfig, seed: u64) -> Self {
        let zoom = cfg.default_camera_z;
        let fov = target_fov(closeness(zoom, &cfg), &cfg);
        ZoomController {
            wheel: WheelZoom::new(&cfg),
            latch: ExplosionLatch::new(cfg.explosion_threshold, cfg.rearm_margin),
            auto:  AutoZoomOut::new(&cfg),
            rng:   StdRng::seed_from_u64(seed),
            zoom,
            fov,
            shake: (0.0, 0.0),
            roll:  0.0,
            pitch: 0.0,
            yaw:   0.0,
            cfg,
        }
    }

    pub fn zoom(&self) -> f32 { self.zoom }
    pub fn fov(&self) -> f32 { self.fov }
    pub fn closeness(&self) -> f32 { closeness(self.zoom, &self.cfg) }
    pub fn wheel(&self) -> &WheelZoom { &self.wheel }
    pub fn latch(&self) -> &ExplosionLatch { &self.latch }
    pub fn is_auto_zooming(&self) -> bool { self.auto.is_active() }

    /// Drop any pending auto zoom-out.
    pub fn cancel(&mut self) {
        self.auto.cancel();
    }

    pub fn update(&mut self, input: &ZoomInput) -> ZoomUpdate {
        let cfg = &self.cfg;
        let prev = self.zoom;
        let mut auto_zoom_finished = false;

        match self.auto.step(input.now, self.zoom) {
            AutoZoomStep::Waiting => {}
            AutoZoomStep::Animating(z) => self.zoom = z,
            AutoZoomStep::Finished(z) => {
                self.zoom = z;
                self.wheel.reset();
                auto_zoom_finished = true;
                info!("auto zoom-out finished");
            }
            AutoZoomStep::Idle => {
                self.wheel.scroll(input.wheel_delta, input.now);
                let fallback = self.wheel.update(input.now);
                let target = match input.pinch {
                    Some(amount) => pinch_depth(amount, cfg),
                    None => fallback,
                };
                self.zoom += (target - self.zoom) * cfg.zoom_smoothing;
            }
        }
        self.zoom = self.zoom.clamp(cfg.min_camera_z, cfg.max_camera_z);

        let delta = self.zoom - prev;
        let exploded = self.latch.update(self.zoom);
        if exploded {
            info!("explosion triggered at zoom {:.2}", self.zoom);
            self.auto.start(input.now);
        }

        let c = closeness(self.zoom, cfg);
        self.fov += (target_fov(c, cfg) - self.fov) * cfg.fov_smoothing;

        if delta.abs() > cfg.shake_threshold {
            let amount = (delta.abs() * cfg.shake_gain).min(cfg.shake_max);
            self.shake = (
                self.rng.gen_range(-1.0f32..=1.0) * amount,
                self.rng.gen_range(-1.0f32..=1.0) * amount,
            );
        } else {
            self.shake.0 *= cfg.shake_decay;
            self.shake.1 *= cfg.shake_decay;
        }

        if c > cfg.tilt_threshold {
            let k = c - cfg.tilt_threshold;
            let t = input.elapsed;
            self.roll  = (t * 0.7).sin() * k * 0.3;
            self.pitch = (t * 0.5).sin() * k * 0.2;
            self.yaw   = (t * 0.3).cos() * k * 0.15;
        } else {
            self.roll  *= 0.9;
            self.pitch *= 0.9;
            self.yaw   *= 0.9;
        }

        ZoomUpdate {
            rig: CameraRig {
                depth:       self.zoom,
                fov_degrees: self.fov,
                offset_x:    self.shake.0,
                offset_y:    self.shake.1,
                roll:        self.roll,
                pitch:       self.pitch,
                yaw:         self.yaw,
                closeness:   c,
            },
            zoom_delta: delta,
            exploded,
            auto_zoom_finished,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ZoomConfig { ZoomConfig::default() }

    fn at(ms: u64) -> Duration { Duration::from_millis(ms) }

    fn idle(now: Duration) -> ZoomInput {
        ZoomInput { pinch: None, wheel_delta: 0.0, now, elapsed: now.as_secs_f32() }
    }

    #[test]
    fn pinch_maps_onto_zoom_range() {
        let c = cfg();
        assert_eq!(pinch_depth(0.0, &c), 2.0);
        assert_eq!(pinch_depth(1.0, &c), 35.0);
        assert_eq!(pinch_depth(-3.0, &c), 2.0);
        assert_eq!(pinch_depth(7.0, &c), 35.0);
    }

    #[test]
    fn closeness_and_fov_ramp() {
        let c = cfg();
        assert_eq!(closeness(35.0, &c), 0.0);
        assert_eq!(closeness(2.0, &c), 1.0);
        assert_eq!(target_fov(0.3, &c), 45.0);
        assert_eq!(target_fov(1.0, &c), 75.0);
        assert!((target_fov(0.75, &c) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn ease_out_cubic_shape() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn latch_fires_once_and_rearms_past_margin() {
        let mut l = ExplosionLatch::new(4.0, 5.0);
        assert!(!l.update(6.0));
        assert!(l.update(3.9));
        for &z in [3.0f32, 2.0, 3.5, 8.0, 9.0].iter() {
            assert!(!l.update(z), "refired at {}", z);
        }
        assert!(!l.is_armed());
        assert!(!l.update(9.5));
        assert!(l.is_armed());
        assert!(l.update(4.0));
    }

    #[test]
    fn pinch_drives_zoom() {
        let mut z = ZoomController::new(cfg(), 1);
        for k in 0..200 {
            z.update(&ZoomInput { pinch: Some(1.0), ..idle(at(k * 16)) });
        }
        assert!((z.zoom() - 35.0).abs() < 1e-3);
        assert_eq!(z.closeness(), 0.0);
    }

    #[test]
    fn idle_rests_at_default() {
        let mut z = ZoomController::new(cfg(), 1);
        let out = z.update(&idle(at(0)));
        assert_eq!(out.rig.depth, 20.0);
        assert_eq!(out.zoom_delta, 0.0);
        assert!(!out.exploded);
    }

    #[test]
    fn wheel_holds_then_decays() {
        let mut z = ZoomController::new(cfg(), 1);
        z.update(&ZoomInput { wheel_delta: 1_000.0, ..idle(at(0)) });
        assert_eq!(z.wheel().value(), 25.0);
        for k in 1..150 {
            z.update(&idle(at(k * 16)));
        }
        assert!((z.zoom() - 25.0).abs() < 0.05);
        for k in 0..300 {
            z.update(&idle(at(4_000 + k * 16)));
        }
        assert!((z.zoom() - 20.0).abs() < 0.05);
    }

    #[test]
    fn pinch_overrides_wheel() {
        let mut z = ZoomController::new(cfg(), 1);
        z.update(&ZoomInput { wheel_delta: 2_000.0, ..idle(at(0)) });
        for k in 1..200 {
            z.update(&ZoomInput { pinch: Some(0.5), ..idle(at(k * 10)) });
        }
        assert!((z.zoom() - 18.5).abs() < 1e-2);
    }

    #[test]
    fn dive_explodes_then_zooms_back_out() {
        let mut z = ZoomController::new(cfg(), 1);
        let mut fired = 0;
        let mut fired_at = None;
        let mut k = 0u64;
        while fired_at.is_none() && k < 1_000 {
            let out = z.update(&ZoomInput { pinch: Some(0.0), ..idle(at(k * 16)) });
            if out.exploded {
                fired += 1;
                fired_at = Some(k * 16);
            }
            k += 1;
        }
        let t0 = fired_at.expect("latch never fired");
        assert!(z.is_auto_zooming());
        let held = z.zoom();

        // Delay: pinch is ignored and zoom holds.
        for ms in (t0 + 16..t0 + 1_400).step_by(16) {
            let out = z.update(&ZoomInput { pinch: Some(0.0), ..idle(at(ms)) });
            fired += out.exploded as u32;
            assert_eq!(z.zoom(), held);
        }

        let mut finished = false;
        for ms in (t0 + 1_400..t0 + 5_000).step_by(16) {
            let out = z.update(&ZoomInput { pinch: Some(0.0), ..idle(at(ms)) });
            fired += out.exploded as u32;
            if out.auto_zoom_finished {
                finished = true;
                assert_eq!(out.rig.depth, 20.0);
                break;
            }
        }
        assert!(finished);
        assert_eq!(fired, 1);
        assert!(!z.is_auto_zooming());
        assert_eq!(z.wheel().value(), 20.0);
        assert!(z.latch().is_armed());
    }

    #[test]
    fn auto_zoom_eases_monotonically() {
        let mut a = AutoZoomOut::new(&cfg());
        a.start(at(0));
        assert_eq!(a.step(at(1_000), 3.0), AutoZoomStep::Waiting);
        let mut last = 3.0;
        for ms in (1_500..4_500).step_by(100) {
            match a.step(at(ms), last) {
                AutoZoomStep::Animating(v) => {
                    assert!(v >= last);
                    last = v;
                }
                other => panic!("unexpected {:?} at {}", other, ms),
            }
        }
        assert_eq!(a.step(at(4_500), last), AutoZoomStep::Finished(20.0));
        assert_eq!(a.step(at(4_600), 20.0), AutoZoomStep::Idle);
    }

    #[test]
    fn large_delta_shakes_then_settles() {
        let mut z = ZoomController::new(cfg(), 7);
        let out = z.update(&ZoomInput { pinch: Some(1.0), ..idle(at(0)) });
        // 20 → 21.2 in one frame
        assert!(out.zoom_delta > 0.15);
        assert!(out.rig.offset_x.abs() <= 0.4 && out.rig.offset_y.abs() <= 0.4);
        let mut last = out.rig;
        for k in 1..400 {
            last = z.update(&ZoomInput { pinch: Some(1.0), ..idle(at(k * 16)) }).rig;
        }
        assert!(last.offset_x.abs() < 1e-3 && last.offset_y.abs() < 1e-3);
    }

    #[test]
    fn tilt_only_when_close() {
        let mut z = ZoomController::new(cfg(), 1);
        let far = z.update(&idle(at(0))).rig;
        assert_eq!((far.roll, far.pitch, far.yaw), (0.0, 0.0, 0.0));

        let mut near = far;
        for k in 0..40 {
            near = z.update(&ZoomInput { pinch: Some(0.1), ..idle(at(k * 16)) }).rig;
        }
        assert!(near.closeness > 0.65);
        assert!(near.yaw.abs() > 0.0);
    }

    #[test]
    fn cancel_stops_auto_zoom() {
        let mut z = ZoomController::new(cfg(), 1);
        z.auto.start(at(0));
        z.cancel();
        assert!(!z.is_auto_zooming());
    }
}
