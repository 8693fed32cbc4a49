//! Big-bang explosion burst.
//!
//! Two point pools (bright main sparks and softer dust) plus a set of
//! expanding shockwave rings.  Spawn positions and velocities are drawn once
//! from the scene RNG and kept, so every trigger replays the same burst from
//! a clean state.  Integration is per frame:
//!
//! ```text
//! pos += vel · dt · phase_multiplier
//! vel *= friction
//! ```
//!
//! with a fast initial phase that settles into a slow drift.

use std::f32::consts::TAU;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use celestial_gesture::Deadline;

use crate::config::{timer_duration, BurstConfig, RuntimeSettings};
use crate::shapes::{unit_sphere, STRIDE};

// ════════════════════════════════════════════════════════════════════════════
// Layer profiles
// ════════════════════════════════════════════════════════════════════════════

/// Which of the two burst pools a layer is; each has its own motion profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstLayerKind {
    Main,
    Dust,
}

impl BurstLayerKind {
    fn speed_range(self) -> (f32, f32) {
        match self {
            BurstLayerKind::Main => (8.0, 20.0),
            BurstLayerKind::Dust => (5.0, 13.0),
        }
    }

    /// Half-width of the spawn cube.
    fn jitter(self) -> f32 {
        match self {
            BurstLayerKind::Main => 0.1,
            BurstLayerKind::Dust => 0.075,
        }
    }

    fn size_range(self) -> (f32, f32) {
        match self {
            BurstLayerKind::Main => (0.15, 0.55),
            BurstLayerKind::Dust => (0.08, 0.23),
        }
    }

    /// Velocity multiplier at burst age `t`.
    pub fn phase_multiplier(self, t: f32) -> f32 {
        match self {
            BurstLayerKind::Main => if t < 1.0 { 10.0 } else { 3.0 },
            BurstLayerKind::Dust => if t < 1.5 { 6.0 } else { 2.0 },
        }
    }

    pub fn friction(self, t: f32) -> f32 {
        match self {
            BurstLayerKind::Main => if t < 2.0 { 0.98 } else { 0.995 },
            BurstLayerKind::Dust => 0.996,
        }
    }

    pub fn opacity(self, t: f32) -> f32 {
        match self {
            BurstLayerKind::Main => (1.0 - t / 8.0).max(0.3),
            BurstLayerKind::Dust => (1.0 - t / 7.0).max(0.2),
        }
    }

    /// Age after which the gentle drift kicks in.
    fn settle_time(self) -> f32 {
        match self {
            BurstLayerKind::Main => 2.0,
            BurstLayerKind::Dust => 1.5,
        }
    }

    /// Weighted color table: `(cumulative weight, rgb)`.
    fn palette(self) -> &'static [(f32, [f32; 3])] {
        match self {
            BurstLayerKind::Main => &[
                (0.30, [1.0, 1.0, 1.0]),
                (0.50, [1.0, 0.84, 0.2]),
                (0.65, [0.4, 0.9, 1.0]),
                (0.80, [1.0, 0.2, 0.5]),
                (1.00, [0.6, 0.2, 0.8]),
            ],
            BurstLayerKind::Dust => &[
                (0.40, [0.9, 0.95, 1.0]),
                (0.70, [1.0, 0.9, 0.6]),
                (1.00, [1.0, 0.7, 0.8]),
            ],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BurstLayer
// ════════════════════════════════════════════════════════════════════════════

pub struct BurstLayer {
    kind:             BurstLayerKind,
    spawn_positions:  Vec<f32>,
    spawn_velocities: Vec<f32>,
    base_sizes:       Vec<f32>,
    colors:           Vec<f32>,
    positions:        Vec<f32>,
    velocities:       Vec<f32>,
    scales:           Vec<f32>,
    active:           usize,
}

impl BurstLayer {
    pub fn generate<R: Rng>(kind: BurstLayerKind, count: usize, rng: &mut R) -> Self {
        let (lo, hi) = kind.speed_range();
        let (s_lo, s_hi) = kind.size_range();
        let jitter = kind.jitter();

        let mut spawn_positions  = Vec::with_capacity(count * STRIDE);
        let mut spawn_velocities = Vec::with_capacity(count * STRIDE);
        let mut base_sizes       = Vec::with_capacity(count);
        let mut colors           = Vec::with_capacity(count * STRIDE);

        for _ in 0..count {
            for _ in 0..STRIDE {
                spawn_positions.push(rng.gen_range(-jitter..jitter));
            }
            let dir = unit_sphere(rng);
            let speed = rng.gen_range(lo..hi);
            spawn_velocities.extend_from_slice(&[dir.x * speed, dir.y * speed, dir.z * speed]);

            let pick: f32 = rng.gen();
            let table = kind.palette();
            let rgb = table
                .iter()
                .find(|(w, _)| pick < *w)
                .map(|(_, c)| *c)
                .unwrap_or(table[table.len() - 1].1);
            colors.extend_from_slice(&rgb);

            base_sizes.push(rng.gen_range(s_lo..s_hi));
        }

        BurstLayer {
            kind,
            positions:  spawn_positions.clone(),
            velocities: spawn_velocities.clone(),
            scales:     base_sizes.clone(),
            spawn_positions,
            spawn_velocities,
            base_sizes,
            colors,
            active: count,
        }
    }

    pub fn kind(&self) -> BurstLayerKind { self.kind }
    pub fn capacity(&self) -> usize { self.base_sizes.len() }
    pub fn active(&self) -> usize { self.active }

    pub fn set_active(&mut self, n: usize) {
        self.active = n.min(self.capacity());
    }

    pub fn positions(&self) -> &[f32] { &self.positions[..self.active * STRIDE] }
    pub fn scales(&self) -> &[f32] { &self.scales[..self.active] }
    pub fn colors(&self) -> &[f32] { &self.colors }

    /// Spawn velocity of particle `i`.
    pub fn spawn_velocity(&self, i: usize) -> [f32; 3] {
        let o = i * STRIDE;
        [self.spawn_velocities[o], self.spawn_velocities[o + 1], self.spawn_velocities[o + 2]]
    }

    fn reset(&mut self) {
        self.positions.copy_from_slice(&self.spawn_positions);
        self.velocities.copy_from_slice(&self.spawn_velocities);
        self.scales.copy_from_slice(&self.base_sizes);
    }

    /// Integrate one frame.  `t` is burst age after this frame's `dt`,
    /// `time` the scene clock used for drift and twinkle.
    fn step(&mut self, t: f32, dt: f32, time: f32) {
        let mult = self.kind.phase_multiplier(t) * dt;
        let friction = self.kind.friction(t);
        let drifting = t > self.kind.settle_time();

        for i in 0..self.active {
            let o = i * STRIDE;
            let fi = i as f32;
            for k in 0..STRIDE {
                self.positions[o + k] += self.velocities[o + k] * mult;
                self.velocities[o + k] *= friction;
            }

            match self.kind {
                BurstLayerKind::Main => {
                    if drifting {
                        self.positions[o]     += (time * 0.5 + fi).sin() * 0.01;
                        self.positions[o + 1] += (time * 0.4 + fi * 1.3).cos() * 0.01;
                    }
                    self.scales[i] = self.base_sizes[i] * (0.8 + (time * 2.0 + fi).sin() * 0.3);
                }
                BurstLayerKind::Dust => {
                    if drifting {
                        self.positions[o + 1] += (time * 0.3 + fi * 2.0).sin() * 0.008;
                    }
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Shockwave
// ════════════════════════════════════════════════════════════════════════════

/// Per-ring delay.
pub const RING_STAGGER: f32 = 0.15;
const RING_GROWTH: f32 = 25.0;
const RING_FADE_SECS: f32 = 2.5;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ring {
    pub scale:   f32,
    pub opacity: f32,
}

impl Ring {
    /// Ring `k` at burst age `t`.
    pub fn at(k: usize, t: f32) -> Ring {
        let ring_t = (t - k as f32 * RING_STAGGER).max(0.0);
        Ring {
            scale:   1.0 + ring_t * RING_GROWTH,
            opacity: (1.0 - ring_t / RING_FADE_SECS).max(0.0) * 0.5,
        }
    }
}

/// Ring colors, innermost first.
pub const RING_COLORS: [u32; 3] = [0xFFFFFF, 0x00FFFF, 0xFF00FF];

/// Unit-circle samples each ring is drawn from.
pub const RING_SEGMENTS: usize = 64;

/// Ring outline points (unit radius, xy plane, stride 3).
pub fn ring_outline() -> Vec<f32> {
    let mut out = Vec::with_capacity(RING_SEGMENTS * STRIDE);
    for s in 0..RING_SEGMENTS {
        let a = s as f32 / RING_SEGMENTS as f32 * TAU;
        out.extend_from_slice(&[a.cos(), a.sin(), 0.0]);
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// ExplosionBurst
// ════════════════════════════════════════════════════════════════════════════

pub struct ExplosionBurst {
    main:     BurstLayer,
    dust:     BurstLayer,
    rings:    Vec<Ring>,
    lifetime: Duration,
    expiry:   Deadline,
    age:      f32,
    visible:  bool,
}

impl ExplosionBurst {
    pub fn generate<R: Rng>(cfg: &BurstConfig, rng: &mut R) -> Self {
        ExplosionBurst {
            main:     BurstLayer::generate(BurstLayerKind::Main, cfg.main_count, rng),
            dust:     BurstLayer::generate(BurstLayerKind::Dust, cfg.dust_count, rng),
            rings:    vec![Ring::default(); cfg.ring_count],
            lifetime: timer_duration(cfg.lifetime_secs),
            expiry:   Deadline::disarmed(),
            age:      0.0,
            visible:  false,
        }
    }

    /// Start (or restart) the burst from its spawn state.
    pub fn trigger(&mut self, now: Duration) {
        self.main.reset();
        self.dust.reset();
        self.age = 0.0;
        self.visible = true;
        self.expiry.arm(now, self.lifetime);
        for (k, ring) in self.rings.iter_mut().enumerate() {
            *ring = Ring::at(k, 0.0);
        }
        info!("explosion burst triggered");
    }

    /// Advance one frame.  Returns true if anything visible changed.
    pub fn update(&mut self, now: Duration, dt: f32, time: f32) -> bool {
        if !self.visible {
            return false;
        }
        if self.expiry.fire(now) {
            self.visible = false;
            debug!("explosion burst expired after {:.1}s", self.age);
            return true;
        }

        self.age += dt.max(0.0);
        let t = self.age;
        self.main.step(t, dt, time);
        self.dust.step(t, dt, time);
        for (k, ring) in self.rings.iter_mut().enumerate() {
            *ring = Ring::at(k, t);
        }
        true
    }

    /// Hide immediately and drop the pending expiry.
    pub fn cancel(&mut self) {
        self.expiry.cancel();
        self.visible = false;
    }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let m = settings.active_count(self.main.capacity());
        let d = settings.active_count(self.dust.capacity());
        self.main.set_active(m);
        self.dust.set_active(d);
    }

    pub fn is_visible(&self) -> bool { self.visible }
    pub fn age(&self) -> f32 { self.age }
    pub fn main(&self) -> &BurstLayer { &self.main }
    pub fn dust(&self) -> &BurstLayer { &self.dust }
    pub fn rings(&self) -> &[Ring] { &self.rings }

    pub fn main_opacity(&self) -> f32 { self.main.kind.opacity(self.age) }
    pub fn dust_opacity(&self) -> f32 { self.dust.kind.opacity(self.age) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
