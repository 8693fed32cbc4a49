//! Ambient pools that animate on their own: the pulsing core, falling snow
//! and the twinkling starfield.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::animation::lerp;
use crate::color::{hex_rgb, lerp_rgb, CORE_OUTER, WHITE};
use crate::config::RuntimeSettings;
use crate::field::{InstanceBuffer, ParticleTransform};
use crate::shapes::{spherical, STRIDE};

/// The same color for every particle.
fn uniform_colors(count: usize, hex: u32) -> Vec<f32> {
    hex_rgb(hex).repeat(count)
}

// ════════════════════════════════════════════════════════════════════════════
// CoreField
// ════════════════════════════════════════════════════════════════════════════

/// Dense shell at the centre that shrinks as the field expands.
pub struct CoreField {
    /// `(theta, phi, radius)` per particle.
    seeds:     Vec<f32>,
    colors:    Vec<f32>,
    instances: InstanceBuffer,
    rotation:  Vec3,
    scratch:   ParticleTransform,
}

impl CoreField {
    pub fn generate<R: Rng>(count: usize, rng: &mut R) -> Self {
        let mut seeds = Vec::with_capacity(count * STRIDE);
        let mut colors = Vec::with_capacity(count * STRIDE);
        let inner = hex_rgb(WHITE);
        let outer = hex_rgb(CORE_OUTER);
        for _ in 0..count {
            let theta: f32 = rng.gen::<f32>() * TAU;
            let phi: f32 = rng.gen::<f32>() * PI;
            let d: f32 = 0.5 + rng.gen::<f32>() * 0.5;
            seeds.extend_from_slice(&[theta, phi, d]);
            colors.extend_from_slice(&lerp_rgb(inner, outer, rng.gen()));
        }
        CoreField {
            seeds,
            colors,
            instances: InstanceBuffer::new(count),
            rotation:  Vec3::ZERO,
            scratch:   ParticleTransform::default(),
        }
    }

    pub fn update(&mut self, expansion: f32, time: f32) {
        let breathe = 1.0 + (time * 6.0).sin() * 0.1;
        let shrink = 1.0 - expansion * 0.5;
        let scale = 0.05 * lerp(1.0, 0.2, expansion);
        for i in 0..self.instances.active() {
            let o = i * STRIDE;
            let (theta, phi, d) = (self.seeds[o], self.seeds[o + 1], self.seeds[o + 2]);
            let r = (d + (time * 20.0 + i as f32).sin() * 0.05) * breathe * shrink;
            self.scratch.position = spherical(r, theta, phi);
            self.scratch.scale = scale;
            self.instances.write(i, &self.scratch);
        }
        self.rotation = Vec3::new(0.0, time * 0.5, 0.0);
    }

    pub fn instances(&self) -> &InstanceBuffer { &self.instances }
    pub fn colors(&self) -> &[f32] { &self.colors }
    pub fn rotation(&self) -> Vec3 { self.rotation }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let n = settings.active_count(self.instances.capacity());
        self.instances.set_active(n);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Snow
// ════════════════════════════════════════════════════════════════════════════

pub const SNOW_TOP: f32 = 20.0;
pub const SNOW_FLOOR: f32 = -20.0;

/// Flakes that fall forever, wrapping from the floor back to the top.
pub struct Snow {
    speeds:    Vec<f32>,
    colors:    Vec<f32>,
    instances: InstanceBuffer,
}

impl Snow {
    pub fn generate<R: Rng>(count: usize, rng: &mut R) -> Self {
        let mut instances = InstanceBuffer::new(count);
        let mut speeds = Vec::with_capacity(count);
        for i in 0..count {
            let p = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 60.0,
                rng.gen::<f32>() * 30.0,
                (rng.gen::<f32>() - 0.5) * 60.0,
            );
            instances.write(i, &ParticleTransform { position: p, scale: 1.0 });
            speeds.push(0.02 + rng.gen::<f32>() * 0.04);
        }
        Snow { speeds, colors: uniform_colors(count, WHITE), instances }
    }

    /// One frame of fall and sideways drift.
    pub fn update(&mut self, time: f32) {
        for i in 0..self.instances.active() {
            let mut p = self.instances.position(i);
            p.y -= self.speeds[i];
            if p.y < SNOW_FLOOR {
                p.y = SNOW_TOP;
            }
            p.x += (time + i as f32).sin() * 0.01;
            self.instances.write(i, &ParticleTransform { position: p, scale: 1.0 });
        }
    }

    pub fn instances(&self) -> &InstanceBuffer { &self.instances }
    pub fn colors(&self) -> &[f32] { &self.colors }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let n = settings.active_count(self.instances.capacity());
        self.instances.set_active(n);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Starfield
// ════════════════════════════════════════════════════════════════════════════

/// Background stars in a ±50 cube; only their scales change.
pub struct Starfield {
    colors:    Vec<f32>,
    instances: InstanceBuffer,
    rotation:  Vec3,
}

impl Starfield {
    pub fn generate<R: Rng>(count: usize, rng: &mut R) -> Self {
        let mut instances = InstanceBuffer::new(count);
        for i in 0..count {
            let p = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 100.0,
                (rng.gen::<f32>() - 0.5) * 100.0,
                (rng.gen::<f32>() - 0.5) * 100.0,
            );
            instances.write(i, &ParticleTransform { position: p, scale: 0.05 });
        }
        Starfield { colors: uniform_colors(count, WHITE), instances, rotation: Vec3::ZERO }
    }

    pub fn update(&mut self, time: f32) {
        for i in 0..self.instances.active() {
            let position = self.instances.position(i);
            let scale = (0.5 + (time * 0.5 + i as f32).sin() * 0.5) * 0.1;
            self.instances.write(i, &ParticleTransform { position, scale });
        }
        self.rotation = Vec3::new(0.0, time * 0.02, time * 0.01);
    }

    pub fn instances(&self) -> &InstanceBuffer { &self.instances }
    pub fn colors(&self) -> &[f32] { &self.colors }
    pub fn rotation(&self) -> Vec3 { self.rotation }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let n = settings.active_count(self.instances.capacity());
        self.instances.set_active(n);
    }
}
