//! The main heart ⇄ galaxy particle field.
//!
//! Each particle owns a static identity (seed triple, heart target, galaxy
//! target, color) and a derived transform that is recomputed every frame
//! from [`FieldInputs`].  The derivation is a pure function
//! ([`ParticleField::transform_of`]); [`ParticleField::update`] runs it over
//! the active prefix of the pool and writes the results into a
//! pre-allocated [`InstanceBuffer`].
//!
//! Per particle, in order:
//!
//! 1. morph: `p = lerp(heart, galaxy, expansion)`
//! 2. attraction: `p = lerp(p, hand, pull)` with
//!    `pull = strength·(1 − falloff·lag)·(0.8·expansion + 0.2)`
//! 3. supernova: `p += (p / 10)·pulse·force·(0.5 + lag)` while the pulse is live
//! 4. scale: `magnitude·twinkle·(1 + 3·pulse)·(1 + heartbeat)`

use glam::Vec3;
use rand::Rng;

use crate::color::STAR_PALETTE;
use crate::config::FieldConfig;
use crate::shapes::{
    galaxy_targets, heart_targets, palette_colors, particle_seeds, put_vec3, vec3_at, STRIDE,
};

/// Pulses at or below this no longer push particles outward.
pub const PULSE_EPSILON: f32 = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// Inputs / outputs
// ════════════════════════════════════════════════════════════════════════════

/// Everything a frame's transforms depend on besides particle identity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldInputs {
    /// 0 = heart, 1 = galaxy.
    pub expansion:   f32,
    pub pulse:       f32,
    pub hand_target: Option<Vec3>,
    /// Scene time in seconds.
    pub elapsed:     f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleTransform {
    pub position: Vec3,
    pub scale:    f32,
}

/// Flat per-instance output: xyz positions (stride 3) and uniform scales.
///
/// Sized once for the pool's capacity; only the first `active` entries are
/// meaningful and exposed.
#[derive(Clone, Debug)]
pub struct InstanceBuffer {
    positions: Vec<f32>,
    scales:    Vec<f32>,
    active:    usize,
}

impl InstanceBuffer {
    pub fn new(capacity: usize) -> Self {
        InstanceBuffer {
            positions: vec![0.0; capacity * STRIDE],
            scales:    vec![0.0; capacity],
            active:    capacity,
        }
    }

    pub fn capacity(&self) -> usize { self.scales.len() }
    pub fn active(&self) -> usize { self.active }

    pub fn set_active(&mut self, n: usize) {
        self.active = n.min(self.capacity());
    }

    /// Active positions, flat xyz.
    pub fn positions(&self) -> &[f32] { &self.positions[..self.active * STRIDE] }

    /// Active scales.
    pub fn scales(&self) -> &[f32] { &self.scales[..self.active] }

    #[inline]
    pub fn write(&mut self, i: usize, t: &ParticleTransform) {
        put_vec3(&mut self.positions, i, t.position);
        self.scales[i] = t.scale;
    }

    pub fn position(&self, i: usize) -> Vec3 { vec3_at(&self.positions, i) }
    pub fn scale(&self, i: usize) -> f32 { self.scales[i] }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
struct FieldParams {
    pull_strength:    f32,
    pull_lag_falloff: f32,
    explosion_force:  f32,
}

pub struct ParticleField {
    seeds:     Vec<f32>,
    heart:     Vec<f32>,
    galaxy:    Vec<f32>,
    colors:    Vec<f32>,
    params:    FieldParams,
    instances: InstanceBuffer,
    scratch:   ParticleTransform,
}

impl ParticleField {
    /// Draw a pool of `cfg.particle_count` particles from `rng`.
    pub fn generate<R: Rng>(cfg: &FieldConfig, rng: &mut R) -> Self {
        let n = cfg.particle_count;
        let seeds  = particle_seeds(n, rng);
        let galaxy = galaxy_targets(n, cfg, rng);
        let heart  = heart_targets(n, cfg, rng);
        let colors = palette_colors(n, &STAR_PALETTE, rng);
        ParticleField {
            seeds,
            heart,
            galaxy,
            colors,
            params: FieldParams {
                pull_strength:    cfg.pull_strength,
                pull_lag_falloff: cfg.pull_lag_falloff,
                explosion_force:  cfg.explosion_force,
            },
            instances: InstanceBuffer::new(n),
            scratch:   ParticleTransform::default(),
        }
    }

    pub fn capacity(&self) -> usize { self.instances.capacity() }
    pub fn active(&self) -> usize { self.instances.active() }

    /// Limit work and upload to the first `n` particles.  Identities are
    /// untouched.
    pub fn set_active(&mut self, n: usize) {
        self.instances.set_active(n);
    }

    /// `(phase, magnitude, lag)` of particle `i`.
    pub fn seed(&self, i: usize) -> (f32, f32, f32) {
        let s = vec3_at(&self.seeds, i);
        (s.x, s.y, s.z)
    }

    pub fn heart_target(&self, i: usize) -> Vec3 { vec3_at(&self.heart, i) }
    pub fn galaxy_target(&self, i: usize) -> Vec3 { vec3_at(&self.galaxy, i) }

    /// Flat rgb, one triple per particle.
    pub fn colors(&self) -> &[f32] { &self.colors }

    pub fn instances(&self) -> &InstanceBuffer { &self.instances }

    /// The transform particle `i` has under `inputs`.
    pub fn transform_of(&self, i: usize, inputs: &FieldInputs) -> ParticleTransform {
        let mut out = ParticleTransform::default();
        particle_transform(
            &self.params,
            vec3_at(&self.seeds, i),
            vec3_at(&self.heart, i),
            vec3_at(&self.galaxy, i),
            inputs,
            &mut out,
        );
        out
    }

    /// Recompute every active transform into the instance buffer.
    pub fn update(&mut self, inputs: &FieldInputs) {
        let ParticleField { seeds, heart, galaxy, params, instances, scratch, .. } = self;
        for i in 0..instances.active() {
            particle_transform(
                params,
                vec3_at(seeds, i),
                vec3_at(heart, i),
                vec3_at(galaxy, i),
                inputs,
                scratch,
            );
            instances.write(i, scratch);
        }
    }
}

#[inline]
fn particle_transform(
    params: &FieldParams,
    seed:   Vec3,
    heart:  Vec3,
    galaxy: Vec3,
    inputs: &FieldInputs,
    out:    &mut ParticleTransform,
) {
    let (phase, magnitude, lag) = (seed.x, seed.y, seed.z);
    let e = inputs.expansion;

    let mut p = heart.lerp(galaxy, e);

    if let Some(target) = inputs.hand_target {
        let pull = params.pull_strength * (1.0 - lag * params.pull_lag_falloff) * (e * 0.8 + 0.2);
        p = p.lerp(target, pull);
    }

    if inputs.pulse > PULSE_EPSILON {
        let force = inputs.pulse * params.explosion_force * (0.5 + lag);
        p += (p / 10.0) * force;
    }

    let t = inputs.elapsed;
    let twinkle = 0.6 + (t * (3.0 + lag * 4.0) + phase).sin() * 0.4;
    let heartbeat = (1.0 - e) * (t * 4.0).sin() * 0.05;

    out.position = p;
    out.scale = magnitude * twinkle * (1.0 + inputs.pulse * 3.0) * (1.0 + heartbeat);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(n: usize) -> ParticleField {
        let cfg = FieldConfig { particle_count: n, ..FieldConfig::default() };
        ParticleField::generate(&cfg, &mut StdRng::seed_from_u64(42))
    }

    fn calm(expansion: f32) -> FieldInputs {
        FieldInputs { expansion, pulse: 0.0, hand_target: None, elapsed: 0.0 }
    }

    #[test]
    fn endpoints_are_the_targets() {
        let f = field(256);
        for i in 0..256 {
            assert!(f.transform_of(i, &calm(0.0)).position.abs_diff_eq(f.heart_target(i), 1e-5));
            assert!(f.transform_of(i, &calm(1.0)).position.abs_diff_eq(f.galaxy_target(i), 1e-5));
        }
    }

    #[test]
    fn morph_is_continuous() {
        let f = field(64);
        for i in 0..64 {
            let a = f.transform_of(i, &calm(0.500)).position;
            let b = f.transform_of(i, &calm(0.501)).position;
            let span = f.heart_target(i).distance(f.galaxy_target(i));
            assert!(a.distance(b) <= span * 0.001 + 1e-4);
        }
    }

    #[test]
    fn transform_is_idempotent() {
        let f = field(32);
        let inputs = FieldInputs {
            expansion: 0.37,
            pulse: 0.6,
            hand_target: Some(Vec3::new(1.0, -2.0, 0.5)),
            elapsed: 12.25,
        };
        for i in 0..32 {
            assert_eq!(f.transform_of(i, &inputs), f.transform_of(i, &inputs));
        }
    }

    #[test]
    fn update_matches_transform_of() {
        let mut f = field(128);
        let inputs = FieldInputs { expansion: 0.8, pulse: 0.3, hand_target: None, elapsed: 3.0 };
        f.update(&inputs);
        for i in 0..128 {
            let t = f.transform_of(i, &inputs);
            assert_eq!(f.instances().position(i), t.position);
            assert_eq!(f.instances().scale(i), t.scale);
        }
    }

    #[test]
    fn hand_pulls_toward_target() {
        let f = field(64);
        let target = Vec3::new(5.0, 5.0, 5.0);
        let pulled = FieldInputs { hand_target: Some(target), ..calm(1.0) };
        for i in 0..64 {
            let free = f.transform_of(i, &calm(1.0)).position;
            let held = f.transform_of(i, &pulled).position;
            assert!(held.distance(target) <= free.distance(target) + 1e-5);
        }
    }

    #[test]
    fn pulse_pushes_outward_and_enlarges() {
        let f = field(64);
        let boom = FieldInputs { pulse: 1.0, ..calm(1.0) };
        for i in 0..64 {
            let rest = f.transform_of(i, &calm(1.0));
            let hot = f.transform_of(i, &boom);
            assert!(hot.position.length() >= rest.position.length() - 1e-5);
            assert!(hot.scale >= rest.scale * 3.99 - 1e-5);
        }
    }

    #[test]
    fn tiny_pulse_does_not_displace() {
        let f = field(16);
        let faint = FieldInputs { pulse: 0.005, ..calm(0.5) };
        for i in 0..16 {
            assert_eq!(f.transform_of(i, &faint).position, f.transform_of(i, &calm(0.5)).position);
        }
    }

    #[test]
    fn quality_limits_active_prefix() {
        let mut f = field(100);
        f.set_active(40);
        f.update(&calm(1.0));
        assert_eq!(f.instances().positions().len(), 40 * 3);
        assert_eq!(f.instances().scales().len(), 40);
        assert_eq!(f.capacity(), 100);
        f.set_active(1_000);
        assert_eq!(f.active(), 100);
    }

    #[test]
    fn identity_is_stable_across_updates() {
        let mut f = field(50);
        let before: Vec<_> = (0..50).map(|i| (f.seed(i), f.heart_target(i), f.galaxy_target(i))).collect();
        let colors = f.colors().to_vec();
        for k in 0..10 {
            f.update(&FieldInputs { expansion: k as f32 / 10.0, pulse: 0.5, hand_target: None, elapsed: k as f32 });
        }
        let after: Vec<_> = (0..50).map(|i| (f.seed(i), f.heart_target(i), f.galaxy_target(i))).collect();
        assert_eq!(before, after);
        assert_eq!(colors, f.colors());
    }
}
