//! Static per-particle data: seeds, morph targets and colors.
//!
//! Everything here is drawn once from a seeded RNG into flat `Vec<f32>`
//! buffers with a stride of 3, and never changes for the life of a pool.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::color::hex_rgb;
use crate::config::FieldConfig;

pub const STRIDE: usize = 3;

/// Read the `i`-th xyz triple of a flat buffer.
#[inline]
pub fn vec3_at(buf: &[f32], i: usize) -> Vec3 {
    let o = i * STRIDE;
    Vec3::new(buf[o], buf[o + 1], buf[o + 2])
}

/// Write `v` as the `i`-th xyz triple of a flat buffer.
#[inline]
pub fn put_vec3(buf: &mut [f32], i: usize, v: Vec3) {
    let o = i * STRIDE;
    buf[o] = v.x;
    buf[o + 1] = v.y;
    buf[o + 2] = v.z;
}

// ════════════════════════════════════════════════════════════════════════════
// Seeds
// ════════════════════════════════════════════════════════════════════════════

/// `(phase, magnitude, lag)` per particle.
///
/// Magnitude is `0.4 + U²·1.6`, so most stars are small and a few are large.
pub fn particle_seeds<R: Rng>(count: usize, rng: &mut R) -> Vec<f32> {
    let mut out = Vec::with_capacity(count * STRIDE);
    for _ in 0..count {
        let phase: f32 = rng.gen::<f32>() * TAU;
        let u: f32 = rng.gen();
        let lag: f32 = rng.gen();
        out.extend_from_slice(&[phase, 0.4 + u * u * 1.6, lag]);
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Heart
// ════════════════════════════════════════════════════════════════════════════

/// The classic parametric heart outline at parameter `t`.
pub fn heart_curve(t: f32) -> (f32, f32) {
    let s = t.sin();
    let x = 16.0 * s * s * s;
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    (x, y)
}

/// One heart target.  `scatter` pulls the point inward to give the shell
/// thickness; depth thins toward the sides through `cos t`.
pub fn heart_point(t: f32, scatter: f32, depth: f32, cfg: &FieldConfig) -> Vec3 {
    let (x, y) = heart_curve(t);
    let s = cfg.heart_scale;
    Vec3::new(
        x * s * scatter,
        (y + cfg.heart_y_offset) * s * scatter,
        depth * scatter * t.cos(),
    )
}

pub fn heart_targets<R: Rng>(count: usize, cfg: &FieldConfig, rng: &mut R) -> Vec<f32> {
    let mut out = vec![0.0; count * STRIDE];
    for i in 0..count {
        let t: f32 = rng.gen::<f32>() * TAU;
        let depth: f32 = rng.gen_range(-1.0..1.0);
        let scatter: f32 = rng.gen_range(0.85..=1.0);
        put_vec3(&mut out, i, heart_point(t, scatter, depth, cfg));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Galaxy
// ════════════════════════════════════════════════════════════════════════════

/// One spiral-galaxy target.  Radii bunch toward the centre (`U^0.6`), the
/// angle winds with radius and snaps to one of `arms` arms, and the disc
/// thins toward the rim.
pub fn galaxy_point(u_radius: f32, u_angle: f32, arm: u32, u_spread: f32, cfg: &FieldConfig) -> Vec3 {
    let radius = cfg.galaxy_radius * u_radius.powf(0.6);
    let arms = cfg.galaxy_arms.max(1) as f32;
    let angle = u_angle * TAU + radius * cfg.galaxy_spin + arm as f32 * TAU / arms;
    let spread = (1.0 - radius / cfg.galaxy_radius) * cfg.galaxy_thickness * (u_spread - 0.5);
    Vec3::new(angle.cos() * radius, spread, angle.sin() * radius)
}

pub fn galaxy_targets<R: Rng>(count: usize, cfg: &FieldConfig, rng: &mut R) -> Vec<f32> {
    let mut out = vec![0.0; count * STRIDE];
    let arms = cfg.galaxy_arms.max(1);
    for i in 0..count {
        let u_angle: f32 = rng.gen();
        let u_radius: f32 = rng.gen();
        let arm = rng.gen_range(0..arms);
        let u_spread: f32 = rng.gen();
        put_vec3(&mut out, i, galaxy_point(u_radius, u_angle, arm, u_spread, cfg));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Colors and sphere sampling
// ════════════════════════════════════════════════════════════════════════════

/// Uniform picks from a hex palette.
pub fn palette_colors<R: Rng>(count: usize, palette: &[u32], rng: &mut R) -> Vec<f32> {
    let mut out = Vec::with_capacity(count * STRIDE);
    for _ in 0..count {
        let hex = if palette.is_empty() { 0xFFFFFF } else { palette[rng.gen_range(0..palette.len())] };
        out.extend_from_slice(&hex_rgb(hex));
    }
    out
}

/// Uniform direction on the unit sphere.
pub fn unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
    let theta: f32 = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

/// Spherical coordinates, `phi` measured from +z.
pub fn spherical(r: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(r * phi.sin() * theta.cos(), r * phi.sin() * theta.sin(), r * phi.cos())
}
