//! Render backend contract.
//!
//! The scene never draws anything itself.  Each pool is registered once with
//! its static colors, then fed flat instance buffers (xyz stride 3 plus one
//! uniform scale per instance) only on frames where its transforms changed.
//! Per-pool visibility, opacity and group rotation, the camera rig and the
//! fog are pushed every frame.

use std::collections::HashMap;

use glam::Vec3;

use crate::camera::CameraRig;

// ════════════════════════════════════════════════════════════════════════════
// Pools
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// The heart/galaxy field.
    Field,
    Core,
    Snow,
    Stars,
    Rings,
    Sphere,
    InnerCore,
    BurstMain,
    BurstDust,
    /// Shockwave ring `k`.
    Shockwave(usize),
    /// Segment pairs rather than points.
    SpeedLines,
}

impl PoolKind {
    pub fn label(&self) -> &'static str {
        match self {
            PoolKind::Field        => "field",
            PoolKind::Core         => "core",
            PoolKind::Snow         => "snow",
            PoolKind::Stars        => "stars",
            PoolKind::Rings        => "rings",
            PoolKind::Sphere       => "sphere",
            PoolKind::InnerCore    => "inner-core",
            PoolKind::BurstMain    => "burst",
            PoolKind::BurstDust    => "dust",
            PoolKind::Shockwave(_) => "shockwave",
            PoolKind::SpeedLines   => "speed-lines",
        }
    }

    /// Consecutive instance pairs are line segments.
    pub fn is_lines(&self) -> bool {
        matches!(self, PoolKind::SpeedLines)
    }

    /// Additively blended, bloom-style pools.
    pub fn is_additive(&self) -> bool {
        !matches!(self, PoolKind::Snow)
    }
}

/// Per-frame group state of a pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoolState {
    pub visible:  bool,
    pub opacity:  f32,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    /// Uniform group scale.
    pub scale:    f32,
}

impl Default for PoolState {
    fn default() -> Self {
        PoolState { visible: true, opacity: 1.0, rotation: Vec3::ZERO, scale: 1.0 }
    }
}

impl PoolState {
    pub fn hidden() -> Self {
        PoolState { visible: false, opacity: 0.0, ..PoolState::default() }
    }

    pub fn rotated(rotation: Vec3) -> Self {
        PoolState { rotation, ..PoolState::default() }
    }
}

/// Linear depth fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogParams {
    pub near:  f32,
    pub far:   f32,
    pub color: [f32; 3],
}

impl FogParams {
    /// Remaining visibility (1 = unfogged) at view depth `d`.
    pub fn visibility(&self, d: f32) -> f32 {
        if self.far <= self.near {
            return if d < self.near { 1.0 } else { 0.0 };
        }
        (1.0 - (d - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RenderBackend
// ════════════════════════════════════════════════════════════════════════════

pub trait RenderBackend {
    fn register_pool(&mut self, kind: PoolKind, colors: &[f32]);
    fn upload_instances(&mut self, kind: PoolKind, positions: &[f32], scales: &[f32]);
    fn set_pool_state(&mut self, kind: PoolKind, state: &PoolState);
    fn set_camera(&mut self, rig: &CameraRig);
    fn set_fog(&mut self, fog: &FogParams);
}

/// Discards everything.  Used when the scene runs headless.
pub struct NullBackend;

impl RenderBackend for NullBackend {
    fn register_pool(&mut self, _kind: PoolKind, _colors: &[f32]) {}
    fn upload_instances(&mut self, _kind: PoolKind, _positions: &[f32], _scales: &[f32]) {}
    fn set_pool_state(&mut self, _kind: PoolKind, _state: &PoolState) {}
    fn set_camera(&mut self, _rig: &CameraRig) {}
    fn set_fog(&mut self, _fog: &FogParams) {}
}

// ── recording backend (tests, replays) ──────────────────────────────────────

/// Remembers the last value pushed for every pool and counts uploads.
#[derive(Default)]
pub struct RecordingBackend {
    pub registered: Vec<PoolKind>,
    pub uploads:    HashMap<PoolKind, usize>,
    pub instances:  HashMap<PoolKind, usize>,
    pub states:     HashMap<PoolKind, PoolState>,
    pub camera:     Option<CameraRig>,
    pub fog:        Option<FogParams>,
}

impl RecordingBackend {
    pub fn new() -> Self { Self::default() }

    pub fn upload_count(&self, kind: PoolKind) -> usize {
        self.uploads.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_visible(&self, kind: PoolKind) -> bool {
        self.states.get(&kind).map(|s| s.visible).unwrap_or(false)
    }

    pub fn clear_counts(&mut self) {
        self.uploads.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn register_pool(&mut self, kind: PoolKind, _colors: &[f32]) {
        if !self.registered.contains(&kind) {
            self.registered.push(kind);
        }
    }

    fn upload_instances(&mut self, kind: PoolKind, positions: &[f32], scales: &[f32]) {
        debug_assert_eq!(positions.len(), scales.len() * 3);
        *self.uploads.entry(kind).or_insert(0) += 1;
        self.instances.insert(kind, scales.len());
    }

    fn set_pool_state(&mut self, kind: PoolKind, state: &PoolState) {
        self.states.insert(kind, *state);
    }

    fn set_camera(&mut self, rig: &CameraRig) {
        self.camera = Some(*rig);
    }

    fn set_fog(&mut self, fog: &FogParams) {
        self.fog = Some(*fog);
    }
}
