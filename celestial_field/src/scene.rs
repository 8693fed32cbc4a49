//! Scene composition: the layers that only react to the core's outputs.
//!
//! ```text
//! closeness  0 ──────────── 0.6 ──── 0.75 ──── 0.85 ──── 1
//!                           rings    sphere    inner core
//! ```
//!
//! Fog closes in as the camera dives, and speed lines flash while the zoom
//! is moving fast.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::ambient::{CoreField, Snow, Starfield};
use crate::color::{hex_rgb, hsl_rgb, lerp_rgb, scale_rgb, GOLD, RED, WHITE};
use crate::config::{AmbientConfig, RuntimeSettings};
use crate::field::{InstanceBuffer, ParticleTransform};
use crate::render::{FogParams, PoolState};
use crate::shapes::{unit_sphere, STRIDE};

// ════════════════════════════════════════════════════════════════════════════
// Inner core layers
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InnerLayerKind {
    Rings,
    Sphere,
    Core,
}

impl InnerLayerKind {
    /// Closeness above which the layer shows.
    pub fn reveal_at(self) -> f32 {
        match self {
            InnerLayerKind::Rings  => 0.6,
            InnerLayerKind::Sphere => 0.75,
            InnerLayerKind::Core   => 0.85,
        }
    }

    fn point_scale(self) -> f32 {
        match self {
            InnerLayerKind::Rings  => 0.08,
            InnerLayerKind::Sphere => 0.06,
            InnerLayerKind::Core   => 0.1,
        }
    }
}

/// A static point cloud revealed past a closeness threshold.
pub struct InnerLayer {
    kind:      InnerLayerKind,
    colors:    Vec<f32>,
    instances: InstanceBuffer,
    state:     PoolState,
}

impl InnerLayer {
    pub fn generate<R: Rng>(kind: InnerLayerKind, count: usize, rng: &mut R) -> Self {
        let mut instances = InstanceBuffer::new(count);
        let mut colors = Vec::with_capacity(count * STRIDE);
        let scale = kind.point_scale();

        for i in 0..count {
            let (position, rgb) = match kind {
                InnerLayerKind::Rings => {
                    let a = i as f32 / count as f32 * TAU;
                    let r = 3.0 + rng.gen::<f32>() * 0.5;
                    let y = (rng.gen::<f32>() - 0.5) * 0.5;
                    (Vec3::new(a.cos() * r, y, a.sin() * r), lerp_rgb(hex_rgb(WHITE), hex_rgb(GOLD), rng.gen()))
                }
                InnerLayerKind::Sphere => {
                    let r = 1.5 + rng.gen::<f32>() * 0.3;
                    (unit_sphere(rng) * r, hex_rgb(RED))
                }
                InnerLayerKind::Core => {
                    let r = rng.gen::<f32>() * 0.5;
                    (unit_sphere(rng) * r, hex_rgb(WHITE))
                }
            };
            instances.write(i, &ParticleTransform { position, scale });
            colors.extend_from_slice(&rgb);
        }

        InnerLayer { kind, colors, instances, state: PoolState::hidden() }
    }

    pub fn update(&mut self, closeness: f32, time: f32) {
        let threshold = self.kind.reveal_at();
        if closeness <= threshold {
            self.state = PoolState::hidden();
            return;
        }
        let (rotation, scale) = match self.kind {
            InnerLayerKind::Rings  => (Vec3::new(0.0, time * 0.3, time * 0.1), 1.0),
            InnerLayerKind::Sphere => (Vec3::new(time * 0.2, -time * 0.5, 0.0), 1.0),
            InnerLayerKind::Core   => (Vec3::new(0.0, time * 0.8, 0.0), 1.0 + (time * 3.0).sin() * 0.15),
        };
        self.state = PoolState {
            visible: true,
            opacity: ((closeness - threshold) / (1.0 - threshold)).clamp(0.0, 1.0),
            rotation,
            scale,
        };
    }

    pub fn kind(&self) -> InnerLayerKind { self.kind }
    pub fn instances(&self) -> &InstanceBuffer { &self.instances }
    pub fn colors(&self) -> &[f32] { &self.colors }
    pub fn state(&self) -> PoolState { self.state }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let n = settings.active_count(self.instances.capacity());
        self.instances.set_active(n);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fog
// ════════════════════════════════════════════════════════════════════════════

pub fn depth_fog(closeness: f32) -> FogParams {
    let c = closeness.clamp(0.0, 1.0);
    FogParams {
        near:  10.0 + (1.0 - c) * 10.0,
        far:   30.0 + (1.0 - c) * 20.0,
        color: hsl_rgb(0.65, 0.3, 0.02 + c * 0.03),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Speed lines
// ════════════════════════════════════════════════════════════════════════════

const LINE_START: f32 = 15.0;
const LINE_END: f32 = 25.0;

/// Radial streaks that flash while the zoom is moving.  Instances come in
/// pairs: the inner and outer end of each line.
pub struct SpeedLines {
    colors:    Vec<f32>,
    instances: InstanceBuffer,
    speed:     f32,
    spin:      f32,
}

impl SpeedLines {
    pub fn generate<R: Rng>(lines: usize, rng: &mut R) -> Self {
        let mut instances = InstanceBuffer::new(lines * 2);
        let mut colors = Vec::with_capacity(lines * 2 * STRIDE);
        for i in 0..lines {
            let a = rng.gen::<f32>() * TAU;
            let end = |r: f32| Vec3::new(a.cos() * r, a.sin() * r * 0.5, a.sin() * r);
            instances.write(2 * i,     &ParticleTransform { position: end(LINE_START), scale: 1.0 });
            instances.write(2 * i + 1, &ParticleTransform { position: end(LINE_END),   scale: 1.0 });
            let rgb = hsl_rgb(0.5, 1.0, 0.5 + rng.gen::<f32>() * 0.3);
            colors.extend_from_slice(&rgb);
            colors.extend_from_slice(&scale_rgb(rgb, 0.3));
        }
        SpeedLines { colors, instances, speed: 0.0, spin: 0.0 }
    }

    pub fn update(&mut self, zoom_delta: f32) {
        self.speed += (zoom_delta.abs() * 30.0 - self.speed) * 0.2;
        self.spin += zoom_delta * 0.5;
    }

    pub fn speed(&self) -> f32 { self.speed }

    pub fn state(&self) -> PoolState {
        if self.speed > 0.1 {
            PoolState {
                opacity: (self.speed / 2.0).min(1.0),
                rotation: Vec3::new(0.0, 0.0, self.spin),
                ..PoolState::default()
            }
        } else {
            PoolState::hidden()
        }
    }

    pub fn instances(&self) -> &InstanceBuffer { &self.instances }
    pub fn colors(&self) -> &[f32] { &self.colors }

    /// Keeps whole lines: the active count stays even.
    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        let lines = settings.active_count(self.instances.capacity() / 2);
        self.instances.set_active(lines * 2);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SceneLayers
// ════════════════════════════════════════════════════════════════════════════

pub struct SceneLayers {
    pub core:        CoreField,
    pub snow:        Snow,
    pub stars:       Starfield,
    pub rings:       InnerLayer,
    pub sphere:      InnerLayer,
    pub inner_core:  InnerLayer,
    pub speed_lines: SpeedLines,
    fog:             FogParams,
}

impl SceneLayers {
    pub fn generate<R: Rng>(cfg: &AmbientConfig, rng: &mut R) -> Self {
        SceneLayers {
            core:        CoreField::generate(cfg.core_count, rng),
            snow:        Snow::generate(cfg.snow_count, rng),
            stars:       Starfield::generate(cfg.star_count, rng),
            rings:       InnerLayer::generate(InnerLayerKind::Rings, cfg.ring_count, rng),
            sphere:      InnerLayer::generate(InnerLayerKind::Sphere, cfg.sphere_count, rng),
            inner_core:  InnerLayer::generate(InnerLayerKind::Core, cfg.inner_core_count, rng),
            speed_lines: SpeedLines::generate(cfg.speed_line_count, rng),
            fog:         depth_fog(0.0),
        }
    }

    pub fn update(&mut self, expansion: f32, closeness: f32, zoom_delta: f32, time: f32) {
        self.core.update(expansion, time);
        self.snow.update(time);
        self.stars.update(time);
        self.rings.update(closeness, time);
        self.sphere.update(closeness, time);
        self.inner_core.update(closeness, time);
        self.speed_lines.update(zoom_delta);
        self.fog = depth_fog(closeness);
    }

    pub fn fog(&self) -> FogParams { self.fog }

    pub fn apply_quality(&mut self, settings: &RuntimeSettings) {
        self.core.apply_quality(settings);
        self.snow.apply_quality(settings);
        self.stars.apply_quality(settings);
        self.rings.apply_quality(settings);
        self.sphere.apply_quality(settings);
        self.inner_core.apply_quality(settings);
        self.speed_lines.apply_quality(settings);
    }
}
