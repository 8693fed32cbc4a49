//! The render-loop driver.
//!
//! `CelestialScene` owns every piece of mutable scene state and threads one
//! tracking frame through the pipeline per display refresh:
//!
//! ```text
//! TrackingFrame ─► GestureClassifier ─► AnimationState ─► ParticleField
//!                        │
//!                        ├─► HeartDebouncer
//!                        └─► ZoomController ─► ExplosionBurst, SceneLayers
//! ```
//!
//! [`CelestialScene::step`] does all the numeric work;
//! [`CelestialScene::present`] pushes the result to a [`RenderBackend`],
//! uploading instance buffers only for pools that changed.

use std::time::Duration;

use glam::Vec3;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use celestial_gesture::{
    GestureClassifier, GestureReading, HandPose, HeartDebouncer, TrackingFrame,
};

use crate::animation::AnimationState;
use crate::burst::{ring_outline, ExplosionBurst, RING_COLORS, RING_SEGMENTS};
use crate::camera::{CameraRig, ZoomController, ZoomInput};
use crate::color::hex_rgb;
use crate::config::{RuntimeSettings, SceneConfig};
use crate::error::Result;
use crate::field::ParticleField;
use crate::render::{PoolKind, PoolState, RenderBackend};
use crate::scene::SceneLayers;

/// Point size of a shockwave ring sample.
const RING_POINT_SCALE: f32 = 0.12;

// ════════════════════════════════════════════════════════════════════════════
// FrameReport
// ════════════════════════════════════════════════════════════════════════════

/// What one [`CelestialScene::step`] produced, for status lines and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub frame:              u64,
    /// Scene time in seconds.
    pub elapsed:            f32,
    pub hands:              usize,
    pub pose:               HandPose,
    pub expansion:          f32,
    pub pulse:              f32,
    pub rotation_x:         f32,
    pub rotation_y:         f32,
    pub zoom:               f32,
    pub fov:                f32,
    pub closeness:          f32,
    pub exploded:           bool,
    pub auto_zoom_finished: bool,
    pub burst_visible:      bool,
    pub heart_triggered:    bool,
    pub heart_visible:      bool,
    pub heart_position:     Option<(f32, f32)>,
}

// ════════════════════════════════════════════════════════════════════════════
// CelestialScene
// ════════════════════════════════════════════════════════════════════════════

pub struct CelestialScene {
    // ── input ─────────────────────────────────────────────────────────────
    classifier: GestureClassifier,
    heart:      HeartDebouncer,
    settings:   RuntimeSettings,

    // ── core ──────────────────────────────────────────────────────────────
    animation:  AnimationState,
    field:      ParticleField,
    zoom:       ZoomController,
    burst:      ExplosionBurst,

    // ── composition ──────────────────────────────────────────────────────
    layers:       SceneLayers,
    ring_outline: Vec<f32>,
    ring_scales:  Vec<f32>,
    rig:          CameraRig,

    // ── bookkeeping ──────────────────────────────────────────────────────
    origin:     Option<Duration>,
    report:     FrameReport,
    dirty:      Vec<PoolKind>,
    registered: bool,
    torn_down:  bool,
}

impl CelestialScene {
    /// Validate `cfg` and build every pool from `cfg.seed`.
    pub fn new(cfg: SceneConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let field  = ParticleField::generate(&cfg.field, &mut rng);
        let burst  = ExplosionBurst::generate(&cfg.burst, &mut rng);
        let layers = SceneLayers::generate(&cfg.ambient, &mut rng);
        let zoom   = ZoomController::new(cfg.zoom.clone(), cfg.seed.wrapping_add(1));
        let animation = AnimationState::new(cfg.morph.clone(), &cfg.field);

        info!(
            "scene built: {} field, {} burst, {} core particles (seed {:#x})",
            field.capacity(),
            burst.main().capacity() + burst.dust().capacity(),
            layers.core.instances().capacity(),
            cfg.seed,
        );

        let report = FrameReport {
            frame:              0,
            elapsed:            0.0,
            hands:              0,
            pose:               HandPose::Absent,
            expansion:          animation.expansion,
            pulse:              animation.pulse,
            rotation_x:         animation.rotation_x,
            rotation_y:         animation.rotation_y,
            zoom:               zoom.zoom(),
            fov:                zoom.fov(),
            closeness:          zoom.closeness(),
            exploded:           false,
            auto_zoom_finished: false,
            burst_visible:      false,
            heart_triggered:    false,
            heart_visible:      false,
            heart_position:     None,
        };

        let mut scene = CelestialScene {
            classifier: GestureClassifier::new(cfg.gestures.clone()),
            heart:      HeartDebouncer::new(),
            settings:   cfg.settings,
            animation,
            field,
            zoom,
            burst,
            layers,
            ring_outline: ring_outline(),
            ring_scales:  vec![RING_POINT_SCALE; RING_SEGMENTS],
            rig:          CameraRig::default(),
            origin:     None,
            report,
            dirty:      Vec::new(),
            registered: false,
            torn_down:  false,
        };
        scene.apply_settings(cfg.settings);
        Ok(scene)
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn animation(&self) -> &AnimationState { &self.animation }
    pub fn field(&self) -> &ParticleField { &self.field }
    pub fn zoom(&self) -> &ZoomController { &self.zoom }
    pub fn burst(&self) -> &ExplosionBurst { &self.burst }
    pub fn layers(&self) -> &SceneLayers { &self.layers }
    pub fn camera(&self) -> &CameraRig { &self.rig }
    pub fn settings(&self) -> RuntimeSettings { self.settings }
    pub fn classifier(&self) -> &GestureClassifier { &self.classifier }
    pub fn last_report(&self) -> &FrameReport { &self.report }
    pub fn is_torn_down(&self) -> bool { self.torn_down }

    // ── runtime settings ─────────────────────────────────────────────────

    /// Apply user settings to the live scene.
    pub fn apply_settings(&mut self, settings: RuntimeSettings) {
        let s = settings.clamped();
        self.settings = s;
        self.classifier.set_sensitivity(s.detection_sensitivity);
        self.animation.set_rate_scale(s.rate_scale());

        let active = s.active_count(self.field.capacity());
        self.field.set_active(active);
        self.burst.apply_quality(&s);
        self.layers.apply_quality(&s);
        self.mark_all_dirty();

        info!(
            "settings: quality {}% ({} particles), sensitivity {}, smoothing {:.3}",
            s.particle_quality, active, s.detection_sensitivity, s.gesture_smoothing,
        );
    }

    // ── per-frame ────────────────────────────────────────────────────────

    /// Run one render-loop iteration.
    ///
    /// `frame` is the newest tracking snapshot, if any; `wheel_delta` the
    /// scroll accumulated since the last call; `now` a monotonic timestamp
    /// and `dt` the frame time in seconds.
    pub fn step(
        &mut self,
        frame: Option<&TrackingFrame>,
        wheel_delta: f32,
        now: Duration,
        dt: f32,
    ) -> FrameReport {
        if self.torn_down {
            return self.report;
        }
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_sub(origin).as_secs_f32();

        let reading = match frame {
            Some(f) => self.classifier.classify(f),
            None => GestureReading::absent(),
        };

        let heart_triggered = self.heart.update(&reading.heart, now);

        self.animation.update(&reading, elapsed);
        self.field.update(&self.animation.inputs(elapsed));

        let pinch = if reading.hand_active() {
            let t = self.classifier.thresholds();
            reading.pinch_distance.map(|d| t.pinch_amount(d))
        } else {
            None
        };
        let zoom = self.zoom.update(&ZoomInput { pinch, wheel_delta, now, elapsed });
        self.rig = zoom.rig;

        if zoom.exploded {
            self.burst.trigger(now);
        }
        let burst_changed = self.burst.update(now, dt, elapsed);

        self.layers.update(self.animation.expansion, zoom.rig.closeness, zoom.zoom_delta, elapsed);

        for kind in [PoolKind::Field, PoolKind::Core, PoolKind::Snow, PoolKind::Stars] {
            self.mark_dirty(kind);
        }
        if burst_changed {
            self.mark_dirty(PoolKind::BurstMain);
            self.mark_dirty(PoolKind::BurstDust);
        }

        self.report = FrameReport {
            frame:              self.report.frame + 1,
            elapsed,
            hands:              reading.hands,
            pose:               reading.pose,
            expansion:          self.animation.expansion,
            pulse:              self.animation.pulse,
            rotation_x:         self.animation.rotation_x,
            rotation_y:         self.animation.rotation_y,
            zoom:               zoom.rig.depth,
            fov:                zoom.rig.fov_degrees,
            closeness:          zoom.rig.closeness,
            exploded:           zoom.exploded,
            auto_zoom_finished: zoom.auto_zoom_finished,
            burst_visible:      self.burst.is_visible(),
            heart_triggered,
            heart_visible:      self.heart.is_visible(now),
            heart_position:     self.heart.position(),
        };
        self.report
    }

    /// Push this frame to `backend`.  The first call registers every pool.
    pub fn present(&mut self, backend: &mut dyn RenderBackend) {
        if !self.registered {
            for kind in self.pools() {
                backend.register_pool(kind, &self.pool_colors(kind));
            }
            self.registered = true;
            self.mark_all_dirty();
        }

        for kind in std::mem::take(&mut self.dirty) {
            let (positions, scales) = self.pool_instances(kind);
            backend.upload_instances(kind, positions, scales);
        }

        for kind in self.pools() {
            backend.set_pool_state(kind, &self.pool_state(kind));
        }
        backend.set_camera(&self.rig);
        backend.set_fog(&self.layers.fog());
    }

    /// Cancel every pending deadline and hide transient pools.  Later
    /// `step` calls return the last report unchanged.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.heart.cancel();
        self.zoom.cancel();
        self.burst.cancel();
        self.report.heart_visible = false;
        self.report.burst_visible = false;
        self.torn_down = true;
        info!("scene torn down after {} frames", self.report.frame);
    }

    // ── pools ────────────────────────────────────────────────────────────

    /// Every pool, in draw order.
    pub fn pools(&self) -> Vec<PoolKind> {
        let mut out = vec![
            PoolKind::Stars,
            PoolKind::Snow,
            PoolKind::Field,
            PoolKind::Core,
            PoolKind::Rings,
            PoolKind::Sphere,
            PoolKind::InnerCore,
            PoolKind::BurstDust,
            PoolKind::BurstMain,
        ];
        out.extend((0..self.burst.rings().len()).map(PoolKind::Shockwave));
        out.push(PoolKind::SpeedLines);
        out
    }

    fn mark_dirty(&mut self, kind: PoolKind) {
        if !self.dirty.contains(&kind) {
            self.dirty.push(kind);
        }
    }

    fn mark_all_dirty(&mut self) {
        for kind in self.pools() {
            self.mark_dirty(kind);
        }
        debug!("all {} pools marked for upload", self.dirty.len());
    }

    fn pool_colors(&self, kind: PoolKind) -> Vec<f32> {
        match kind {
            PoolKind::Field        => self.field.colors().to_vec(),
            PoolKind::Core         => self.layers.core.colors().to_vec(),
            PoolKind::Snow         => self.layers.snow.colors().to_vec(),
            PoolKind::Stars        => self.layers.stars.colors().to_vec(),
            PoolKind::Rings        => self.layers.rings.colors().to_vec(),
            PoolKind::Sphere       => self.layers.sphere.colors().to_vec(),
            PoolKind::InnerCore    => self.layers.inner_core.colors().to_vec(),
            PoolKind::BurstMain    => self.burst.main().colors().to_vec(),
            PoolKind::BurstDust    => self.burst.dust().colors().to_vec(),
            PoolKind::Shockwave(k) => hex_rgb(RING_COLORS[k % RING_COLORS.len()]).repeat(RING_SEGMENTS),
            PoolKind::SpeedLines   => self.layers.speed_lines.colors().to_vec(),
        }
    }

    fn pool_instances(&self, kind: PoolKind) -> (&[f32], &[f32]) {
        let buf = match kind {
            PoolKind::Field        => self.field.instances(),
            PoolKind::Core         => self.layers.core.instances(),
            PoolKind::Snow         => self.layers.snow.instances(),
            PoolKind::Stars        => self.layers.stars.instances(),
            PoolKind::Rings        => self.layers.rings.instances(),
            PoolKind::Sphere       => self.layers.sphere.instances(),
            PoolKind::InnerCore    => self.layers.inner_core.instances(),
            PoolKind::SpeedLines   => self.layers.speed_lines.instances(),
            PoolKind::BurstMain    => {
                let m = self.burst.main();
                return (m.positions(), m.scales());
            }
            PoolKind::BurstDust    => {
                let d = self.burst.dust();
                return (d.positions(), d.scales());
            }
            PoolKind::Shockwave(_) => return (self.ring_outline.as_slice(), self.ring_scales.as_slice()),
        };
        (buf.positions(), buf.scales())
    }

    fn pool_state(&self, kind: PoolKind) -> PoolState {
        let burst_on = self.burst.is_visible();
        match kind {
            PoolKind::Field => PoolState::rotated(Vec3::new(
                self.animation.rotation_x,
                self.animation.rotation_y,
                0.0,
            )),
            PoolKind::Core  => PoolState::rotated(self.layers.core.rotation()),
            PoolKind::Snow  => PoolState::default(),
            PoolKind::Stars => PoolState::rotated(self.layers.stars.rotation()),
            PoolKind::Rings     => self.layers.rings.state(),
            PoolKind::Sphere    => self.layers.sphere.state(),
            PoolKind::InnerCore => self.layers.inner_core.state(),
            PoolKind::BurstMain if burst_on => PoolState {
                opacity: self.burst.main_opacity(),
                ..PoolState::default()
            },
            PoolKind::BurstDust if burst_on => PoolState {
                opacity: self.burst.dust_opacity(),
                ..PoolState::default()
            },
            PoolKind::BurstMain | PoolKind::BurstDust => PoolState::hidden(),
            PoolKind::Shockwave(k) => match self.burst.rings().get(k) {
                Some(ring) if burst_on && ring.opacity > 0.0 => PoolState {
                    opacity: ring.opacity,
                    scale:   ring.scale,
                    ..PoolState::default()
                },
                _ => PoolState::hidden(),
            },
            PoolKind::SpeedLines => self.layers.speed_lines.state(),
        }
    }
}

impl Drop for CelestialScene {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
