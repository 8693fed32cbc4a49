//! Top-level application state machine.
//!
//! `AppState` owns the [`CelestialScene`] and the [`TrackingSession`] that
//! feeds it.  Each tick reads the newest tracking frame, steps the scene and
//! rebuilds the status line; `run` drives ticks from the window loop.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use celestial_field::{CelestialScene, FrameReport, RenderBackend, RuntimeSettings, SceneConfig};
use celestial_gesture::{HandTracker, TrackingSession, TrackingStatus};
use log::info;

use crate::error::Result;
use crate::tracking::{SimHandTracker, SimInput};
use crate::visualizer::{Visualizer, WindowInput, WIN_H, WIN_W};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where hand landmarks come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerKind {
    /// Keyboard and mouse drive a synthetic hand.
    Simulated,
    /// LeapMotion controller; needs the `leap` feature.
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub scene:   SceneConfig,
    pub tracker: TrackerKind,
    pub width:   usize,
    pub height:  usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            scene:   SceneConfig::default(),
            tracker: if cfg!(feature = "leap") { TrackerKind::Leap } else { TrackerKind::Simulated },
            width:   WIN_W,
            height:  WIN_H,
        }
    }
}

/// Build the tracker for `kind`.  `sim_rx` feeds the simulator.
pub fn make_tracker(kind: TrackerKind, sim_rx: Receiver<SimInput>) -> Box<dyn HandTracker> {
    match kind {
        #[cfg(feature = "leap")]
        TrackerKind::Leap => {
            drop(sim_rx);
            Box::new(crate::tracking::LeapHandTracker)
        }
        #[cfg(not(feature = "leap"))]
        TrackerKind::Leap => {
            log::warn!("built without the `leap` feature; using the keyboard simulator");
            Box::new(SimHandTracker::new(sim_rx))
        }
        TrackerKind::Simulated => Box::new(SimHandTracker::new(sim_rx)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Settings stepping
// ════════════════════════════════════════════════════════════════════════════

const SETTINGS_STEP: i32 = 10;

/// `settings` after the quality/sensitivity steps in `input`, or `None`
/// when nothing changes.
pub fn stepped_settings(settings: RuntimeSettings, input: &WindowInput) -> Option<RuntimeSettings> {
    let step = |value: u8, by: i32| (value as i32 + by * SETTINGS_STEP).clamp(0, 100) as u8;
    let next = RuntimeSettings {
        particle_quality:      step(settings.particle_quality, input.quality_step),
        detection_sensitivity: step(settings.detection_sensitivity, input.sensitivity_step),
        ..settings
    };
    if next == settings { None } else { Some(next) }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── scene ────────────────────────────────────────────────────────────
    scene:   CelestialScene,

    // ── tracking ─────────────────────────────────────────────────────────
    session: TrackingSession,

    // ── status message ────────────────────────────────────────────────────
    pub status: String,
}

impl AppState {
    pub fn new(cfg: SceneConfig, tracker: Box<dyn HandTracker>) -> Result<Self> {
        let scene = CelestialScene::new(cfg)?;
        let mut session = TrackingSession::idle();
        session.attach(tracker)?;
        Ok(AppState {
            scene,
            session,
            status: "loading hand tracking".to_string(),
        })
    }

    pub fn scene(&self) -> &CelestialScene { &self.scene }
    pub fn session(&self) -> &TrackingSession { &self.session }

    /// Apply settings without restarting the scene.
    pub fn apply_settings(&mut self, settings: RuntimeSettings) {
        self.scene.apply_settings(settings);
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, wheel: f32, now: Duration, dt: f32) -> FrameReport {
        let report = self.scene.step(self.session.latest(), wheel, now, dt);
        self.status = status_line(&report, self.session.status(), &self.scene.settings());
        report
    }

    pub fn present(&mut self, backend: &mut dyn RenderBackend) {
        self.scene.present(backend);
    }

    /// Stop tracking and release every pending scene timer.
    pub fn shutdown(&mut self) {
        self.session.stop();
        self.scene.teardown();
    }
}

/// One-line summary shown in the status bar.
pub fn status_line(report: &FrameReport, tracking: &TrackingStatus, settings: &RuntimeSettings) -> String {
    let mut line = format!(
        "tracking {}  hands {}  {:?}  expand {:.2}  zoom {:.1}  fov {:.0}  quality {}%  sens {}",
        tracking.label(),
        report.hands,
        report.pose,
        report.expansion,
        report.zoom,
        report.fov,
        settings.particle_quality,
        settings.detection_sensitivity,
    );
    if report.burst_visible {
        line.push_str("  BURST");
    }
    if report.heart_visible {
        line.push_str("  HEART");
    }
    line
}

// ════════════════════════════════════════════════════════════════════════════
// run
// ════════════════════════════════════════════════════════════════════════════

/// Open the window and run until it is closed or `Q` is pressed.
pub fn run(cfg: AppConfig) -> Result<()> {
    let (sim_tx, sim_rx) = mpsc::channel();
    let mut vis = Visualizer::new(cfg.width, cfg.height, sim_tx)?;
    let tracker = make_tracker(cfg.tracker, sim_rx);
    let mut state = AppState::new(cfg.scene, tracker)?;

    let start = Instant::now();
    let mut last = start;
    while vis.is_open() {
        let input = vis.poll_input();
        if input.quit {
            break;
        }
        if let Some(settings) = stepped_settings(state.scene().settings(), &input) {
            state.apply_settings(settings);
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        state.tick(input.wheel, now.duration_since(start), dt);
        state.present(vis.renderer_mut());
        vis.show(&state.status)?;
    }

    state.shutdown();
    info!("viewer closed after {:.1} s", start.elapsed().as_secs_f32());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::SoftwareRenderer;
    use crate::tracking::SimPose;
    use celestial_field::{AmbientConfig, BurstConfig, FieldConfig};
    use celestial_gesture::{HandPose, ScriptedTracker, TrackingError};

    fn small_scene() -> SceneConfig {
        SceneConfig {
            field:   FieldConfig { particle_count: 500, ..FieldConfig::default() },
            burst:   BurstConfig { main_count: 100, dust_count: 50, ..BurstConfig::default() },
            ambient: AmbientConfig {
                core_count:       20,
                snow_count:       20,
                star_count:       20,
                ring_count:       20,
                sphere_count:     20,
                inner_core_count: 10,
                speed_line_count: 4,
            },
            ..SceneConfig::default()
        }
    }

    fn wait_ready(state: &mut AppState) {
        for k in 0..500u64 {
            state.tick(0.0, Duration::from_millis(k), 0.016);
            if *state.session().status() == TrackingStatus::Ready {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("tracker never became ready");
    }

    #[test]
    fn settings_step_in_tens_and_clamp() {
        let base = RuntimeSettings::default();
        assert_eq!(stepped_settings(base, &WindowInput::default()), None);

        let down = WindowInput { quality_step: -1, sensitivity_step: 1, ..WindowInput::default() };
        let s = stepped_settings(base, &down).unwrap();
        assert_eq!(s.particle_quality, 90);
        assert_eq!(s.detection_sensitivity, 60);
        assert_eq!(s.gesture_smoothing, base.gesture_smoothing);

        let up = WindowInput { quality_step: 1, ..WindowInput::default() };
        assert_eq!(stepped_settings(base, &up), None);
    }

    #[test]
    fn status_line_names_tracking_and_events() {
        let scene = CelestialScene::new(small_scene()).unwrap();
        let mut report = *scene.last_report();
        report.burst_visible = true;
        let line = status_line(&report, &TrackingStatus::Failed("x".into()), &RuntimeSettings::default());
        assert!(line.starts_with("tracking failed"));
        assert!(line.contains("quality 100%"));
        assert!(line.contains("BURST"));
        assert!(!line.contains("HEART"));
    }

    #[test]
    fn simulated_fist_reaches_the_scene() {
        let (tx, rx) = mpsc::channel();
        let mut state = AppState::new(small_scene(), make_tracker(TrackerKind::Simulated, rx)).unwrap();
        wait_ready(&mut state);

        tx.send(SimInput::Pose(SimPose::Fist)).unwrap();
        let mut pose = HandPose::Absent;
        for k in 0..500u64 {
            pose = state.tick(0.0, Duration::from_millis(500 + k * 16), 0.016).pose;
            if pose == HandPose::Fist {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(pose, HandPose::Fist);
        assert!(state.status.contains("hands 1"));

        let mut renderer = SoftwareRenderer::new(64, 48);
        state.present(&mut renderer);
        renderer.render();
        assert_eq!(renderer.pool_count(), state.scene().pools().len());
        state.shutdown();
        assert!(state.scene().is_torn_down());
    }

    #[test]
    fn failed_tracker_keeps_the_scene_running() {
        let tracker = ScriptedTracker::new().fail(TrackingError::Unavailable("no device".into()));
        let mut state = AppState::new(small_scene(), Box::new(tracker)).unwrap();
        let mut failed = false;
        for k in 0..500u64 {
            state.tick(0.0, Duration::from_millis(k * 16), 0.016);
            if matches!(state.session().status(), TrackingStatus::Failed(_)) {
                failed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(failed);
        assert!(state.status.starts_with("tracking failed"));
        let before = state.scene().last_report().rotation_y;
        let after = state.tick(0.0, Duration::from_secs(20), 0.016).rotation_y;
        assert!(after > before);
    }
}
