//! End-to-end runs of the scene driver with synthetic tracking input.

use std::time::Duration;

use celestial_field::{
    CelestialScene, FieldConfig, FrameReport, PoolKind, RecordingBackend, SceneConfig,
};
use celestial_field::config::{AmbientConfig, BurstConfig};
use celestial_gesture::{
    synthetic, HandPose, ScriptedTracker, TrackingError, TrackingFrame, TrackingSession,
    TrackingStatus,
};

const FRAME_MS: u64 = 16;
const DT: f32 = FRAME_MS as f32 / 1000.0;

fn small_config() -> SceneConfig {
    SceneConfig {
        field:   FieldConfig { particle_count: 2_000, ..FieldConfig::default() },
        burst:   BurstConfig { main_count: 400, dust_count: 200, ..BurstConfig::default() },
        ambient: AmbientConfig {
            core_count:       100,
            snow_count:       100,
            star_count:       100,
            ring_count:       60,
            sphere_count:     40,
            inner_core_count: 20,
            speed_line_count: 10,
        },
        ..SceneConfig::default()
    }
}

fn at(frame: u64) -> Duration {
    Duration::from_millis(frame * FRAME_MS)
}

fn fist() -> TrackingFrame {
    TrackingFrame::new(vec![synthetic::fist_hand((0.5, 0.5))], Duration::ZERO)
}

/// Step `frames` frames starting at frame index `start`.
fn run(
    scene: &mut CelestialScene,
    start: u64,
    frames: u64,
    input: Option<&TrackingFrame>,
) -> Vec<FrameReport> {
    (start..start + frames).map(|k| scene.step(input, 0.0, at(k), DT)).collect()
}

#[test]
fn idle_scene_drifts_to_galaxy_and_rotates() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let collapsed = run(&mut scene, 0, 120, Some(&fist()));
    assert!(collapsed.last().unwrap().expansion < 0.01);

    // 5 simulated seconds with nothing in view
    let idle = run(&mut scene, 120, 313, None);
    for pair in idle.windows(2) {
        assert!(pair[1].expansion >= pair[0].expansion);
        assert!(pair[1].rotation_y > pair[0].rotation_y);
        assert_eq!(pair[1].pose, HandPose::Absent);
    }
    assert!(idle.last().unwrap().expansion > 0.98);
}

#[test]
fn fist_brings_heart_back_within_bounded_frames() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    run(&mut scene, 0, 300, None);
    assert!(scene.last_report().expansion > 0.999);

    let reports = run(&mut scene, 300, 60, Some(&fist()));
    assert!(reports[0].pulse > 0.9, "snap to fist should detonate");
    let reached = reports.iter().position(|r| r.expansion < 0.1);
    assert!(matches!(reached, Some(n) if n < 40), "reached heart at {:?}", reached);
}

#[test]
fn wheel_dive_explodes_once_then_zooms_out() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let mut backend = RecordingBackend::new();

    let mut exploded_at = Vec::new();
    let mut finished_at = None;
    let mut burst_seen = false;

    for k in 0..600u64 {
        let wheel = if k == 0 { -4_000.0 } else { 0.0 };
        let r = scene.step(None, wheel, at(k), DT);
        scene.present(&mut backend);
        if r.exploded {
            exploded_at.push(k);
            assert!(r.burst_visible);
        }
        if r.burst_visible && backend.is_visible(PoolKind::BurstMain) {
            burst_seen = true;
        }
        if r.auto_zoom_finished {
            finished_at = Some(k);
            assert_eq!(r.zoom, 20.0);
        }
    }

    assert_eq!(exploded_at.len(), 1, "latch fired at {:?}", exploded_at);
    assert!(burst_seen);
    let fired = exploded_at[0];
    let done = finished_at.expect("auto zoom-out never finished");
    // 1.5 s delay + 3 s animation
    let elapsed_ms = (done - fired) * FRAME_MS;
    assert!((4_400..=4_700).contains(&elapsed_ms), "took {} ms", elapsed_ms);
    assert!(scene.zoom().latch().is_armed());
}

#[test]
fn burst_hides_after_its_lifetime() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let mut fired = None;
    for k in 0..200u64 {
        let wheel = if k == 0 { -4_000.0 } else { 0.0 };
        if scene.step(None, wheel, at(k), DT).exploded {
            fired = Some(k);
            break;
        }
    }
    let fired = fired.expect("no explosion");
    let ten_s = 10_000 / FRAME_MS;
    let before = run(&mut scene, fired + 1, ten_s - 2, None);
    assert!(before.iter().all(|r| r.burst_visible));
    let after = run(&mut scene, fired + ten_s, 10, None);
    assert!(after.iter().all(|r| !r.burst_visible));
}

#[test]
fn inner_core_revealed_when_close() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let mut backend = RecordingBackend::new();
    // A tight pinch parks the camera near depth 7, above the explosion threshold.
    let pinch = TrackingFrame::new(vec![synthetic::pinch_hand((0.5, 0.5), 0.03)], Duration::ZERO);
    for k in 0..200 {
        scene.step(Some(&pinch), 0.0, at(k), DT);
    }
    scene.present(&mut backend);
    let r = scene.last_report();
    assert!(r.closeness > 0.6, "closeness {}", r.closeness);
    assert!(backend.is_visible(PoolKind::Rings));
    assert!(r.fov > 45.0);
    let fog = backend.fog.unwrap();
    assert!(fog.near < 20.0);
}

#[test]
fn teardown_releases_pending_work() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let (l, r) = synthetic::heart_pair((0.5, 0.5));
    let heart = TrackingFrame::new(vec![l, r], Duration::ZERO);
    scene.step(Some(&heart), -4_000.0, at(0), DT);
    for k in 1..60 {
        scene.step(None, 0.0, at(k), DT);
    }
    assert!(scene.last_report().burst_visible);
    assert!(scene.zoom().is_auto_zooming());

    scene.teardown();
    scene.teardown();
    assert!(!scene.zoom().is_auto_zooming());
    assert!(!scene.burst().is_visible());
    let frozen = scene.step(None, 0.0, at(60), DT);
    assert!(!frozen.burst_visible && !frozen.heart_visible);
    assert_eq!(frozen.frame, 60);
}

#[test]
fn session_feeds_scene_latest_frame_only() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let (sink, mut session) = TrackingSession::pair();
    assert!(sink.ready());
    sink.frame(TrackingFrame::new(vec![synthetic::open_hand((0.5, 0.5))], at(0)));
    sink.frame(fist());

    let r = scene.step(session.latest(), 0.0, at(0), DT);
    assert_eq!(r.pose, HandPose::Fist);
    assert_eq!(session.frames_dropped(), 1);
    assert_eq!(*session.status(), TrackingStatus::Ready);

    // Nothing new: the previous snapshot stays in place.
    let r = scene.step(session.latest(), 0.0, at(1), DT);
    assert_eq!(r.pose, HandPose::Fist);
}

#[test]
fn tracker_dying_mid_gesture_releases_the_hand() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let (sink, mut session) = TrackingSession::pair();
    assert!(sink.ready());
    assert!(sink.frame(fist()));
    assert_eq!(scene.step(session.latest(), 0.0, at(0), DT).pose, HandPose::Fist);

    sink.failed(TrackingError::Unavailable("camera unplugged".into()));
    drop(sink);
    let r = scene.step(session.latest(), 0.0, at(1), DT);
    assert_eq!(r.pose, HandPose::Absent);
    assert_eq!(r.hands, 0);

    // Idle drift pulls the collapsed field back toward the galaxy.
    let collapsed = r.expansion;
    let mut last = r;
    for k in 2..60 {
        last = scene.step(session.latest(), 0.0, at(k), DT);
    }
    assert!(last.expansion > collapsed);
}

#[test]
fn failed_tracker_leaves_scene_idling() {
    let mut scene = CelestialScene::new(small_config()).unwrap();
    let tracker = ScriptedTracker::new().fail(TrackingError::PermissionDenied("camera".into()));
    let mut session = TrackingSession::start(tracker).unwrap();

    let mut failed = false;
    for k in 0..500 {
        let r = scene.step(session.latest(), 0.0, at(k), DT);
        assert_eq!(r.pose, HandPose::Absent);
        if matches!(session.status(), TrackingStatus::Failed(_)) {
            failed = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(failed);
    let before = scene.last_report().rotation_y;
    let r = scene.step(session.latest(), 0.0, at(600), DT);
    assert!(r.rotation_y > before);
    session.stop();
}
