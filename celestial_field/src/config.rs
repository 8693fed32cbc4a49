//! Scene configuration.
//!
//! Every tuning constant of the scene lives here as a named field with its
//! default, so a YAML file can override any subset:
//!
//! ```yaml
//! seed: 7
//! zoom:
//!   min_camera_z: 3.0
//! settings:
//!   particle_quality: 60
//! ```

use std::path::Path;
use std::time::Duration;

use celestial_gesture::GestureThresholds;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Main heart/galaxy field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub particle_count:   usize,
    pub heart_scale:      f32,
    pub heart_y_offset:   f32,
    pub galaxy_radius:    f32,
    pub galaxy_spin:      f32,
    pub galaxy_arms:      u32,
    pub galaxy_thickness: f32,
    /// Base attraction toward the hand target.
    pub pull_strength:    f32,
    /// How much a particle's lag weakens the pull.
    pub pull_lag_falloff: f32,
    pub explosion_force:  f32,
    /// Hand-target mapping from centred image coordinates to world units.
    pub hand_span:        [f32; 3],
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            particle_count:   18_000,
            heart_scale:      0.42,
            heart_y_offset:   1.5,
            galaxy_radius:    26.0,
            galaxy_spin:      0.7,
            galaxy_arms:      3,
            galaxy_thickness: 6.0,
            pull_strength:    0.12,
            pull_lag_falloff: 0.4,
            explosion_force:  12.0,
            hand_span:        [-28.0, -20.0, -12.0],
        }
    }
}

/// Expansion / pulse / rotation smoothing.  Rates are per-frame lerp factors
/// at the reference gesture smoothing of 0.1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    pub fist_rate:       f32,
    pub open_rate:       f32,
    pub idle_rate:       f32,
    pub pulse_decay:     f32,
    /// A fist arms the pulse only while expansion is above this.
    pub pulse_arm_above: f32,
    pub auto_rotate:     f32,
    pub follow_y_rate:   f32,
    pub follow_x_rate:   f32,
    pub idle_tilt_rate:  f32,
    pub roll_gain:       f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        MorphConfig {
            fist_rate:       0.08,
            open_rate:       0.05,
            idle_rate:       0.015,
            pulse_decay:     0.05,
            pulse_arm_above: 0.4,
            auto_rotate:     0.004,
            follow_y_rate:   0.12,
            follow_x_rate:   0.1,
            idle_tilt_rate:  0.03,
            roll_gain:       2.5,
        }
    }
}

/// Camera depth, field of view, shake, tilt, explosion latch, auto zoom-out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_camera_z:        f32,
    pub max_camera_z:        f32,
    pub default_camera_z:    f32,
    pub zoom_smoothing:      f32,
    pub wheel_speed:         f32,
    pub wheel_hold_secs:     f32,
    pub default_decay:       f32,
    pub fov_far:             f32,
    pub fov_near:            f32,
    pub fov_ramp_start:      f32,
    pub fov_smoothing:       f32,
    pub shake_threshold:     f32,
    pub shake_gain:          f32,
    pub shake_max:           f32,
    pub shake_decay:         f32,
    pub tilt_threshold:      f32,
    pub explosion_threshold: f32,
    pub rearm_margin:        f32,
    pub auto_zoom_delay_secs:    f32,
    pub auto_zoom_duration_secs: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig {
            min_camera_z:        2.0,
            max_camera_z:        35.0,
            default_camera_z:    20.0,
            zoom_smoothing:      0.08,
            wheel_speed:         0.005,
            wheel_hold_secs:     3.0,
            default_decay:       0.05,
            fov_far:             45.0,
            fov_near:            75.0,
            fov_ramp_start:      0.5,
            fov_smoothing:       0.1,
            shake_threshold:     0.15,
            shake_gain:          2.0,
            shake_max:           0.4,
            shake_decay:         0.85,
            tilt_threshold:      0.65,
            explosion_threshold: 4.0,
            rearm_margin:        5.0,
            auto_zoom_delay_secs:    1.5,
            auto_zoom_duration_secs: 3.0,
        }
    }
}

/// Explosion burst pools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub main_count:    usize,
    pub dust_count:    usize,
    pub lifetime_secs: f32,
    pub ring_count:    usize,
}

impl Default for BurstConfig {
    fn default() -> Self {
        BurstConfig {
            main_count:    8_000,
            dust_count:    4_000,
            lifetime_secs: 10.0,
            ring_count:    3,
        }
    }
}

/// Pool sizes of the ambient layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub core_count:        usize,
    pub snow_count:        usize,
    pub star_count:        usize,
    pub ring_count:        usize,
    pub sphere_count:      usize,
    pub inner_core_count:  usize,
    pub speed_line_count:  usize,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        AmbientConfig {
            core_count:       3_000,
            snow_count:       1_200,
            star_count:       3_000,
            ring_count:       600,
            sphere_count:     400,
            inner_core_count: 200,
            speed_line_count: 100,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RuntimeSettings
// ════════════════════════════════════════════════════════════════════════════

/// The reference smoothing value every morph rate is tuned against.
pub const REFERENCE_SMOOTHING: f32 = 0.1;

/// Rate multiplier at `gesture_smoothing = 1.0`.
pub const MAX_RATE_SCALE: f32 = 1.0 / REFERENCE_SMOOTHING;

/// User-adjustable settings, applied to a live scene without restart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Share of each pool that is animated and drawn, 0–100.
    pub particle_quality:      u8,
    /// Fist/open detection sensitivity, 0–100 (50 = thresholds as configured).
    pub detection_sensitivity: u8,
    /// Gesture smoothing factor in (0, 1].
    pub gesture_smoothing:     f32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            particle_quality:      100,
            detection_sensitivity: 50,
            gesture_smoothing:     REFERENCE_SMOOTHING,
        }
    }
}

impl RuntimeSettings {
    /// Copy with every field forced into range.
    pub fn clamped(self) -> Self {
        let smoothing = if self.gesture_smoothing.is_finite() {
            self.gesture_smoothing.clamp(0.01, 1.0)
        } else {
            REFERENCE_SMOOTHING
        };
        RuntimeSettings {
            particle_quality:      self.particle_quality.min(100),
            detection_sensitivity: self.detection_sensitivity.min(100),
            gesture_smoothing:     smoothing,
        }
    }

    /// Multiplier for every morph rate: 1 at the reference smoothing,
    /// rising linearly to `MAX_RATE_SCALE` at 1.0.
    pub fn rate_scale(&self) -> f32 {
        (self.gesture_smoothing / REFERENCE_SMOOTHING).clamp(0.0, MAX_RATE_SCALE)
    }

    /// Number of active instances in a pool of `capacity`.
    pub fn active_count(&self, capacity: usize) -> usize {
        let q = self.particle_quality.min(100) as f32 / 100.0;
        ((capacity as f32 * q).round() as usize).min(capacity)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SceneConfig
// ════════════════════════════════════════════════════════════════════════════

/// Root of the scene configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for every random draw in the scene.
    pub seed:     u64,
    pub field:    FieldConfig,
    pub morph:    MorphConfig,
    pub zoom:     ZoomConfig,
    pub burst:    BurstConfig,
    pub ambient:  AmbientConfig,
    pub settings: RuntimeSettings,
    pub gestures: GestureThresholds,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            seed:     0x00C0_FFEE,
            field:    FieldConfig::default(),
            morph:    MorphConfig::default(),
            zoom:     ZoomConfig::default(),
            burst:    BurstConfig::default(),
            ambient:  AmbientConfig::default(),
            settings: RuntimeSettings::default(),
            gestures: GestureThresholds::default(),
        }
    }
}

/// A commented starting point for user configuration files.
pub const EXAMPLE_CONFIG: &str = r#"# Celestial scene configuration. Every key is optional.
seed: 12648430

settings:
  particle_quality: 100       # 0-100, share of each pool drawn
  detection_sensitivity: 50   # 0-100, 50 keeps the ratio thresholds below
  gesture_smoothing: 0.1      # (0, 1], 0.1 is the tuned reference

gestures:
  fist_ratio: 1.35
  open_ratio: 1.75
  pinch_min_distance: 0.02
  pinch_max_distance: 0.15

field:
  particle_count: 18000
  heart_scale: 0.42
  galaxy_radius: 26.0
  galaxy_arms: 3

zoom:
  min_camera_z: 2.0
  max_camera_z: 35.0
  default_camera_z: 20.0
  explosion_threshold: 4.0
  rearm_margin: 5.0

burst:
  main_count: 8000
  dust_count: 4000
  lifetime_secs: 10.0
"#;

fn check(ok: bool, msg: &str) -> Result<()> {
    if ok { Ok(()) } else { Err(FieldError::Config(msg.to_string())) }
}

fn is_rate(v: f32) -> bool {
    v > 0.0 && v <= 1.0
}

/// Longest timer a config may ask for, in seconds.
pub const MAX_TIMER_SECS: f32 = 86_400.0;

fn is_secs(v: f32) -> bool {
    (0.0..=MAX_TIMER_SECS).contains(&v)
}

/// Config seconds as a `Duration`, clamped to `[0, MAX_TIMER_SECS]`.
/// NaN reads as zero.
pub(crate) fn timer_duration(secs: f32) -> Duration {
    let secs = if secs.is_nan() { 0.0 } else { secs.clamp(0.0, MAX_TIMER_SECS) };
    Duration::from_secs_f32(secs)
}

impl SceneConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let cfg = Self::from_yaml(&content)?;
        info!("loaded scene configuration from {}", path.display());
        Ok(cfg)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: SceneConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save configuration to a YAML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gestures;
        check(g.fist_ratio > 0.0, "fist_ratio must be positive")?;
        check(g.fist_ratio < g.open_ratio, "fist_ratio must be below open_ratio")?;
        check(
            g.pinch_min_distance >= 0.0 && g.pinch_min_distance < g.pinch_max_distance,
            "pinch_min_distance must be below pinch_max_distance",
        )?;
        check(g.heart_pinch_min < g.heart_pinch_max, "heart pinch window is empty")?;

        let z = &self.zoom;
        check(
            z.min_camera_z < z.default_camera_z && z.default_camera_z < z.max_camera_z,
            "camera depths must satisfy min < default < max",
        )?;
        check(
            z.explosion_threshold >= z.min_camera_z && z.explosion_threshold < z.max_camera_z,
            "explosion_threshold must lie inside the zoom range",
        )?;
        check(z.rearm_margin > 0.0, "rearm_margin must be positive")?;
        check(
            is_rate(z.zoom_smoothing) && is_rate(z.fov_smoothing) && is_rate(z.default_decay),
            "zoom smoothing rates must be in (0, 1]",
        )?;
        check(z.shake_decay >= 0.0 && z.shake_decay < 1.0, "shake_decay must be in [0, 1)")?;
        check((0.0..1.0).contains(&z.fov_ramp_start), "fov_ramp_start must be in [0, 1)")?;
        check(z.fov_far > 0.0 && z.fov_near < 180.0, "field of view must be in (0, 180)")?;
        check(is_secs(z.wheel_hold_secs), "wheel_hold_secs must be finite and not negative")?;
        check(
            is_secs(z.auto_zoom_delay_secs)
                && is_secs(z.auto_zoom_duration_secs)
                && z.auto_zoom_duration_secs > 0.0,
            "auto zoom timing must be finite and positive",
        )?;

        let m = &self.morph;
        for (name, rate) in [
            ("fist_rate", m.fist_rate),
            ("open_rate", m.open_rate),
            ("idle_rate", m.idle_rate),
            ("pulse_decay", m.pulse_decay),
            ("follow_y_rate", m.follow_y_rate),
            ("follow_x_rate", m.follow_x_rate),
            ("idle_tilt_rate", m.idle_tilt_rate),
        ] {
            if !is_rate(rate) {
                return Err(FieldError::Config(format!("{} must be in (0, 1]", name)));
            }
        }

        let f = &self.field;
        check(f.galaxy_arms > 0, "galaxy_arms must be at least 1")?;
        check(f.galaxy_radius > 0.0, "galaxy_radius must be positive")?;
        check(
            is_secs(self.burst.lifetime_secs) && self.burst.lifetime_secs > 0.0,
            "burst lifetime must be finite and positive",
        )?;

        let s = &self.settings;
        check(s.particle_quality <= 100, "particle_quality must be 0-100")?;
        check(s.detection_sensitivity <= 100, "detection_sensitivity must be 0-100")?;
        check(
            s.gesture_smoothing > 0.0 && s.gesture_smoothing <= 1.0,
            "gesture_smoothing must be in (0, 1]",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SceneConfig::default().validate().unwrap();
    }

    #[test]
    fn example_config_parses() {
        let cfg = SceneConfig::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.seed, 12_648_430);
        assert_eq!(cfg.field.particle_count, 18_000);
        assert_eq!(cfg.morph, MorphConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = SceneConfig::from_yaml("zoom:\n  min_camera_z: 3.0\n").unwrap();
        assert_eq!(cfg.zoom.min_camera_z, 3.0);
        assert_eq!(cfg.zoom.max_camera_z, 35.0);
        assert_eq!(cfg.field, FieldConfig::default());
    }

    #[test]
    fn yaml_round_trip() {
        let mut cfg = SceneConfig::default();
        cfg.seed = 99;
        cfg.settings.particle_quality = 40;
        let back = SceneConfig::from_yaml(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("celestial_cfg_{}.yaml", std::process::id()));
        let cfg = SceneConfig::default();
        cfg.to_file(&path).unwrap();
        let back = SceneConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, cfg);
    }

    #[test]
    fn inverted_ratios_rejected() {
        let mut cfg = SceneConfig::default();
        cfg.gestures.fist_ratio = 2.0;
        assert!(matches!(cfg.validate(), Err(FieldError::Config(_))));
    }

    #[test]
    fn default_depth_outside_range_rejected() {
        let mut cfg = SceneConfig::default();
        cfg.zoom.default_camera_z = 40.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_rate_rejected() {
        let mut cfg = SceneConfig::default();
        cfg.morph.open_rate = 0.0;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("open_rate"));
    }

    #[test]
    fn bad_yaml_is_yaml_error() {
        assert!(matches!(SceneConfig::from_yaml("seed: [1, 2"), Err(FieldError::Yaml(_))));
    }

    #[test]
    fn quality_scales_active_count() {
        let mut s = RuntimeSettings::default();
        assert_eq!(s.active_count(18_000), 18_000);
        s.particle_quality = 50;
        assert_eq!(s.active_count(18_000), 9_000);
        s.particle_quality = 0;
        assert_eq!(s.active_count(18_000), 0);
        s.particle_quality = 33;
        assert_eq!(s.active_count(1_000), 330);
    }

    #[test]
    fn rate_scale_follows_the_whole_smoothing_range() {
        let mut s = RuntimeSettings::default();
        assert!((s.rate_scale() - 1.0).abs() < 1e-6);
        s.gesture_smoothing = 0.05;
        assert!((s.rate_scale() - 0.5).abs() < 1e-6);

        let mut last = 0.0;
        for k in 1..=10 {
            s.gesture_smoothing = k as f32 / 10.0;
            assert!(s.rate_scale() > last, "flat at smoothing {}", s.gesture_smoothing);
            last = s.rate_scale();
        }
        assert!((last - MAX_RATE_SCALE).abs() < 1e-4);
    }

    #[test]
    fn infinite_timers_rejected() {
        for yaml in [
            "zoom:\n  wheel_hold_secs: .inf\n",
            "zoom:\n  auto_zoom_delay_secs: .inf\n",
            "zoom:\n  auto_zoom_duration_secs: .inf\n",
            "burst:\n  lifetime_secs: .inf\n",
            "burst:\n  lifetime_secs: .nan\n",
        ] {
            let cfg = SceneConfig::from_yaml(yaml).unwrap();
            assert!(matches!(cfg.validate(), Err(FieldError::Config(_))), "{}", yaml);
        }
    }

    #[test]
    fn timer_duration_saturates() {
        assert_eq!(timer_duration(1.5), Duration::from_millis(1500));
        assert_eq!(timer_duration(-2.0), Duration::ZERO);
        assert_eq!(timer_duration(f32::NAN), Duration::ZERO);
        assert_eq!(timer_duration(f32::INFINITY), Duration::from_secs_f32(MAX_TIMER_SECS));
    }

    #[test]
    fn clamped_settings_are_valid() {
        let s = RuntimeSettings {
            particle_quality: 250,
            detection_sensitivity: 180,
            gesture_smoothing: f32::NAN,
        }
        .clamped();
        assert_eq!(s.particle_quality, 100);
        assert_eq!(s.detection_sensitivity, 100);
        assert_eq!(s.gesture_smoothing, REFERENCE_SMOOTHING);
    }
}
