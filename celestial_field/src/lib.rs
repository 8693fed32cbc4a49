//! # celestial_field
//!
//! The animated half of the celestial scene: a pool of particles that morphs
//! between a heart and a three-armed spiral galaxy, an explosion burst, a
//! pinch/wheel driven camera rig, and the ambient layers around them.
//!
//! ## Frame pipeline
//!
//! | Stage | Type | Output |
//! |---|---|---|
//! | gesture smoothing | [`AnimationState`] | expansion, pulse, rotation, hand attractor |
//! | particle transforms | [`ParticleField`] | flat position/scale instance buffer |
//! | camera | [`ZoomController`] | [`CameraRig`], explosion edge |
//! | burst | [`ExplosionBurst`] | main + dust pools, shockwave rings |
//! | composition | [`SceneLayers`] | core, snow, stars, inner core, fog, speed lines |
//!
//! [`CelestialScene`] runs the whole pipeline once per display refresh and
//! hands the result to any [`RenderBackend`].
//!
//! ## Determinism
//!
//! Every random draw comes from a `StdRng` seeded with
//! [`SceneConfig::seed`]; per-particle transforms are pure functions of the
//! particle's identity and the frame inputs.

pub mod ambient;
pub mod animation;
pub mod burst;
pub mod camera;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod render;
pub mod scene;
pub mod shapes;

pub use animation::AnimationState;
pub use burst::{BurstLayerKind, ExplosionBurst, Ring};
pub use camera::{CameraRig, ExplosionLatch, WheelZoom, ZoomController, ZoomInput, ZoomUpdate};
pub use config::{
    AmbientConfig, BurstConfig, FieldConfig, MorphConfig, RuntimeSettings, SceneConfig,
    ZoomConfig, EXAMPLE_CONFIG, MAX_RATE_SCALE, MAX_TIMER_SECS,
};
pub use driver::{CelestialScene, FrameReport};
pub use error::{FieldError, Result};
pub use field::{FieldInputs, InstanceBuffer, ParticleField, ParticleTransform};
pub use render::{FogParams, NullBackend, PoolKind, PoolState, RecordingBackend, RenderBackend};
pub use scene::SceneLayers;
