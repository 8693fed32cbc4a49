//! Property checks for the particle transforms and the explosion latch.

use celestial_field::camera::{closeness, pinch_depth, ExplosionLatch};
use celestial_field::{FieldConfig, FieldInputs, ParticleField, ZoomConfig};
use glam::Vec3;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const POOL: usize = 64;

fn field(seed: u64) -> ParticleField {
    let cfg = FieldConfig { particle_count: POOL, ..FieldConfig::default() };
    ParticleField::generate(&cfg, &mut StdRng::seed_from_u64(seed))
}

fn inputs() -> impl Strategy<Value = FieldInputs> {
    (
        0.0f32..=1.0,
        0.0f32..=1.0,
        proptest::option::of((-30.0f32..30.0, -30.0f32..30.0, -15.0f32..15.0)),
        0.0f32..600.0,
    )
        .prop_map(|(expansion, pulse, hand, elapsed)| FieldInputs {
            expansion,
            pulse,
            hand_target: hand.map(|(x, y, z)| Vec3::new(x, y, z)),
            elapsed,
        })
}

proptest! {
    #[test]
    fn transform_is_a_pure_function(seed in 0u64..1_000, input in inputs(), i in 0..POOL) {
        let f = field(seed);
        let a = f.transform_of(i, &input);
        let b = f.transform_of(i, &input);
        prop_assert_eq!(a, b);

        // Same seed, separately built pool, same answer.
        let g = field(seed);
        prop_assert_eq!(a, g.transform_of(i, &input));
    }

    #[test]
    fn update_writes_what_transform_of_returns(input in inputs(), other in inputs()) {
        let mut f = field(3);
        f.update(&other);
        f.update(&input);
        for i in 0..POOL {
            let t = f.transform_of(i, &input);
            prop_assert_eq!(f.instances().position(i), t.position);
            prop_assert_eq!(f.instances().scale(i), t.scale);
        }
    }

    #[test]
    fn morph_has_no_jumps(e in 0.0f32..0.99, i in 0..POOL) {
        let f = field(7);
        let step = 0.01;
        let a = f.transform_of(i, &FieldInputs { expansion: e, ..FieldInputs::default() });
        let b = f.transform_of(i, &FieldInputs { expansion: e + step, ..FieldInputs::default() });
        let span = f.heart_target(i).distance(f.galaxy_target(i));
        prop_assert!(a.position.distance(b.position) <= span * step + 1e-4);
    }

    #[test]
    fn scales_stay_positive_and_bounded(input in inputs(), i in 0..POOL) {
        let t = field(11).transform_of(i, &input);
        // magnitude ≤ 2, twinkle ≤ 1, pulse ≤ ×4, heartbeat ≤ ×1.05
        prop_assert!(t.scale >= 0.0);
        prop_assert!(t.scale <= 2.0 * 4.0 * 1.05 + 1e-4);
    }

    #[test]
    fn pinch_depth_never_leaves_range(amount in -5.0f32..5.0) {
        let cfg = ZoomConfig::default();
        let z = pinch_depth(amount, &cfg);
        prop_assert!(z >= cfg.min_camera_z && z <= cfg.max_camera_z);
        let c = closeness(z, &cfg);
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn latch_fires_once_per_dive(path in proptest::collection::vec(2.0f32..9.0, 1..200)) {
        // Never leaves the hysteresis band after the first dive: at most one fire.
        let mut latch = ExplosionLatch::new(4.0, 5.0);
        let fires = path.iter().filter(|&&z| latch.update(z)).count();
        prop_assert!(fires <= 1);
        let dipped = path.iter().any(|&z| z <= 4.0);
        prop_assert_eq!(fires == 1, dipped);
    }
}
