//! Property-based tests using proptest
//!
//! These tests verify invariants hold across random inputs:
//! - Pile height and volume are inverse functions
//! - Pile height grows with volume
//! - Reclaimed volume and quality equal what was stacked
//! - No neighbouring columns exceed the repose slope

use blendsim::{
    stockpile_height, stockpile_volume, BedSimulator, BlendingSimulator, PileProfile,
    SimulatorConfig,
};
use proptest::prelude::*;

const BED_X: f64 = 30.0;
const BED_Z: f64 = 15.0;

/// A deposit: (x, z, volume, quality)
fn deposit() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..BED_X, 0.0..BED_Z, 0.0..12.0f64, 0.0..10.0f64)
}

fn deposits() -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(deposit(), 1..12)
}

fn open_top_bed(particles_per_m3: f64) -> BedSimulator {
    // Stacker high enough that the ceiling never binds.
    BedSimulator::new(&SimulatorConfig {
        particles_per_m3,
        drop_height: Some(100.0),
        ..SimulatorConfig::new(BED_X, BED_Z)
    })
    .expect("valid config")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: stockpile_height inverts stockpile_volume
    #[test]
    fn test_height_inverts_volume(height in 1e-3..200.0f64, core in 0.0..1000.0f64) {
        let volume = stockpile_volume(height, core);
        let back = stockpile_height(volume, core);
        prop_assert!(
            (back - height).abs() <= 1e-9 * height.max(1.0),
            "h={} L={} -> V={} -> h={}", height, core, volume, back
        );
    }

    /// Property: more volume never means a lower pile
    #[test]
    fn test_height_monotonic(v in 0.0..1e6f64, extra in 0.0..1e6f64, core in 0.0..500.0f64) {
        prop_assert!(stockpile_height(v + extra, core) >= stockpile_height(v, core));
    }

    /// Property: the inverse law holds for any repose angle
    #[test]
    fn test_profile_inverse_any_angle(
        angle in 15.0..75.0f64,
        height in 0.1..50.0f64,
        core in 0.0..300.0f64
    ) {
        let profile = PileProfile::from_degrees(angle);
        let back = profile.height(profile.volume(height, core), core);
        prop_assert!((back - height).abs() <= 1e-9 * height.max(1.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: reclaiming returns exactly the stacked volume and quality
    #[test]
    fn test_stack_reclaim_conserves(
        events in deposits(),
        ppm in prop_oneof![Just(1.0), Just(4.0)]
    ) {
        let mut sim = open_top_bed(ppm);
        let mut volume = 0.0;
        let mut weighted = 0.0;
        for (t, &(x, z, v, q)) in events.iter().enumerate() {
            sim.stack(t as f64, x, z, v, &[q]).unwrap();
            volume += v;
            weighted += v * q;
        }

        let slices = sim.reclaim().unwrap();
        let out_volume: f64 = slices.iter().map(|s| s.volume).sum();
        prop_assert!((out_volume - volume).abs() <= 1e-9 * volume.max(1.0));

        let out_weighted: f64 = slices
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.volume * s.parameters[0])
            .sum();
        prop_assert!(
            (out_weighted - weighted).abs() <= 1e-7 * weighted.max(1.0),
            "quality mass {} in, {} out", weighted, out_weighted
        );
    }

    /// Property: adjacent columns never differ by more than the repose slope
    #[test]
    fn test_slope_never_exceeded(events in deposits()) {
        let mut sim = open_top_bed(1.0);
        for (t, &(x, z, v, q)) in events.iter().enumerate() {
            sim.stack(t as f64, x, z, v, &[q]).unwrap();
        }
        let excess = sim.bed().max_slope_excess();
        prop_assert!(excess < 1e-9, "slope exceeded by {}", excess);
    }

    /// Property: the drop height caps the pile while the bed has room
    #[test]
    fn test_drop_height_respected(events in deposits(), drop in 1.0..4.0f64) {
        let mut sim = BedSimulator::new(&SimulatorConfig {
            drop_height: Some(drop),
            ..SimulatorConfig::new(BED_X, BED_Z)
        })
        .unwrap();
        for (t, &(x, z, v, q)) in events.iter().enumerate() {
            sim.stack(t as f64, x, z, v, &[q]).unwrap();
        }
        let peak = sim.bed().heights().iter().cloned().fold(0.0, f64::max);
        prop_assert!(peak <= drop + 1e-9, "peak {} above drop height {}", peak, drop);
    }
}
