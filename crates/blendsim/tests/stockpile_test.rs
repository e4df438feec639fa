//! End-to-end stacking and reclaiming tests.
//!
//! Checks volume conservation, pile footprint against the idealized
//! geometry, merge invariance of identical deposits, and the batch
//! material-stream conversion.

use blendsim::{
    heightmap_volume, homogenization_effect, stockpile_height, BedSimulator, BlendingSimulator,
    DepositionPath, MaterialDeposition, MaterialSeries, PileProfile, ReclaimedSlice, SimError,
    SimulatorConfig,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn simulator(config: SimulatorConfig) -> BedSimulator {
    BedSimulator::new(&config).expect("valid config")
}

fn total_volume(slices: &[ReclaimedSlice]) -> f64 {
    slices.iter().map(|s| s.volume).sum()
}

/// Length along the sweep covered by non-empty slices.
fn occupied_extent(slices: &[ReclaimedSlice], step: f64) -> f64 {
    let first = slices.iter().position(|s| !s.is_empty());
    let last = slices.iter().rposition(|s| !s.is_empty());
    match (first, last) {
        (Some(a), Some(b)) => slices[b].x_position - (slices[a].x_position - step),
        _ => 0.0,
    }
}

#[test]
fn test_single_drop_conserves_volume_and_footprint() {
    init_logging();
    let mut sim = simulator(SimulatorConfig::new(40.0, 20.0));
    sim.stack(0.0, 20.0, 10.0, 100.0, &[1.0]).unwrap();

    let heights = sim.get_heights();
    let on_bed: f64 = heights.iter().flatten().sum::<f64>() * sim.bed().layout.cell_area();
    println!("peak {:.3}", heights.iter().flatten().cloned().fold(0.0, f64::max));
    assert!((on_bed - 100.0).abs() < 1e-9, "bed holds {}", on_bed);

    let slices = sim.reclaim().unwrap();
    assert!((total_volume(&slices) - 100.0).abs() < 1e-9);

    let profile = PileProfile::default();
    let ideal = profile.footprint_length(profile.height(100.0, 0.0), 0.0);
    let extent = occupied_extent(&slices, sim.geometry().reclaim_increment);
    println!("reclaimed extent {:.2} m, ideal cone {:.2} m", extent, ideal);
    assert!(extent > 0.0);
    assert!(
        extent <= 1.25 * ideal + 2.0 * sim.geometry().reclaim_increment,
        "pile spread over {} m",
        extent
    );
    assert!(sim.bed().max_slope_excess() < 1e-9);
}

#[test]
fn test_reclaim_empty_bed() {
    let mut sim = simulator(SimulatorConfig::new(12.0, 6.0));
    let slices = sim.reclaim().unwrap();
    assert_eq!(slices.len(), 12);
    assert_eq!(total_volume(&slices), 0.0);
    assert_eq!(slices.last().map(|s| s.x_position), Some(12.0));
}

#[test]
fn test_identical_deposits_merge() {
    let config = SimulatorConfig::new(30.0, 16.0);

    let mut split = simulator(config.clone());
    split.stack(0.0, 15.0, 8.0, 30.0, &[2.5, 7.0]).unwrap();
    split.stack(1.0, 15.0, 8.0, 20.0, &[2.5, 7.0]).unwrap();

    let mut merged = simulator(config);
    merged.stack(0.0, 15.0, 8.0, 50.0, &[2.5, 7.0]).unwrap();

    let a = split.reclaim().unwrap();
    let b = merged.reclaim().unwrap();
    assert_eq!(a.len(), b.len());
    for (sa, sb) in a.iter().zip(&b) {
        assert!((sa.volume - sb.volume).abs() < 1e-9);
        for (pa, pb) in sa.parameters.iter().zip(&sb.parameters) {
            assert!((pa - pb).abs() < 1e-9);
        }
    }
}

#[test]
fn test_uneven_split_merges_within_a_particle_per_cell() {
    let config = SimulatorConfig::new(30.0, 16.0);
    let quality = [2.5, 7.0];

    let mut merged = simulator(config.clone());
    merged.stack(0.0, 15.0, 8.0, 50.0, &quality).unwrap();
    let b = merged.reclaim().unwrap();

    // Each slice is one column of cells across the bed depth.
    let cells_per_slice = merged.bed().depth() as f64;
    let bound = merged.geometry().particle_volume() * cells_per_slice;

    for (v1, v2) in [(30.3, 19.7), (12.25, 37.75), (0.4, 49.6)] {
        let mut split = simulator(config.clone());
        split.stack(0.0, 15.0, 8.0, v1, &quality).unwrap();
        split.stack(1.0, 15.0, 8.0, v2, &quality).unwrap();
        let a = split.reclaim().unwrap();

        assert_eq!(a.len(), b.len());
        assert!((total_volume(&a) - total_volume(&b)).abs() < 1e-9);

        let worst = a
            .iter()
            .zip(&b)
            .map(|(sa, sb)| (sa.volume - sb.volume).abs())
            .fold(0.0, f64::max);
        println!("split {} + {}: worst slice difference {:.3} m³", v1, v2, worst);
        assert!(worst <= bound, "slice differs by {} m³, bound {}", worst, bound);

        for (sa, sb) in a.iter().zip(&b) {
            if sa.is_empty() || sb.is_empty() {
                continue;
            }
            for (pa, pb) in sa.parameters.iter().zip(&sb.parameters) {
                assert!((pa - pb).abs() < 1e-12, "parameter {} vs {}", pa, pb);
            }
        }
    }
}

#[test]
fn test_reclaim_freezes_simulator() {
    let mut sim = simulator(SimulatorConfig::new(20.0, 8.0));
    sim.stack(0.0, 10.0, 4.0, 12.0, &[3.0]).unwrap();
    let first = sim.reclaim().unwrap();

    assert!(matches!(
        sim.stack(1.0, 10.0, 4.0, 1.0, &[3.0]),
        Err(SimError::ReclaimStarted)
    ));
    assert_eq!(sim.reclaim().unwrap(), first);

    // A different step sweeps the same frozen bed.
    let coarse = sim.reclaim_with_step(4.0).unwrap();
    assert_eq!(coarse.len(), 5);
    assert!((total_volume(&coarse) - 12.0).abs() < 1e-9);
    assert!(sim.reclaim_with_step(-1.0).is_err());
}

#[test]
fn test_detailed_bed_matches_aggregate() {
    let events = [
        (0.0, 6.0, 5.0, 8.0, 1.0),
        (1.0, 9.0, 5.0, 6.0, 4.0),
        (2.0, 7.0, 4.0, 10.0, 2.0),
    ];
    let mut plain = simulator(SimulatorConfig::new(16.0, 10.0));
    let mut detailed = simulator(SimulatorConfig {
        detailed: true,
        ..SimulatorConfig::new(16.0, 10.0)
    });
    for &(t, x, z, v, p) in &events {
        plain.stack(t, x, z, v, &[p]).unwrap();
        detailed.stack(t, x, z, v, &[p]).unwrap();
    }
    assert_eq!(plain.get_heights(), detailed.get_heights());

    let a = plain.reclaim().unwrap();
    let b = detailed.reclaim().unwrap();
    for (sa, sb) in a.iter().zip(&b) {
        assert!((sa.volume - sb.volume).abs() < 1e-9);
        assert!((sa.parameters[0] - sb.parameters[0]).abs() < 1e-9);
    }
}

#[test]
fn test_circular_bed_conserves_volume() {
    let mut sim = simulator(SimulatorConfig {
        circular: true,
        ..SimulatorConfig::new(360.0, 10.0)
    });
    sim.stack(0.0, 90.0, 6.0, 15.0, &[1.0]).unwrap();
    sim.stack(1.0, 270.0, 6.0, 5.0, &[5.0]).unwrap();

    let slices = sim.reclaim().unwrap();
    assert_eq!(slices.len(), 360);
    assert!((total_volume(&slices) - 20.0).abs() < 1e-9);

    // Material dropped at 90° is found near 90°, not near 270°.
    let near = |deg: usize| -> f64 { slices[deg - 45..deg + 45].iter().map(|s| s.volume).sum() };
    assert!(near(90) > near(270));
    assert!(near(90) > 10.0);
}

#[test]
fn test_heightmap_volume_of_bed() {
    let mut sim = simulator(SimulatorConfig::new(10.0, 10.0));
    sim.stack(0.0, 5.0, 5.0, 0.5, &[]).unwrap();
    // One cell of height 0.5 on a unit grid, quarter-cell evaluator convention.
    assert!((heightmap_volume(&sim.get_heights(), 1.0) - 0.125).abs() < 1e-12);
    assert_eq!(stockpile_height(0.0, 321.0), 0.0);
}

/// Chevron stacking: the stacker sweeps the bed back and forth while the
/// feed quality alternates between passes.
fn chevron_input() -> MaterialDeposition {
    let mut material = String::from("timestamp\tvolume\tquality\n");
    for i in 0..40 {
        let quality = if (i / 10) % 2 == 0 { 0.0 } else { 10.0 };
        material.push_str(&format!("{}\t5\t{}\n", i, quality));
    }
    let path = "timestamp\tx\tz\n\
                0\t5\t5\n9\t35\t5\n\
                10\t35\t5\n19\t5\t5\n\
                20\t5\t5\n29\t35\t5\n\
                30\t35\t5\n39\t5\t5\n";

    let material = MaterialSeries::read_tsv(material.as_bytes()).unwrap();
    let path = DepositionPath::read_tsv(path.as_bytes()).unwrap();
    MaterialDeposition::from_series(&material, &path).unwrap()
}

#[test]
fn test_chevron_stacking_homogenizes() {
    init_logging();
    let input = chevron_input();
    let mut sim = simulator(SimulatorConfig::new(40.0, 10.0));
    let output = sim.stack_reclaim(&input, 0.1).unwrap();

    assert_eq!(output.parameter_names, vec!["quality".to_string()]);
    assert!((output.total_volume() - 200.0).abs() < 1e-9);
    assert!((output.rows[0].timestamp - 10.0).abs() < 1e-9);
    assert!((output.rows[39].timestamp - 400.0).abs() < 1e-9);

    let input_mean = input.material().parameter_mean(0).unwrap();
    let output_mean = output.parameter_mean(0).unwrap();
    assert!((input_mean - output_mean).abs() < 1e-9);

    let effect = homogenization_effect(&input.material(), &output, 0).unwrap();
    println!("homogenization effect {:.2}", effect);
    assert!(effect > 1.0);
}

#[test]
fn test_stream_files_roundtrip() {
    let dir = std::env::temp_dir().join(format!("blendsim_stream_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("deposition.tsv");
    let output_path = dir.join("reclaimed.tsv");

    let input = chevron_input();
    input.save_tsv(&input_path).unwrap();
    let loaded = MaterialDeposition::load_tsv(&input_path).unwrap();
    assert_eq!(loaded, input);

    let mut sim = simulator(SimulatorConfig::new(40.0, 10.0));
    let output = sim.stack_reclaim(&loaded, 1.0).unwrap();
    output.save_tsv(&output_path).unwrap();
    let reread = MaterialSeries::load_tsv(&output_path).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(reread.rows.len(), output.rows.len());
    assert!((reread.total_volume() - output.total_volume()).abs() < 1e-9);
}

fn reclaim_generic<S: BlendingSimulator>(sim: &mut S) -> f64 {
    sim.stack(0.0, 3.0, 2.0, 2.0, &[1.0]).unwrap();
    total_volume(&sim.reclaim().unwrap())
}

#[test]
fn test_backend_through_trait() {
    let mut sim = simulator(SimulatorConfig::new(8.0, 4.0));
    assert!((reclaim_generic(&mut sim) - 2.0).abs() < 1e-9);
}
