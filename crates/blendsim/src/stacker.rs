//! Splitting stacking events into particles and dropping them on the bed.

use crate::bed::{Bed, Neighbourhood};
use crate::config::BedGeometry;
use crate::error::{SimError, SimResult};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One macroscopic stacking step: material dropped at a bed position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackEvent {
    pub timestamp: f64,
    pub x: f64,
    pub z: f64,
    pub volume: f64,
    /// Quality parameters, constant over the whole drop.
    pub parameters: Vec<f64>,
}

impl StackEvent {
    pub fn new(timestamp: f64, x: f64, z: f64, volume: f64, parameters: Vec<f64>) -> Self {
        Self {
            timestamp,
            x,
            z,
            volume,
            parameters,
        }
    }
}

/// Converts stacking events into particle deposits.
#[derive(Clone, Debug)]
pub struct StackingEngine {
    particles_per_m3: f64,
    eight: f64,
    rng: StdRng,
    next_event: u64,
}

impl StackingEngine {
    pub fn new(geometry: &BedGeometry) -> Self {
        Self {
            particles_per_m3: geometry.particles_per_m3,
            eight: geometry.eight,
            rng: StdRng::seed_from_u64(geometry.seed),
            next_event: 0,
        }
    }

    /// Number of events stacked so far (zero-volume events excluded).
    pub fn event_count(&self) -> u64 {
        self.next_event
    }

    /// Particle count for a drop: `ceil(volume * particles_per_m3)`, at least one.
    pub fn particle_count(&self, volume: f64) -> usize {
        ((volume * self.particles_per_m3).ceil() as usize).max(1)
    }

    /// Deposit one event. Returns the number of particles dropped.
    pub fn stack(
        &mut self,
        bed: &mut Bed,
        timestamp: f64,
        x: f64,
        z: f64,
        volume: f64,
        parameters: &[f64],
    ) -> SimResult<usize> {
        validate_event(x, z, volume, parameters)?;
        if volume == 0.0 {
            return Ok(0);
        }
        bed.ensure_parameter_count(parameters.len())?;

        let (position, clamped) = bed.layout.position(x, z);
        if clamped {
            log::warn!(
                "stacking position ({:.4}, {:.4}) at t={} outside bed, clamped",
                x,
                z,
                timestamp
            );
        }
        let (ix, iz) = bed.layout.cell_at(position);

        let count = self.particle_count(volume);
        let particle_volume = volume / count as f64;
        let event = self.next_event;
        self.next_event += 1;

        let mut touched = 0;
        for _ in 0..count {
            let neighbourhood = if self.rng.gen_bool(self.eight) {
                Neighbourhood::Moore
            } else {
                Neighbourhood::VonNeumann
            };
            touched +=
                bed.deposit_particle(ix, iz, particle_volume, parameters, neighbourhood, event);
        }

        log::debug!(
            "t={}: {:.3} m³ at cell ({}, {}) as {} particles over {} cell deposits",
            timestamp,
            volume,
            ix,
            iz,
            count,
            touched
        );
        Ok(count)
    }
}

fn validate_event(x: f64, z: f64, volume: f64, parameters: &[f64]) -> SimResult<()> {
    if !volume.is_finite() || volume < 0.0 {
        return Err(SimError::invalid_input(
            "volume",
            volume,
            "must be finite and non-negative",
        ));
    }
    if !x.is_finite() {
        return Err(SimError::invalid_input("x", x, "must be finite"));
    }
    if !z.is_finite() {
        return Err(SimError::invalid_input("z", z, "must be finite"));
    }
    if let Some(p) = parameters.iter().find(|p| !p.is_finite()) {
        return Err(SimError::invalid_input("parameters", p, "must be finite"));
    }
    Ok(())
}
