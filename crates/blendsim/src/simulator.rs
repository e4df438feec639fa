//! Simulator facade: stacking, reclaiming and batch stream conversion.

use crate::bed::Bed;
use crate::config::{BedGeometry, SimulatorConfig};
use crate::constants::EMPTY_SLICE_PARAMETER;
use crate::error::{SimError, SimResult};
use crate::reclaimer::{ReclaimedSlice, ReclaimingEngine};
use crate::series::{MaterialDeposition, MaterialRow, ReclaimedMaterial};
use crate::stacker::{StackEvent, StackingEngine};

/// Anything that can stack material and reclaim it afterwards.
///
/// Backends are interchangeable: callers only rely on this capability set.
pub trait BlendingSimulator {
    /// Deposit `volume` of material with the given quality at `(x, z)`.
    fn stack(
        &mut self,
        timestamp: f64,
        x: f64,
        z: f64,
        volume: f64,
        parameters: &[f64],
    ) -> SimResult<()>;

    /// Recover the whole pile as an ordered sequence of slices.
    fn reclaim(&mut self) -> SimResult<Vec<ReclaimedSlice>>;

    fn stack_event(&mut self, event: &StackEvent) -> SimResult<()> {
        self.stack(event.timestamp, event.x, event.z, event.volume, &event.parameters)
    }

    /// Stack every row, reclaim, and turn slice positions into timestamps
    /// via `timestamp = x_position / reclaim_speed`.
    fn stack_reclaim(
        &mut self,
        material_deposition: &MaterialDeposition,
        reclaim_speed: f64,
    ) -> SimResult<ReclaimedMaterial> {
        if !(reclaim_speed.is_finite() && reclaim_speed > 0.0) {
            return Err(SimError::InvalidReclaimSpeed(reclaim_speed));
        }
        for event in &material_deposition.rows {
            self.stack_event(event)?;
        }

        let parameter_count = material_deposition.parameter_names.len();
        let rows = self
            .reclaim()?
            .into_iter()
            .map(|slice| {
                let mut parameters = slice.parameters;
                // Nothing stacked: the bed never learned the parameter count.
                if parameters.len() < parameter_count {
                    parameters.resize(parameter_count, EMPTY_SLICE_PARAMETER);
                }
                MaterialRow {
                    timestamp: slice.x_position / reclaim_speed,
                    volume: slice.volume,
                    parameters,
                }
            })
            .collect();

        Ok(ReclaimedMaterial {
            parameter_names: material_deposition.parameter_names.clone(),
            rows,
        })
    }
}

/// Grid-based stockpile simulator.
///
/// Owns the bed exclusively. Stacking calls apply in order; the first
/// `reclaim` freezes the bed and caches the result, later calls return the
/// same slices and further stacking is refused.
#[derive(Clone, Debug)]
pub struct BedSimulator {
    geometry: BedGeometry,
    bed: Bed,
    stacker: StackingEngine,
    reclaimer: ReclaimingEngine,
    reclaimed: Option<Vec<ReclaimedSlice>>,
}

impl BedSimulator {
    pub fn new(config: &SimulatorConfig) -> SimResult<Self> {
        Ok(Self::from_geometry(config.validate()?))
    }

    pub fn from_geometry(geometry: BedGeometry) -> Self {
        let bed = Bed::new(&geometry);
        log::info!(
            "bed {}x{} cells of {:.3}x{:.3} m ({}{}), {} particles/m³",
            bed.width(),
            bed.depth(),
            bed.layout.cell_size_x,
            bed.layout.cell_size_z,
            if geometry.circular { "circular" } else { "linear" },
            if geometry.detailed { ", detailed" } else { "" },
            geometry.particles_per_m3
        );

        Self {
            stacker: StackingEngine::new(&geometry),
            reclaimer: ReclaimingEngine::new(geometry.reclaim_increment),
            reclaimed: None,
            bed,
            geometry,
        }
    }

    pub fn geometry(&self) -> &BedGeometry {
        &self.geometry
    }

    pub fn bed(&self) -> &Bed {
        &self.bed
    }

    /// Height grid snapshot, `heights[ix][iz]`.
    pub fn get_heights(&self) -> Vec<Vec<f64>> {
        self.bed.get_heights()
    }

    /// Mass of the material currently on the bed.
    pub fn bed_mass(&self) -> f64 {
        self.geometry.mass(self.bed.volume())
    }

    pub fn is_reclaimed(&self) -> bool {
        self.reclaimed.is_some()
    }

    /// Sweep the bed with an explicit step, leaving the cached result alone.
    pub fn reclaim_with_step(&self, step: f64) -> SimResult<Vec<ReclaimedSlice>> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SimError::invalid_input("step", step, "must be finite and positive"));
        }
        Ok(ReclaimingEngine::new(step).reclaim(&self.bed))
    }
}

impl BlendingSimulator for BedSimulator {
    fn stack(
        &mut self,
        timestamp: f64,
        x: f64,
        z: f64,
        volume: f64,
        parameters: &[f64],
    ) -> SimResult<()> {
        if self.reclaimed.is_some() {
            return Err(SimError::ReclaimStarted);
        }
        self.stacker
            .stack(&mut self.bed, timestamp, x, z, volume, parameters)?;
        Ok(())
    }

    fn reclaim(&mut self) -> SimResult<Vec<ReclaimedSlice>> {
        let slices = match &self.reclaimed {
            Some(slices) => slices.clone(),
            None => {
                let slices = self.reclaimer.reclaim(&self.bed);
                self.reclaimed = Some(slices.clone());
                slices
            }
        };
        Ok(slices)
    }
}
