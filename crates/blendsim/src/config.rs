//! Simulator options and the validated bed geometry derived from them.

use crate::constants::{
    DEFAULT_BULK_DENSITY, DEFAULT_EIGHT, DEFAULT_PARTICLES_PER_M3, DEFAULT_RECLAIM_ANGLE_DEG,
    DEFAULT_SEED,
};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options recognized by the simulator, as read from JSON/YAML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Bed length along the reclaim direction (degrees of arc in circular mode).
    pub bed_size_x: f64,
    /// Bed depth across the reclaim direction (outer radius in circular mode).
    pub bed_size_z: f64,

    /// Maximum stable slope of the stacked material (degrees).
    #[serde(default = "default_reclaim_angle")]
    pub reclaim_angle: f64,
    #[serde(default = "default_particles_per_m3")]
    pub particles_per_m3: f64,
    /// Interpret stacking positions as (angle, radius) around the bed center.
    #[serde(default)]
    pub circular: bool,
    /// Likelihood of 8-neighbour spreading per particle, in `[0, 1]`.
    #[serde(default = "default_eight")]
    pub eight: f64,
    /// Stacked material density (t/m³), converts bed volumes into masses.
    #[serde(default = "default_bulk_density")]
    pub bulk_density: f64,
    /// Stacker discharge height. `None` means half the bed depth.
    #[serde(default)]
    pub drop_height: Option<f64>,
    /// Keep the per-cell deposit history instead of only running averages.
    #[serde(default)]
    pub detailed: bool,
    /// Grid spacing and default reclaim step. `None` means `1 / sqrt(particles_per_m3)`.
    #[serde(default)]
    pub reclaim_increment: Option<f64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_reclaim_angle() -> f64 {
    DEFAULT_RECLAIM_ANGLE_DEG
}
fn default_particles_per_m3() -> f64 {
    DEFAULT_PARTICLES_PER_M3
}
fn default_eight() -> f64 {
    DEFAULT_EIGHT
}
fn default_bulk_density() -> f64 {
    DEFAULT_BULK_DENSITY
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SimulatorConfig {
    /// Options for a bed of the given footprint, everything else default.
    pub fn new(bed_size_x: f64, bed_size_z: f64) -> Self {
        Self {
            bed_size_x,
            bed_size_z,
            reclaim_angle: default_reclaim_angle(),
            particles_per_m3: default_particles_per_m3(),
            circular: false,
            eight: default_eight(),
            bulk_density: default_bulk_density(),
            drop_height: None,
            detailed: false,
            reclaim_increment: None,
            seed: default_seed(),
        }
    }

    /// Check every option and resolve the defaulted ones.
    pub fn validate(&self) -> SimResult<BedGeometry> {
        non_negative("bed_size_x", self.bed_size_x)?;
        non_negative("bed_size_z", self.bed_size_z)?;
        if !(self.reclaim_angle > 0.0 && self.reclaim_angle < 90.0) {
            return Err(SimError::invalid_config(
                "reclaim_angle",
                self.reclaim_angle,
                "must lie strictly between 0 and 90 degrees",
            ));
        }
        positive("particles_per_m3", self.particles_per_m3)?;
        if !(0.0..=1.0).contains(&self.eight) {
            return Err(SimError::invalid_config(
                "eight",
                self.eight,
                "must lie within [0, 1]",
            ));
        }
        positive("bulk_density", self.bulk_density)?;

        let drop_height = self.drop_height.unwrap_or(self.bed_size_z / 2.0);
        non_negative("drop_height", drop_height)?;

        let reclaim_increment = self
            .reclaim_increment
            .unwrap_or_else(|| 1.0 / self.particles_per_m3.sqrt());
        positive("reclaim_increment", reclaim_increment)?;

        Ok(BedGeometry {
            bed_size_x: self.bed_size_x,
            bed_size_z: self.bed_size_z,
            reclaim_angle: self.reclaim_angle,
            particles_per_m3: self.particles_per_m3,
            circular: self.circular,
            eight: self.eight,
            bulk_density: self.bulk_density,
            drop_height,
            detailed: self.detailed,
            reclaim_increment,
            seed: self.seed,
        })
    }

    /// Write the options as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read options from a JSON file; absent keys take their defaults.
    pub fn load_json(path: &Path) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Write the options as YAML.
    pub fn save_yaml(&self, path: &Path) -> SimResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Read options from a YAML file; absent keys take their defaults.
    pub fn load_yaml(path: &Path) -> SimResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&yaml)?;
        Ok(config)
    }
}

fn non_negative(key: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid_config(key, value, "must be finite and non-negative"))
    }
}

fn positive(key: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid_config(key, value, "must be finite and positive"))
    }
}

/// Validated, immutable bed geometry. Only obtainable through
/// [`SimulatorConfig::validate`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BedGeometry {
    pub bed_size_x: f64,
    pub bed_size_z: f64,
    pub reclaim_angle: f64,
    pub particles_per_m3: f64,
    pub circular: bool,
    pub eight: f64,
    pub bulk_density: f64,
    pub drop_height: f64,
    pub detailed: bool,
    pub reclaim_increment: f64,
    pub seed: u64,
}

impl BedGeometry {
    /// Volume carried by one full particle.
    #[inline]
    pub fn particle_volume(&self) -> f64 {
        1.0 / self.particles_per_m3
    }

    /// Mass of a stacked volume at the configured bulk density.
    #[inline]
    pub fn mass(&self, volume: f64) -> f64 {
        volume * self.bulk_density
    }

    /// Maximum height gain per meter of horizontal distance.
    #[inline]
    pub fn max_slope(&self) -> f64 {
        self.reclaim_angle.to_radians().tan()
    }
}
