//! Default values and calibration constants for the blending simulator.
//!
//! ## Units
//!
//! Lengths are meters, volumes cubic meters, angles degrees unless a name
//! says otherwise. Timestamps are whatever unit the caller feeds in; the
//! simulator only divides positions by a reclaim speed expressed in
//! `length / timestamp-unit`.

/// Default repose angle of the stacked material (degrees).
pub const DEFAULT_RECLAIM_ANGLE_DEG: f64 = 45.0;

/// Default discretization density (particles per cubic meter).
pub const DEFAULT_PARTICLES_PER_M3: f64 = 1.0;

/// Likelihood that a particle spreads over the 8-cell neighbourhood instead
/// of the 4-cell one. Empirically tuned for pile roundness, keep as is.
pub const DEFAULT_EIGHT: f64 = 0.87;

/// Default bulk density (t/m³).
pub const DEFAULT_BULK_DENSITY: f64 = 1.0;

/// Default RNG seed for the spreading bias.
pub const DEFAULT_SEED: u64 = 0;

/// Parameter value reported for slices that reclaimed no material.
pub const EMPTY_SLICE_PARAMETER: f64 = 0.0;

/// Remaining particle volume below this is treated as fully absorbed.
pub const VOLUME_EPSILON: f64 = 1e-12;
