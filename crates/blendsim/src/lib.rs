//! Stockpile blending simulation
//!
//! Material arriving at a bulk-material stockpile is dropped by a stacker
//! onto a discretized bed, where it spreads under its angle of repose. A
//! reclaimer later cuts the pile in thin slices along the bed, blending the
//! whole vertical cross-section of every slice. Comparing the quality
//! variability of the input stream with that of the reclaimed stream
//! measures how well the stockpile homogenizes.
//!
//! # Example
//!
//! ```
//! use blendsim::{BedSimulator, BlendingSimulator, SimulatorConfig};
//!
//! let mut sim = BedSimulator::new(&SimulatorConfig::new(20.0, 10.0)).unwrap();
//!
//! // Two batches of different quality at opposite ends of the bed
//! sim.stack(0.0, 5.0, 5.0, 4.0, &[1.0]).unwrap();
//! sim.stack(1.0, 15.0, 5.0, 4.0, &[3.0]).unwrap();
//!
//! let slices = sim.reclaim().unwrap();
//! let total: f64 = slices.iter().map(|s| s.volume).sum();
//! assert!((total - 8.0).abs() < 1e-9);
//! ```

pub mod bed;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluate;
pub mod geometry;
pub mod reclaimer;
pub mod series;
pub mod simulator;
pub mod stacker;

pub use bed::{Bed, BedLayout, HeightCell, Layer, Neighbourhood};
pub use config::{BedGeometry, SimulatorConfig};
pub use error::{SimError, SimResult};
pub use evaluate::{heightmap_volume, homogenization_effect, weighted_std};
pub use geometry::{stockpile_height, stockpile_heights, stockpile_volume, PileProfile};
pub use reclaimer::{ReclaimedSlice, ReclaimingEngine};
pub use series::{
    DepositionPath, DepositionPoint, MaterialDeposition, MaterialRow, MaterialSeries,
    ReclaimedMaterial,
};
pub use simulator::{BedSimulator, BlendingSimulator};
pub use stacker::{StackEvent, StackingEngine};
