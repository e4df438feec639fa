//! Face-averaging reclaim sweep over a finished bed.
//!
//! The reclaimer advances along the bed in thin slices and recovers the full
//! vertical cross-section of each slice at once, so every output sample is
//! the volume-weighted blend of all material in its slice.

use crate::bed::Bed;
use crate::constants::EMPTY_SLICE_PARAMETER;
use serde::{Deserialize, Serialize};

/// Material recovered from one slice of the bed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclaimedSlice {
    /// Far edge of the slice along the sweep: the reclaimer position at
    /// which the slice is fully recovered.
    pub x_position: f64,
    pub volume: f64,
    /// Volume-weighted parameter averages; [`EMPTY_SLICE_PARAMETER`] for empty slices.
    pub parameters: Vec<f64>,
}

impl ReclaimedSlice {
    pub fn is_empty(&self) -> bool {
        self.volume <= 0.0
    }
}

#[derive(Clone, Debug)]
struct Accumulator {
    volume: f64,
    weighted: Vec<f64>,
}

impl Accumulator {
    fn add(&mut self, volume: f64, parameters: &[f64]) {
        self.volume += volume;
        for (w, &p) in self.weighted.iter_mut().zip(parameters) {
            *w += volume * p;
        }
    }
}

/// Sweeps a bed along `x` with a fixed step.
#[derive(Clone, Copy, Debug)]
pub struct ReclaimingEngine {
    pub step: f64,
}

impl ReclaimingEngine {
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    /// Number of slices covering the sweep length.
    pub fn slice_count(&self, sweep_length: f64) -> usize {
        ((sweep_length / self.step - 1e-9).ceil() as usize).max(1)
    }

    /// Recover the whole bed, first slice first.
    pub fn reclaim(&self, bed: &Bed) -> Vec<ReclaimedSlice> {
        let layout = &bed.layout;
        let length = layout.sweep_length();
        let count = self.slice_count(length);
        let mut slices = vec![
            Accumulator {
                volume: 0.0,
                weighted: vec![0.0; bed.parameter_count()],
            };
            count
        ];

        for iz in 0..bed.depth() {
            for ix in 0..bed.width() {
                if bed.height(ix, iz) <= 0.0 {
                    continue;
                }
                if layout.is_circular() {
                    let k = ((layout.cell_angle(ix, iz) / self.step) as usize).min(count - 1);
                    collect_column(bed, ix, iz, 1.0, &mut slices[k]);
                } else {
                    let x0 = ix as f64 * layout.cell_size_x;
                    let x1 = x0 + layout.cell_size_x;
                    let first = ((x0 / self.step) as usize).min(count - 1);
                    for k in first..count {
                        let lo = x0.max(k as f64 * self.step);
                        let hi = if k + 1 == count {
                            x1
                        } else {
                            x1.min((k + 1) as f64 * self.step)
                        };
                        if hi <= lo {
                            break;
                        }
                        let fraction = (hi - lo) / layout.cell_size_x;
                        collect_column(bed, ix, iz, fraction, &mut slices[k]);
                    }
                }
            }
        }

        let reclaimed: Vec<ReclaimedSlice> = slices
            .into_iter()
            .enumerate()
            .map(|(k, acc)| ReclaimedSlice {
                x_position: ((k + 1) as f64 * self.step).min(length),
                volume: acc.volume,
                parameters: if acc.volume > 0.0 {
                    acc.weighted.iter().map(|w| w / acc.volume).collect()
                } else {
                    vec![EMPTY_SLICE_PARAMETER; acc.weighted.len()]
                },
            })
            .collect();

        log::debug!(
            "reclaimed {:.3} m³ in {} slices of {:.4}",
            reclaimed.iter().map(|s| s.volume).sum::<f64>(),
            reclaimed.len(),
            self.step
        );
        reclaimed
    }
}

/// Add `fraction` of a cell column to a slice. Detailed beds integrate the
/// layer history, aggregate beds the running average.
fn collect_column(bed: &Bed, ix: usize, iz: usize, fraction: f64, slice: &mut Accumulator) {
    let area = bed.layout.cell_area() * fraction;
    if bed.is_detailed() {
        for layer in bed.layers(ix, iz) {
            slice.add(layer.height * area, layer.parameters);
        }
    } else {
        slice.add(bed.height(ix, iz) * area, bed.cell_parameters(ix, iz));
    }
}
