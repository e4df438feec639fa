//! Discretized stockpile bed: heights plus per-cell material quality.
//!
//! The bed owns all mutable simulation state. Stacking mutates it through
//! [`Bed::deposit_particle`]; reclaiming only reads it.

use crate::config::BedGeometry;
use crate::error::{SimError, SimResult};

mod deposit;
mod layers;
mod layout;

pub use deposit::Neighbourhood;
pub use layers::{Layer, LayerArena, LayerIter};
pub use layout::BedLayout;

/// Read-only view of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightCell<'a> {
    pub ix: usize,
    pub iz: usize,
    /// Material column height.
    pub height: f64,
    /// Volume-weighted average of each quality parameter in the column.
    pub parameters: &'a [f64],
}

/// Height field of a stockpile bed.
#[derive(Clone, Debug)]
pub struct Bed {
    pub layout: BedLayout,
    /// Column heights, `iz * width + ix`.
    heights: Vec<f64>,
    /// Running averages, `parameter_count` values per cell.
    averages: Vec<f64>,
    parameter_count: usize,
    layers: Option<LayerArena>,

    max_slope: f64,
    drop_height: f64,
    deposited: f64,
}

impl Bed {
    /// Create an empty bed. Detailed geometries also keep the layer history.
    pub fn new(geometry: &BedGeometry) -> Self {
        let layout = BedLayout::new(geometry);
        let cell_count = layout.cell_count();
        Self {
            heights: vec![0.0; cell_count],
            averages: Vec::new(),
            parameter_count: 0,
            layers: geometry.detailed.then(|| LayerArena::new(cell_count, 0)),
            max_slope: geometry.max_slope(),
            drop_height: geometry.drop_height,
            deposited: 0.0,
            layout,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.layout.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.layout.depth
    }

    /// Whether `(ix, iz)` lies on the grid.
    #[inline]
    pub fn contains(&self, ix: usize, iz: usize) -> bool {
        ix < self.layout.width && iz < self.layout.depth
    }

    /// Cell index from (x, z) grid coordinates, clamped onto the grid.
    #[inline]
    pub fn idx(&self, ix: usize, iz: usize) -> usize {
        let ix = ix.min(self.layout.width - 1);
        let iz = iz.min(self.layout.depth - 1);
        iz * self.layout.width + ix
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    pub fn is_detailed(&self) -> bool {
        self.layers.is_some()
    }

    /// Fix the number of tracked quality parameters.
    ///
    /// The first deposit decides; later calls must agree with it.
    pub fn ensure_parameter_count(&mut self, count: usize) -> SimResult<()> {
        if self.deposited > 0.0 {
            if count != self.parameter_count {
                return Err(SimError::ParameterCountMismatch {
                    expected: self.parameter_count,
                    provided: count,
                });
            }
            return Ok(());
        }

        if count != self.parameter_count || self.averages.len() != count * self.heights.len() {
            self.parameter_count = count;
            self.averages = vec![0.0; count * self.heights.len()];
            if let Some(layers) = self.layers.as_mut() {
                layers.set_stride(count);
            }
        }
        Ok(())
    }

    /// Column height at grid position. Coordinates past the grid read the
    /// nearest edge cell.
    pub fn height(&self, ix: usize, iz: usize) -> f64 {
        self.heights[self.idx(ix, iz)]
    }

    /// Raw height buffer, `iz * width + ix`.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Snapshot of the height grid as `heights[ix][iz]`.
    pub fn get_heights(&self) -> Vec<Vec<f64>> {
        (0..self.width())
            .map(|ix| (0..self.depth()).map(|iz| self.height(ix, iz)).collect())
            .collect()
    }

    /// Running parameter averages of a cell.
    pub fn cell_parameters(&self, ix: usize, iz: usize) -> &[f64] {
        let start = self.idx(ix, iz) * self.parameter_count;
        &self.averages[start..start + self.parameter_count]
    }

    pub fn cell(&self, ix: usize, iz: usize) -> HeightCell<'_> {
        HeightCell {
            ix,
            iz,
            height: self.height(ix, iz),
            parameters: self.cell_parameters(ix, iz),
        }
    }

    /// All cells in storage order.
    pub fn cells(&self) -> impl Iterator<Item = HeightCell<'_>> + '_ {
        (0..self.depth()).flat_map(move |iz| (0..self.width()).map(move |ix| self.cell(ix, iz)))
    }

    /// Deposit history of a cell, bottom first. Empty unless the bed is detailed.
    pub fn layers(&self, ix: usize, iz: usize) -> impl Iterator<Item = Layer<'_>> + '_ {
        let idx = self.idx(ix, iz);
        self.layers.as_ref().map(|arena| arena.iter(idx)).into_iter().flatten()
    }

    /// Material volume currently on the bed.
    pub fn volume(&self) -> f64 {
        self.heights.iter().sum::<f64>() * self.layout.cell_area()
    }

    /// Sum of every volume increment deposited so far.
    pub fn deposited_volume(&self) -> f64 {
        self.deposited
    }

    /// Largest height difference between 4-adjacent cells, measured as
    /// excess over the slope limit. Zero or negative when the pile is stable.
    pub fn max_slope_excess(&self) -> f64 {
        let mut worst = f64::NEG_INFINITY;
        for iz in 0..self.depth() {
            for ix in 0..self.width() {
                let h = self.height(ix, iz);
                if ix + 1 < self.width() {
                    let diff = (h - self.height(ix + 1, iz)).abs();
                    worst = worst.max(diff - self.max_slope * self.layout.cell_size_x);
                }
                if iz + 1 < self.depth() {
                    let diff = (h - self.height(ix, iz + 1)).abs();
                    worst = worst.max(diff - self.max_slope * self.layout.cell_size_z);
                }
            }
        }
        worst.max(0.0)
    }
}
