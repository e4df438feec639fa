//! Particle deposition with angle-of-repose spreading.

use super::Bed;
use crate::constants::VOLUME_EPSILON;
use std::collections::{HashSet, VecDeque};

/// Cells a particle may roll to from its current cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighbourhood {
    /// The 4 edge-adjacent cells.
    VonNeumann,
    /// The 8 surrounding cells, diagonals at their true distance.
    Moore,
}

/// Offsets in ascending grid-index order, so scanning them in sequence
/// resolves height ties toward the earlier index.
const MOORE: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Neighbourhood {
    fn offsets(self) -> impl Iterator<Item = (i32, i32)> {
        MOORE
            .into_iter()
            .filter(move |&(dx, dz)| self == Neighbourhood::Moore || dx == 0 || dz == 0)
    }
}

/// What the current cell can hold and where overflow goes.
struct Spill {
    /// Absorbable volume.
    capacity: f64,
    /// Lowest neighbour, if strictly lower than the cell.
    lower: Option<usize>,
}

impl Bed {
    /// Drop `volume` of material onto cell `(ix, iz)`.
    ///
    /// The cell absorbs what it can without exceeding the repose slope
    /// toward any neighbour in `neighbourhood` or rising above the drop
    /// height; the rest rolls on to the lowest neighbour, repeatedly. A
    /// particle landing on a plateau at the drop height crosses it to the
    /// nearest cell below the ceiling. Only a bed filled to the ceiling
    /// everywhere lets material pile above it. Volume is always conserved.
    ///
    /// Coordinates past the grid are clamped onto its edge.
    ///
    /// Returns the number of cells that received material.
    pub fn deposit_particle(
        &mut self,
        ix: usize,
        iz: usize,
        volume: f64,
        parameters: &[f64],
        neighbourhood: Neighbourhood,
        event: u64,
    ) -> usize {
        if !(volume > 0.0) {
            return 0;
        }

        if !self.contains(ix, iz) {
            log::warn!(
                "deposit at cell ({}, {}) outside {}x{} grid, clamped",
                ix,
                iz,
                self.layout.width,
                self.layout.depth
            );
        }
        let mut idx = self.idx(ix, iz);
        let mut remaining = volume;
        let mut touched = 0;
        let max_steps = 2 * self.heights.len() + 8;

        for _ in 0..max_steps {
            let spill = self.spill(idx, neighbourhood);
            let take = remaining.min(spill.capacity);
            if take > 0.0 {
                self.absorb(idx, take, parameters, event);
                remaining -= take;
                touched += 1;
            }

            if remaining <= VOLUME_EPSILON {
                if remaining > 0.0 {
                    self.absorb(idx, remaining, parameters, event);
                }
                return touched;
            }

            match spill.lower {
                Some(next) => {
                    log::trace!("{:.3e} m³ rolls from cell {} to {}", remaining, idx, next);
                    idx = next;
                }
                // Filled up to a limit; re-evaluate the same cell.
                None if take > 0.0 => {}
                None => match self.plateau_exit(idx, neighbourhood) {
                    Some(exit) => {
                        log::trace!("plateau at cell {}, leaving through {}", idx, exit);
                        idx = exit;
                    }
                    None => break,
                },
            }
        }

        log::trace!("bed full at cell {}, overtopping with {:.3e} m³", idx, remaining);
        self.absorb(idx, remaining, parameters, event);
        touched + 1
    }

    /// In-bounds neighbours of a cell with their center distance, in
    /// ascending index order.
    fn neighbours(
        &self,
        idx: usize,
        neighbourhood: Neighbourhood,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        let width = self.layout.width as i32;
        let depth = self.layout.depth as i32;
        let x = (idx % self.layout.width) as i32;
        let z = (idx / self.layout.width) as i32;
        let dx = self.layout.cell_size_x;
        let dz = self.layout.cell_size_z;
        let diagonal = (dx * dx + dz * dz).sqrt();

        neighbourhood.offsets().filter_map(move |(ox, oz)| {
            let nx = x + ox;
            let nz = z + oz;
            if nx < 0 || nz < 0 || nx >= width || nz >= depth {
                return None;
            }
            let dist = match (ox, oz) {
                (_, 0) => dx,
                (0, _) => dz,
                _ => diagonal,
            };
            Some((nz as usize * width as usize + nx as usize, dist))
        })
    }

    fn spill(&self, idx: usize, neighbourhood: Neighbourhood) -> Spill {
        let h = self.heights[idx];
        let mut headroom = self.drop_height - h;
        let mut lowest: Option<(usize, f64)> = None;

        for (nidx, dist) in self.neighbours(idx, neighbourhood) {
            let nh = self.heights[nidx];
            headroom = headroom.min(nh + self.max_slope * dist - h);
            if lowest.map_or(true, |(_, lh)| nh < lh) {
                lowest = Some((nidx, nh));
            }
        }

        Spill {
            capacity: headroom.max(0.0) * self.layout.cell_area(),
            lower: lowest.filter(|&(_, lh)| lh < h).map(|(nidx, _)| nidx),
        }
    }

    /// Nearest cell below the drop height reachable across the plateau
    /// of cells at or above it.
    fn plateau_exit(&self, start: usize, neighbourhood: Neighbourhood) -> Option<usize> {
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);

        while let Some(idx) = queue.pop_front() {
            for (nidx, _) in self.neighbours(idx, neighbourhood) {
                if self.heights[nidx] < self.drop_height {
                    return Some(nidx);
                }
                if seen.insert(nidx) {
                    queue.push_back(nidx);
                }
            }
        }
        None
    }

    /// Put `volume` on top of a single cell. The atomic mutation.
    fn absorb(&mut self, idx: usize, volume: f64, parameters: &[f64], event: u64) {
        let dh = volume / self.layout.cell_area();
        let new_height = self.heights[idx] + dh;

        let n = self.parameter_count;
        let weight = dh / new_height;
        let averages = &mut self.averages[idx * n..(idx + 1) * n];
        for (avg, &p) in averages.iter_mut().zip(parameters) {
            *avg += (p - *avg) * weight;
        }

        self.heights[idx] = new_height;
        self.deposited += volume;

        if let Some(layers) = self.layers.as_mut() {
            layers.push(idx, dh, parameters, event);
        }
    }
}
