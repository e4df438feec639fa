//! Mapping between bed coordinates and grid cells.

use crate::config::BedGeometry;
use glam::DVec2;

/// Grid resolution and coordinate mapping of a bed.
///
/// Cartesian beds cover `[0, bed_size_x] x [0, bed_size_z]`. Circular beds
/// take `x` as an angle in degrees and `z` as a radius; their grid is the
/// square of side `2 * bed_size_z` around the bed center.
#[derive(Clone, Debug, PartialEq)]
pub struct BedLayout {
    pub width: usize,
    pub depth: usize,
    pub cell_size_x: f64,
    pub cell_size_z: f64,
    circular: bool,
    size_x: f64,
    size_z: f64,
}

/// Cell count and spacing covering `extent` at roughly `increment` resolution.
fn axis(extent: f64, increment: f64) -> (usize, f64) {
    let count = ((extent / increment).round() as usize).max(1);
    let spacing = if extent > 0.0 {
        extent / count as f64
    } else {
        increment
    };
    (count, spacing)
}

impl BedLayout {
    pub fn new(geometry: &BedGeometry) -> Self {
        let (extent_x, extent_z) = if geometry.circular {
            (2.0 * geometry.bed_size_z, 2.0 * geometry.bed_size_z)
        } else {
            (geometry.bed_size_x, geometry.bed_size_z)
        };
        let (width, cell_size_x) = axis(extent_x, geometry.reclaim_increment);
        let (depth, cell_size_z) = axis(extent_z, geometry.reclaim_increment);

        Self {
            width,
            depth,
            cell_size_x,
            cell_size_z,
            circular: geometry.circular,
            size_x: geometry.bed_size_x,
            size_z: geometry.bed_size_z,
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.depth
    }

    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.cell_size_x * self.cell_size_z
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Extent of the sweep coordinate (length, or degrees of arc).
    pub fn sweep_length(&self) -> f64 {
        self.size_x
    }

    /// Center of a circular bed in grid space.
    pub fn center(&self) -> DVec2 {
        DVec2::splat(self.size_z)
    }

    /// Grid-space position of a stacking coordinate, clamped onto the bed.
    /// The flag reports whether clamping was needed.
    pub fn position(&self, x: f64, z: f64) -> (DVec2, bool) {
        let cx = x.clamp(0.0, self.size_x);
        let cz = z.clamp(0.0, self.size_z);
        let clamped = cx != x || cz != z;

        if self.circular {
            let angle = cx.to_radians();
            let offset = DVec2::new(angle.cos(), angle.sin()) * cz;
            (self.center() + offset, clamped)
        } else {
            (DVec2::new(cx, cz), clamped)
        }
    }

    /// Cell containing a grid-space position.
    pub fn cell_at(&self, p: DVec2) -> (usize, usize) {
        let ix = ((p.x / self.cell_size_x).floor().max(0.0) as usize).min(self.width - 1);
        let iz = ((p.y / self.cell_size_z).floor().max(0.0) as usize).min(self.depth - 1);
        (ix, iz)
    }

    /// Grid-space center of a cell.
    pub fn cell_center(&self, ix: usize, iz: usize) -> DVec2 {
        DVec2::new(
            (ix as f64 + 0.5) * self.cell_size_x,
            (iz as f64 + 0.5) * self.cell_size_z,
        )
    }

    /// Polar angle (degrees, `[0, 360)`) of a cell center around the bed center.
    pub fn cell_angle(&self, ix: usize, iz: usize) -> f64 {
        let d = self.cell_center(ix, iz) - self.center();
        if d == DVec2::ZERO {
            return 0.0;
        }
        d.y.atan2(d.x).to_degrees().rem_euclid(360.0)
    }
}
