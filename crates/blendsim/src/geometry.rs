//! Closed-form geometry of an idealized stockpile.
//!
//! The idealized pile is a triangular prism of length `core_length` (the
//! ridge) capped at both ends by half cones. All flanks stand at the repose
//! angle, so at 45° the pile is as wide as it is twice high.
//!
//! Longitudinal coordinates run from the toe of the first cone (`x = 0`)
//! to the toe of the second (`x = core_length + 2 * height / tan(angle)`).

use rayon::prelude::*;
use std::f64::consts::PI;

/// Newton polish steps after the closed-form cubic root.
const NEWTON_STEPS: usize = 8;

/// Pile shape at an arbitrary repose angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PileProfile {
    /// tan of the repose angle.
    slope: f64,
}

impl Default for PileProfile {
    fn default() -> Self {
        Self::from_degrees(45.0)
    }
}

impl PileProfile {
    pub fn from_degrees(angle: f64) -> Self {
        Self {
            slope: angle.to_radians().tan(),
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Horizontal reach of a flank of the given height.
    #[inline]
    pub fn base_radius(&self, height: f64) -> f64 {
        height / self.slope
    }

    /// Total pile length including both cone caps.
    pub fn footprint_length(&self, height: f64, core_length: f64) -> f64 {
        core_length + 2.0 * self.base_radius(height)
    }

    /// Volume of a pile of the given height and ridge length.
    pub fn volume(&self, height: f64, core_length: f64) -> f64 {
        let t = self.slope;
        height * height * core_length / t + PI / (3.0 * t * t) * height.powi(3)
    }

    /// Height of a pile holding `volume` over a ridge of `core_length`.
    ///
    /// Solves `a·h³ + b·h² = volume` with `a = π / (3 tan²)` and `b = core_length / tan`
    /// in real arithmetic, then polishes the root with Newton steps so that
    /// tiny volumes on long ridges keep full relative precision.
    pub fn height(&self, volume: f64, core_length: f64) -> f64 {
        if !(volume > 0.0) {
            return 0.0;
        }
        let t = self.slope;
        let a = PI / (3.0 * t * t);
        let b = core_length.max(0.0) / t;

        if b == 0.0 {
            return (volume / a).cbrt();
        }

        let guess = cardano_root(a, b, volume);
        // Each term alone reaching `volume` bounds the root from above.
        let upper = (volume / b).sqrt().min((volume / a).cbrt());
        let mut h = if guess.is_finite() && guess > 0.0 {
            guess.min(upper)
        } else {
            upper
        };

        for _ in 0..NEWTON_STEPS {
            let f = (a * h + b) * h * h - volume;
            let df = (3.0 * a * h + 2.0 * b) * h;
            if df <= 0.0 {
                break;
            }
            let step = f / df;
            h -= step;
            if step.abs() <= h.abs() * 1e-15 {
                break;
            }
        }

        h.max(0.0)
    }

    /// Cross-section area of the ridge prism at longitudinal position `x`.
    pub fn slice_core_area(&self, x: f64, height: f64, core_length: f64) -> f64 {
        let r = self.base_radius(height);
        if height <= 0.0 || x < r || x > r + core_length {
            return 0.0;
        }
        height * r
    }

    /// Cross-section area of whichever half cone covers position `x`.
    ///
    /// A vertical plane at distance `d` from the cone axis cuts the cone in a
    /// hyperbolic segment of area `h·w - tan·d²·ln((r + w) / d)`, `w = sqrt(r² - d²)`.
    pub fn slice_half_cone_area(&self, x: f64, height: f64, core_length: f64) -> f64 {
        let r = self.base_radius(height);
        if height <= 0.0 {
            return 0.0;
        }
        let d = if x < r {
            r - x
        } else if x > r + core_length {
            x - r - core_length
        } else {
            return 0.0;
        };
        if d >= r {
            return 0.0;
        }
        if d <= 0.0 {
            return height * r;
        }
        let w = (r * r - d * d).sqrt();
        (height * w - self.slope * d * d * ((r + w) / d).ln()).max(0.0)
    }

    /// Total cross-section area at `x`.
    pub fn slice_area(&self, x: f64, height: f64, core_length: f64) -> f64 {
        self.slice_core_area(x, height, core_length)
            + self.slice_half_cone_area(x, height, core_length)
    }

    /// Volume between two longitudinal positions (Simpson's rule).
    pub fn slice_volume(&self, x_start: f64, x_end: f64, height: f64, core_length: f64) -> f64 {
        let mid = 0.5 * (x_start + x_end);
        (x_end - x_start) / 6.0
            * (self.slice_area(x_start, height, core_length)
                + 4.0 * self.slice_area(mid, height, core_length)
                + self.slice_area(x_end, height, core_length))
    }
}

/// Real root of `a·h³ + b·h² - v = 0` for `a, b, v > 0`.
fn cardano_root(a: f64, b: f64, v: f64) -> f64 {
    // h = y - s turns it into y³ + p·y + q = 0 with p = -3s², q = 2s³ - v/a.
    let s = b / (3.0 * a);
    let s3 = s * s * s;
    let va = v / a;
    let discriminant = va * (0.25 * va - s3);

    if discriminant > 0.0 {
        // -q/2 + sqrt(D), positive on this branch.
        let c = ((0.5 * va - s3) + discriminant.sqrt()).cbrt();
        // Second cube root from c·c' = s², avoids cancellation.
        c + s * s / c - s
    } else {
        let arg = (0.5 * va / s3 - 1.0).clamp(-1.0, 1.0);
        let theta = arg.acos();
        s * (2.0 * (theta / 3.0).cos() - 1.0)
    }
}

/// Volume of a 45° pile.
pub fn stockpile_volume(height: f64, core_length: f64) -> f64 {
    PileProfile::default().volume(height, core_length)
}

/// Height of a 45° pile holding `volume`.
pub fn stockpile_height(volume: f64, core_length: f64) -> f64 {
    PileProfile::default().height(volume, core_length)
}

/// Batched [`stockpile_height`].
pub fn stockpile_heights(volumes: &[f64], core_length: f64) -> Vec<f64> {
    let profile = PileProfile::default();
    volumes
        .par_iter()
        .map(|&v| profile.height(v, core_length))
        .collect()
}

pub fn slice_core_area(x: f64, height: f64, core_length: f64) -> f64 {
    PileProfile::default().slice_core_area(x, height, core_length)
}

pub fn slice_half_cone_area(x: f64, height: f64, core_length: f64) -> f64 {
    PileProfile::default().slice_half_cone_area(x, height, core_length)
}

pub fn slice_area(x: f64, height: f64, core_length: f64) -> f64 {
    PileProfile::default().slice_area(x, height, core_length)
}

pub fn slice_volume(x_start: f64, x_end: f64, height: f64, core_length: f64) -> f64 {
    PileProfile::default().slice_volume(x_start, x_end, height, core_length)
}
