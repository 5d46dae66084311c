use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use crate::charge::PointCharge;
use crate::config;
use crate::error::{EngineError, Result};

/// Axis-aligned rectangle of the play area, in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: config::BOUNDS_MIN_X,
            min_y: config::BOUNDS_MIN_Y,
            max_x: config::BOUNDS_MAX_X,
            max_y: config::BOUNDS_MAX_Y,
        }
    }
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.max_x, self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Closed containment test; points on the edge are inside.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "bounds must be finite with positive extent, got {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Reject positions with a NaN or infinite coordinate.
pub fn ensure_finite(p: DVec2) -> Result<()> {
    if p.x.is_finite() && p.y.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidPosition { x: p.x, y: p.y })
    }
}

/// Rotate a vector a quarter turn counter-clockwise.
#[inline]
pub fn perpendicular(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

/// Unit vector and magnitude of `v`, or `None` when the magnitude is below `min_mag`.
#[inline]
pub fn direction(v: DVec2, min_mag: f64) -> Option<(DVec2, f64)> {
    let mag = v.mag();
    if mag < min_mag || !mag.is_finite() {
        None
    } else {
        Some((v / mag, mag))
    }
}

/// Scatter `n` unit charges of alternating sign uniformly over `bounds`, shrunk by `margin`.
///
/// Deterministic for a given `seed`.
pub fn scatter_charges(n: usize, bounds: &Bounds, margin: f64, seed: u64) -> Vec<PointCharge> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let width = (bounds.width() - 2.0 * margin).max(0.0);
    let height = (bounds.height() - 2.0 * margin).max(0.0);

    let mut charges = Vec::with_capacity(n);
    for i in 0..n {
        let pos = DVec2::new(
            bounds.min_x + margin + rng.f64() * width,
            bounds.min_y + margin + rng.f64() * height,
        );
        charges.push(if i % 2 == 0 {
            PointCharge::positive(pos)
        } else {
            PointCharge::negative(pos)
        });
    }
    charges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contain_edges() {
        let b = Bounds::default();
        assert!(b.contains(b.min()));
        assert!(b.contains(b.max()));
        assert!(!b.contains(DVec2::new(b.max_x + 1e-9, 0.0)));
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = DVec2::new(3.0, -2.0);
        assert_eq!(perpendicular(v).dot(v), 0.0);
        assert_eq!(perpendicular(DVec2::new(1.0, 0.0)), DVec2::new(0.0, 1.0));
    }

    #[test]
    fn scatter_is_deterministic_and_inside() {
        let b = Bounds::default();
        let a = scatter_charges(10, &b, 0.5, 7);
        let c = scatter_charges(10, &b, 0.5, 7);
        assert_eq!(a.len(), 10);
        for (x, y) in a.iter().zip(&c) {
            assert_eq!(x.position, y.position);
            assert!(b.contains(x.position));
        }
    }
}
