use serde::{Deserialize, Serialize};
use std::fmt;
use ultraviolet::DVec2;

use crate::config::{COINCIDENCE_EPSILON, MIN_FIELD_MAGNITUDE};
use crate::error::{EngineError, Result};
use crate::field::{FieldSample, FieldSource};
use crate::utils::Bounds;

pub type LineId = u64;

/// Why a half-trace stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// Came back around to the seed.
    Closed,
    /// The next point would have left the play area.
    LeftBounds,
    /// Step cap reached; the partial line is kept.
    MaxSteps,
    /// Field magnitude dropped below the direction threshold.
    VanishingField,
    /// No step, down to the minimum step size, stayed on the level set.
    Stalled,
    /// Field line ran into a charge.
    ReachedCharge,
}

impl Termination {
    /// Whether the line ended for a reason that says nothing about its quality.
    pub fn is_natural(self) -> bool {
        matches!(
            self,
            Termination::Closed | Termination::LeftBounds | Termination::ReachedCharge
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Closed => "closed",
            Termination::LeftBounds => "left bounds",
            Termination::MaxSteps => "step cap",
            Termination::VanishingField => "vanishing field",
            Termination::Stalled => "stalled",
            Termination::ReachedCharge => "reached charge",
        };
        f.write_str(s)
    }
}

/// Points produced by one sense of a trace, excluding the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct HalfTrace {
    pub points: Vec<DVec2>,
    pub termination: Termination,
}

/// Reject seeds no line can be traced from, returning the field sample at the seed.
pub fn validate_seed<S: FieldSource + ?Sized>(
    source: &S,
    bounds: &Bounds,
    seed: DVec2,
) -> Result<FieldSample> {
    if !source.has_charges() {
        return Err(EngineError::NoCharges);
    }
    if !seed.x.is_finite() || !seed.y.is_finite() || !bounds.contains(seed) {
        return Err(EngineError::SeedOutOfBounds { x: seed.x, y: seed.y });
    }
    if source.is_near_charge(seed, COINCIDENCE_EPSILON) {
        return Err(EngineError::SeedAtCharge { x: seed.x, y: seed.y });
    }
    let sample = source.evaluate(seed);
    if sample.field.mag() < MIN_FIELD_MAGNITUDE {
        return Err(EngineError::VanishingField { x: seed.x, y: seed.y });
    }
    Ok(sample)
}

/// Join a backward and a forward half-trace through the seed.
pub fn stitch(backward: &[DVec2], seed: DVec2, forward: &[DVec2]) -> Vec<DVec2> {
    let mut merged = Vec::with_capacity(backward.len() + forward.len() + 1);
    merged.extend(backward.iter().rev().copied());
    merged.push(seed);
    merged.extend_from_slice(forward);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::PointCharge;

    #[test]
    fn stitch_orders_backward_reversed_then_forward() {
        let seed = DVec2::new(0.0, 0.0);
        let back = [DVec2::new(-1.0, 0.0), DVec2::new(-2.0, 0.0)];
        let fwd = [DVec2::new(1.0, 0.0)];
        let merged = stitch(&back, seed, &fwd);
        let xs: Vec<f64> = merged.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-2.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn seed_validation_errors() {
        let bounds = Bounds::default();
        let none: [PointCharge; 0] = [];
        assert!(matches!(
            validate_seed(&none[..], &bounds, DVec2::zero()),
            Err(EngineError::NoCharges)
        ));

        let charges = [PointCharge::positive(DVec2::zero())];
        assert!(matches!(
            validate_seed(&charges[..], &bounds, DVec2::zero()),
            Err(EngineError::SeedAtCharge { .. })
        ));
        assert!(matches!(
            validate_seed(&charges[..], &bounds, DVec2::new(100.0, 0.0)),
            Err(EngineError::SeedOutOfBounds { .. })
        ));

        let balanced = [
            PointCharge::positive(DVec2::new(-1.0, 0.0)),
            PointCharge::positive(DVec2::new(1.0, 0.0)),
        ];
        assert!(matches!(
            validate_seed(&balanced[..], &bounds, DVec2::zero()),
            Err(EngineError::VanishingField { .. })
        ));
        assert!(validate_seed(&balanced[..], &bounds, DVec2::new(0.0, 1.0)).is_ok());
    }
}
