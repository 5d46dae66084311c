use ultraviolet::DVec2;

use crate::charge::{ChargeRegistry, PointCharge};
use crate::config::{COINCIDENCE_EPSILON, K_CONSTANT};

/// Result of sampling the field at a single point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSample {
    pub potential: f64,
    pub field: DVec2,
}

impl Default for FieldSample {
    fn default() -> Self {
        Self {
            potential: 0.0,
            field: DVec2::zero(),
        }
    }
}

/// Anything that can report an electric field and potential at a point.
///
/// The tracers and sensors are generic over this so they can run against the live registry
/// or a plain slice of charges.
pub trait FieldSource {
    fn electric_field(&self, point: DVec2) -> DVec2;

    fn electric_potential(&self, point: DVec2) -> f64;

    fn evaluate(&self, point: DVec2) -> FieldSample {
        FieldSample {
            potential: self.electric_potential(point),
            field: self.electric_field(point),
        }
    }

    /// Whether `point` lies within `radius` of any source charge.
    fn is_near_charge(&self, point: DVec2, radius: f64) -> bool;

    fn has_charges(&self) -> bool;
}

/// Evaluate potential and field at `point` by superposition over `charges`.
///
/// Terms whose charge lies closer than [`COINCIDENCE_EPSILON`] to `point` are skipped, so a
/// query exactly on a charge reports the contribution of the other charges only.
pub fn evaluate(charges: &[PointCharge], point: DVec2) -> FieldSample {
    let mut potential = 0.0f64;
    let mut field = DVec2::zero();
    let eps_sq = COINCIDENCE_EPSILON * COINCIDENCE_EPSILON;

    for c in charges {
        let d = point - c.position;
        let r_sq = d.mag_sq();
        if r_sq < eps_sq {
            continue;
        }
        let r = r_sq.sqrt();
        let kq = K_CONSTANT * c.charge() as f64;
        potential += kq / r;
        field += d * (kq / (r_sq * r));
    }

    debug_assert!(
        field.x.is_finite() && field.y.is_finite(),
        "electric field at {:?} is not finite: {:?}",
        point,
        field
    );
    debug_assert!(potential.is_finite(), "electric potential at {:?} is not finite", point);

    FieldSample { potential, field }
}

#[inline]
pub fn electric_field(charges: &[PointCharge], point: DVec2) -> DVec2 {
    evaluate(charges, point).field
}

#[inline]
pub fn electric_potential(charges: &[PointCharge], point: DVec2) -> f64 {
    evaluate(charges, point).potential
}

impl FieldSource for [PointCharge] {
    fn electric_field(&self, point: DVec2) -> DVec2 {
        electric_field(self, point)
    }

    fn electric_potential(&self, point: DVec2) -> f64 {
        electric_potential(self, point)
    }

    fn evaluate(&self, point: DVec2) -> FieldSample {
        evaluate(self, point)
    }

    fn is_near_charge(&self, point: DVec2, radius: f64) -> bool {
        let r_sq = radius * radius;
        self.iter().any(|c| (point - c.position).mag_sq() <= r_sq)
    }

    fn has_charges(&self) -> bool {
        !self.is_empty()
    }
}

impl FieldSource for ChargeRegistry {
    fn electric_field(&self, point: DVec2) -> DVec2 {
        electric_field(self.as_slice(), point)
    }

    fn electric_potential(&self, point: DVec2) -> f64 {
        electric_potential(self.as_slice(), point)
    }

    fn evaluate(&self, point: DVec2) -> FieldSample {
        evaluate(self.as_slice(), point)
    }

    fn is_near_charge(&self, point: DVec2, radius: f64) -> bool {
        self.as_slice().is_near_charge(point, radius)
    }

    fn has_charges(&self) -> bool {
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{scatter_charges, Bounds};
    use approx::assert_relative_eq;

    fn at(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn single_charge_matches_coulomb() {
        let charges = [PointCharge::positive(DVec2::zero())];
        let sample = evaluate(&charges, at(2.0, 0.0));
        assert_relative_eq!(sample.potential, K_CONSTANT / 2.0, max_relative = 1e-12);
        assert_relative_eq!(sample.field.x, K_CONSTANT / 4.0, max_relative = 1e-12);
        assert_relative_eq!(sample.field.y, 0.0);
    }

    #[test]
    fn negative_charge_field_points_inward() {
        let charges = [PointCharge::negative(at(1.0, 1.0))];
        let field = electric_field(&charges, at(1.0, 3.0));
        assert!(field.y < 0.0);
        assert_relative_eq!(field.x, 0.0);
        assert_relative_eq!(field.mag(), K_CONSTANT / 4.0, max_relative = 1e-12);
    }

    #[test]
    fn superposition_is_linear() {
        let a = PointCharge::positive(at(-1.0, 0.5));
        let b = PointCharge::negative(at(1.5, -0.25));
        let p = at(0.3, 0.7);

        let both = evaluate(&[a, b], p);
        let only_a = evaluate(&[a], p);
        let only_b = evaluate(&[b], p);

        assert_relative_eq!(both.field.x, only_a.field.x + only_b.field.x, epsilon = 1e-12);
        assert_relative_eq!(both.field.y, only_a.field.y + only_b.field.y, epsilon = 1e-12);
        assert_relative_eq!(both.potential, only_a.potential + only_b.potential, epsilon = 1e-12);
    }

    #[test]
    fn dipole_bisector_has_zero_potential() {
        let charges = [
            PointCharge::positive(at(-1.0, 0.0)),
            PointCharge::negative(at(1.0, 0.0)),
        ];
        let sample = evaluate(&charges, at(0.0, 1.3));
        assert_relative_eq!(sample.potential, 0.0, epsilon = 1e-12);
        // Points from the positive side towards the negative side.
        assert!(sample.field.x > 0.0);
        assert_relative_eq!(sample.field.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_point_skips_that_term() {
        let charges = [
            PointCharge::positive(at(0.0, 0.0)),
            PointCharge::positive(at(2.0, 0.0)),
        ];
        let sample = evaluate(&charges, at(0.0, 0.0));
        let other = evaluate(&charges[1..], at(0.0, 0.0));
        assert_eq!(sample, other);
        assert!(sample.field.x.is_finite() && sample.potential.is_finite());
    }

    #[test]
    fn empty_registry_is_zero() {
        let registry = ChargeRegistry::new();
        assert_eq!(registry.evaluate(at(1.0, 1.0)), FieldSample::default());
        assert!(!registry.has_charges());
    }

    #[test]
    fn random_configurations_stay_finite() {
        let bounds = Bounds::default();
        let mut rng = fastrand::Rng::with_seed(11);
        for seed in 0..20 {
            let charges = scatter_charges(1 + seed as usize % 6, &bounds, 0.2, seed);
            for _ in 0..50 {
                let p = at(
                    bounds.min_x + rng.f64() * bounds.width(),
                    bounds.min_y + rng.f64() * bounds.height(),
                );
                let sample = evaluate(&charges, p);
                assert!(sample.potential.is_finite());
                assert!(sample.field.x.is_finite() && sample.field.y.is_finite());
            }
        }
    }
}
