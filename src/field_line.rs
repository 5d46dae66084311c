//! Electric field lines: streamlines of the unit field direction, integrated with RK4.

use log::debug;
use ultraviolet::DVec2;

use crate::config::{FieldLineConfig, MIN_FIELD_MAGNITUDE};
use crate::error::Result;
use crate::field::FieldSource;
use crate::profile_scope;
use crate::trace::{stitch, validate_seed, HalfTrace, LineId, Termination};
use crate::utils::{direction, Bounds};

#[derive(Clone, Debug, PartialEq)]
pub struct ElectricFieldLine {
    pub id: LineId,
    pub seed: DVec2,
    /// Ordered from the upstream end (towards positive charges) to the downstream end.
    pub positions: Vec<DVec2>,
    pub forward: Termination,
    pub backward: Termination,
}

fn rk4<S: FieldSource + ?Sized>(source: &S, p: DVec2, h: f64, sign: f64) -> Option<DVec2> {
    let f = |x: DVec2| direction(source.electric_field(x), MIN_FIELD_MAGNITUDE).map(|(d, _)| d * sign);
    let k1 = f(p)?;
    let k2 = f(p + k1 * (0.5 * h))?;
    let k3 = f(p + k2 * (0.5 * h))?;
    let k4 = f(p + k3 * h)?;
    let dir = (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0;
    Some(p + dir * h)
}

fn half_trace<S: FieldSource + ?Sized>(
    source: &S,
    bounds: &Bounds,
    config: &FieldLineConfig,
    seed: DVec2,
    sign: f64,
) -> HalfTrace {
    let mut points = Vec::new();
    let mut p = seed;
    for _ in 0..config.max_steps {
        let Some(q) = rk4(source, p, config.step, sign) else {
            return HalfTrace {
                points,
                termination: Termination::VanishingField,
            };
        };
        if !bounds.contains(q) {
            return HalfTrace {
                points,
                termination: Termination::LeftBounds,
            };
        }
        points.push(q);
        if source.is_near_charge(q, config.charge_capture_radius) {
            return HalfTrace {
                points,
                termination: Termination::ReachedCharge,
            };
        }
        p = q;
    }
    HalfTrace {
        points,
        termination: Termination::MaxSteps,
    }
}

/// Trace the field line through `seed` in both directions.
pub fn trace_field_line<S: FieldSource + ?Sized>(
    source: &S,
    bounds: &Bounds,
    config: &FieldLineConfig,
    seed: DVec2,
) -> Result<ElectricFieldLine> {
    profile_scope!("field_line_trace");
    validate_seed(source, bounds, seed)?;

    let forward = half_trace(source, bounds, config, seed, 1.0);
    let backward = half_trace(source, bounds, config, seed, -1.0);
    debug!(
        "field line from ({:.3}, {:.3}): forward {} ({} pts), backward {} ({} pts)",
        seed.x,
        seed.y,
        forward.termination,
        forward.points.len(),
        backward.termination,
        backward.points.len()
    );

    Ok(ElectricFieldLine {
        id: 0,
        seed,
        positions: stitch(&backward.points, seed, &forward.points),
        forward: forward.termination,
        backward: backward.termination,
    })
}
