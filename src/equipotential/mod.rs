//! Equipotential contour tracing.
//!
//! A line is followed by stepping perpendicular to the local field, since the field is the
//! negative gradient of the potential. Each raw step is a midpoint (RK2) step along the
//! tangent followed by Newton corrections along the field direction that pull the point
//! back onto the seed's level set, so drift never accumulates over many steps.

use log::debug;
use ultraviolet::DVec2;

use crate::config::{TracerConfig, MIN_FIELD_MAGNITUDE};
use crate::error::Result;
use crate::field::FieldSource;
use crate::profile_scope;
use crate::trace::{stitch, validate_seed, HalfTrace, LineId, Termination};
use crate::utils::{direction, perpendicular, Bounds};


/// A traced contour of constant potential.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipotentialLine {
    pub id: LineId,
    /// Point the line was requested at; used for label placement and persistence.
    pub seed: DVec2,
    pub electric_potential: f64,
    /// Ordered polyline through the seed. Closed lines start and end on the seed.
    pub positions: Vec<DVec2>,
    pub closed: bool,
    pub forward: Termination,
    /// `None` when the forward half already closed the loop.
    pub backward: Option<Termination>,
}

impl EquipotentialLine {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

enum StepOutcome {
    Accepted { point: DVec2, tangent: DVec2 },
    Rejected,
    Vanished,
}

/// Follows the level set of a [`FieldSource`] inside a bounded play area.
pub struct EquipotentialTracer<'a, S: FieldSource + ?Sized> {
    source: &'a S,
    bounds: &'a Bounds,
    config: &'a TracerConfig,
}

impl<'a, S: FieldSource + ?Sized> EquipotentialTracer<'a, S> {
    pub fn new(source: &'a S, bounds: &'a Bounds, config: &'a TracerConfig) -> Self {
        Self {
            source,
            bounds,
            config,
        }
    }

    /// Trace the equipotential through `seed`. The returned line has id 0; the model
    /// assigns ids when it stores a line.
    pub fn trace(&self, seed: DVec2) -> Result<EquipotentialLine> {
        profile_scope!("equipotential_trace");
        let sample = validate_seed(self.source, self.bounds, seed)?;
        let v0 = sample.potential;
        let tangent = perpendicular(sample.field / sample.field.mag());

        let forward = self.half_trace(seed, v0, tangent);
        let line = if forward.termination == Termination::Closed {
            let mut positions = Vec::with_capacity(forward.points.len() + 1);
            positions.push(seed);
            positions.extend_from_slice(&forward.points);
            EquipotentialLine {
                id: 0,
                seed,
                electric_potential: v0,
                positions,
                closed: true,
                forward: forward.termination,
                backward: None,
            }
        } else {
            let backward = self.half_trace(seed, v0, -tangent);
            let closed = backward.termination == Termination::Closed;
            let positions = if closed {
                // Loop found only going the other way; keep the forward orientation.
                // The last backward point is the seed, so the reversed half starts on it.
                let mut positions = Vec::with_capacity(backward.points.len() + 1);
                positions.extend(backward.points.iter().rev().copied());
                positions.push(seed);
                positions
            } else {
                stitch(&backward.points, seed, &forward.points)
            };
            EquipotentialLine {
                id: 0,
                seed,
                electric_potential: v0,
                positions,
                closed,
                forward: forward.termination,
                backward: Some(backward.termination),
            }
        };

        debug!(
            "equipotential at {:.4} V from ({:.3}, {:.3}): {} points, forward {}, backward {}",
            v0,
            seed.x,
            seed.y,
            line.positions.len(),
            line.forward,
            line.backward
                .map(|t| t.to_string())
                .unwrap_or_else(|| "skipped".into()),
        );
        Ok(line)
    }

    fn tolerance(&self, v0: f64) -> f64 {
        self.config.potential_tolerance * v0.abs().max(1.0)
    }

    /// Unit tangent of the level set at `p`, oriented to agree with `reference`.
    fn tangent_at(&self, p: DVec2, reference: DVec2) -> Option<DVec2> {
        let (e_hat, _) = direction(self.source.electric_field(p), MIN_FIELD_MAGNITUDE)?;
        let t = perpendicular(e_hat);
        Some(if t.dot(reference) < 0.0 { -t } else { t })
    }

    /// Pull `q` back onto the level set `v0`. `None` means the field vanished on the way.
    fn correct(&self, mut q: DVec2, v0: f64, tol: f64) -> Option<(DVec2, bool)> {
        for _ in 0..self.config.max_corrections {
            let sample = self.source.evaluate(q);
            let dv = sample.potential - v0;
            if dv.abs() <= tol {
                return Some((q, true));
            }
            let (e_hat, mag) = direction(sample.field, MIN_FIELD_MAGNITUDE)?;
            q += e_hat * (dv / mag);
        }
        let converged = (self.source.electric_potential(q) - v0).abs() <= tol;
        Some((q, converged))
    }

    fn step(&self, p: DVec2, prev: DVec2, h: f64, v0: f64, tol: f64) -> StepOutcome {
        let Some(t1) = self.tangent_at(p, prev) else {
            return StepOutcome::Vanished;
        };
        // Only the field at the current point decides a vanishing field. A midpoint or a
        // correction that lands in a dead zone means the step was too long.
        let mid = p + t1 * (h * 0.5);
        let Some(t2) = self.tangent_at(mid, t1) else {
            return StepOutcome::Rejected;
        };
        let Some((q, converged)) = self.correct(p + t2 * h, v0, tol) else {
            return StepOutcome::Rejected;
        };
        if !converged || !q.x.is_finite() || !q.y.is_finite() {
            return StepOutcome::Rejected;
        }

        let chord = q - p;
        let len = chord.mag();
        if len == 0.0 || len > 2.0 * h {
            return StepOutcome::Rejected;
        }
        let tangent = chord / len;
        if tangent.dot(prev) < self.config.max_turn_angle.cos() {
            return StepOutcome::Rejected;
        }
        StepOutcome::Accepted { point: q, tangent }
    }

    fn half_trace(&self, seed: DVec2, v0: f64, initial: DVec2) -> HalfTrace {
        let tol = self.tolerance(v0);
        let nominal = self.config.step;
        let min_step = self.config.min_step();

        let mut points = Vec::new();
        let mut p = seed;
        let mut tangent = initial;
        let mut h = nominal;
        let mut arc = 0.0;

        for _ in 0..self.config.max_steps {
            match self.step(p, tangent, h, v0, tol) {
                StepOutcome::Accepted { point, tangent: t } => {
                    if !self.bounds.contains(point) {
                        return HalfTrace {
                            points,
                            termination: Termination::LeftBounds,
                        };
                    }
                    arc += (point - p).mag();
                    points.push(point);
                    p = point;
                    tangent = t;

                    let closure = self.config.closure_radius(h);
                    if arc > 2.0 * closure && (point - seed).mag() <= closure {
                        points.push(seed);
                        return HalfTrace {
                            points,
                            termination: Termination::Closed,
                        };
                    }
                    h = (h * 2.0).min(nominal);
                }
                StepOutcome::Rejected => {
                    if h <= min_step {
                        return HalfTrace {
                            points,
                            termination: Termination::Stalled,
                        };
                    }
                    h = (h * 0.5).max(min_step);
                }
                StepOutcome::Vanished => {
                    return HalfTrace {
                        points,
                        termination: Termination::VanishingField,
                    };
                }
            }
        }

        debug!(
            "equipotential half-trace hit the {} step cap with {} points",
            self.config.max_steps,
            points.len()
        );
        HalfTrace {
            points,
            termination: Termination::MaxSteps,
        }
    }
}

/// Convenience wrapper around [`EquipotentialTracer::trace`].
pub fn trace_equipotential<S: FieldSource + ?Sized>(
    source: &S,
    bounds: &Bounds,
    config: &TracerConfig,
    seed: DVec2,
) -> Result<EquipotentialLine> {
    EquipotentialTracer::new(source, bounds, config).trace(seed)
}
