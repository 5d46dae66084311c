// Centralized configuration for the field engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::utils::Bounds;

// ====================
// Physical Constants
// ====================
/// Coulomb constant in V·m/nC. Charges are expressed in nC and positions in metres.
pub const K_CONSTANT: f64 = 9.0;
/// Distance below which a charge's contribution to a query point is skipped (m).
pub const COINCIDENCE_EPSILON: f64 = 1e-9;
/// Field magnitude below which a line direction is considered undefined (V/m).
pub const MIN_FIELD_MAGNITUDE: f64 = 1e-6;

// ====================
// Play Area
// ====================
pub const BOUNDS_MIN_X: f64 = -4.0;
pub const BOUNDS_MIN_Y: f64 = -3.0;
pub const BOUNDS_MAX_X: f64 = 4.0;
pub const BOUNDS_MAX_Y: f64 = 3.0;

// ====================
// Sensor Grids
// ====================
pub const ELECTRIC_FIELD_SENSOR_SPACING: f64 = 0.5;
pub const ELECTRIC_POTENTIAL_SENSOR_SPACING: f64 = 0.1;

// ====================
// Color Saturation
// ====================
/// Potential (V) at which the potential grid reaches its saturated color.
pub const MAX_ELECTRIC_POTENTIAL: f64 = 40.0;
/// Field magnitude (V/m) at which field arrows reach full brightness.
pub const MAX_EFIELD_MAGNITUDE: f64 = 5.0;

// ====================
// Equipotential Tracer
// ====================
pub const EQUIPOTENTIAL_STEP: f64 = 0.05;
/// Smallest step the adaptive tracer may shrink to, as a fraction of the nominal step.
pub const EQUIPOTENTIAL_MIN_STEP_FRACTION: f64 = 1.0 / 64.0;
pub const EQUIPOTENTIAL_MAX_STEPS: usize = 4000;
/// Allowed |V - V0| after correction, relative to max(|V0|, 1 V).
pub const POTENTIAL_TOLERANCE: f64 = 1e-4;
pub const MAX_CORRECTIONS: usize = 8;
/// Largest tangent rotation accepted in a single step (radians).
pub const MAX_TURN_ANGLE: f64 = 0.3;
/// Closure radius as a multiple of the nominal step.
pub const CLOSURE_RADIUS_FACTOR: f64 = 1.5;

// ====================
// Field-line Tracer
// ====================
pub const FIELD_LINE_STEP: f64 = 0.02;
pub const FIELD_LINE_MAX_STEPS: usize = 2000;
pub const CHARGE_CAPTURE_RADIUS: f64 = 0.05;

/// Parameters of the equipotential tracer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Nominal arc length between consecutive polyline points (m).
    pub step: f64,
    pub min_step_fraction: f64,
    /// Step cap per half-trace.
    pub max_steps: usize,
    pub potential_tolerance: f64,
    pub max_corrections: usize,
    pub max_turn_angle: f64,
    pub closure_radius_factor: f64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            step: EQUIPOTENTIAL_STEP,
            min_step_fraction: EQUIPOTENTIAL_MIN_STEP_FRACTION,
            max_steps: EQUIPOTENTIAL_MAX_STEPS,
            potential_tolerance: POTENTIAL_TOLERANCE,
            max_corrections: MAX_CORRECTIONS,
            max_turn_angle: MAX_TURN_ANGLE,
            closure_radius_factor: CLOSURE_RADIUS_FACTOR,
        }
    }
}

impl TracerConfig {
    pub fn min_step(&self) -> f64 {
        self.step * self.min_step_fraction
    }

    /// Distance to the seed within which a trace moving with step `h` counts as closed.
    pub fn closure_radius(&self, h: f64) -> f64 {
        h * self.closure_radius_factor
    }

    pub fn validate(&self) -> Result<()> {
        positive("tracer.step", self.step)?;
        positive("tracer.potential_tolerance", self.potential_tolerance)?;
        positive("tracer.max_turn_angle", self.max_turn_angle)?;
        positive("tracer.closure_radius_factor", self.closure_radius_factor)?;
        if !(self.min_step_fraction > 0.0 && self.min_step_fraction <= 1.0) {
            return Err(EngineError::InvalidConfig(
                "tracer.min_step_fraction must lie in (0, 1]".into(),
            ));
        }
        if self.max_steps == 0 {
            return Err(EngineError::InvalidConfig(
                "tracer.max_steps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the electric field line tracer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLineConfig {
    pub step: f64,
    pub max_steps: usize,
    /// A line ends once it comes this close to a charge.
    pub charge_capture_radius: f64,
}

impl Default for FieldLineConfig {
    fn default() -> Self {
        Self {
            step: FIELD_LINE_STEP,
            max_steps: FIELD_LINE_MAX_STEPS,
            charge_capture_radius: CHARGE_CAPTURE_RADIUS,
        }
    }
}

impl FieldLineConfig {
    pub fn validate(&self) -> Result<()> {
        positive("field_line.step", self.step)?;
        positive("field_line.charge_capture_radius", self.charge_capture_radius)?;
        if self.max_steps == 0 {
            return Err(EngineError::InvalidConfig(
                "field_line.max_steps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Runtime configuration of a model, loadable from TOML.
///
/// Every field falls back to its default when omitted, so an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bounds: Bounds,
    pub electric_field_spacing: f64,
    pub electric_potential_spacing: f64,
    /// Whether the field grid starts visible.
    pub electric_field_visible: bool,
    /// Whether the potential grid starts visible.
    pub electric_potential_visible: bool,
    /// Drop traced lines whenever a charge is added, moved or removed.
    pub clear_lines_on_charge_change: bool,
    pub tracer: TracerConfig,
    pub field_line: FieldLineConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            electric_field_spacing: ELECTRIC_FIELD_SENSOR_SPACING,
            electric_potential_spacing: ELECTRIC_POTENTIAL_SENSOR_SPACING,
            electric_field_visible: true,
            electric_potential_visible: false,
            clear_lines_on_charge_change: true,
            tracer: TracerConfig::default(),
            field_line: FieldLineConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        positive("electric_field_spacing", self.electric_field_spacing)?;
        positive("electric_potential_spacing", self.electric_potential_spacing)?;
        self.tracer.validate()?;
        self.field_line.validate()
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{name} must be a positive finite value, got {value}"
        )))
    }
}
