// sensor/grid.rs
// Fixed tilings of static sensor elements, one per visualization layer

use serde::{Deserialize, Serialize};
use std::fmt;
use ultraviolet::DVec2;

use crate::error::{EngineError, Result};
use crate::field::FieldSource;
use crate::profile_scope;
use crate::utils::Bounds;

/// The two grid visualizations of the play area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    ElectricField,
    ElectricPotential,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::ElectricField, Layer::ElectricPotential];
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::ElectricField => write!(f, "electric field"),
            Layer::ElectricPotential => write!(f, "electric potential"),
        }
    }
}

/// One cell of a visualization grid. Values hold whatever was last computed while the
/// owning layer was active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticSensor {
    pub position: DVec2,
    pub electric_field: DVec2,
    pub electric_potential: f64,
}

impl StaticSensor {
    fn new(position: DVec2) -> Self {
        Self {
            position,
            electric_field: DVec2::zero(),
            electric_potential: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SensorGrid {
    layer: Layer,
    spacing: f64,
    columns: usize,
    rows: usize,
    elements: Vec<StaticSensor>,
    active: bool,
    computed_revision: Option<u64>,
}

impl SensorGrid {
    /// Tile `bounds` row by row (bottom to top, left to right) with the given spacing.
    ///
    /// The first element sits on `bounds.min()`; the last column and row are the furthest
    /// multiples of `spacing` that still fit inside the bounds.
    pub fn new(layer: Layer, bounds: &Bounds, spacing: f64) -> Result<Self> {
        bounds.validate()?;
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "{layer} grid spacing must be positive, got {spacing}"
            )));
        }

        // A small slack keeps 8.0 / 0.1 from rounding down to 79 cells.
        let columns = (bounds.width() / spacing + 1e-9).floor() as usize + 1;
        let rows = (bounds.height() / spacing + 1e-9).floor() as usize + 1;

        let mut elements = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for col in 0..columns {
                let position = DVec2::new(
                    bounds.min_x + col as f64 * spacing,
                    bounds.min_y + row as f64 * spacing,
                );
                elements.push(StaticSensor::new(position));
            }
        }

        Ok(Self {
            layer,
            spacing,
            columns,
            rows,
            elements,
            active: false,
            computed_revision: None,
        })
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[StaticSensor] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StaticSensor> {
        self.elements.iter()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Revision of the charge configuration the elements were last computed against.
    pub fn computed_revision(&self) -> Option<u64> {
        self.computed_revision
    }

    pub fn is_stale(&self, revision: u64) -> bool {
        self.computed_revision != Some(revision)
    }

    /// Recompute every element if the layer is active. Inactive layers are left as they
    /// were; the return value tells whether anything was recomputed.
    pub fn refresh<S: FieldSource + ?Sized>(&mut self, source: &S, revision: u64) -> bool {
        if !self.active {
            return false;
        }
        profile_scope!("sensor_grid_refresh");
        for element in &mut self.elements {
            let sample = source.evaluate(element.position);
            element.electric_field = sample.field;
            element.electric_potential = sample.potential;
        }
        self.computed_revision = Some(revision);
        true
    }
}

impl<'a> IntoIterator for &'a SensorGrid {
    type Item = &'a StaticSensor;
    type IntoIter = std::slice::Iter<'a, StaticSensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
