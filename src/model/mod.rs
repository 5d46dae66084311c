//! Top-level model: owns the charges and everything derived from them.
//!
//! Every charge mutation runs the same chain before returning: bump the revision, refresh
//! active grid layers, update the movable sensors, drop lines traced against the old
//! configuration (when configured to), then publish the events describing all of it.

use log::{debug, warn};
use ultraviolet::DVec2;

use crate::charge::{ChargeId, ChargeRegistry};
use crate::config::EngineConfig;
use crate::equipotential::{EquipotentialLine, EquipotentialTracer};
use crate::error::{EngineError, Result};
use crate::events::{EventBus, ModelEvent};
use crate::field::FieldSource;
use crate::field_line::{trace_field_line, ElectricFieldLine};
use crate::sensor::{Layer, SensorCollection, SensorGrid, SensorId, SensorKind};
use crate::trace::LineId;
use crate::utils::{ensure_finite, Bounds};

use crossbeam::channel::Receiver;

#[cfg(test)]
mod tests;

pub struct ChargesAndFieldsModel {
    config: EngineConfig,
    registry: ChargeRegistry,
    electric_field_grid: SensorGrid,
    electric_potential_grid: SensorGrid,
    sensors: SensorCollection,
    equipotential_lines: Vec<EquipotentialLine>,
    electric_field_lines: Vec<ElectricFieldLine>,
    next_line_id: LineId,
    revision: u64,
    events: EventBus,
}

impl ChargesAndFieldsModel {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut electric_field_grid = SensorGrid::new(
            Layer::ElectricField,
            &config.bounds,
            config.electric_field_spacing,
        )?;
        let mut electric_potential_grid = SensorGrid::new(
            Layer::ElectricPotential,
            &config.bounds,
            config.electric_potential_spacing,
        )?;
        electric_field_grid.set_active(config.electric_field_visible);
        electric_potential_grid.set_active(config.electric_potential_visible);

        let registry = ChargeRegistry::new();
        electric_field_grid.refresh(&registry, 0);
        electric_potential_grid.refresh(&registry, 0);

        Ok(Self {
            config,
            registry,
            electric_field_grid,
            electric_potential_grid,
            sensors: SensorCollection::new(),
            equipotential_lines: Vec::new(),
            electric_field_lines: Vec::new(),
            next_line_id: 1,
            revision: 0,
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bounds(&self) -> &Bounds {
        &self.config.bounds
    }

    /// Number of charge mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.events.subscribe()
    }

    // ====================
    // Charges
    // ====================

    pub fn charges(&self) -> &ChargeRegistry {
        &self.registry
    }

    pub fn add_charge(&mut self, position: DVec2, charge: i32) -> Result<ChargeId> {
        let id = self.registry.add_charge(position, charge)?;
        self.charges_changed(ModelEvent::ChargeAdded {
            id,
            position,
            charge,
        });
        Ok(id)
    }

    pub fn move_charge(&mut self, id: ChargeId, position: DVec2) -> Result<()> {
        self.registry.move_charge(id, position)?;
        self.charges_changed(ModelEvent::ChargeMoved { id, position });
        Ok(())
    }

    pub fn remove_charge(&mut self, id: ChargeId) -> Result<()> {
        self.registry.remove_charge(id)?;
        self.charges_changed(ModelEvent::ChargeRemoved { id });
        Ok(())
    }

    pub fn clear_charges(&mut self) {
        self.registry.clear();
        self.charges_changed(ModelEvent::ChargesCleared);
    }

    /// Whether any charge is in the play area.
    pub fn is_play_area_charged(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn electric_field(&self, point: DVec2) -> DVec2 {
        self.registry.electric_field(point)
    }

    pub fn electric_potential(&self, point: DVec2) -> f64 {
        self.registry.electric_potential(point)
    }

    fn charges_changed(&mut self, cause: ModelEvent) {
        self.revision += 1;
        let mut pending = vec![cause];

        for layer in Layer::ALL {
            let revision = self.revision;
            let registry = &self.registry;
            let grid = match layer {
                Layer::ElectricField => &mut self.electric_field_grid,
                Layer::ElectricPotential => &mut self.electric_potential_grid,
            };
            if grid.refresh(registry, revision) {
                pending.push(ModelEvent::LayerRefreshed { layer, revision });
            }
        }

        self.sensors.update_all(&self.registry);

        if self.config.clear_lines_on_charge_change {
            if !self.equipotential_lines.is_empty() {
                self.equipotential_lines.clear();
                pending.push(ModelEvent::EquipotentialLinesCleared);
            }
            if !self.electric_field_lines.is_empty() {
                self.electric_field_lines.clear();
                pending.push(ModelEvent::ElectricFieldLinesCleared);
            }
        }

        debug!(
            "charge configuration revision {} ({} charges)",
            self.revision,
            self.registry.len()
        );
        for event in pending {
            self.events.publish(event);
        }
    }

    // ====================
    // Grid layers
    // ====================

    pub fn grid(&self, layer: Layer) -> &SensorGrid {
        match layer {
            Layer::ElectricField => &self.electric_field_grid,
            Layer::ElectricPotential => &self.electric_potential_grid,
        }
    }

    fn grid_mut(&mut self, layer: Layer) -> &mut SensorGrid {
        match layer {
            Layer::ElectricField => &mut self.electric_field_grid,
            Layer::ElectricPotential => &mut self.electric_potential_grid,
        }
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        self.grid(layer).is_active()
    }

    /// Show or hide a grid layer. A layer that went stale while hidden is recomputed as
    /// soon as it becomes visible again.
    pub fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        if self.grid(layer).is_active() == visible {
            return;
        }
        self.grid_mut(layer).set_active(visible);
        self.events
            .publish(ModelEvent::LayerVisibilityChanged { layer, visible });
        if visible && self.grid(layer).is_stale(self.revision) {
            self.refresh_layer(layer);
        }
    }

    /// Recompute a layer against the current charges if it is visible.
    pub fn refresh_layer(&mut self, layer: Layer) -> bool {
        let revision = self.revision;
        let grid = match layer {
            Layer::ElectricField => &mut self.electric_field_grid,
            Layer::ElectricPotential => &mut self.electric_potential_grid,
        };
        let refreshed = grid.refresh(&self.registry, revision);
        if refreshed {
            self.events
                .publish(ModelEvent::LayerRefreshed { layer, revision });
        }
        refreshed
    }

    // ====================
    // Movable sensors
    // ====================

    pub fn sensors(&self) -> &SensorCollection {
        &self.sensors
    }

    pub fn add_sensor(&mut self, kind: SensorKind, position: DVec2) -> Result<SensorId> {
        ensure_finite(position)?;
        let id = self.sensors.add(kind, position, &self.registry);
        self.events.publish(ModelEvent::SensorAdded { id, kind });
        Ok(id)
    }

    pub fn move_sensor(&mut self, id: SensorId, position: DVec2) -> Result<()> {
        ensure_finite(position)?;
        let sensor = self
            .sensors
            .get_mut(id)
            .ok_or(EngineError::UnknownSensor(id))?;
        sensor.position = position;
        sensor.update(&self.registry);
        self.events.publish(ModelEvent::SensorMoved { id, position });
        Ok(())
    }

    pub fn set_sensor_user_controlled(&mut self, id: SensorId, controlled: bool) -> Result<()> {
        let sensor = self
            .sensors
            .get_mut(id)
            .ok_or(EngineError::UnknownSensor(id))?;
        sensor.user_controlled = controlled;
        Ok(())
    }

    pub fn remove_sensor(&mut self, id: SensorId) -> Result<()> {
        self.sensors
            .remove(id)
            .ok_or(EngineError::UnknownSensor(id))?;
        self.events.publish(ModelEvent::SensorRemoved { id });
        Ok(())
    }

    // ====================
    // Lines
    // ====================

    pub fn equipotential_lines(&self) -> &[EquipotentialLine] {
        &self.equipotential_lines
    }

    pub fn electric_field_lines(&self) -> &[ElectricFieldLine] {
        &self.electric_field_lines
    }

    fn next_line_id(&mut self) -> LineId {
        let id = self.next_line_id;
        self.next_line_id += 1;
        id
    }

    /// Trace the equipotential through `point` and add it to the collection.
    pub fn add_equipotential_line(&mut self, point: DVec2) -> Result<&EquipotentialLine> {
        let mut line = EquipotentialTracer::new(
            &self.registry,
            &self.config.bounds,
            &self.config.tracer,
        )
        .trace(point)?;
        if !line.forward.is_natural() || line.backward.is_some_and(|t| !t.is_natural()) {
            warn!(
                "equipotential at ({:.3}, {:.3}) ended early (forward {}, backward {:?})",
                point.x, point.y, line.forward, line.backward
            );
        }
        line.id = self.next_line_id();
        self.events.publish(ModelEvent::EquipotentialLineAdded {
            id: line.id,
            electric_potential: line.electric_potential,
        });
        self.equipotential_lines.push(line);
        Ok(&self.equipotential_lines[self.equipotential_lines.len() - 1])
    }

    /// Plot the equipotential through a movable sensor's current position.
    pub fn add_equipotential_line_at_sensor(&mut self, id: SensorId) -> Result<&EquipotentialLine> {
        let position = self
            .sensors
            .get(id)
            .ok_or(EngineError::UnknownSensor(id))?
            .position;
        self.add_equipotential_line(position)
    }

    pub fn clear_equipotential_lines(&mut self) {
        self.equipotential_lines.clear();
        self.events.publish(ModelEvent::EquipotentialLinesCleared);
    }

    pub fn add_electric_field_line(&mut self, point: DVec2) -> Result<&ElectricFieldLine> {
        let mut line = trace_field_line(
            &self.registry,
            &self.config.bounds,
            &self.config.field_line,
            point,
        )?;
        line.id = self.next_line_id();
        self.events
            .publish(ModelEvent::ElectricFieldLineAdded { id: line.id });
        self.electric_field_lines.push(line);
        Ok(&self.electric_field_lines[self.electric_field_lines.len() - 1])
    }

    pub fn clear_electric_field_lines(&mut self) {
        self.electric_field_lines.clear();
        self.events.publish(ModelEvent::ElectricFieldLinesCleared);
    }

    /// Remove every charge, sensor and line; grids are refreshed to the empty field.
    pub fn reset(&mut self) {
        self.sensors.clear();
        self.equipotential_lines.clear();
        self.electric_field_lines.clear();
        self.events.publish(ModelEvent::EquipotentialLinesCleared);
        self.events.publish(ModelEvent::ElectricFieldLinesCleared);
        self.clear_charges();
    }
}
