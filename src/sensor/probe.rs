// sensor/probe.rs
// User-draggable field and potential sensors

use ultraviolet::DVec2;

use crate::field::FieldSource;

pub type SensorId = u64;

/// Which probe collection a movable sensor belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    ElectricField,
    ElectricPotential,
}

/// A movable sensor. Field probes display `electric_field`; the potential probe displays
/// `electric_potential` and is the usual seed for equipotential lines.
#[derive(Clone, Debug, PartialEq)]
pub struct MovableSensor {
    pub id: SensorId,
    pub kind: SensorKind,
    pub position: DVec2,
    pub electric_field: DVec2,
    pub electric_potential: f64,
    /// Set while the user is dragging the sensor.
    pub user_controlled: bool,
    /// Set while the sensor is animating back to its tray.
    pub animating: bool,
}

impl MovableSensor {
    pub fn new(id: SensorId, kind: SensorKind, position: DVec2) -> Self {
        Self {
            id,
            kind,
            position,
            electric_field: DVec2::zero(),
            electric_potential: 0.0,
            user_controlled: false,
            animating: false,
        }
    }

    pub fn update<S: FieldSource + ?Sized>(&mut self, source: &S) {
        let sample = source.evaluate(self.position);
        self.electric_field = sample.field;
        self.electric_potential = sample.potential;
    }
}

/// Ordered collection of movable sensors of every kind.
#[derive(Clone, Debug)]
pub struct SensorCollection {
    sensors: Vec<MovableSensor>,
    next_id: SensorId,
}

impl Default for SensorCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorCollection {
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a sensor and compute its initial reading.
    pub fn add<S: FieldSource + ?Sized>(
        &mut self,
        kind: SensorKind,
        position: DVec2,
        source: &S,
    ) -> SensorId {
        let id = self.next_id;
        self.next_id += 1;
        let mut sensor = MovableSensor::new(id, kind, position);
        sensor.update(source);
        self.sensors.push(sensor);
        id
    }

    pub fn get(&self, id: SensorId) -> Option<&MovableSensor> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SensorId) -> Option<&mut MovableSensor> {
        self.sensors.iter_mut().find(|s| s.id == id)
    }

    pub fn remove(&mut self, id: SensorId) -> Option<MovableSensor> {
        let idx = self.sensors.iter().position(|s| s.id == id)?;
        Some(self.sensors.remove(idx))
    }

    pub fn clear(&mut self) {
        self.sensors.clear();
    }

    pub fn update_all<S: FieldSource + ?Sized>(&mut self, source: &S) {
        for sensor in &mut self.sensors {
            sensor.update(source);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovableSensor> {
        self.sensors.iter()
    }

    pub fn of_kind(&self, kind: SensorKind) -> impl Iterator<Item = &MovableSensor> {
        self.sensors.iter().filter(move |s| s.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
