pub mod grid;
pub mod probe;

pub use grid::{Layer, SensorGrid, StaticSensor};
pub use probe::{MovableSensor, SensorCollection, SensorId, SensorKind};

#[cfg(test)]
mod tests;
