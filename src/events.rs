// events.rs
// Ordered change notifications from the model to the view layer

use crossbeam::channel::{self, Receiver, Sender};
use ultraviolet::DVec2;

use crate::charge::ChargeId;
use crate::sensor::{Layer, SensorId, SensorKind};
use crate::trace::LineId;

/// Something observable changed in the model. Events are published after the model state
/// is already consistent, in the order the changes were applied.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelEvent {
    ChargeAdded { id: ChargeId, position: DVec2, charge: i32 },
    ChargeMoved { id: ChargeId, position: DVec2 },
    ChargeRemoved { id: ChargeId },
    ChargesCleared,
    /// A grid layer was recomputed against the given charge revision.
    LayerRefreshed { layer: Layer, revision: u64 },
    LayerVisibilityChanged { layer: Layer, visible: bool },
    SensorAdded { id: SensorId, kind: SensorKind },
    SensorMoved { id: SensorId, position: DVec2 },
    SensorRemoved { id: SensorId },
    EquipotentialLineAdded { id: LineId, electric_potential: f64 },
    EquipotentialLinesCleared,
    ElectricFieldLineAdded { id: LineId },
    ElectricFieldLinesCleared,
}

/// Fan-out of [`ModelEvent`]s to any number of channel subscribers.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<ModelEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping the ones whose receiver is gone.
    pub fn publish(&mut self, event: ModelEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
