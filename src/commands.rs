// commands.rs
// Message-style entry point for driving the model from a UI or script

use log::trace;
use ultraviolet::DVec2;

use crate::charge::ChargeId;
use crate::error::Result;
use crate::model::ChargesAndFieldsModel;
use crate::sensor::{Layer, SensorId, SensorKind};

/// One user-level action on the model.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelCommand {
    AddCharge { position: DVec2, charge: i32 },
    MoveCharge { id: ChargeId, position: DVec2 },
    RemoveCharge { id: ChargeId },
    ClearCharges,
    AddSensor { kind: SensorKind, position: DVec2 },
    MoveSensor { id: SensorId, position: DVec2 },
    RemoveSensor { id: SensorId },
    SetLayerVisible { layer: Layer, visible: bool },
    AddEquipotentialLine { position: DVec2 },
    PlotAtSensor { id: SensorId },
    ClearEquipotentialLines,
    AddElectricFieldLine { position: DVec2 },
    ClearElectricFieldLines,
    Reset,
}

/// Apply a single command. Errors come straight from the model operation.
pub fn process_command(cmd: ModelCommand, model: &mut ChargesAndFieldsModel) -> Result<()> {
    trace!("processing {:?}", cmd);
    match cmd {
        ModelCommand::AddCharge { position, charge } => {
            model.add_charge(position, charge)?;
        }
        ModelCommand::MoveCharge { id, position } => model.move_charge(id, position)?,
        ModelCommand::RemoveCharge { id } => model.remove_charge(id)?,
        ModelCommand::ClearCharges => model.clear_charges(),
        ModelCommand::AddSensor { kind, position } => {
            model.add_sensor(kind, position)?;
        }
        ModelCommand::MoveSensor { id, position } => model.move_sensor(id, position)?,
        ModelCommand::RemoveSensor { id } => model.remove_sensor(id)?,
        ModelCommand::SetLayerVisible { layer, visible } => {
            model.set_layer_visible(layer, visible)
        }
        ModelCommand::AddEquipotentialLine { position } => {
            model.add_equipotential_line(position)?;
        }
        ModelCommand::PlotAtSensor { id } => {
            model.add_equipotential_line_at_sensor(id)?;
        }
        ModelCommand::ClearEquipotentialLines => model.clear_equipotential_lines(),
        ModelCommand::AddElectricFieldLine { position } => {
            model.add_electric_field_line(position)?;
        }
        ModelCommand::ClearElectricFieldLines => model.clear_electric_field_lines(),
        ModelCommand::Reset => model.reset(),
    }
    Ok(())
}

/// Apply commands in order, stopping at the first failure.
pub fn process_all<I>(cmds: I, model: &mut ChargesAndFieldsModel) -> Result<()>
where
    I: IntoIterator<Item = ModelCommand>,
{
    for cmd in cmds {
        process_command(cmd, model)?;
    }
    Ok(())
}
