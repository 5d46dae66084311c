// model/tests.rs
// Invalidation chain, layer visibility and line collection tests

use super::*;
use crate::config::EngineConfig;
use crate::events::ModelEvent;
use crate::field::FieldSource;
use crate::sensor::{Layer, SensorKind};
use ultraviolet::DVec2;

fn model() -> ChargesAndFieldsModel {
    let config = EngineConfig {
        electric_field_visible: true,
        electric_potential_visible: false,
        ..EngineConfig::default()
    };
    ChargesAndFieldsModel::new(config).unwrap()
}

fn assert_grid_current(model: &ChargesAndFieldsModel, layer: Layer) {
    for element in model.grid(layer).iter() {
        let sample = model.charges().evaluate(element.position);
        assert_eq!(element.electric_field, sample.field);
        assert_eq!(element.electric_potential, sample.potential);
    }
}

#[test]
fn moving_a_charge_refreshes_only_visible_layers() {
    let mut model = model();
    let id = model.add_charge(DVec2::new(0.5, 0.5), 1).unwrap();
    assert_grid_current(&model, Layer::ElectricField);

    let stale: Vec<f64> = model
        .grid(Layer::ElectricPotential)
        .iter()
        .map(|e| e.electric_potential)
        .collect();
    assert!(stale.iter().all(|v| *v == 0.0));

    model.move_charge(id, DVec2::new(-1.0, 0.25)).unwrap();
    assert_grid_current(&model, Layer::ElectricField);
    assert!(model.grid(Layer::ElectricPotential).is_stale(model.revision()));

    model.set_layer_visible(Layer::ElectricPotential, true);
    assert!(!model.grid(Layer::ElectricPotential).is_stale(model.revision()));
    assert_grid_current(&model, Layer::ElectricPotential);
}

#[test]
fn revision_counts_charge_mutations() {
    let mut model = model();
    assert_eq!(model.revision(), 0);
    let id = model.add_charge(DVec2::new(0.5, 0.5), -1).unwrap();
    model.move_charge(id, DVec2::new(1.0, 0.5)).unwrap();
    model.remove_charge(id).unwrap();
    assert_eq!(model.revision(), 3);
    assert!(model.move_charge(id, DVec2::zero()).is_err());
    assert_eq!(model.revision(), 3);
}

#[test]
fn zero_charge_leaves_model_untouched() {
    let mut model = model();
    assert!(model.add_charge(DVec2::zero(), 0).is_err());
    assert_eq!(model.revision(), 0);
    assert!(!model.is_play_area_charged());
}

#[test]
fn clearing_lines_then_adding_starts_fresh() {
    let mut model = model();
    model.add_charge(DVec2::zero(), 1).unwrap();
    model.add_equipotential_line(DVec2::new(1.0, 0.0)).unwrap();
    model.add_equipotential_line(DVec2::new(2.0, 0.0)).unwrap();
    assert_eq!(model.equipotential_lines().len(), 2);

    model.clear_equipotential_lines();
    assert!(model.equipotential_lines().is_empty());

    let line = model.add_equipotential_line(DVec2::new(0.0, 1.5)).unwrap();
    assert!(line.closed);
    assert!((line.electric_potential - 6.0).abs() < 1e-12);
    let potential = line.electric_potential;
    let points = line.positions.clone();
    assert_eq!(model.equipotential_lines().len(), 1);
    for p in points {
        assert!((model.electric_potential(p) - potential).abs() < 1e-3);
    }
}

#[test]
fn charge_changes_drop_stale_lines_when_configured() {
    let mut model = model();
    let id = model.add_charge(DVec2::zero(), 1).unwrap();
    model.add_equipotential_line(DVec2::new(1.0, 0.0)).unwrap();
    model.add_electric_field_line(DVec2::new(1.0, 0.0)).unwrap();
    model.move_charge(id, DVec2::new(0.5, 0.0)).unwrap();
    assert!(model.equipotential_lines().is_empty());
    assert!(model.electric_field_lines().is_empty());

    let mut keep = ChargesAndFieldsModel::new(EngineConfig {
        clear_lines_on_charge_change: false,
        ..EngineConfig::default()
    })
    .unwrap();
    let id = keep.add_charge(DVec2::zero(), 1).unwrap();
    keep.add_equipotential_line(DVec2::new(1.0, 0.0)).unwrap();
    keep.move_charge(id, DVec2::new(0.5, 0.0)).unwrap();
    assert_eq!(keep.equipotential_lines().len(), 1);
}

#[test]
fn events_follow_mutation_order() {
    let mut model = model();
    let rx = model.subscribe();
    let id = model.add_charge(DVec2::zero(), 1).unwrap();
    let line_id = model.add_equipotential_line(DVec2::new(1.0, 0.0)).unwrap().id;
    model.move_charge(id, DVec2::new(0.5, 0.0)).unwrap();

    let events: Vec<ModelEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            ModelEvent::ChargeAdded {
                id,
                position: DVec2::zero(),
                charge: 1
            },
            ModelEvent::LayerRefreshed {
                layer: Layer::ElectricField,
                revision: 1
            },
            ModelEvent::EquipotentialLineAdded {
                id: line_id,
                electric_potential: 9.0
            },
            ModelEvent::ChargeMoved {
                id,
                position: DVec2::new(0.5, 0.0)
            },
            ModelEvent::LayerRefreshed {
                layer: Layer::ElectricField,
                revision: 2
            },
            ModelEvent::EquipotentialLinesCleared,
        ]
    );
}

#[test]
fn sensors_track_charge_changes() {
    let mut model = model();
    let sensor = model
        .add_sensor(SensorKind::ElectricPotential, DVec2::new(2.0, 0.0))
        .unwrap();
    assert_eq!(model.sensors().get(sensor).unwrap().electric_potential, 0.0);

    let id = model.add_charge(DVec2::zero(), 1).unwrap();
    assert_eq!(model.sensors().get(sensor).unwrap().electric_potential, 4.5);

    model.move_charge(id, DVec2::new(-1.0, 0.0)).unwrap();
    assert_eq!(model.sensors().get(sensor).unwrap().electric_potential, 3.0);

    model.move_sensor(sensor, DVec2::new(-1.0, 1.0)).unwrap();
    assert_eq!(model.sensors().get(sensor).unwrap().electric_potential, 9.0);

    let line = model.add_equipotential_line_at_sensor(sensor).unwrap();
    assert_eq!(line.seed, DVec2::new(-1.0, 1.0));
    assert!(model.remove_sensor(sensor).is_ok());
    assert!(model.remove_sensor(sensor).is_err());
}

#[test]
fn degenerate_line_requests_are_errors() {
    let mut model = model();
    assert!(matches!(
        model.add_equipotential_line(DVec2::new(1.0, 1.0)),
        Err(EngineError::NoCharges)
    ));
    model.add_charge(DVec2::new(1.0, 1.0), 1).unwrap();
    assert!(matches!(
        model.add_equipotential_line(DVec2::new(1.0, 1.0)),
        Err(EngineError::SeedAtCharge { .. })
    ));
    assert!(model.equipotential_lines().is_empty());
}

#[test]
fn reset_empties_everything() {
    let mut model = model();
    model.add_charge(DVec2::zero(), 1).unwrap();
    model
        .add_sensor(SensorKind::ElectricField, DVec2::new(1.0, 1.0))
        .unwrap();
    model.add_equipotential_line(DVec2::new(1.0, 0.0)).unwrap();
    model.reset();
    assert!(!model.is_play_area_charged());
    assert!(model.sensors().is_empty());
    assert!(model.equipotential_lines().is_empty());
    assert!(model
        .grid(Layer::ElectricField)
        .iter()
        .all(|e| e.electric_potential == 0.0));
}

#[test]
fn non_finite_positions_leave_the_model_untouched() {
    let mut model = model();
    let rx = model.subscribe();
    assert!(matches!(
        model.add_charge(DVec2::new(f64::NAN, 0.0), 1),
        Err(EngineError::InvalidPosition { .. })
    ));
    assert_eq!(model.revision(), 0);
    assert!(rx.try_recv().is_err());

    let id = model.add_charge(DVec2::new(1.0, 0.0), 1).unwrap();
    assert!(model.move_charge(id, DVec2::new(0.0, f64::NAN)).is_err());
    assert_eq!(model.revision(), 1);
    assert_grid_current(&model, Layer::ElectricField);

    assert!(matches!(
        model.add_sensor(SensorKind::ElectricField, DVec2::new(f64::INFINITY, 0.0)),
        Err(EngineError::InvalidPosition { .. })
    ));
    assert!(model.sensors().is_empty());

    let sensor = model
        .add_sensor(SensorKind::ElectricPotential, DVec2::new(2.0, 0.0))
        .unwrap();
    assert!(model.move_sensor(sensor, DVec2::new(f64::NAN, f64::NAN)).is_err());
    let reading = model.sensors().get(sensor).unwrap();
    assert_eq!(reading.position, DVec2::new(2.0, 0.0));
    assert!(reading.electric_potential.is_finite());
}
