// sensor/tests.rs
// Grid tiling, refresh and probe tests

use super::*;
use crate::charge::ChargeRegistry;
use crate::field::FieldSource;
use crate::utils::Bounds;
use ultraviolet::DVec2;

fn small_bounds() -> Bounds {
    Bounds::new(DVec2::new(-1.0, -0.5), DVec2::new(1.0, 0.5))
}

#[test]
fn grid_tiles_bounds_in_row_major_order() {
    let grid = SensorGrid::new(Layer::ElectricField, &small_bounds(), 0.5).unwrap();
    assert_eq!(grid.dimensions(), (5, 3));
    assert_eq!(grid.len(), 15);

    let first = grid.elements()[0].position;
    let second = grid.elements()[1].position;
    let last = grid.elements()[14].position;
    assert_eq!(first, DVec2::new(-1.0, -0.5));
    assert_eq!(second, DVec2::new(-0.5, -0.5));
    assert!((last - DVec2::new(1.0, 0.5)).mag() < 1e-12);
}

#[test]
fn grid_tiling_tolerates_inexact_spacing() {
    let grid = SensorGrid::new(Layer::ElectricPotential, &Bounds::default(), 0.1).unwrap();
    assert_eq!(grid.dimensions(), (81, 61));
}

#[test]
fn grid_rejects_bad_spacing() {
    assert!(SensorGrid::new(Layer::ElectricField, &small_bounds(), 0.0).is_err());
    assert!(SensorGrid::new(Layer::ElectricField, &small_bounds(), f64::NAN).is_err());
}

#[test]
fn active_grid_matches_direct_evaluation_after_move() {
    let mut registry = ChargeRegistry::new();
    let id = registry.add_charge(DVec2::new(0.3, 0.1), 1).unwrap();
    let mut grid = SensorGrid::new(Layer::ElectricField, &small_bounds(), 0.25).unwrap();
    grid.set_active(true);
    assert!(grid.refresh(&registry, 1));

    registry.move_charge(id, DVec2::new(-0.4, -0.2)).unwrap();
    assert!(grid.refresh(&registry, 2));

    for element in &grid {
        let sample = registry.evaluate(element.position);
        assert_eq!(element.electric_field, sample.field);
        assert_eq!(element.electric_potential, sample.potential);
    }
    assert!(!grid.is_stale(2));
}

#[test]
fn inactive_grid_stays_stale_until_reactivated() {
    let mut registry = ChargeRegistry::new();
    let id = registry.add_charge(DVec2::new(0.3, 0.1), 1).unwrap();
    let mut grid = SensorGrid::new(Layer::ElectricPotential, &small_bounds(), 0.25).unwrap();
    grid.set_active(true);
    grid.refresh(&registry, 1);
    let before: Vec<_> = grid.iter().map(|e| e.electric_potential).collect();

    grid.set_active(false);
    registry.move_charge(id, DVec2::new(-0.4, -0.2)).unwrap();
    assert!(!grid.refresh(&registry, 2));
    let after: Vec<_> = grid.iter().map(|e| e.electric_potential).collect();
    assert_eq!(before, after);
    assert!(grid.is_stale(2));

    grid.set_active(true);
    assert!(grid.refresh(&registry, 2));
    for element in grid.iter() {
        assert_eq!(
            element.electric_potential,
            registry.electric_potential(element.position)
        );
    }
}

#[test]
fn probes_follow_their_position() {
    let mut registry = ChargeRegistry::new();
    registry.add_charge(DVec2::zero(), -1).unwrap();
    let mut probes = SensorCollection::new();
    let field_id = probes.add(SensorKind::ElectricField, DVec2::new(1.0, 0.0), &registry);
    let potential_id = probes.add(SensorKind::ElectricPotential, DVec2::new(0.0, 3.0), &registry);

    let field_probe = probes.get(field_id).unwrap();
    assert!(field_probe.electric_field.x < 0.0);
    assert_eq!(probes.get(potential_id).unwrap().electric_potential, -3.0);

    let probe = probes.get_mut(field_id).unwrap();
    probe.position = DVec2::new(0.0, 2.0);
    probe.update(&registry);
    assert!(probes.get(field_id).unwrap().electric_field.y < 0.0);

    assert_eq!(probes.of_kind(SensorKind::ElectricPotential).count(), 1);
    assert!(probes.remove(field_id).is_some());
    assert!(probes.remove(field_id).is_none());
    assert_eq!(probes.len(), 1);
}
