// scenario.rs
// Loads initial scenes (charges, sensors, line seeds) from TOML and applies them to a model

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use ultraviolet::DVec2;

use crate::commands::{process_all, ModelCommand};
use crate::error::{EngineError, Result};
use crate::model::ChargesAndFieldsModel;
use crate::sensor::{Layer, SensorKind};
use crate::utils::{scatter_charges, Bounds};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Scenario {
    pub name: Option<String>,
    pub electric_field_visible: Option<bool>,
    pub electric_potential_visible: Option<bool>,
    pub charges: Vec<ChargeConfig>,
    pub random: Option<RandomConfig>,
    pub sensors: Vec<SensorConfig>,
    pub equipotential_lines: Vec<SeedConfig>,
    pub electric_field_lines: Vec<SeedConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChargeConfig {
    pub x: f64,
    pub y: f64,
    /// +1 or -1 in the usual scenes; any non-zero value is accepted.
    pub charge: i32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SensorConfig {
    pub x: f64,
    pub y: f64,
    pub kind: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SeedConfig {
    pub x: f64,
    pub y: f64,
}

/// Alternating-sign charges scattered uniformly over the play area.
#[derive(Debug, Deserialize, Serialize)]
pub struct RandomConfig {
    pub count: usize,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_margin() -> f64 {
    0.5
}

impl SensorConfig {
    pub fn to_kind(&self) -> Result<SensorKind> {
        match self.kind.as_str() {
            "electricField" | "field" => Ok(SensorKind::ElectricField),
            "electricPotential" | "potential" => Ok(SensorKind::ElectricPotential),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown sensor kind `{}`",
                other
            ))),
        }
    }
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Translate the scene into model commands. Charges come first so that sensors start with
    /// a meaningful reading and lines have something to trace.
    pub fn to_commands(&self, bounds: &Bounds) -> Result<Vec<ModelCommand>> {
        let mut cmds = Vec::new();

        if let Some(visible) = self.electric_field_visible {
            cmds.push(ModelCommand::SetLayerVisible {
                layer: Layer::ElectricField,
                visible,
            });
        }
        if let Some(visible) = self.electric_potential_visible {
            cmds.push(ModelCommand::SetLayerVisible {
                layer: Layer::ElectricPotential,
                visible,
            });
        }

        for c in &self.charges {
            cmds.push(ModelCommand::AddCharge {
                position: DVec2::new(c.x, c.y),
                charge: c.charge,
            });
        }
        if let Some(random) = &self.random {
            for c in scatter_charges(random.count, bounds, random.margin, random.seed) {
                cmds.push(ModelCommand::AddCharge {
                    position: c.position,
                    charge: c.charge(),
                });
            }
        }

        for s in &self.sensors {
            cmds.push(ModelCommand::AddSensor {
                kind: s.to_kind()?,
                position: DVec2::new(s.x, s.y),
            });
        }
        for seed in &self.electric_field_lines {
            cmds.push(ModelCommand::AddElectricFieldLine {
                position: DVec2::new(seed.x, seed.y),
            });
        }
        for seed in &self.equipotential_lines {
            cmds.push(ModelCommand::AddEquipotentialLine {
                position: DVec2::new(seed.x, seed.y),
            });
        }
        Ok(cmds)
    }

    pub fn apply(&self, model: &mut ChargesAndFieldsModel) -> Result<()> {
        let cmds = self.to_commands(model.bounds())?;
        info!(
            "applying scenario {} ({} commands)",
            self.name.as_deref().unwrap_or("<unnamed>"),
            cmds.len()
        );
        process_all(cmds, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    const DIPOLE: &str = r#"
        name = "dipole"
        electric_potential_visible = true

        [[charges]]
        x = -1.0
        y = 0.0
        charge = 1

        [[charges]]
        x = 1.0
        y = 0.0
        charge = -1

        [[sensors]]
        x = 0.0
        y = 1.5
        kind = "electricField"

        [[sensors]]
        x = 0.5
        y = 0.5
        kind = "potential"

        [[equipotential_lines]]
        x = -1.5
        y = 0.0

        [[electric_field_lines]]
        x = 0.0
        y = 0.5
    "#;

    #[test]
    fn dipole_scene_applies() {
        let scenario = Scenario::from_toml_str(DIPOLE).unwrap();
        let mut model = ChargesAndFieldsModel::new(EngineConfig::default()).unwrap();
        scenario.apply(&mut model).unwrap();

        assert_eq!(model.charges().len(), 2);
        assert_eq!(model.sensors().len(), 2);
        assert_eq!(model.equipotential_lines().len(), 1);
        assert_eq!(model.electric_field_lines().len(), 1);
        assert!(model.is_layer_visible(Layer::ElectricPotential));
        assert!(model.equipotential_lines()[0].electric_potential > 0.0);
    }

    #[test]
    fn empty_scene_is_valid() {
        let scenario = Scenario::from_toml_str("").unwrap();
        assert!(scenario.to_commands(&Bounds::default()).unwrap().is_empty());
    }

    #[test]
    fn unknown_sensor_kind_is_rejected() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[sensors]]
            x = 0.0
            y = 0.0
            kind = "thermometer"
            "#,
        )
        .unwrap();
        assert!(matches!(
            scenario.to_commands(&Bounds::default()),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn random_scatter_is_reproducible() {
        let scenario = Scenario::from_toml_str(
            r#"
            [random]
            count = 6
            seed = 42
            "#,
        )
        .unwrap();
        let bounds = Bounds::default();
        let a = scenario.to_commands(&bounds).unwrap();
        let b = scenario.to_commands(&bounds).unwrap();
        assert_eq!(a.len(), 6);
        assert_eq!(a, b);
    }
}
