use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use ultraviolet::DVec2;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::model::ChargesAndFieldsModel;
use crate::profile_scope;
use crate::sensor::{Layer, SensorKind};

pub const SNAPSHOT_VERSION: u32 = 1;

const KNOWN_KINDS: [&str; 5] = [
    "charge",
    "electricFieldSensor",
    "electricPotentialSensor",
    "equipotentialLine",
    "electricFieldLine",
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl From<DVec2> for Position {
    fn from(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Position> for DVec2 {
    fn from(p: Position) -> Self {
        DVec2::new(p.x, p.y)
    }
}

/// Essential state of one entity. Traced polylines are not stored: lines persist their seed
/// (and the potential they were traced at) and are regenerated on restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntitySnapshot {
    Charge {
        charge: i32,
        position: Position,
    },
    ElectricFieldSensor {
        position: Position,
    },
    ElectricPotentialSensor {
        position: Position,
    },
    EquipotentialLine {
        position: Position,
        #[serde(rename = "electricPotential")]
        electric_potential: f64,
    },
    ElectricFieldLine {
        position: Position,
    },
}

impl EntitySnapshot {
    /// Decode one entity, failing loudly on kinds this version does not know about.
    pub fn from_value(value: Value) -> Result<Self> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MalformedSnapshot("entity without a `kind` tag".into()))?;
        if !KNOWN_KINDS.contains(&kind) {
            return Err(EngineError::UnknownEntityKind(kind.to_string()));
        }
        serde_json::from_value(value).map_err(|e| EngineError::MalformedSnapshot(e.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerVisibility {
    pub electric_field: bool,
    pub electric_potential: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            electric_field: true,
            electric_potential: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub version: u32,
    pub layers: LayerVisibility,
    pub entities: Vec<EntitySnapshot>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    version: u32,
    #[serde(default)]
    layers: LayerVisibility,
    #[serde(default)]
    entities: Vec<Value>,
}

impl ModelSnapshot {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_slice(bytes)?;
        if raw.version != SNAPSHOT_VERSION {
            return Err(EngineError::UnsupportedVersion(raw.version));
        }
        let entities = raw
            .entities
            .into_iter()
            .map(EntitySnapshot::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version: raw.version,
            layers: raw.layers,
            entities,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Capture the persistent state of `model`: charges, sensors, line seeds and layer toggles.
pub fn capture(model: &ChargesAndFieldsModel) -> ModelSnapshot {
    let mut entities = Vec::new();
    for c in model.charges() {
        entities.push(EntitySnapshot::Charge {
            charge: c.charge(),
            position: c.position.into(),
        });
    }
    for s in model.sensors().iter() {
        let position = s.position.into();
        entities.push(match s.kind {
            SensorKind::ElectricField => EntitySnapshot::ElectricFieldSensor { position },
            SensorKind::ElectricPotential => EntitySnapshot::ElectricPotentialSensor { position },
        });
    }
    for line in model.equipotential_lines() {
        entities.push(EntitySnapshot::EquipotentialLine {
            position: line.seed.into(),
            electric_potential: line.electric_potential,
        });
    }
    for line in model.electric_field_lines() {
        entities.push(EntitySnapshot::ElectricFieldLine {
            position: line.seed.into(),
        });
    }

    ModelSnapshot {
        version: SNAPSHOT_VERSION,
        layers: LayerVisibility {
            electric_field: model.is_layer_visible(Layer::ElectricField),
            electric_potential: model.is_layer_visible(Layer::ElectricPotential),
        },
        entities,
    }
}

/// Rebuild a model from a snapshot. Charges are placed before any line is regenerated, so
/// entity order within the snapshot does not matter.
pub fn restore(snapshot: &ModelSnapshot, config: EngineConfig) -> Result<ChargesAndFieldsModel> {
    profile_scope!("restore");
    let mut model = ChargesAndFieldsModel::new(config)?;
    model.set_layer_visible(Layer::ElectricField, snapshot.layers.electric_field);
    model.set_layer_visible(Layer::ElectricPotential, snapshot.layers.electric_potential);

    for entity in &snapshot.entities {
        if let EntitySnapshot::Charge { charge, position } = entity {
            model.add_charge((*position).into(), *charge)?;
        }
    }

    for entity in &snapshot.entities {
        match entity {
            EntitySnapshot::Charge { .. } => {}
            EntitySnapshot::ElectricFieldSensor { position } => {
                model.add_sensor(SensorKind::ElectricField, (*position).into())?;
            }
            EntitySnapshot::ElectricPotentialSensor { position } => {
                model.add_sensor(SensorKind::ElectricPotential, (*position).into())?;
            }
            EntitySnapshot::EquipotentialLine {
                position,
                electric_potential,
            } => {
                let tolerance = model.config().tracer.potential_tolerance
                    * electric_potential.abs().max(1.0);
                let line = model.add_equipotential_line((*position).into())?;
                if (line.electric_potential - electric_potential).abs() > tolerance {
                    warn!(
                        "restored equipotential at ({:.3}, {:.3}) traced at {:.4} V, snapshot said {:.4} V",
                        position.x, position.y, line.electric_potential, electric_potential
                    );
                }
            }
            EntitySnapshot::ElectricFieldLine { position } => {
                model.add_electric_field_line((*position).into())?;
            }
        }
    }
    Ok(model)
}

/// Write a snapshot of `model` as JSON, gzip-compressed when the path ends in `.gz`.
///
/// The file is written next to the target first and renamed into place.
pub fn save_state<P: AsRef<Path>>(path: P, model: &ChargesAndFieldsModel) -> Result<()> {
    profile_scope!("save_state");
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let snapshot = capture(model);
    let use_gzip = path.extension().is_some_and(|e| e == "gz");

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        if use_gzip {
            let mut encoder = GzEncoder::new(writer, Compression::fast());
            serde_json::to_writer(&mut encoder, &snapshot)?;
            let mut writer = encoder.finish()?;
            writer.flush()?;
        } else {
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
        }
    }
    std::fs::rename(&tmp_path, path)?;
    info!(
        "saved {} entities to {}",
        snapshot.entities.len(),
        path.display()
    );
    Ok(())
}

/// Read a snapshot written by [`save_state`]. Gzip is detected from the magic bytes.
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<ModelSnapshot> {
    profile_scope!("load_state");
    let data = std::fs::read(path.as_ref())?;
    match maybe_decompress_gzip(&data)? {
        Some(decoded) => ModelSnapshot::from_json_slice(&decoded),
        None => ModelSnapshot::from_json_slice(&data),
    }
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }
    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}
