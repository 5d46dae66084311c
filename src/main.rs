use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use ultraviolet::DVec2;

use charges_fields::color::{field_color, potential_color, ColorProfile, ProfileName};
use charges_fields::config::{EngineConfig, MAX_EFIELD_MAGNITUDE, MAX_ELECTRIC_POTENTIAL};
use charges_fields::io::{load_state, restore, save_state};
use charges_fields::model::ChargesAndFieldsModel;
use charges_fields::profiler;
use charges_fields::scenario::Scenario;
use charges_fields::sensor::{Layer, SensorKind};

#[derive(Parser)]
#[command(name = "charges-fields", author, version, about, long_about = None)]
struct Args {
    /// Engine configuration (TOML). Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a scene from a scenario file and report its sensors and lines.
    Run {
        #[arg(long, value_name = "FILE")]
        scenario: PathBuf,
        /// Write a snapshot of the resulting scene (gzip when the name ends in .gz).
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Evaluate the field and potential of a scenario at one point.
    Probe {
        #[arg(long, value_name = "FILE")]
        scenario: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(long, default_value = "default")]
        profile: String,
    },
    /// Rebuild a scene from a saved snapshot and report it.
    Restore {
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Run { scenario, save } => {
            let model = build_scene(&scenario, config)?;
            summarize(&model);
            if let Some(path) = save {
                save_state(&path, &model)
                    .with_context(|| format!("failed to save snapshot to {}", path.display()))?;
            }
        }
        Commands::Probe {
            scenario,
            x,
            y,
            profile,
        } => {
            let profile = match profile.as_str() {
                "default" => ColorProfile::from_name(ProfileName::Default),
                "projector" => ColorProfile::from_name(ProfileName::Projector),
                other => bail!("unknown colour profile '{}'", other),
            };
            let model = build_scene(&scenario, config)?;
            let point = DVec2::new(x, y);
            let e = model.electric_field(point);
            let v = model.electric_potential(point);
            let vc = potential_color(v, MAX_ELECTRIC_POTENTIAL, &profile);
            let ec = field_color(e.mag(), MAX_EFIELD_MAGNITUDE, &profile);
            println!("point      ({:.4}, {:.4})", x, y);
            println!("potential  {:.6} V", v);
            println!(
                "field      ({:.6}, {:.6}) V/m  |E| = {:.6} V/m",
                e.x,
                e.y,
                e.mag()
            );
            println!(
                "colours    potential #{:02x}{:02x}{:02x}  field #{:02x}{:02x}{:02x}",
                vc.red, vc.green, vc.blue, ec.red, ec.green, ec.blue
            );
        }
        Commands::Restore { snapshot } => {
            let snap = load_state(&snapshot)
                .with_context(|| format!("failed to read snapshot {}", snapshot.display()))?;
            info!(
                "loaded snapshot v{} with {} entities",
                snap.version,
                snap.entities.len()
            );
            let model = restore(&snap, config).context("failed to restore snapshot")?;
            summarize(&model);
        }
    }

    profiler::report();
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            EngineConfig::load_from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn build_scene(path: &Path, config: EngineConfig) -> anyhow::Result<ChargesAndFieldsModel> {
    let scenario = Scenario::load_from_file(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    let mut model = ChargesAndFieldsModel::new(config)?;
    scenario
        .apply(&mut model)
        .with_context(|| format!("failed to apply scenario {}", path.display()))?;
    Ok(model)
}

fn summarize(model: &ChargesAndFieldsModel) {
    info!(
        "{} charges (net {}), revision {}",
        model.charges().len(),
        model.charges().net_charge(),
        model.revision()
    );
    for layer in Layer::ALL {
        let grid = model.grid(layer);
        let (cols, rows) = grid.dimensions();
        info!(
            "{} layer: {}x{} sensors, {}",
            layer,
            cols,
            rows,
            if model.is_layer_visible(layer) {
                "visible"
            } else {
                "hidden"
            }
        );
    }
    for s in model.sensors().iter() {
        match s.kind {
            SensorKind::ElectricField => info!(
                "field sensor {} at ({:.3}, {:.3}): |E| = {:.4} V/m",
                s.id,
                s.position.x,
                s.position.y,
                s.electric_field.mag()
            ),
            SensorKind::ElectricPotential => info!(
                "potential sensor {} at ({:.3}, {:.3}): V = {:.4} V",
                s.id, s.position.x, s.position.y, s.electric_potential
            ),
        }
    }
    for line in model.equipotential_lines() {
        info!(
            "equipotential {} at {:.4} V: {} points, {}",
            line.id,
            line.electric_potential,
            line.positions.len(),
            if line.closed { "closed" } else { "open" }
        );
    }
    for line in model.electric_field_lines() {
        info!(
            "field line {}: {} points ({} / {})",
            line.id,
            line.positions.len(),
            line.backward,
            line.forward
        );
    }
}
