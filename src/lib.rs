pub mod charge;
pub mod color;
pub mod commands;
pub mod config;
pub mod equipotential;
pub mod error;
pub mod events;
pub mod field;
pub mod field_line;
pub mod io;
pub mod model;
pub mod profiler;
pub mod scenario;
pub mod sensor;
pub mod trace;
pub mod utils;

pub use charge::{ChargeId, ChargeRegistry, PointCharge};
pub use config::EngineConfig;
pub use equipotential::{trace_equipotential, EquipotentialLine, EquipotentialTracer};
pub use error::{EngineError, Result};
pub use field::{FieldSample, FieldSource};
pub use model::ChargesAndFieldsModel;
pub use trace::Termination;

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
