use thiserror::Error;

use crate::charge::ChargeId;
use crate::sensor::SensorId;

/// Errors surfaced by the field engine to its immediate caller.
///
/// Numerical edge cases inside the evaluator never show up here: coincident points are
/// skipped per term and tracer runaway is reported as a [`crate::trace::Termination`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("point charges must carry a non-zero charge")]
    ZeroCharge,

    #[error("position ({x}, {y}) is not finite")]
    InvalidPosition { x: f64, y: f64 },

    #[error("no charge with id {0}")]
    UnknownCharge(ChargeId),

    #[error("no sensor with id {0}")]
    UnknownSensor(SensorId),

    #[error("cannot trace a line without any charges in the play area")]
    NoCharges,

    #[error("seed ({x}, {y}) lies outside the simulation bounds")]
    SeedOutOfBounds { x: f64, y: f64 },

    #[error("seed ({x}, {y}) coincides with a charge")]
    SeedAtCharge { x: f64, y: f64 },

    #[error("electric field vanishes at ({x}, {y}); line direction is undefined")]
    VanishingField { x: f64, y: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown entity kind `{0}` in snapshot")]
    UnknownEntityKind(String),

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
