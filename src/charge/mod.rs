pub mod registry;
pub mod types;

pub use registry::ChargeRegistry;
pub use types::{ChargeId, PointCharge};
