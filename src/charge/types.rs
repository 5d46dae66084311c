// charge/types.rs
// Point charge value type

use ultraviolet::DVec2;

use crate::error::{EngineError, Result};
use crate::utils::ensure_finite;

pub type ChargeId = u64;

/// An idealized source of field and potential with no spatial extent.
///
/// `charge` is a signed multiple of the unit charge (1 nC) and is never zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCharge {
    pub position: DVec2,
    id: ChargeId,
    charge: i32,
}

impl PointCharge {
    pub fn new(position: DVec2, charge: i32) -> Result<Self> {
        if charge == 0 {
            return Err(EngineError::ZeroCharge);
        }
        ensure_finite(position)?;
        Ok(Self {
            position,
            id: 0,
            charge,
        })
    }

    pub fn positive(position: DVec2) -> Self {
        Self {
            position,
            id: 0,
            charge: 1,
        }
    }

    pub fn negative(position: DVec2) -> Self {
        Self {
            position,
            id: 0,
            charge: -1,
        }
    }

    /// Registry-assigned id. Charges built outside a registry report 0.
    pub fn id(&self) -> ChargeId {
        self.id
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub(crate) fn with_id(mut self, id: ChargeId) -> Self {
        self.id = id;
        self
    }
}
