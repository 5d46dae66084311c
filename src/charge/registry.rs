// charge/registry.rs
// Ordered collection of the charges currently in the play area

use ultraviolet::DVec2;

use super::types::{ChargeId, PointCharge};
use crate::error::{EngineError, Result};
use crate::utils::ensure_finite;

/// Owns every charge in the play area, in insertion order.
///
/// Ids are handed out from a per-registry counter and never reused, so an id held by a
/// caller stays meaningful (or becomes unknown) across removals of other charges.
#[derive(Clone, Debug)]
pub struct ChargeRegistry {
    charges: Vec<PointCharge>,
    next_id: ChargeId,
}

impl Default for ChargeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChargeRegistry {
    pub fn new() -> Self {
        Self {
            charges: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add_charge(&mut self, position: DVec2, charge: i32) -> Result<ChargeId> {
        let charge = PointCharge::new(position, charge)?;
        Ok(self.insert(charge))
    }

    /// Insert an already validated charge, assigning it a fresh id.
    pub fn insert(&mut self, charge: PointCharge) -> ChargeId {
        let id = self.next_id;
        self.next_id += 1;
        self.charges.push(charge.with_id(id));
        id
    }

    pub fn move_charge(&mut self, id: ChargeId, position: DVec2) -> Result<()> {
        ensure_finite(position)?;
        let charge = self
            .charges
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(EngineError::UnknownCharge(id))?;
        charge.position = position;
        Ok(())
    }

    pub fn remove_charge(&mut self, id: ChargeId) -> Result<PointCharge> {
        let idx = self
            .charges
            .iter()
            .position(|c| c.id() == id)
            .ok_or(EngineError::UnknownCharge(id))?;
        Ok(self.charges.remove(idx))
    }

    pub fn clear(&mut self) {
        self.charges.clear();
    }

    pub fn get(&self, id: ChargeId) -> Option<&PointCharge> {
        self.charges.iter().find(|c| c.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointCharge> {
        self.charges.iter()
    }

    pub fn as_slice(&self) -> &[PointCharge] {
        &self.charges
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// Sum of all charges, in units of the elementary nC.
    pub fn net_charge(&self) -> i64 {
        self.charges.iter().map(|c| c.charge() as i64).sum()
    }
}

impl<'a> IntoIterator for &'a ChargeRegistry {
    type Item = &'a PointCharge;
    type IntoIter = std::slice::Iter<'a, PointCharge>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
