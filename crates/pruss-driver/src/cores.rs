// SPDX-License-Identifier: AGPL-3.0-only

//! PRU core objects and the core reservation table
//!
//! Core objects are created by whoever brings up the PRU children of an
//! instance; the arbiter only stores and compares them. A [`CoreHandle`] is
//! a counted reference: while any clone exists the core object stays alive,
//! so a reserved core cannot disappear under its owner.

use crate::error::{PrussError, Result};
use pruss_chip::pru::{PruId, NUM_PRUS};
use std::sync::Arc;

/// A PRU core object (the remote processor bound to one PRU child node).
#[derive(Debug)]
pub struct PruCore {
    name: String,
    pru: PruId,
}

/// Counted reference to a core object. Compared by identity only.
pub type CoreHandle = Arc<PruCore>;

impl PruCore {
    /// Create a core object
    pub fn new(name: impl Into<String>, pru: PruId) -> CoreHandle {
        Arc::new(Self {
            name: name.into(),
            pru,
        })
    }

    /// Device name of the core
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Core slot the object was created for
    #[must_use]
    pub const fn pru(&self) -> PruId {
        self.pru
    }
}

/// Owner of every core slot of one instance.
#[derive(Debug, Default)]
pub(crate) struct CoreTable {
    slots: [Option<CoreHandle>; NUM_PRUS],
}

impl CoreTable {
    /// Store `core` in slot `pru` unless someone already holds it.
    pub(crate) fn claim(&mut self, pru: PruId, core: &CoreHandle) -> Result<()> {
        let slot = &mut self.slots[pru.index()];
        if slot.is_some() {
            return Err(PrussError::busy(format!("PRU core {pru}")));
        }
        *slot = Some(Arc::clone(core));
        Ok(())
    }

    /// Slot currently occupied by `core`
    pub(crate) fn slot_of(&self, core: &CoreHandle) -> Option<PruId> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, core)))
            .map(|index| PruId::ALL[index])
    }

    /// Take the slot held by `core`. The returned handle is the reference
    /// stored at claim time; dropping it releases that reference.
    pub(crate) fn release(&mut self, core: &CoreHandle) -> Option<(PruId, CoreHandle)> {
        let pru = self.slot_of(core)?;
        self.slots[pru.index()].take().map(|held| (pru, held))
    }

    pub(crate) fn holder(&self, pru: PruId) -> Option<&CoreHandle> {
        self.slots[pru.index()].as_ref()
    }

    pub(crate) fn any_held(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}
