// SPDX-License-Identifier: AGPL-3.0-only

//! Memory region table
//!
//! Each instance owns a fixed table of memory windows indexed by
//! [`MemKind`]. Descriptors are immutable once the instance exists; clients
//! receive value copies. Exclusive use of a window is tracked by
//! [`RegionOwners`], which the instance guards with its reservation lock.

use crate::error::{PrussError, Result};
use crate::mmio::{Mmio, RegionMapper};
use pruss_chip::mem::{MemKind, NUM_MEM_KINDS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Physical placement of a memory resource, as handed over at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemResource {
    /// Physical (bus) address
    pub physical_base: u64,
    /// Size in bytes
    pub size: usize,
}

impl MemResource {
    /// Create a resource description
    #[must_use]
    pub const fn new(physical_base: u64, size: usize) -> Self {
        Self {
            physical_base,
            size,
        }
    }
}

/// Descriptor of one memory window.
///
/// A copy handed to a client is independent of the table. `mapped_base` is
/// only meaningful while the instance that produced it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRegion {
    /// Memory kind
    pub kind: MemKind,
    /// Physical (bus) address
    pub physical_base: u64,
    /// Address of the window in this process
    pub mapped_base: usize,
    /// Size in bytes
    pub size: usize,
}

/// Identity of one memory-region reservation.
///
/// Tokens are never reused within a process, so a token from an earlier
/// reservation or from another instance never matches a live slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionToken(u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl RegionToken {
    fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value, for logging
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A granted memory-region reservation: the descriptor copy and its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedRegion {
    region: MemRegion,
    token: RegionToken,
}

impl ReservedRegion {
    /// Descriptor copy of the reserved window
    #[must_use]
    pub const fn region(&self) -> &MemRegion {
        &self.region
    }

    /// Token to hand back on release
    #[must_use]
    pub const fn token(&self) -> RegionToken {
        self.token
    }
}

struct RegionWindow {
    region: MemRegion,
    mmio: Arc<dyn Mmio>,
}

/// Immutable table of an instance's memory windows.
pub(crate) struct RegionTable {
    windows: [Option<RegionWindow>; NUM_MEM_KINDS],
}

impl std::fmt::Debug for RegionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.windows.iter().flatten().map(|w| &w.region))
            .finish()
    }
}

impl RegionTable {
    /// Map every present resource. Absent kinds stay empty.
    pub(crate) fn map(
        resources: &[Option<MemResource>; NUM_MEM_KINDS],
        mapper: &dyn RegionMapper,
    ) -> Result<Self> {
        let mut windows: [Option<RegionWindow>; NUM_MEM_KINDS] = Default::default();

        for kind in MemKind::ALL {
            let Some(resource) = resources[kind.index()] else {
                continue;
            };

            let mmio: Arc<dyn Mmio> = Arc::from(mapper.map(kind, &resource)?);
            let region = MemRegion {
                kind,
                physical_base: resource.physical_base,
                mapped_base: mmio.mapped_base(),
                size: resource.size,
            };

            tracing::debug!(
                "memory {:>8}: pa {:#010x} size {:#x} va {:#x}",
                kind.resource_name(),
                region.physical_base,
                region.size,
                region.mapped_base
            );

            windows[kind.index()] = Some(RegionWindow { region, mmio });
        }

        Ok(Self { windows })
    }

    /// Descriptor of a present window
    pub(crate) fn region(&self, kind: MemKind) -> Option<MemRegion> {
        self.windows[kind.index()].as_ref().map(|w| w.region)
    }

    /// Register access to a present window
    pub(crate) fn mmio(&self, kind: MemKind) -> Option<&Arc<dyn Mmio>> {
        self.windows[kind.index()].as_ref().map(|w| &w.mmio)
    }
}

/// Reservation state of every memory slot.
#[derive(Debug, Default)]
pub(crate) struct RegionOwners {
    slots: [Option<RegionToken>; NUM_MEM_KINDS],
}

impl RegionOwners {
    /// Mark `kind` reserved and return the new token.
    pub(crate) fn claim(&mut self, kind: MemKind) -> Result<RegionToken> {
        let slot = &mut self.slots[kind.index()];
        if slot.is_some() {
            return Err(PrussError::busy(format!("memory region {kind}")));
        }
        let token = RegionToken::next();
        *slot = Some(token);
        Ok(token)
    }

    /// Clear the slot held by `token`, reporting which kind it was.
    pub(crate) fn release(&mut self, token: RegionToken) -> Result<MemKind> {
        let index = self
            .slots
            .iter()
            .position(|slot| *slot == Some(token))
            .ok_or_else(|| {
                PrussError::invalid_argument(format!(
                    "region token {} does not hold any memory region",
                    token.id()
                ))
            })?;
        self.slots[index] = None;
        Ok(MemKind::ALL[index])
    }

    pub(crate) fn holder(&self, kind: MemKind) -> Option<RegionToken> {
        self.slots[kind.index()]
    }

    pub(crate) fn any_held(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}

impl ReservedRegion {
    pub(crate) const fn new(region: MemRegion, token: RegionToken) -> Self {
        Self { region, token }
    }
}
