// SPDX-License-Identifier: AGPL-3.0-only

//! PRU-ICSS instance and its reservation protocol
//!
//! An instance owns its memory windows, a core reservation table, a memory
//! reservation table, and two independent locks:
//!
//! - the reservation lock guards both ownership tables;
//! - the configuration lock serializes CFG read-modify-write sequences.
//!
//! No operation holds both locks at once.

use crate::cores::{CoreHandle, CoreTable};
use crate::error::{PrussError, Result};
use crate::mmio::{Mmio, RegionMapper};
use crate::region::{MemRegion, MemResource, RegionOwners, RegionTable, RegionToken, ReservedRegion};
use crate::topology::{HwTopology, NodeId};
use parking_lot::Mutex;
use pruss_chip::cfg::CFG_SPAN;
use pruss_chip::mem::{MemKind, WindowLayout, NUM_MEM_KINDS};
use pruss_chip::pru::PruId;
use std::sync::Arc;

/// Configuration supplied when an instance is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Instance id, unique among registered instances of the same SoC
    pub id: u32,
    /// Node of the instance in the hardware description
    pub node: NodeId,
    /// Physical resources, indexed by [`MemKind`]; `None` for absent kinds
    pub resources: [Option<MemResource>; NUM_MEM_KINDS],
}

impl InstanceConfig {
    /// Configuration with no memory resources yet
    #[must_use]
    pub const fn new(id: u32, node: NodeId) -> Self {
        Self {
            id,
            node,
            resources: [None; NUM_MEM_KINDS],
        }
    }

    /// Add (or replace) the resource of one memory kind
    #[must_use]
    pub fn with_resource(mut self, kind: MemKind, physical_base: u64, size: usize) -> Self {
        self.resources[kind.index()] = Some(MemResource::new(physical_base, size));
        self
    }

    /// Populate resources from a window layout relative to `base`.
    ///
    /// The shared RAM entry is skipped when `has_no_sharedram` is set.
    #[must_use]
    pub fn with_layout(mut self, base: u64, layout: &[WindowLayout], has_no_sharedram: bool) -> Self {
        for window in layout {
            if has_no_sharedram && window.kind == MemKind::SharedRam2 {
                continue;
            }
            self = self.with_resource(window.kind, base + window.offset, window.size);
        }
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct Reservations {
    pub(crate) cores: CoreTable,
    pub(crate) regions: RegionOwners,
}

/// One PRU-ICSS instance
pub struct Pruss {
    id: u32,
    node: NodeId,
    topology: Arc<dyn HwTopology>,
    regions: RegionTable,
    pub(crate) cfg: Arc<dyn Mmio>,
    pub(crate) reservations: Mutex<Reservations>,
    pub(crate) cfg_lock: Mutex<()>,
}

impl std::fmt::Debug for Pruss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pruss")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("regions", &self.regions)
            .finish_non_exhaustive()
    }
}

impl Pruss {
    /// Map the configured resources and build the instance.
    ///
    /// The CFG window is mandatory and must cover the whole register map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the CFG resource is missing or too small,
    /// or the mapper's error if a window cannot be mapped.
    pub fn new(
        config: &InstanceConfig,
        topology: Arc<dyn HwTopology>,
        mapper: &dyn RegionMapper,
    ) -> Result<Arc<Self>> {
        match config.resources[MemKind::Cfg.index()] {
            Some(res) if res.size >= CFG_SPAN => {}
            Some(res) => {
                return Err(PrussError::invalid_argument(format!(
                    "cfg window of {:#x} bytes does not cover the register map ({CFG_SPAN:#x})",
                    res.size
                )))
            }
            None => return Err(PrussError::invalid_argument("instance has no cfg window")),
        }

        let regions = RegionTable::map(&config.resources, mapper)?;
        let cfg = regions
            .mmio(MemKind::Cfg)
            .cloned()
            .ok_or_else(|| PrussError::invalid_argument("instance has no cfg window"))?;

        Ok(Arc::new(Self {
            id: config.id,
            node: config.node,
            topology,
            regions,
            cfg,
            reservations: Mutex::new(Reservations::default()),
            cfg_lock: Mutex::new(()),
        }))
    }

    /// Instance id
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Node of the instance in the hardware description
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Descriptor of a memory window, without reserving it
    #[must_use]
    pub fn region(&self, kind: MemKind) -> Option<MemRegion> {
        self.regions.region(kind)
    }

    /// Reserve a PRU core for exclusive use.
    ///
    /// The core object is looked up through the child node labelled after
    /// `pru`. The returned handle keeps the core object alive; give it back
    /// with [`Pruss::release_core`].
    ///
    /// # Errors
    ///
    /// - `NotFound` if the instance has no child labelled for `pru`
    /// - `NotReady` if the child exists but its core has not registered yet
    /// - `Busy` if another client holds the core
    pub fn reserve_core(&self, pru: PruId) -> Result<CoreHandle> {
        let child = self
            .topology
            .child_by_label(self.node, pru.label())
            .ok_or_else(|| {
                PrussError::not_found(format!("pruss{} has no {} child", self.id, pru.label()))
            })?;

        // probably the core is not yet probed
        let core = self.topology.bound_core(child).ok_or_else(|| {
            PrussError::not_ready(format!("pruss{} {} core not registered", self.id, pru))
        })?;

        self.reservations.lock().cores.claim(pru, &core)?;

        tracing::debug!("pruss{}: {} reserved ({})", self.id, pru, core.name());
        Ok(core)
    }

    /// Release a reserved core.
    ///
    /// A handle that holds no slot of this instance is ignored, so cleanup
    /// paths may call this unconditionally.
    pub fn release_core(&self, core: &CoreHandle) {
        let released = self.reservations.lock().cores.release(core);

        match released {
            Some((pru, held)) => {
                tracing::debug!("pruss{}: {} released ({})", self.id, pru, held.name());
            }
            None => {
                tracing::trace!("pruss{}: {} holds no core slot", self.id, core.name());
            }
        }
    }

    /// Current owner of a core slot
    #[must_use]
    pub fn core_holder(&self, pru: PruId) -> Option<CoreHandle> {
        self.reservations.lock().cores.holder(pru).cloned()
    }

    /// Slot occupied by `core`, if any
    #[must_use]
    pub fn core_slot(&self, core: &CoreHandle) -> Option<PruId> {
        self.reservations.lock().cores.slot_of(core)
    }

    /// Reserve a memory window for exclusive use.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if this instance has no window of `kind`
    /// - `Busy` if another client holds it
    pub fn reserve_region(&self, kind: MemKind) -> Result<ReservedRegion> {
        let region = self.regions.region(kind).ok_or_else(|| {
            PrussError::invalid_argument(format!("pruss{} has no {} region", self.id, kind))
        })?;

        let token = self.reservations.lock().regions.claim(kind)?;

        tracing::debug!("pruss{}: region {} reserved (token {})", self.id, kind, token.id());
        Ok(ReservedRegion::new(region, token))
    }

    /// Release a memory window reservation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `token` holds no window of this
    /// instance (double release, foreign token).
    pub fn release_region(&self, token: RegionToken) -> Result<()> {
        let released = self.reservations.lock().regions.release(token);

        match released {
            Ok(kind) => {
                tracing::debug!("pruss{}: region {} released", self.id, kind);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("pruss{}: {e}", self.id);
                Err(e)
            }
        }
    }

    /// Token currently holding a memory window
    #[must_use]
    pub fn region_holder(&self, kind: MemKind) -> Option<RegionToken> {
        self.reservations.lock().regions.holder(kind)
    }

    /// Whether any core or memory window is reserved
    #[must_use]
    pub fn has_reservations(&self) -> bool {
        let reservations = self.reservations.lock();
        reservations.cores.any_held() || reservations.regions.any_held()
    }
}
