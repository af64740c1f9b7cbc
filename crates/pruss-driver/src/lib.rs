// SPDX-License-Identifier: AGPL-3.0-only

//! Resource arbiter for the TI PRU-ICSS subsystem.
//!
//! A PRU-ICSS instance carries two PRU cores and a handful of memory banks
//! that several independent clients want to use. This crate makes sure each
//! core and each bank has at most one owner at a time, keeps a registry of
//! the instances present on the machine, and serializes the CFG register
//! updates that clients issue for their cores.
//!
//! # Flow
//!
//! ```text
//! attach()          PrussRegistry::get()     Pruss::reserve_core()     Pruss::set_gpi_mode()
//!   map windows  →    resolve "pruss"     →    Pruss::reserve_region() →  Pruss::set_gpmux() ...
//!   register          dependency               (exclusive)                (CFG lock)
//! ```
//!
//! # Failure model
//!
//! Nothing retries internally. `Busy` and `NotReady` are transient (see
//! [`PrussError::is_transient`]); the caller decides whether and when to
//! try again. `NotFound` and `InvalidArgument` are permanent.
//!
//! # Quick start
//!
//! ```no_run
//! use pruss_driver::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let tree = DeviceTree::new();
//! let client = tree.add_node("ethernet@0", None);
//! let registry = PrussRegistry::new();
//! // ... attach() the platform devices ...
//! let pruss = registry.get(tree.as_ref(), client)?;
//! let core = pruss.reserve_core(PruId::Pru0)?;
//! let dram = pruss.reserve_region(MemKind::Dram0)?;
//! pruss.set_gpi_mode(&core, GpiMode::Parallel)?;
//!
//! pruss.release_region(dram.token())?;
//! pruss.release_core(&core);
//! registry.put(pruss);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod accessor;
pub mod attach;
mod config;
mod cores;
mod error;
pub mod mmio;
mod pruss;
mod region;
mod registry;
pub mod topology;

pub use cores::{CoreHandle, PruCore};
pub use accessor::RegisterAccessor;
pub use attach::{attach, detach, CorePopulator, PlatformDevice};
pub use error::{PrussError, Result};
pub use mmio::{DevMemMapper, MappedRegion, Mmio, RegionMapper, SoftwareMapper, SoftwareRegion};
pub use pruss::{InstanceConfig, Pruss};
pub use region::{MemRegion, MemResource, RegionToken, ReservedRegion};
pub use registry::PrussRegistry;
pub use topology::{DeviceTree, HwTopology, NodeId, PRUSS_PROPERTY};

/// Silicon model (re-exported from pruss-chip).
pub use pruss_chip as chip;
pub use pruss_chip::cfg::{GpMuxSel, GpiMode};
pub use pruss_chip::mem::MemKind;
pub use pruss_chip::pru::PruId;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        CoreHandle, DeviceTree, GpMuxSel, GpiMode, HwTopology, MemKind, NodeId, Pruss,
        PrussError, PrussRegistry, PruId, ReservedRegion, Result,
    };
}
