// SPDX-License-Identifier: AGPL-3.0-only

//! Serialized CFG register updates
//!
//! Every operation here is one read-modify-write of a CFG register taken
//! under the instance's configuration lock. The reservation tables are only
//! consulted (under their own lock, released before the CFG lock is taken)
//! to map a core object to its slot.

use crate::accessor::RegisterAccessor;
use crate::cores::CoreHandle;
use crate::error::{PrussError, Result};
use crate::pruss::Pruss;
use pruss_chip::cfg::{
    self, GpMuxSel, GpiMode, GPCFG_GPI_MODE_MASK, GPCFG_MUX_SEL_MASK, MII_RT_EVENT_EN,
    SPP_XFER_SHIFT_EN,
};
use pruss_chip::pru::PruId;

impl Pruss {
    /// Read a CFG register
    #[must_use]
    pub fn cfg_read(&self, reg: usize) -> u32 {
        let _guard = self.cfg_lock.lock();
        RegisterAccessor::new(self.cfg.as_ref()).read(reg)
    }

    /// Replace the `mask` bits of a CFG register with those of `set`,
    /// atomically with respect to every other CFG update of this instance.
    ///
    /// Returns the value written.
    pub fn cfg_update(&self, reg: usize, mask: u32, set: u32) -> u32 {
        let _guard = self.cfg_lock.lock();
        RegisterAccessor::new(self.cfg.as_ref()).update(reg, mask, set)
    }

    /// Set the GPI mode of the PRU backing `core`.
    ///
    /// `core` must currently occupy a core slot of this instance; it does not
    /// have to be reserved by the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `core` holds no slot of this instance.
    pub fn set_gpi_mode(&self, core: &CoreHandle, mode: GpiMode) -> Result<()> {
        let Some(pru) = self.core_slot(core) else {
            tracing::error!("pruss{}: PRU id not found for {}", self.id(), core.name());
            return Err(PrussError::invalid_argument(format!(
                "{} is not a PRU core of pruss{}",
                core.name(),
                self.id()
            )));
        };

        let value = self.cfg_update(cfg::gpcfg(pru), GPCFG_GPI_MODE_MASK, mode.field());
        tracing::debug!("pruss{}: {} GPI mode {:?} (gpcfg {:#010x})", self.id(), pru, mode, value);
        Ok(())
    }

    /// Set the GP mux select of a PRU core.
    pub fn set_gpmux(&self, pru: PruId, mux: GpMuxSel) {
        let value = self.cfg_update(cfg::gpcfg(pru), GPCFG_MUX_SEL_MASK, mux.field());
        tracing::debug!("pruss{}: {} GP mux {:?} (gpcfg {:#010x})", self.id(), pru, mux, value);
    }

    /// Enable or disable MII real-time events.
    pub fn miirt_enable(&self, enable: bool) {
        let set = if enable { MII_RT_EVENT_EN } else { 0 };
        self.cfg_update(cfg::MII_RT, MII_RT_EVENT_EN, set);
        tracing::debug!("pruss{}: MII_RT events {}", self.id(), on_off(enable));
    }

    /// Enable or disable the XIN/XOUT transfer-shift functionality.
    pub fn xfr_enable(&self, enable: bool) {
        let set = if enable { SPP_XFER_SHIFT_EN } else { 0 };
        self.cfg_update(cfg::SPP, SPP_XFER_SHIFT_EN, set);
        tracing::debug!("pruss{}: transfer shift {}", self.id(), on_off(enable));
    }
}

const fn on_off(enable: bool) -> &'static str {
    if enable {
        "enabled"
    } else {
        "disabled"
    }
}
