// SPDX-License-Identifier: AGPL-3.0-only

//! CFG register map of the PRU-ICSS.
//!
//! Offsets are relative to the start of the CFG window
//! ([`MemKind::Cfg`](crate::mem::MemKind::Cfg)).
//!
//! ```text
//! 0x00  REVID    revision
//! 0x04  SYSCFG   standby / idle control
//! 0x08  GPCFG0   PRU0 GPI mode [1:0], GP mux select [29:26]
//! 0x0c  GPCFG1   PRU1, same layout
//! 0x10  CGR      clock gating
//! 0x2c  MII_RT   MII real-time event enable [0]
//! 0x34  SPP      scratch pad priority, XIN/XOUT shift enable [1]
//! 0x40  PIN_MX   pin mux
//! ```

use crate::pru::PruId;
use crate::OutOfRange;

// ── Register offsets ─────────────────────────────────────────────────────────

/// Revision register.
pub const REVID: usize = 0x00;
/// System configuration register.
pub const SYSCFG: usize = 0x04;
/// General purpose configuration register for PRU0.
pub const GPCFG0: usize = 0x08;
/// General purpose configuration register for PRU1.
pub const GPCFG1: usize = 0x0C;
/// Clock gating register.
pub const CGR: usize = 0x10;
/// IRQ status raw parity.
pub const ISRP: usize = 0x14;
/// IRQ status parity.
pub const ISP: usize = 0x18;
/// IRQ enable set parity.
pub const IESP: usize = 0x1C;
/// IRQ enable clear parity.
pub const IECP: usize = 0x20;
/// SCR priority.
pub const SCRP: usize = 0x24;
/// PRU master OCP address extension.
pub const PMAO: usize = 0x28;
/// MII real-time event control.
pub const MII_RT: usize = 0x2C;
/// IEP clock source.
pub const IEPCLK: usize = 0x30;
/// Scratch pad priority and configuration.
pub const SPP: usize = 0x34;
/// Pin mux select.
pub const PIN_MX: usize = 0x40;

/// Bytes of CFG space that must be mapped for every register above.
pub const CFG_SPAN: usize = PIN_MX + 4;

/// GPCFG register of a given PRU core.
#[must_use]
pub const fn gpcfg(pru: PruId) -> usize {
    GPCFG0 + 4 * pru.index()
}

// ── GPCFG bit fields ─────────────────────────────────────────────────────────

/// GPI mode field shift.
pub const GPCFG_GPI_MODE_SHIFT: u32 = 0;
/// GPI mode field mask, bits 1:0.
pub const GPCFG_GPI_MODE_MASK: u32 = 0x3 << GPCFG_GPI_MODE_SHIFT;
/// GP mux select field shift.
pub const GPCFG_MUX_SEL_SHIFT: u32 = 26;
/// GP mux select field mask, bits 29:26.
pub const GPCFG_MUX_SEL_MASK: u32 = 0xF << GPCFG_MUX_SEL_SHIFT;

// ── MII_RT / SPP bits ────────────────────────────────────────────────────────

/// MII real-time event enable.
pub const MII_RT_EVENT_EN: u32 = 1 << 0;
/// PRU1 pad high-priority enable.
pub const SPP_PRU1_PAD_HP_EN: u32 = 1 << 0;
/// XIN/XOUT shift functionality enable.
pub const SPP_XFER_SHIFT_EN: u32 = 1 << 1;

// ── Field values ─────────────────────────────────────────────────────────────

/// GPI (general purpose input) mode of a PRU core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GpiMode {
    /// Direct input.
    Direct = 0,
    /// 16-bit parallel capture.
    Parallel = 1,
    /// 28-bit shift in.
    Shift28Bit = 2,
    /// MII_RT input.
    Mii = 3,
}

impl GpiMode {
    /// Field value already shifted into GPCFG position.
    #[must_use]
    pub const fn field(self) -> u32 {
        (self as u32) << GPCFG_GPI_MODE_SHIFT
    }
}

impl TryFrom<u32> for GpiMode {
    type Error = OutOfRange;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Direct),
            1 => Ok(Self::Parallel),
            2 => Ok(Self::Shift28Bit),
            3 => Ok(Self::Mii),
            _ => Err(OutOfRange {
                raw,
                what: "GPI mode",
            }),
        }
    }
}

/// GP mux selection of a PRU core's pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GpMuxSel {
    /// General purpose I/O.
    Gp = 0,
    /// EnDat encoder interface.
    EnDat = 1,
    /// MII2.
    Mii2 = 2,
    /// Sigma-delta.
    Sd = 3,
}

impl GpMuxSel {
    /// Field value already shifted into GPCFG position.
    #[must_use]
    pub const fn field(self) -> u32 {
        (self as u32) << GPCFG_MUX_SEL_SHIFT
    }
}

impl TryFrom<u32> for GpMuxSel {
    type Error = OutOfRange;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Gp),
            1 => Ok(Self::EnDat),
            2 => Ok(Self::Mii2),
            3 => Ok(Self::Sd),
            _ => Err(OutOfRange {
                raw,
                what: "GP mux select",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpcfg_is_per_core_word() {
        assert_eq!(gpcfg(PruId::Pru0), GPCFG0);
        assert_eq!(gpcfg(PruId::Pru1), GPCFG1);
    }

    #[test]
    fn gpcfg_fields_do_not_overlap() {
        assert_eq!(GPCFG_GPI_MODE_MASK & GPCFG_MUX_SEL_MASK, 0);
        assert_eq!(GPCFG_MUX_SEL_MASK, 0x3C00_0000);
    }

    #[test]
    fn field_values_stay_inside_their_masks() {
        for raw in 0..4 {
            let mode = GpiMode::try_from(raw).unwrap();
            assert_eq!(mode.field() & !GPCFG_GPI_MODE_MASK, 0);
            let mux = GpMuxSel::try_from(raw).unwrap();
            assert_eq!(mux.field() & !GPCFG_MUX_SEL_MASK, 0);
        }
        assert!(GpiMode::try_from(4).is_err());
        assert!(GpMuxSel::try_from(4).is_err());
    }

    #[test]
    fn control_bits_live_in_distinct_registers() {
        assert_ne!(MII_RT, SPP);
        assert!(SPP < CFG_SPAN);
    }
}
