// SPDX-License-Identifier: AGPL-3.0-only

//! Memory kinds of a PRU-ICSS instance.
//!
//! Each instance exposes up to six memory windows. They are described in the
//! hardware description by resource name; the shared data RAM is absent on
//! some variants (AM437x PRU-ICSS0).
//!
//! ```text
//! Kind        Resource   AM335x offset  Size     Purpose
//! ─────────── ────────── ────────────── ──────── ──────────────────────────
//! Dram0       dram0      0x00000        8 KB     PRU0 data RAM
//! Dram1       dram1      0x02000        8 KB     PRU1 data RAM
//! SharedRam2  shrdram2   0x10000        12 KB    Shared data RAM
//! Cfg         cfg        0x26000        8 KB     CFG register bank
//! Iep         iep        0x2e000        0x31c    Industrial Ethernet Peripheral
//! MiiRt       mii_rt     0x32000        0x58     MII real-time module
//! ```

use crate::OutOfRange;

/// Number of memory kinds.
pub const NUM_MEM_KINDS: usize = 6;

/// A memory window of a PRU-ICSS instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum MemKind {
    /// PRU0 data RAM.
    Dram0 = 0,
    /// PRU1 data RAM.
    Dram1 = 1,
    /// Shared data RAM (absent on some variants).
    SharedRam2 = 2,
    /// CFG register bank.
    Cfg = 3,
    /// Industrial Ethernet Peripheral (timer).
    Iep = 4,
    /// MII real-time module (protocol offload).
    MiiRt = 5,
}

impl MemKind {
    /// All kinds in table order.
    pub const ALL: [Self; NUM_MEM_KINDS] = [
        Self::Dram0,
        Self::Dram1,
        Self::SharedRam2,
        Self::Cfg,
        Self::Iep,
        Self::MiiRt,
    ];

    /// Slot index into per-instance tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Resource name in the hardware description.
    #[must_use]
    pub const fn resource_name(self) -> &'static str {
        match self {
            Self::Dram0 => "dram0",
            Self::Dram1 => "dram1",
            Self::SharedRam2 => "shrdram2",
            Self::Cfg => "cfg",
            Self::Iep => "iep",
            Self::MiiRt => "mii_rt",
        }
    }

    /// Look a kind up by resource name.
    #[must_use]
    pub fn from_resource_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.resource_name() == name)
    }
}

impl TryFrom<u32> for MemKind {
    type Error = OutOfRange;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(OutOfRange {
                raw,
                what: "memory kind",
            })
    }
}

impl std::fmt::Display for MemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// Window placement relative to the instance base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    /// Memory kind.
    pub kind: MemKind,
    /// Offset from the instance base.
    pub offset: u64,
    /// Window size in bytes.
    pub size: usize,
}

/// AM335x PRU-ICSS layout. The other supported SoCs use the same offsets
/// within their instance.
pub const AM335X_LAYOUT: [WindowLayout; NUM_MEM_KINDS] = [
    WindowLayout { kind: MemKind::Dram0, offset: 0x0_0000, size: 0x2000 },
    WindowLayout { kind: MemKind::Dram1, offset: 0x0_2000, size: 0x2000 },
    WindowLayout { kind: MemKind::SharedRam2, offset: 0x1_0000, size: 0x3000 },
    WindowLayout { kind: MemKind::Cfg, offset: 0x2_6000, size: 0x2000 },
    WindowLayout { kind: MemKind::Iep, offset: 0x2_e000, size: 0x31c },
    WindowLayout { kind: MemKind::MiiRt, offset: 0x3_2000, size: 0x58 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_round_trip() {
        for kind in MemKind::ALL {
            assert_eq!(MemKind::from_resource_name(kind.resource_name()), Some(kind));
        }
        assert_eq!(MemKind::from_resource_name("iram0"), None);
    }

    #[test]
    fn layout_is_in_table_order_and_non_overlapping() {
        for (i, w) in AM335X_LAYOUT.iter().enumerate() {
            assert_eq!(w.kind.index(), i);
        }
        let mut sorted = AM335X_LAYOUT;
        sorted.sort_by_key(|w| w.offset);
        for pair in sorted.windows(2) {
            assert!(pair[0].offset + pair[0].size as u64 <= pair[1].offset);
        }
    }

    #[test]
    fn raw_kind_past_the_table_is_rejected() {
        assert_eq!(MemKind::try_from(3), Ok(MemKind::Cfg));
        assert!(MemKind::try_from(6).is_err());
        assert!(MemKind::try_from(u32::MAX).is_err());
    }
}
