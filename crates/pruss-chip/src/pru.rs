// SPDX-License-Identifier: AGPL-3.0-only

//! PRU core identifiers.
//!
//! Every PRU-ICSS instance carries two PRU cores. Their child nodes in the
//! hardware description are tagged with the labels `pru0` and `pru1`.

use crate::OutOfRange;

/// Number of PRU cores per instance.
pub const NUM_PRUS: usize = 2;

/// Logical PRU core slot within an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum PruId {
    /// First PRU core.
    Pru0 = 0,
    /// Second PRU core.
    Pru1 = 1,
}

impl PruId {
    /// All core slots in index order.
    pub const ALL: [Self; NUM_PRUS] = [Self::Pru0, Self::Pru1];

    /// Slot index into per-core tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Label of the child node that carries this core.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pru0 => "pru0",
            Self::Pru1 => "pru1",
        }
    }
}

impl TryFrom<u32> for PruId {
    type Error = OutOfRange;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Pru0),
            1 => Ok(Self::Pru1),
            _ => Err(OutOfRange {
                raw,
                what: "PRU id",
            }),
        }
    }
}

impl std::fmt::Display for PruId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
