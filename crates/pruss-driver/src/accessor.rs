// SPDX-License-Identifier: AGPL-3.0-only

//! Register read / modify / write over a mapped window
//!
//! Stateless: it borrows a window and nothing else. Callers that need the
//! read-modify-write to be atomic with respect to other writers hold their
//! own lock around [`RegisterAccessor::update`].

use crate::mmio::Mmio;

/// Register helper over one window
#[derive(Debug, Clone, Copy)]
pub struct RegisterAccessor<'a> {
    window: &'a dyn Mmio,
}

impl<'a> RegisterAccessor<'a> {
    /// Borrow a window
    #[must_use]
    pub const fn new(window: &'a dyn Mmio) -> Self {
        Self { window }
    }

    /// Read the register at `reg`
    #[must_use]
    pub fn read(&self, reg: usize) -> u32 {
        self.window.read32(reg)
    }

    /// Write the register at `reg`
    pub fn write(&self, reg: usize, value: u32) {
        self.window.write32(reg, value);
    }

    /// Replace the bits of `mask` with the matching bits of `set`.
    ///
    /// Bits of `set` outside `mask` are ignored. Returns the value written.
    pub fn update(&self, reg: usize, mask: u32, set: u32) -> u32 {
        let old = self.read(reg);
        let new = (old & !mask) | (set & mask);
        self.write(reg, new);
        tracing::trace!("reg {reg:#06x}: {old:#010x} -> {new:#010x}");
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmio::SoftwareRegion;

    #[test]
    fn update_touches_only_masked_bits() {
        let window = SoftwareRegion::new(0x10);
        let regs = RegisterAccessor::new(&window);
        regs.write(0x8, 0xffff_0000);

        let written = regs.update(0x8, 0x0000_00f0, 0x0000_0050);
        assert_eq!(written, 0xffff_0050);
        assert_eq!(regs.read(0x8), 0xffff_0050);
    }

    #[test]
    fn set_bits_outside_mask_are_dropped() {
        let window = SoftwareRegion::new(0x10);
        let regs = RegisterAccessor::new(&window);
        regs.update(0x4, 0x1, 0xffff_ffff);
        assert_eq!(regs.read(0x4), 0x1);
        regs.update(0x4, 0x1, 0);
        assert_eq!(regs.read(0x4), 0);
    }
}
