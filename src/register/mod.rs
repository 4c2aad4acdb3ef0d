//! Register access for one SGDMA channel
//!
//! The ring never touches registers directly. Every read and write goes
//! through a [`RegisterPort`], so the same ring code drives real hardware
//! (via [`MmioPort`]) and the simulated register file used in tests.

pub mod sgdma;

/// Channel registers used by the ring handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Engine status and configuration
    Status,
    /// Engine control (sequence gate)
    Control,
    /// Current descriptor physical address
    DescriptorAddress,
    /// Interrupt status (write 1 to clear)
    InterruptStatus,
    /// Interrupt enable
    InterruptEnable,
    /// Software control (run/stop handshake, coalescing)
    SgControl,
}

impl Register {
    /// Byte offset of the register from the channel base.
    pub const fn offset(self) -> usize {
        match self {
            Register::Status => sgdma::STATUS_OFFSET,
            Register::Control => sgdma::CONTROL_OFFSET,
            Register::DescriptorAddress => sgdma::DESC_ADDR_OFFSET,
            Register::InterruptStatus => sgdma::INT_STATUS_OFFSET,
            Register::InterruptEnable => sgdma::INT_ENABLE_OFFSET,
            Register::SgControl => sgdma::SG_CONTROL_OFFSET,
        }
    }
}

/// Read/write access to a channel's registers.
pub trait RegisterPort {
    /// Read a register.
    fn read(&self, reg: Register) -> u32;

    /// Write a register.
    fn write(&mut self, reg: Register, value: u32);

    /// Modify a register using a read-modify-write operation.
    #[inline]
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set bits in a register (read-modify-write).
    #[inline]
    fn set_bits(&mut self, reg: Register, bits: u32) {
        self.modify(reg, |v| v | bits);
    }

    /// Clear bits in a register (read-modify-write).
    #[inline]
    fn clear_bits(&mut self, reg: Register, bits: u32) {
        self.modify(reg, |v| v & !bits);
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value);
    }
}

// =============================================================================
// Memory-mapped port
// =============================================================================

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    // SAFETY: caller guarantees address validity
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    // SAFETY: caller guarantees address validity
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Volatile register port over a memory-mapped channel block.
#[derive(Debug)]
pub struct MmioPort {
    base: usize,
}

impl MmioPort {
    /// Create a port for the channel whose registers start at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the word-aligned address of a mapped SGDMA channel
    /// register block, and no other code may drive the same channel.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the register block.
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterPort for MmioPort {
    #[inline(always)]
    fn read(&self, reg: Register) -> u32 {
        // SAFETY: `new` requires a valid, exclusively owned register block.
        unsafe { read_reg(self.base + reg.offset()) }
    }

    #[inline(always)]
    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: `new` requires a valid, exclusively owned register block.
        unsafe { write_reg(self.base + reg.offset(), value) }
    }
}
