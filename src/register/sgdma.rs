//! SGDMA channel register map
//!
//! One channel is a block of 32-bit registers. The status and control
//! registers use the same layout as the matching descriptor words.

// =============================================================================
// Register Offsets
// =============================================================================

/// Status register (engine configuration, busy, SG done)
pub const STATUS_OFFSET: usize = 0x00;
/// Control register (engine sequence gate)
pub const CONTROL_OFFSET: usize = 0x04;
/// Descriptor address register (physical address of the current descriptor)
pub const DESC_ADDR_OFFSET: usize = 0x10;
/// Interrupt status register (write 1 to clear)
pub const INT_STATUS_OFFSET: usize = 0x18;
/// Interrupt enable register
pub const INT_ENABLE_OFFSET: usize = 0x1C;
/// Software control register (run/stop handshake, coalescing)
pub const SG_CONTROL_OFFSET: usize = 0x20;

// =============================================================================
// Status Register Bits
// =============================================================================

/// Status register bit field constants
pub mod status {
    /// Engine busy
    pub const BUSY: u32 = 1 << 31;
    /// SG Done - engine stopped on a sequence-gated descriptor
    pub const SG_DONE: u32 = 1 << 27;
    /// Engine configuration field mask
    pub const CONFIG_MASK: u32 = 0x3;
    /// Configuration: simple DMA
    pub const CONFIG_SIMPLE: u32 = 0;
    /// Configuration: simple scatter-gather
    pub const CONFIG_SIMPLE_SG: u32 = 1;
    /// Configuration: scatter-gather transmit
    pub const CONFIG_SG_TX: u32 = 2;
    /// Configuration: scatter-gather receive
    pub const CONFIG_SG_RX: u32 = 3;
}

// =============================================================================
// Control Register Bits
// =============================================================================

/// Control register bit field constants
pub mod control {
    /// Engine sequence gate - hold the engine until the gate is cleared
    pub const SEQUENCE_GATE: u32 = 1 << 27;
}

// =============================================================================
// Software Control Register Bits
// =============================================================================

/// Software control register bit field constants
pub mod sg_control {
    /// Run Enable - engine walks the descriptor list; clears itself on stop
    pub const RUN_ENABLE: u32 = 1 << 31;
    /// Stop Request - ask the engine to halt at the next descriptor boundary
    pub const STOP_REQUEST: u32 = 1 << 30;
    /// Auto Restart Disable - do not reload the descriptor address on restart
    pub const AUTO_RESTART_DISABLE: u32 = 1 << 29;
    /// Packet waitbound shift (12 bits)
    pub const WAITBOUND_SHIFT: u32 = 12;
    /// Packet waitbound mask
    pub const WAITBOUND_MASK: u32 = 0xFFF << WAITBOUND_SHIFT;
    /// Packet threshold shift (12 bits)
    pub const THRESHOLD_SHIFT: u32 = 0;
    /// Packet threshold mask
    pub const THRESHOLD_MASK: u32 = 0xFFF << THRESHOLD_SHIFT;
}

// =============================================================================
// Interrupt Status / Enable Bits
// =============================================================================

/// Interrupt status and enable bit field constants
pub mod interrupt {
    /// Transfer done
    pub const DONE: u32 = 1 << 0;
    /// Bus error or timeout
    pub const ERROR: u32 = 1 << 1;
    /// Engine reached the end of the submitted list
    pub const SG_END: u32 = 1 << 2;
    /// Packet threshold reached
    pub const PACKET_THRESHOLD: u32 = 1 << 3;
    /// Packet waitbound timer expired
    pub const PACKET_WAITBOUND: u32 = 1 << 4;
    /// All interrupt sources
    pub const ALL: u32 = DONE | ERROR | SG_END | PACKET_THRESHOLD | PACKET_WAITBOUND;
}
