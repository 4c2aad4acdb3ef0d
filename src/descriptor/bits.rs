//! Descriptor bit field constants.
//!
//! The status and control words of a descriptor share their layout with the
//! engine's own status and control registers.

// =============================================================================
// Word offsets
// =============================================================================

/// Byte offsets of each word within a descriptor record
pub mod offset {
    /// Status word (hardware-written)
    pub const STATUS: usize = 0x00;
    /// Control word
    pub const CONTROL: usize = 0x04;
    /// Buffer address, upper 32 bits
    pub const HIGH_ADDR: usize = 0x08;
    /// Buffer address, lower 32 bits
    pub const LOW_ADDR: usize = 0x0C;
    /// Physical address of the next record in the ring
    pub const LINK: usize = 0x10;
    /// Transfer length in bytes
    pub const LENGTH: usize = 0x14;
    /// Packet status (hardware-written on receive)
    pub const PACKET_STATUS: usize = 0x18;
    /// Reserved by the engine, used as a software tag
    pub const TAG: usize = 0x1C;
    /// First application user word
    pub const USER0: usize = 0x20;
}

// =============================================================================
// Status word
// =============================================================================

/// Status word bit field constants
pub mod status {
    /// Busy - descriptor owned by the engine, not yet processed
    pub const BUSY: u32 = 1 << 31;
    /// Bus Error - engine saw a bus error while processing the descriptor
    pub const BUS_ERROR: u32 = 1 << 30;
    /// Bus Timeout - engine saw a bus timeout while processing the descriptor
    pub const BUS_TIMEOUT: u32 = 1 << 29;
    /// Done - engine finished the descriptor
    pub const DONE: u32 = 1 << 28;
    /// SG Done - engine reached a sequence-gated descriptor
    pub const SG_DONE: u32 = 1 << 27;
    /// Last - final descriptor of a packet, as reported by the engine
    pub const LAST: u32 = 1 << 26;
    /// All error bits
    pub const ERRORS: u32 = BUS_ERROR | BUS_TIMEOUT;
}

// =============================================================================
// Control word
// =============================================================================

/// Control word bit field constants
pub mod control {
    /// Address Increment - step the local address per transfer
    pub const ADDR_INCREMENT: u32 = 1 << 31;
    /// Bypass Realignment - skip the data realignment engine
    pub const BYPASS_REALIGN: u32 = 1 << 29;
    /// Sequence Gate - halt after this descriptor until the list is extended
    pub const SEQUENCE_GATE: u32 = 1 << 27;
    /// Last - final descriptor of a packet
    pub const LAST: u32 = 1 << 26;
    /// Device Select shift (8 bits)
    pub const DEVSEL_SHIFT: u32 = 16;
    /// Device Select mask
    pub const DEVSEL_MASK: u32 = 0xFF << DEVSEL_SHIFT;
    /// Local Page shift (4 bits)
    pub const PAGE_SHIFT: u32 = 8;
    /// Local Page mask
    pub const PAGE_MASK: u32 = 0xF << PAGE_SHIFT;
    /// Transfer Type shift (3 bits)
    pub const TYPE_SHIFT: u32 = 4;
    /// Transfer Type mask
    pub const TYPE_MASK: u32 = 0x7 << TYPE_SHIFT;
    /// Transfer Width shift (3 bits)
    pub const WIDTH_SHIFT: u32 = 0;
    /// Transfer Width mask
    pub const WIDTH_MASK: u32 = 0x7 << WIDTH_SHIFT;
}
