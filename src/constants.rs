//! Centralized Constants
//!
//! Sizes, limits and timing defaults shared by the ring and its handshake.
//!
//! Register and descriptor bit definitions live next to the code that uses
//! them (`descriptor/bits.rs`, `register/sgdma.rs`).

// =============================================================================
// Descriptor Geometry
// =============================================================================

/// Size in bytes of one descriptor record (14 words)
pub const BD_SIZE: usize = 56;

/// Number of 32-bit words in a descriptor record
pub const BD_WORDS: usize = BD_SIZE / 4;

/// Number of application-defined user words at the end of each record
pub const USER_WORDS: usize = 6;

/// Smallest supported descriptor alignment in bytes
pub const MIN_ALIGNMENT: u32 = 4;

// =============================================================================
// Interrupt Coalescing
// =============================================================================

/// Largest packet threshold or waitbound value (12-bit fields)
pub const MAX_COALESCE: u16 = 0x0FFF;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default upper bound on waiting for the engine to acknowledge a stop request
pub const DEFAULT_STOP_TIMEOUT_US: u32 = 10_000;

/// Default delay between stop acknowledgement polls
pub const DEFAULT_POLL_INTERVAL_US: u32 = 10;
