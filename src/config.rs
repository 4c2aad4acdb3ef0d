//! Ring configuration and channel state types.

use crate::constants::{DEFAULT_POLL_INTERVAL_US, DEFAULT_STOP_TIMEOUT_US};
use crate::register::sgdma::status;

/// Handshake state of the engine as last driven by software
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Engine halted; the ring may be reconfigured
    #[default]
    Stopped,
    /// Engine enabled and walking the descriptor list
    Started,
}

/// Engine configuration reported by the channel status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    /// Simple (register-driven) DMA, no descriptor list
    Simple,
    /// Simple scatter-gather
    SimpleSg,
    /// Scatter-gather transmit
    SgTx,
    /// Scatter-gather receive
    SgRx,
}

impl ChannelKind {
    /// Decode the configuration field of a raw status register value.
    pub const fn from_status(raw: u32) -> Self {
        match raw & status::CONFIG_MASK {
            status::CONFIG_SIMPLE_SG => ChannelKind::SimpleSg,
            status::CONFIG_SG_TX => ChannelKind::SgTx,
            status::CONFIG_SG_RX => ChannelKind::SgRx,
            _ => ChannelKind::Simple,
        }
    }

    /// True for every configuration that walks a descriptor list.
    pub const fn is_scatter_gather(self) -> bool {
        !matches!(self, ChannelKind::Simple)
    }
}

/// Ring handshake configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingConfig {
    /// Upper bound on waiting for a stop acknowledgement, in microseconds
    pub stop_timeout_us: u32,
    /// Delay between stop acknowledgement polls, in microseconds
    pub poll_interval_us: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RingConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop_timeout_us: DEFAULT_STOP_TIMEOUT_US,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the stop acknowledgement timeout
    #[must_use]
    pub const fn with_stop_timeout_us(mut self, timeout_us: u32) -> Self {
        self.stop_timeout_us = timeout_us;
        self
    }

    /// Set the stop acknowledgement poll interval
    ///
    /// Zero is treated as one microsecond.
    #[must_use]
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    /// Effective poll interval, never zero.
    pub const fn effective_poll_interval_us(&self) -> u32 {
        if self.poll_interval_us == 0 {
            1
        } else {
            self.poll_interval_us
        }
    }

    /// Number of stop acknowledgement polls before giving up. Always at least one.
    pub const fn max_poll_iterations(&self) -> u32 {
        let n = self.stop_timeout_us / self.effective_poll_interval_us();
        if n == 0 { 1 } else { n }
    }
}
