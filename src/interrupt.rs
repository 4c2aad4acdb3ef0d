//! Channel interrupt status and event dispatch.
//!
//! [`InterruptStatus`] decodes the channel's interrupt status register.
//! [`BdRing::service_interrupts`] acknowledges whatever is pending and turns
//! it into [`DmaEvent`]s for a [`DmaEventHandler`].

use crate::register::sgdma::interrupt::{
    DONE, ERROR, PACKET_THRESHOLD, PACKET_WAITBOUND, SG_END,
};
use crate::register::{Register, RegisterPort};
use crate::ring::BdRing;

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt flags parsed from the interrupt status register.
///
/// # Example
///
/// ```ignore
/// let status = ring.interrupt_status();
/// if status.transfer_done {
///     // Reclaim with from_hw
/// }
/// if status.has_error() {
///     // Stop the channel and inspect descriptor error bits
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// A descriptor completed
    pub transfer_done: bool,
    /// Bus error or bus timeout
    pub error: bool,
    /// Engine reached a sequence-gated descriptor and halted
    pub list_end: bool,
    /// Packet coalescing threshold reached
    pub packet_threshold: bool,
    /// Packet coalescing waitbound expired
    pub packet_waitbound: bool,
}

impl InterruptStatus {
    /// Create from raw interrupt status register value
    #[inline]
    pub fn from_raw(status: u32) -> Self {
        Self {
            transfer_done: (status & DONE) != 0,
            error: (status & ERROR) != 0,
            list_end: (status & SG_END) != 0,
            packet_threshold: (status & PACKET_THRESHOLD) != 0,
            packet_waitbound: (status & PACKET_WAITBOUND) != 0,
        }
    }

    /// Convert to raw value for clearing (write-1-to-clear)
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.transfer_done {
            val |= DONE;
        }
        if self.error {
            val |= ERROR;
        }
        if self.list_end {
            val |= SG_END;
        }
        if self.packet_threshold {
            val |= PACKET_THRESHOLD;
        }
        if self.packet_waitbound {
            val |= PACKET_WAITBOUND;
        }
        val
    }

    /// Check if any interrupt is pending
    #[inline]
    pub fn any(&self) -> bool {
        self.to_raw() != 0
    }

    /// Check if an error is pending
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }
}

// =============================================================================
// Events
// =============================================================================

/// One interrupt cause, as delivered to a [`DmaEventHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaEvent {
    /// A descriptor completed
    TransferDone,
    /// Packet coalescing threshold reached
    CoalesceThreshold,
    /// Packet coalescing waitbound expired
    CoalesceWaitbound,
    /// Engine halted at the end of the submitted list
    ListEnd,
    /// Bus error or timeout
    Fault {
        /// Channel status register at the time of the fault
        status: u32,
    },
}

/// Receiver for [`DmaEvent`]s.
///
/// Implemented for every `FnMut(DmaEvent)` closure.
pub trait DmaEventHandler {
    /// Handle one event.
    fn on_event(&mut self, event: DmaEvent);
}

impl<F: FnMut(DmaEvent)> DmaEventHandler for F {
    fn on_event(&mut self, event: DmaEvent) {
        self(event);
    }
}

// =============================================================================
// Ring integration
// =============================================================================

impl<P: RegisterPort> BdRing<'_, P> {
    /// Pending interrupts, without acknowledging them.
    pub fn interrupt_status(&self) -> InterruptStatus {
        InterruptStatus::from_raw(self.port().read(Register::InterruptStatus))
    }

    /// Acknowledge pending interrupts and dispatch them to `handler`.
    ///
    /// Exactly the bits read are written back, so causes raised in between
    /// stay pending for the next call. Each cause is dispatched at most once,
    /// a fault first. Returns what was acknowledged.
    pub fn service_interrupts<H: DmaEventHandler>(&mut self, handler: &mut H) -> InterruptStatus {
        let raw = self.port().read(Register::InterruptStatus);
        let pending = InterruptStatus::from_raw(raw);
        if !pending.any() {
            return pending;
        }
        self.port_mut()
            .write(Register::InterruptStatus, pending.to_raw());

        if pending.error {
            let status = self.port().read(Register::Status);
            handler.on_event(DmaEvent::Fault { status });
        }
        if pending.transfer_done {
            handler.on_event(DmaEvent::TransferDone);
        }
        if pending.packet_threshold {
            handler.on_event(DmaEvent::CoalesceThreshold);
        }
        if pending.packet_waitbound {
            handler.on_event(DmaEvent::CoalesceWaitbound);
        }
        if pending.list_end {
            handler.on_event(DmaEvent::ListEnd);
        }
        pending
    }

    /// Enable the interrupt sources in `mask`.
    pub fn enable_interrupts(&mut self, mask: u32) {
        self.port_mut().set_bits(Register::InterruptEnable, mask);
    }

    /// Disable the interrupt sources in `mask`.
    pub fn disable_interrupts(&mut self, mask: u32) {
        self.port_mut().clear_bits(Register::InterruptEnable, mask);
    }

    /// Currently enabled interrupt sources.
    pub fn interrupt_enable(&self) -> u32 {
        self.port().read(Register::InterruptEnable)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::config::RingConfig;
    use crate::register::sgdma::interrupt::ALL;
    use crate::register::sgdma::status::CONFIG_SG_TX;
    use crate::test_utils::SimRegisters;

    #[test]
    fn interrupt_status_from_raw_zero() {
        let status = InterruptStatus::from_raw(0);
        assert_eq!(status, InterruptStatus::default());
        assert!(!status.any());
        assert!(!status.has_error());
    }

    #[test]
    fn interrupt_status_from_raw_single_bits() {
        assert!(InterruptStatus::from_raw(DONE).transfer_done);
        assert!(InterruptStatus::from_raw(SG_END).list_end);
        assert!(InterruptStatus::from_raw(PACKET_THRESHOLD).packet_threshold);
        assert!(InterruptStatus::from_raw(PACKET_WAITBOUND).packet_waitbound);

        let err = InterruptStatus::from_raw(ERROR);
        assert!(err.error);
        assert!(err.has_error());
        assert!(!err.transfer_done);
    }

    #[test]
    fn interrupt_status_ignores_unknown_bits() {
        let status = InterruptStatus::from_raw(0xFFFF_FFFF);
        assert_eq!(status.to_raw(), ALL);
    }

    #[test]
    fn interrupt_status_to_raw_roundtrip() {
        let raw = DONE | SG_END | PACKET_WAITBOUND;
        assert_eq!(InterruptStatus::from_raw(raw).to_raw(), raw);
    }

    #[test]
    fn service_dispatches_fault_first_and_acknowledges() {
        let sim = SimRegisters::sg_tx();
        let mut ring = BdRing::new(sim.clone(), RingConfig::new());
        sim.raise(DONE | ERROR | SG_END);

        let mut events = Vec::new();
        let handled = ring.service_interrupts(&mut |e: DmaEvent| events.push(e));

        assert_eq!(handled.to_raw(), DONE | ERROR | SG_END);
        assert_eq!(
            events,
            [
                DmaEvent::Fault {
                    status: CONFIG_SG_TX
                },
                DmaEvent::TransferDone,
                DmaEvent::ListEnd,
            ]
        );
        assert_eq!(sim.get(Register::InterruptStatus), 0);
        assert_eq!(
            sim.writes(),
            [(Register::InterruptStatus, DONE | ERROR | SG_END)]
        );
    }

    #[test]
    fn service_with_nothing_pending_writes_nothing() {
        let sim = SimRegisters::sg_rx();
        let mut ring = BdRing::new(sim.clone(), RingConfig::new());

        let mut calls = 0;
        let handled = ring.service_interrupts(&mut |_: DmaEvent| calls += 1);

        assert!(!handled.any());
        assert_eq!(calls, 0);
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn service_leaves_unread_causes_pending() {
        let sim = SimRegisters::sg_rx();
        let mut ring = BdRing::new(sim.clone(), RingConfig::new());
        sim.raise(PACKET_THRESHOLD);
        ring.service_interrupts(&mut |_: DmaEvent| {});

        // Raised after the acknowledge
        sim.raise(PACKET_WAITBOUND);
        assert_eq!(
            ring.interrupt_status(),
            InterruptStatus::from_raw(PACKET_WAITBOUND)
        );
    }

    struct Counter {
        coalesce: usize,
    }

    impl DmaEventHandler for Counter {
        fn on_event(&mut self, event: DmaEvent) {
            if matches!(
                event,
                DmaEvent::CoalesceThreshold | DmaEvent::CoalesceWaitbound
            ) {
                self.coalesce += 1;
            }
        }
    }

    #[test]
    fn service_with_struct_handler() {
        let sim = SimRegisters::sg_rx();
        let mut ring = BdRing::new(sim.clone(), RingConfig::new());
        sim.raise(PACKET_THRESHOLD | PACKET_WAITBOUND);

        let mut counter = Counter { coalesce: 0 };
        ring.service_interrupts(&mut counter);
        assert_eq!(counter.coalesce, 2);
    }

    #[test]
    fn enable_and_disable_masks() {
        let sim = SimRegisters::sg_tx();
        let mut ring = BdRing::new(sim.clone(), RingConfig::new());

        ring.enable_interrupts(DONE | ERROR);
        ring.enable_interrupts(SG_END);
        assert_eq!(ring.interrupt_enable(), DONE | ERROR | SG_END);

        ring.disable_interrupts(DONE);
        assert_eq!(sim.get(Register::InterruptEnable), ERROR | SG_END);
    }
}
