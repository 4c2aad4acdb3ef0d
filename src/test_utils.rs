//! Testing utilities and mock implementations
//!
//! This module provides a simulated SGDMA channel for testing the ring on
//! the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use crate::config::ChannelKind;
use crate::descriptor::Descriptor;
use crate::descriptor::bits::status as bd_status;
use crate::register::sgdma::{sg_control, status};
use crate::register::{Register, RegisterPort};
use crate::ring::BdRing;

/// Physical base used by ring tests (64-byte aligned)
pub const TEST_PHYS_BASE: u32 = 0x4000_0000;

const ALL_REGISTERS: [Register; 6] = [
    Register::Status,
    Register::Control,
    Register::DescriptorAddress,
    Register::InterruptStatus,
    Register::InterruptEnable,
    Register::SgControl,
];

// =============================================================================
// Aligned backing memory
// =============================================================================

/// Byte buffer aligned for any descriptor alignment up to 64.
#[repr(C, align(64))]
pub struct AlignedRegion<const N: usize>([u8; N]);

impl<const N: usize> AlignedRegion<N> {
    pub const fn new() -> Self {
        Self([0; N])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

// =============================================================================
// Simulated register file
// =============================================================================

#[derive(Debug, Default)]
struct SimState {
    regs: HashMap<Register, u32>,
    writes: Vec<(Register, u32)>,
    /// Polls before a stop request is acknowledged (`None` = never)
    stop_ack_after: Option<u32>,
    pending_ack: Option<u32>,
}

/// Simulated channel registers.
///
/// Clones share one register file, so a test can keep a handle while the
/// ring owns another. Port writes are logged; `set` is not.
///
/// A port write to the software control register that raises a stop request
/// while run-enable is set arms an acknowledgement: after the configured
/// number of reads of that register, run-enable drops.
#[derive(Debug, Clone)]
pub struct SimRegisters {
    state: Rc<RefCell<SimState>>,
}

impl SimRegisters {
    /// Channel whose status register reports `status`.
    pub fn with_status(status: u32) -> Self {
        let mut state = SimState {
            stop_ack_after: Some(0),
            ..SimState::default()
        };
        state.regs.insert(Register::Status, status);
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Scatter-gather transmit channel.
    pub fn sg_tx() -> Self {
        Self::with_status(status::CONFIG_SG_TX)
    }

    /// Scatter-gather receive channel.
    pub fn sg_rx() -> Self {
        Self::with_status(status::CONFIG_SG_RX)
    }

    pub fn kind(&self) -> ChannelKind {
        ChannelKind::from_status(self.get(Register::Status))
    }

    /// Current register value, without side effects.
    pub fn get(&self, reg: Register) -> u32 {
        self.state.borrow().regs.get(&reg).copied().unwrap_or(0)
    }

    /// Overwrite a register as the hardware would, without logging.
    pub fn set(&self, reg: Register, value: u32) {
        self.state.borrow_mut().regs.insert(reg, value);
    }

    /// Latch interrupt status bits.
    pub fn raise(&self, bits: u32) {
        let value = self.get(Register::InterruptStatus) | bits;
        self.set(Register::InterruptStatus, value);
    }

    pub fn set_stop_ack_after(&self, polls: Option<u32>) {
        self.state.borrow_mut().stop_ack_after = polls;
    }

    pub fn writes(&self) -> Vec<(Register, u32)> {
        self.state.borrow().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    /// Every register value, in a fixed order.
    pub fn snapshot(&self) -> Vec<(Register, u32)> {
        ALL_REGISTERS.iter().map(|&r| (r, self.get(r))).collect()
    }
}

impl RegisterPort for SimRegisters {
    fn read(&self, reg: Register) -> u32 {
        let mut state = self.state.borrow_mut();
        if reg == Register::SgControl {
            let pending = state.pending_ack;
            match pending {
                Some(0) => {
                    state.pending_ack = None;
                    let swcr = state.regs.entry(reg).or_insert(0);
                    *swcr &= !sg_control::RUN_ENABLE;
                }
                Some(n) => state.pending_ack = Some(n - 1),
                None => {}
            }
        }
        state.regs.get(&reg).copied().unwrap_or(0)
    }

    fn write(&mut self, reg: Register, value: u32) {
        let mut state = self.state.borrow_mut();
        state.writes.push((reg, value));
        match reg {
            Register::InterruptStatus => {
                let isr = state.regs.entry(reg).or_insert(0);
                *isr &= !value;
            }
            Register::SgControl => {
                state.regs.insert(reg, value);
                let stopping = value & sg_control::STOP_REQUEST != 0
                    && value & sg_control::RUN_ENABLE != 0;
                state.pending_ack = if stopping {
                    state.stop_ack_after
                } else {
                    None
                };
            }
            _ => {
                state.regs.insert(reg, value);
            }
        }
    }
}

// =============================================================================
// Simulated engine
// =============================================================================

/// Plays the engine's part on descriptors handed over with `to_hw`.
pub struct SimEngine;

impl SimEngine {
    /// Finish one descriptor: clear busy, set done, and report last if the
    /// control word asked for it.
    pub fn complete(bd: &Descriptor) {
        let mut value = bd_status::DONE;
        if bd.is_last() {
            value |= bd_status::LAST;
        }
        bd.set_raw_status(value);
    }

    /// Finish one descriptor with a bus error.
    pub fn fail(bd: &Descriptor) {
        Self::complete(bd);
        bd.set_raw_status(bd.raw_status() | bd_status::BUS_ERROR);
    }

    /// Finish up to `n` engine-owned descriptors in ring order, starting at
    /// the first still busy. Returns how many were finished.
    pub fn run<P: RegisterPort>(ring: &BdRing<'_, P>, n: usize) -> usize {
        let head = ring.zones().hw_owned().head;
        ring.descriptors(head, ring.hw_count())
            .filter(|bd| bd.is_busy())
            .take(n)
            .map(Self::complete)
            .count()
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay that accumulates the requested time instead of waiting
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn sim_registers_share_state_between_clones() {
        let sim = SimRegisters::sg_rx();
        let mut port = sim.clone();
        port.write(Register::Control, 0x55);
        assert_eq!(sim.get(Register::Control), 0x55);
        assert_eq!(sim.kind(), ChannelKind::SgRx);
        assert_eq!(sim.writes(), [(Register::Control, 0x55)]);
        sim.clear_writes();
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn interrupt_status_is_write_one_to_clear() {
        let sim = SimRegisters::sg_tx();
        let mut port = sim.clone();
        sim.raise(0b111);
        port.write(Register::InterruptStatus, 0b010);
        assert_eq!(sim.get(Register::InterruptStatus), 0b101);
    }

    #[test]
    fn stop_request_acknowledged_after_polls() {
        let sim = SimRegisters::sg_tx();
        sim.set_stop_ack_after(Some(2));
        let mut port = sim.clone();
        port.write(
            Register::SgControl,
            sg_control::RUN_ENABLE | sg_control::STOP_REQUEST,
        );
        assert_ne!(port.read(Register::SgControl) & sg_control::RUN_ENABLE, 0);
        assert_ne!(port.read(Register::SgControl) & sg_control::RUN_ENABLE, 0);
        assert_eq!(port.read(Register::SgControl) & sg_control::RUN_ENABLE, 0);
    }

    #[test]
    fn resume_cancels_pending_acknowledge() {
        let sim = SimRegisters::sg_tx();
        let mut port = sim.clone();
        port.write(
            Register::SgControl,
            sg_control::RUN_ENABLE | sg_control::STOP_REQUEST,
        );
        port.write(Register::SgControl, sg_control::RUN_ENABLE);
        assert_ne!(port.read(Register::SgControl) & sg_control::RUN_ENABLE, 0);
    }

    #[test]
    fn sim_engine_completes_busy_descriptors() {
        let mut region = AlignedRegion::<1024>::new();
        let mut ring = BdRing::new(SimRegisters::sg_tx(), RingConfig::new());
        ring.create(region.as_mut_slice(), TEST_PHYS_BASE, 64, 4, None)
            .unwrap();
        let set = ring.alloc(3).unwrap();
        for (i, bd) in ring.descriptors(set, 3).enumerate() {
            bd.set_last(i == 2);
        }
        ring.to_hw(3, set).unwrap();

        assert_eq!(SimEngine::run(&ring, 2), 2);
        assert_eq!(SimEngine::run(&ring, 5), 1);
        assert!(ring.descriptors(set, 3).all(|bd| bd.is_done()));
        assert_eq!(ring.from_hw(8).map(|s| s.count), Some(3));
    }

    #[test]
    fn sim_engine_fail_sets_error() {
        let bd = Descriptor::new();
        bd.set_last(true);
        SimEngine::fail(&bd);
        assert!(bd.has_error());
        assert!(bd.is_status_last());
        assert!(!bd.is_busy());
    }

    #[test]
    fn mock_delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_ns(1000);
        delay.delay_us(2);
        assert_eq!(delay.total_ns(), 3000);
        assert_eq!(delay.total_us(), 3);
    }
}
