//! Interrupt-safe sharing of a ring
//!
//! A [`BdRing`](crate::BdRing) takes `&mut self` for every protocol and
//! handshake call, so a ring touched from both thread mode and an interrupt
//! handler needs a lock around it. This module provides one:
//!
//! - [`CriticalSectionCell`]: `RefCell` behind a `critical_section::Mutex`
//! - [`SharedBdRing`]: a ring inside such a cell, one lock per ring
//!
//! # Feature Flags
//!
//! - `critical-section`: enables this module; the critical-section
//!   implementation comes from the HAL or runtime crate
//!
//! # Example
//!
//! ```ignore
//! use ph_sgdma::{BdRing, MmioPort, RingConfig};
//! use ph_sgdma::sync::SharedBdRing;
//!
//! static TX: SharedBdRing<'static, MmioPort> = SharedBdRing::new(BdRing::new(
//!     // SAFETY: base of the transmit channel's register block.
//!     unsafe { MmioPort::new(0x8060_0000) },
//!     RingConfig::new(),
//! ));
//!
//! #[interrupt]
//! fn DMA_TX() {
//!     TX.with(|ring| {
//!         ring.service_interrupts(&mut |_event| {});
//!         while let Some(done) = ring.from_hw(usize::MAX) {
//!             ring.free(done.count, done.first).ok();
//!         }
//!     });
//! }
//! ```

mod primitives;
mod shared;

pub use primitives::CriticalSectionCell;
pub use shared::SharedBdRing;
