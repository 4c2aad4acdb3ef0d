//! Scatter-Gather DMA Descriptor Ring
//!
//! A `no_std`, `no_alloc` Rust implementation of the buffer-descriptor ring
//! manager used by SGDMA-style FPGA DMA engines.
//!
//! The engine walks a circular list of fixed-size descriptor records in
//! memory, processes each one and clears its busy bit. Software owns the same
//! memory and hands descriptors back and forth with the engine through a
//! strict four-zone protocol, so neither side ever touches a descriptor the
//! other one owns.
//!
//! # Architecture
//!
//! 1. **Descriptors** ([`descriptor`]): the 56-byte record with volatile accessors
//! 2. **Ring** ([`ring`]): storage, zone tracking, allocation protocol,
//!    start/stop handshake and the consistency checker
//! 3. **Registers** ([`register`]): the [`RegisterPort`] seam to the engine
//!
//! ## Zones
//!
//! Every descriptor lives in exactly one zone, implied by its position in the
//! ring relative to four head cursors:
//!
//! ```text
//!          alloc           to_hw            from_hw          free
//!   Free ────────▶ PreWork ───────▶ HwOwned ────────▶ PostWork ──────▶ Free
//!        ◀────────
//!         unalloc
//! ```
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types
//! - `log`: Emit `log` records for protocol misuse and handshake transitions
//! - `critical-section`: Enable ISR-safe `SharedBdRing` wrapper
//!
//! # Example
//!
//! ```ignore
//! use ph_sgdma::{BdRing, MmioPort, RingConfig};
//!
//! // SAFETY: base address of the channel's register block.
//! let port = unsafe { MmioPort::new(0x8060_0000) };
//! let mut ring = BdRing::new(port, RingConfig::new());
//!
//! ring.create(region, region_phys, 64, 32, None)?;
//! ring.start()?;
//!
//! let set = ring.alloc(2)?;
//! for (i, bd) in ring.descriptors(set, 2).enumerate() {
//!     bd.set_buffer_addr(buffers[i]);
//!     bd.set_length(lengths[i]);
//!     bd.set_last(i == 1);
//! }
//! ring.to_hw(2, set)?;
//!
//! // Later, from the completion path
//! if let Some(done) = ring.from_hw(usize::MAX) {
//!     // inspect ring.descriptors(done.first, done.count)
//!     ring.free(done.count, done.first)?;
//! }
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here and in Cargo.toml [lints].
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod interrupt;
pub mod register;
pub mod ring;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ChannelKind, RingConfig, RunState};
pub use descriptor::Descriptor;
pub use error::{DmaError, DmaResult};
pub use interrupt::{DmaEvent, DmaEventHandler, InterruptStatus};
pub use register::{MmioPort, Register, RegisterPort};
pub use ring::{BdIter, BdPtr, BdRing, BdSet, ZoneTracker};

#[cfg(feature = "critical-section")]
pub use sync::SharedBdRing;
