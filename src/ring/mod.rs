//! Buffer descriptor ring
//!
//! [`BdRing`] owns one channel's descriptor array, the four zone cursors and
//! the register port that drives the engine. The work is split across:
//!
//! - [`storage`]: array geometry, wraparound and address translation
//! - [`zones`]: the Free/PreWork/HwOwned/PostWork cursors
//! - `protocol`: `alloc`, `unalloc`, `to_hw`, `from_hw`, `free`
//! - `handshake`: `start`, `stop` and interrupt coalescing
//! - `check`: the structural consistency check
//!
//! # Ownership
//!
//! A descriptor returned by [`BdRing::alloc`] belongs to the caller until it
//! is passed to [`BdRing::to_hw`]; from then on the engine owns it until
//! [`BdRing::from_hw`] hands it back. Callers must only touch descriptors in
//! sets they currently own, and must bound every walk by the set's count.

mod check;
mod handshake;
mod protocol;
pub(crate) mod storage;
pub mod zones;

pub use zones::{Zone, ZoneTracker};

use crate::config::{ChannelKind, RingConfig, RunState};
use crate::descriptor::Descriptor;
use crate::error::{DmaError, DmaResult};
use crate::register::sgdma::{control, sg_control};
use crate::register::{Register, RegisterPort};
use storage::RingStorage;

/// Logical address of one descriptor slot.
///
/// Only a ring produces these; use [`BdRing::next`] and [`BdRing::prev`] to
/// move between slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BdPtr(pub(crate) usize);

impl BdPtr {
    /// Logical (CPU) address of the slot.
    pub const fn addr(self) -> usize {
        self.0
    }
}

/// A run of consecutive descriptors: `count` slots starting at `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BdSet {
    /// First descriptor of the run
    pub first: BdPtr,
    /// Number of descriptors in the run
    pub count: usize,
}

/// Iterator over `n` consecutive descriptors, wrapping at the ring end.
pub struct BdIter<'r> {
    storage: Option<&'r RingStorage<'r>>,
    cur: BdPtr,
    remaining: usize,
}

impl<'r> Iterator for BdIter<'r> {
    type Item = &'r Descriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let storage = self.storage?;
        if self.remaining == 0 {
            return None;
        }
        let bd = storage.bd(self.cur);
        self.cur = storage.next(self.cur);
        self.remaining -= 1;
        Some(bd)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.storage.is_some() { self.remaining } else { 0 };
        (n, Some(n))
    }
}

impl ExactSizeIterator for BdIter<'_> {}

/// Descriptor ring for one scatter-gather channel.
///
/// # Type Parameters
///
/// * `'a` - lifetime of the memory region backing the descriptors
/// * `P` - register port for the channel
pub struct BdRing<'a, P: RegisterPort> {
    port: P,
    config: RingConfig,
    storage: Option<RingStorage<'a>>,
    zones: ZoneTracker,
    run_state: RunState,
    /// Physical address the engine resumes from on the next start
    restart_phys: u32,
}

impl<'a, P: RegisterPort> BdRing<'a, P> {
    /// Create a ring handle with no descriptor list yet.
    ///
    /// Call [`create`](Self::create) before any other operation.
    pub const fn new(port: P, config: RingConfig) -> Self {
        Self {
            port,
            config,
            storage: None,
            zones: ZoneTracker::empty(),
            run_state: RunState::Stopped,
            restart_phys: 0,
        }
    }

    /// Lay out `count` descriptors in `region` and put them all in Free.
    ///
    /// `phys_base` is the engine's view of `region`'s first byte. Each record
    /// is padded to `alignment`. The region is zeroed, every link word is
    /// chained to the next slot (the last wraps to the first) and every
    /// descriptor is marked done. A `template` fills every other field.
    ///
    /// The restart point becomes the ring base, and the engine's sequence
    /// gate is set so nothing runs until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// - `NoFeature` if the channel is not a scatter-gather engine
    /// - `IsStarted` if the engine is running, either started through this
    ///   ring or left with run-enable set by earlier users of the channel;
    ///   call [`stop`](Self::stop) first
    /// - `InvalidParameter` for a bad alignment, misaligned bases, zero
    ///   `count` or a region shorter than `count` padded records
    /// - `ListSpansReservedBoundary` if the ring would wrap the address space
    ///
    /// A failed call leaves any existing ring untouched.
    pub fn create(
        &mut self,
        region: &'a mut [u8],
        phys_base: u32,
        alignment: u32,
        count: usize,
        template: Option<&Descriptor>,
    ) -> DmaResult<()> {
        if !self.channel_kind().is_scatter_gather() {
            return Err(DmaError::NoFeature);
        }
        if self.run_state == RunState::Started
            || self.port.read(Register::SgControl) & sg_control::RUN_ENABLE != 0
        {
            return Err(DmaError::IsStarted);
        }

        let storage = RingStorage::new(region, phys_base, alignment, count)?;
        storage.format(template);

        self.zones = ZoneTracker::new(storage.first(), count);
        self.restart_phys = phys_base;
        self.run_state = RunState::Stopped;
        self.storage = Some(storage);
        self.port.set_bits(Register::Control, control::SEQUENCE_GATE);

        #[cfg(feature = "log")]
        log::debug!("sgdma: ring created, {count} descriptors at phys {phys_base:#010x}");

        Ok(())
    }

    /// Copy `template` into every descriptor, keeping link words and forcing
    /// the done bit on.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `IsStarted` if the engine is running
    /// - `ListError` if any descriptor is outside the Free zone
    pub fn apply_template(&mut self, template: &Descriptor) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        if self.run_state == RunState::Started {
            return Err(DmaError::IsStarted);
        }
        if self.zones.free.count != storage.count() {
            return Err(DmaError::ListError);
        }
        storage.apply_template(template);
        Ok(())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// True once [`create`](Self::create) has succeeded.
    pub fn is_created(&self) -> bool {
        self.storage.is_some()
    }

    /// Number of descriptors in the ring (0 before creation).
    pub fn count(&self) -> usize {
        self.zones.total
    }

    /// Bytes between consecutive descriptors (0 before creation).
    pub fn separation(&self) -> usize {
        self.storage.as_ref().map_or(0, RingStorage::separation)
    }

    /// Physical address of the first descriptor.
    pub fn phys_base(&self) -> Option<u32> {
        self.storage.as_ref().map(RingStorage::phys_base)
    }

    /// Descriptors in Free.
    pub fn free_count(&self) -> usize {
        self.zones.free.count
    }

    /// Descriptors in PreWork.
    pub fn pre_count(&self) -> usize {
        self.zones.pre.count
    }

    /// Descriptors owned by the engine.
    pub fn hw_count(&self) -> usize {
        self.zones.hw.count
    }

    /// Descriptors in PostWork.
    pub fn post_count(&self) -> usize {
        self.zones.post.count
    }

    /// Zone cursors.
    pub fn zones(&self) -> &ZoneTracker {
        &self.zones
    }

    /// Current handshake state.
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// True while the engine is started.
    pub fn is_started(&self) -> bool {
        self.run_state == RunState::Started
    }

    /// Ring configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Physical address the engine resumes from on the next start.
    pub fn restart_point(&self) -> u32 {
        self.restart_phys
    }

    /// Channel configuration decoded from the status register.
    pub fn channel_kind(&self) -> ChannelKind {
        ChannelKind::from_status(self.port.read(Register::Status))
    }

    /// Register port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutable register port, for channel setup outside the ring's concern.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Give up the ring and return the register port.
    pub fn release(self) -> P {
        self.port
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// First descriptor of the ring.
    pub fn first(&self) -> Option<BdPtr> {
        self.storage.as_ref().map(RingStorage::first)
    }

    /// Slot after `ptr`, wrapping at the end.
    ///
    /// `None` if no ring exists or `ptr` is not one of its slots.
    pub fn next(&self, ptr: BdPtr) -> Option<BdPtr> {
        let storage = self.slot_storage(ptr)?;
        Some(storage.next(ptr))
    }

    /// Slot before `ptr`, wrapping at the start.
    ///
    /// `None` if no ring exists or `ptr` is not one of its slots.
    pub fn prev(&self, ptr: BdPtr) -> Option<BdPtr> {
        let storage = self.slot_storage(ptr)?;
        Some(storage.prev(ptr))
    }

    /// Descriptor at `ptr`.
    pub fn descriptor(&self, ptr: BdPtr) -> Option<&Descriptor> {
        let storage = self.slot_storage(ptr)?;
        Some(storage.bd(ptr))
    }

    /// The `n` descriptors starting at `first`.
    ///
    /// Yields nothing if no ring exists or `first` is not one of its slots.
    pub fn descriptors(&self, first: BdPtr, n: usize) -> BdIter<'_> {
        BdIter {
            storage: self.slot_storage(first),
            cur: first,
            remaining: n,
        }
    }

    /// Physical address of the slot at `ptr`.
    pub fn virt_to_phys(&self, ptr: BdPtr) -> Option<u32> {
        let storage = self.slot_storage(ptr)?;
        Some(storage.virt_to_phys(ptr))
    }

    /// Slot at physical address `phys`.
    pub fn phys_to_virt(&self, phys: u32) -> Option<BdPtr> {
        self.storage.as_ref()?.phys_to_virt(phys)
    }

    fn slot_storage(&self, ptr: BdPtr) -> Option<&RingStorage<'a>> {
        self.storage.as_ref().filter(|s| s.contains(ptr))
    }
}
