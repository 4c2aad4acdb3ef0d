//! Zone tracker: four (head, count) cursors over the ring.
//!
//! Zones are contiguous runs in ring order, Free → PreWork → HwOwned →
//! PostWork → Free. Membership is implied by position; no descriptor carries
//! a zone tag. The counts are the only source of truth, since in a full or
//! empty ring several heads share a slot.

use super::BdPtr;
use super::storage::RingStorage;
use crate::error::{DmaError, DmaResult};

/// One zone: its first slot and how many slots it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Zone {
    /// First descriptor of the zone
    pub head: BdPtr,
    /// Number of descriptors in the zone
    pub count: usize,
}

impl Zone {
    const fn at(head: BdPtr, count: usize) -> Self {
        Self { head, count }
    }
}

/// Cursor state of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZoneTracker {
    pub(super) free: Zone,
    pub(super) pre: Zone,
    pub(super) hw: Zone,
    pub(super) post: Zone,
    pub(super) hw_tail: BdPtr,
    pub(super) total: usize,
}

impl ZoneTracker {
    /// Tracker for a ring that does not exist yet.
    pub(crate) const fn empty() -> Self {
        Self::new(BdPtr(0), 0)
    }

    /// Every descriptor free, every head at `base`.
    pub(crate) const fn new(base: BdPtr, total: usize) -> Self {
        Self {
            free: Zone::at(base, total),
            pre: Zone::at(base, 0),
            hw: Zone::at(base, 0),
            post: Zone::at(base, 0),
            hw_tail: base,
            total,
        }
    }

    /// Free zone
    pub const fn free(&self) -> Zone {
        self.free
    }

    /// Allocated, not yet submitted
    pub const fn pre_work(&self) -> Zone {
        self.pre
    }

    /// Submitted to the engine
    pub const fn hw_owned(&self) -> Zone {
        self.hw
    }

    /// Retrieved from the engine, not yet freed
    pub const fn post_work(&self) -> Zone {
        self.post
    }

    /// Last descriptor handed to the engine
    pub const fn hw_tail(&self) -> BdPtr {
        self.hw_tail
    }

    /// Number of descriptors in the ring
    pub const fn total(&self) -> usize {
        self.total
    }

    /// True when the four counts account for every descriptor.
    pub const fn is_balanced(&self) -> bool {
        self.free.count + self.pre.count + self.hw.count + self.post.count == self.total
    }

    /// The five cursors, in ring order.
    pub(crate) const fn heads(&self) -> [BdPtr; 5] {
        [
            self.free.head,
            self.pre.head,
            self.hw.head,
            self.hw_tail,
            self.post.head,
        ]
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Free → PreWork. Returns the first reserved descriptor.
    pub(crate) fn reserve(&mut self, storage: &RingStorage<'_>, n: usize) -> DmaResult<BdPtr> {
        if self.free.count < n {
            return Err(DmaError::InsufficientResources);
        }
        let set = self.free.head;
        self.free.head = storage.seek_ahead(set, n);
        self.free.count -= n;
        self.pre.count += n;
        Ok(set)
    }

    /// PreWork → Free, undoing the tail of the latest reservation.
    pub(crate) fn unreserve(
        &mut self,
        storage: &RingStorage<'_>,
        n: usize,
        set: BdPtr,
    ) -> DmaResult<()> {
        if self.pre.count < n {
            return Err(DmaError::InsufficientResources);
        }
        let head = storage.seek_back(self.free.head, n);
        if head != set {
            return Err(DmaError::ProtocolViolation);
        }
        self.free.head = head;
        self.free.count += n;
        self.pre.count -= n;
        Ok(())
    }

    /// Check that `set` heads PreWork and holds at least `n` descriptors.
    pub(crate) fn check_pre_work(&self, n: usize, set: BdPtr) -> DmaResult<()> {
        if self.pre.count < n || self.pre.head != set {
            return Err(DmaError::ProtocolViolation);
        }
        Ok(())
    }

    /// PreWork → HwOwned, with `last` as the new tail.
    pub(crate) fn submit(&mut self, storage: &RingStorage<'_>, n: usize, last: BdPtr) {
        self.pre.head = storage.seek_ahead(self.pre.head, n);
        self.pre.count -= n;
        self.hw.count += n;
        self.hw_tail = last;
    }

    /// HwOwned → PostWork.
    pub(crate) fn retire(&mut self, storage: &RingStorage<'_>, n: usize) {
        self.hw.head = storage.seek_ahead(self.hw.head, n);
        self.hw.count -= n;
        self.post.count += n;
    }

    /// PostWork → Free.
    pub(crate) fn reclaim(
        &mut self,
        storage: &RingStorage<'_>,
        n: usize,
        set: BdPtr,
    ) -> DmaResult<()> {
        if self.post.count < n || self.post.head != set {
            return Err(DmaError::ProtocolViolation);
        }
        self.post.head = storage.seek_ahead(set, n);
        self.post.count -= n;
        self.free.count += n;
        Ok(())
    }
}
