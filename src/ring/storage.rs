//! Ring storage: the descriptor array and its addressing.
//!
//! Records sit back to back in a caller-supplied region, each padded up to
//! the requested alignment. Slot `i` lives at `base + i * separation` in the
//! CPU's view and at `phys_base + i * separation` in the engine's view.

use core::marker::PhantomData;
use core::ptr::NonNull;

use super::BdPtr;
use crate::constants::{BD_SIZE, MIN_ALIGNMENT};
use crate::descriptor::Descriptor;
use crate::descriptor::bits::status;
use crate::error::{DmaError, DmaResult};

/// Descriptor array borrowed for the lifetime of the ring.
pub(crate) struct RingStorage<'a> {
    base: NonNull<u8>,
    phys_base: u32,
    separation: usize,
    count: usize,
    _region: PhantomData<&'a mut [u8]>,
}

// SAFETY: the storage stands in for the exclusive `&'a mut [u8]` it was
// built from, which is itself `Send`.
unsafe impl Send for RingStorage<'_> {}

/// Record size rounded up to `alignment` (a power of two).
pub(crate) const fn separation(alignment: u32) -> usize {
    let align = alignment as usize;
    (BD_SIZE + align - 1) & !(align - 1)
}

impl<'a> RingStorage<'a> {
    /// Validate the geometry and take ownership of `region`.
    ///
    /// Nothing is written; see [`RingStorage::format`].
    pub(crate) fn new(
        region: &'a mut [u8],
        phys_base: u32,
        alignment: u32,
        count: usize,
    ) -> DmaResult<Self> {
        if alignment < MIN_ALIGNMENT || !alignment.is_power_of_two() {
            return Err(DmaError::InvalidParameter);
        }
        let virt_base = region.as_mut_ptr() as usize;
        if phys_base % alignment != 0 || virt_base % alignment as usize != 0 {
            return Err(DmaError::InvalidParameter);
        }
        if count == 0 {
            return Err(DmaError::InvalidParameter);
        }

        let separation = separation(alignment);
        let span = separation
            .checked_mul(count - 1)
            .ok_or(DmaError::ListSpansReservedBoundary)?;
        let last_phys = (phys_base as u64) + span as u64;
        if last_phys + (separation as u64 - 1) > u32::MAX as u64 {
            return Err(DmaError::ListSpansReservedBoundary);
        }
        let length = span
            .checked_add(separation)
            .ok_or(DmaError::ListSpansReservedBoundary)?;
        if virt_base.checked_add(length - 1).is_none() {
            return Err(DmaError::ListSpansReservedBoundary);
        }
        if region.len() < length {
            return Err(DmaError::InvalidParameter);
        }

        let base = NonNull::from(region).cast::<u8>();
        Ok(Self {
            base,
            phys_base,
            separation,
            count,
            _region: PhantomData,
        })
    }

    /// Zero the array, chain every link word to the next slot and mark every
    /// record hardware-done. A template, if given, fills every other field.
    pub(crate) fn format(&self, template: Option<&Descriptor>) {
        // SAFETY: `new` checked the region holds `length()` bytes.
        unsafe { core::ptr::write_bytes(self.base.as_ptr(), 0, self.length()) };

        let mut cur = self.first();
        for _ in 0..self.count {
            let next = self.next(cur);
            let bd = self.bd(cur);
            if let Some(template) = template {
                bd.copy_from(template);
            }
            bd.set_link_addr(self.virt_to_phys(next));
            bd.set_raw_status(bd.raw_status() | status::DONE);
            cur = next;
        }
    }

    /// Copy `template` into every record, keeping link words and forcing
    /// the done bit on.
    pub(crate) fn apply_template(&self, template: &Descriptor) {
        let done = template.raw_status() | status::DONE;
        let mut cur = self.first();
        for _ in 0..self.count {
            let bd = self.bd(cur);
            bd.copy_from(template);
            bd.set_raw_status(done);
            cur = self.next(cur);
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn separation(&self) -> usize {
        self.separation
    }

    pub(crate) fn length(&self) -> usize {
        self.separation * self.count
    }

    pub(crate) fn phys_base(&self) -> u32 {
        self.phys_base
    }

    pub(crate) fn base_addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Logical address of the last slot.
    pub(crate) fn high_addr(&self) -> usize {
        self.base_addr() + self.separation * (self.count - 1)
    }

    pub(crate) fn first(&self) -> BdPtr {
        BdPtr(self.base_addr())
    }

    /// True if `ptr` lies in `[base, high]` on the slot grid.
    pub(crate) fn contains(&self, ptr: BdPtr) -> bool {
        ptr.0 >= self.base_addr()
            && ptr.0 <= self.high_addr()
            && (ptr.0 - self.base_addr()) % self.separation == 0
    }

    pub(crate) fn index_of(&self, ptr: BdPtr) -> usize {
        (ptr.0 - self.base_addr()) / self.separation
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    pub(crate) fn next(&self, ptr: BdPtr) -> BdPtr {
        self.seek_ahead(ptr, 1)
    }

    pub(crate) fn prev(&self, ptr: BdPtr) -> BdPtr {
        self.seek_back(ptr, 1)
    }

    /// Step `n` slots forward, wrapping at the end of the ring.
    pub(crate) fn seek_ahead(&self, ptr: BdPtr, n: usize) -> BdPtr {
        let index = (self.index_of(ptr) + n % self.count) % self.count;
        BdPtr(self.base_addr() + index * self.separation)
    }

    /// Step `n` slots back, wrapping at the start of the ring.
    pub(crate) fn seek_back(&self, ptr: BdPtr, n: usize) -> BdPtr {
        let index = (self.index_of(ptr) + self.count - n % self.count) % self.count;
        BdPtr(self.base_addr() + index * self.separation)
    }

    // =========================================================================
    // Translation
    // =========================================================================

    pub(crate) fn virt_to_phys(&self, ptr: BdPtr) -> u32 {
        self.phys_base + (ptr.0 - self.base_addr()) as u32
    }

    /// Logical slot for a physical address, if it names a slot of this ring.
    pub(crate) fn phys_to_virt(&self, phys: u32) -> Option<BdPtr> {
        let offset = phys.checked_sub(self.phys_base)? as usize;
        let ptr = BdPtr(self.base_addr().checked_add(offset)?);
        self.contains(ptr).then_some(ptr)
    }

    /// Borrow the record at `ptr`.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not a slot of this ring.
    pub(crate) fn bd(&self, ptr: BdPtr) -> &Descriptor {
        assert!(self.contains(ptr), "descriptor pointer outside ring");
        // SAFETY: `ptr` is an aligned slot inside the region borrowed for 'a;
        // each slot holds at least BD_SIZE bytes and Descriptor has align 4.
        unsafe { &*(ptr.0 as *const Descriptor) }
    }
}
