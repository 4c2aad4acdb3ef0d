//! Allocation, submission and reclaim.
//!
//! The steady-state cycle is `alloc` → fill in → `to_hw` → engine runs →
//! `from_hw` → inspect → `free`. Each step moves a run of descriptors one
//! zone forward. None of these calls synchronize; callers sharing a ring
//! across contexts wrap it in a lock (see `SharedBdRing`).

#[cfg(feature = "log")]
use log::warn;

use super::{BdPtr, BdRing, BdSet};
use crate::config::RunState;
use crate::descriptor::bits::status;
use crate::error::{DmaError, DmaResult};
use crate::register::sgdma::sg_control;
use crate::register::{Register, RegisterPort};

impl<P: RegisterPort> BdRing<'_, P> {
    /// Reserve `n` descriptors from Free.
    ///
    /// The returned set belongs to the caller, who may change every field
    /// except the link word before passing it to [`to_hw`](Self::to_hw).
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `InsufficientResources` if fewer than `n` descriptors are free
    pub fn alloc(&mut self, n: usize) -> DmaResult<BdPtr> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        self.zones.reserve(storage, n)
    }

    /// Return the last `n` allocated descriptors to Free.
    ///
    /// Undoes [`alloc`](Self::alloc) in stack order: `set` must be the first
    /// of the most recently allocated `n` descriptors. Allocating 10 and then
    /// releasing the trailing 4 is fine; releasing the leading 4 is not.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `InsufficientResources` if fewer than `n` descriptors are in PreWork
    /// - `ProtocolViolation` if `set` is not `n` slots behind the Free head
    pub fn unalloc(&mut self, n: usize, set: BdPtr) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        self.zones.unreserve(storage, n, set).inspect_err(|_err| {
            #[cfg(feature = "log")]
            warn!("sgdma: unalloc({n}) rejected: {_err}");
        })
    }

    /// Hand `n` prepared descriptors starting at `set` to the engine.
    ///
    /// The final descriptor of the set must be flagged last-of-packet. Each
    /// descriptor's status is reset to busy and its sequence gate cleared,
    /// except the final one, which keeps the gate and becomes the new end of
    /// the engine's list. If earlier work is still queued, the previous tail
    /// loses its gate so the engine runs straight on into the new set.
    ///
    /// On a running engine the list is extended under a stop request and
    /// resumed afterwards. Once this returns `Ok` the descriptors belong to
    /// the engine and must not be touched until [`from_hw`](Self::from_hw)
    /// returns them.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `InvalidParameter` if `n` is zero
    /// - `ProtocolViolation` if `set` is not the PreWork head or PreWork
    ///   holds fewer than `n` descriptors
    /// - `RejectedTransfer` if the set's final descriptor is not flagged last
    ///
    /// Validation happens before anything is written.
    pub fn to_hw(&mut self, n: usize, set: BdPtr) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        if n == 0 {
            return Err(DmaError::InvalidParameter);
        }
        if let Err(err) = self.zones.check_pre_work(n, set) {
            #[cfg(feature = "log")]
            warn!(
                "sgdma: to_hw({n}) out of sequence ({} in PreWork)",
                self.zones.pre.count
            );
            return Err(err);
        }
        let last = storage.seek_ahead(set, n - 1);
        if !storage.bd(last).is_last() {
            #[cfg(feature = "log")]
            warn!("sgdma: to_hw({n}) rejected, set does not end on last");
            return Err(DmaError::RejectedTransfer);
        }

        let mut cur = set;
        while cur != last {
            let bd = storage.bd(cur);
            bd.set_raw_status(status::BUSY);
            bd.set_sequence_gate(false);
            cur = storage.next(cur);
        }
        let tail = storage.bd(last);
        tail.set_raw_status(status::BUSY);
        tail.set_sequence_gate(true);

        let running = self.run_state == RunState::Started;
        let swcr = self.port.read(Register::SgControl);
        if running {
            self.port
                .write(Register::SgControl, swcr | sg_control::STOP_REQUEST);
        }

        if self.zones.hw.count != 0 {
            storage.bd(self.zones.hw_tail).set_sequence_gate(false);
        }
        self.zones.submit(storage, n, last);

        if running {
            self.port.write(
                Register::SgControl,
                (swcr & !sg_control::STOP_REQUEST) | sg_control::RUN_ENABLE,
            );
        }
        Ok(())
    }

    /// Take back descriptors the engine has finished with.
    ///
    /// Scans from the HwOwned head while descriptors are no longer busy,
    /// stopping at the first busy one, at the tail, or after `limit`. Trailing
    /// descriptors after the last one the engine flagged last-of-packet are
    /// left in HwOwned, so only whole packets come back.
    ///
    /// Returns `None` when nothing qualifies (including before creation).
    /// The returned descriptors belong to the caller until passed to
    /// [`free`](Self::free).
    pub fn from_hw(&mut self, limit: usize) -> Option<BdSet> {
        let storage = self.storage.as_ref()?;
        if self.zones.hw.count == 0 || limit == 0 {
            return None;
        }

        let first = self.zones.hw.head;
        let mut cur = first;
        let mut count = 0;
        let mut partial = 0;
        while count < limit && count < self.zones.hw.count {
            let bd = storage.bd(cur);
            if bd.is_busy() {
                break;
            }
            count += 1;
            if bd.is_status_last() {
                partial = 0;
            } else {
                partial += 1;
            }
            if cur == self.zones.hw_tail {
                break;
            }
            cur = storage.next(cur);
        }

        let count = count - partial;
        if count == 0 {
            return None;
        }
        self.zones.retire(storage, count);
        Some(BdSet { first, count })
    }

    /// Return `n` processed descriptors starting at `set` to Free.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `ProtocolViolation` if `set` is not the PostWork head or PostWork
    ///   holds fewer than `n` descriptors
    pub fn free(&mut self, n: usize, set: BdPtr) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        self.zones.reclaim(storage, n, set).inspect_err(|_err| {
            #[cfg(feature = "log")]
            warn!("sgdma: free({n}) rejected: {_err}");
        })
    }
}
