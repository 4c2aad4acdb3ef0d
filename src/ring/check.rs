//! Structural consistency check.

#[cfg(feature = "log")]
use log::warn;

use super::BdRing;
use crate::config::RunState;
use crate::error::{DmaError, DmaResult};
use crate::register::RegisterPort;

impl<P: RegisterPort> BdRing<'_, P> {
    /// Verify the ring's bookkeeping and link chain.
    ///
    /// Checks that every zone cursor names a slot of the ring, that the four
    /// zone counts add up to the ring size, and that following link words
    /// from the first slot visits every slot in order and comes back to the
    /// first. Nothing is modified.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `IsStarted` if the engine is running; the engine may be rewriting
    ///   descriptors, so stop it first
    /// - `ListError` on any inconsistency
    pub fn sg_check(&self) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        if self.run_state == RunState::Started {
            return Err(DmaError::IsStarted);
        }

        for head in self.zones.heads() {
            if !storage.contains(head) {
                #[cfg(feature = "log")]
                warn!("sgdma: zone cursor {:#x} outside ring", head.addr());
                return Err(DmaError::ListError);
            }
        }

        if !self.zones.is_balanced() || self.zones.total != storage.count() {
            #[cfg(feature = "log")]
            warn!("sgdma: zone counts do not add up to {}", storage.count());
            return Err(DmaError::ListError);
        }

        let first = storage.first();
        let mut cur = first;
        for _ in 0..storage.count() {
            let link = storage.bd(cur).link_addr();
            let expected = storage.next(cur);
            if storage.phys_to_virt(link) != Some(expected) {
                #[cfg(feature = "log")]
                warn!(
                    "sgdma: broken link at slot {} -> {link:#010x}",
                    storage.index_of(cur)
                );
                return Err(DmaError::ListError);
            }
            cur = expected;
        }
        if cur != first {
            return Err(DmaError::ListError);
        }

        Ok(())
    }
}
