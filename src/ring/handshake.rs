//! Engine start/stop handshake and interrupt coalescing.
//!
//! Starting loads the restart point into the descriptor address register
//! and sets run-enable. Stopping asks the engine to halt at a descriptor
//! boundary, waits (bounded) for run-enable to drop, and records where the
//! engine stood so the next start resumes there.

use embedded_hal::delay::DelayNs;
#[cfg(feature = "log")]
use log::{debug, warn};

use super::BdRing;
use crate::config::{ChannelKind, RunState};
use crate::constants::MAX_COALESCE;
use crate::error::{DmaError, DmaResult};
use crate::register::sgdma::{control, sg_control, status};
use crate::register::{Register, RegisterPort};

impl<P: RegisterPort> BdRing<'_, P> {
    /// Start (or resume) the engine at the restart point.
    ///
    /// If the descriptor at the restart point still has work pending (not
    /// done), the engine's sequence gate is released so it runs straight
    /// away. Calling this on a started engine does nothing.
    ///
    /// # Errors
    ///
    /// - `NoListCreated` if no ring exists
    /// - `ListError` if the restart point is not a slot of this ring
    pub fn start(&mut self) -> DmaResult<()> {
        let storage = self.storage.as_ref().ok_or(DmaError::NoListCreated)?;
        if self.run_state == RunState::Started {
            return Ok(());
        }
        let Some(restart) = storage.phys_to_virt(self.restart_phys) else {
            #[cfg(feature = "log")]
            warn!(
                "sgdma: restart point {:#010x} outside ring",
                self.restart_phys
            );
            return Err(DmaError::ListError);
        };

        self.port
            .write(Register::DescriptorAddress, self.restart_phys);
        if !storage.bd(restart).is_done() {
            self.port
                .clear_bits(Register::Control, control::SEQUENCE_GATE);
        }
        self.port.modify(Register::SgControl, |v| {
            (v & !sg_control::AUTO_RESTART_DISABLE) | sg_control::RUN_ENABLE
        });
        self.run_state = RunState::Started;

        #[cfg(feature = "log")]
        debug!("sgdma: started at {:#010x}", self.restart_phys);

        Ok(())
    }

    /// Stop the engine and record where it stopped.
    ///
    /// Interrupts are masked for the duration. If the engine is running, a
    /// stop request is raised and run-enable is polled every
    /// `poll_interval_us` until it drops or `stop_timeout_us` elapses.
    ///
    /// The descriptor address register becomes the next restart point. A
    /// receive channel that stopped before reaching a sequence gate backs the
    /// restart point up by one slot so the interrupted descriptor is redone.
    ///
    /// # Errors
    ///
    /// `HardwareTimeout` if the engine never acknowledges. The ring stays
    /// `Started`, interrupt enables are restored and the stop request stays
    /// raised, so a later call can finish the job.
    pub fn stop<D: DelayNs>(&mut self, delay: &mut D) -> DmaResult<()> {
        let enables = self.port.read(Register::InterruptEnable);
        self.port.write(Register::InterruptEnable, 0);

        let mut swcr = self.port.read(Register::SgControl);
        if swcr & sg_control::RUN_ENABLE != 0 {
            swcr |= sg_control::STOP_REQUEST;
            self.port.write(Register::SgControl, swcr);
            match self.wait_for_stop(delay) {
                Ok(acked) => swcr = acked,
                Err(err) => {
                    self.port.write(Register::InterruptEnable, enables);
                    #[cfg(feature = "log")]
                    warn!(
                        "sgdma: engine did not stop within {} us",
                        self.config.stop_timeout_us
                    );
                    return Err(err);
                }
            }
        }
        self.run_state = RunState::Stopped;

        let mut restart = self.port.read(Register::DescriptorAddress);
        let engine = self.port.read(Register::Status);
        if ChannelKind::from_status(engine) == ChannelKind::SgRx
            && engine & status::SG_DONE == 0
            && let Some(storage) = self.storage.as_ref()
            && let Some(ptr) = storage.phys_to_virt(restart)
        {
            restart = storage.virt_to_phys(storage.prev(ptr));
        }
        self.restart_phys = restart;

        swcr = (swcr | sg_control::AUTO_RESTART_DISABLE) & !sg_control::STOP_REQUEST;
        self.port.write(Register::SgControl, swcr);
        self.port.write(Register::InterruptEnable, enables);

        #[cfg(feature = "log")]
        debug!("sgdma: stopped, restart at {restart:#010x}");

        Ok(())
    }

    /// Poll run-enable until it drops. Returns the acknowledged register value.
    fn wait_for_stop<D: DelayNs>(&self, delay: &mut D) -> DmaResult<u32> {
        let interval = self.config.effective_poll_interval_us();
        for _ in 0..self.config.max_poll_iterations() {
            let swcr = self.port.read(Register::SgControl);
            if swcr & sg_control::RUN_ENABLE == 0 {
                return Ok(swcr);
            }
            delay.delay_us(interval);
        }
        // The engine may have halted during the last interval
        let swcr = self.port.read(Register::SgControl);
        if swcr & sg_control::RUN_ENABLE == 0 {
            return Ok(swcr);
        }
        Err(DmaError::HardwareTimeout)
    }

    // =========================================================================
    // Interrupt Coalescing
    // =========================================================================

    /// Raise the completion interrupt only every `threshold` packets.
    ///
    /// Zero disables the threshold.
    ///
    /// # Errors
    ///
    /// - `NoFeature` on a channel without scatter-gather
    /// - `IsStarted` while the engine runs
    /// - `InvalidParameter` above 4095
    pub fn set_packet_threshold(&mut self, threshold: u16) -> DmaResult<()> {
        self.set_coalesce_field(
            threshold,
            sg_control::THRESHOLD_MASK,
            sg_control::THRESHOLD_SHIFT,
        )
    }

    /// Current packet threshold (0 on channels without scatter-gather).
    pub fn packet_threshold(&self) -> u16 {
        self.coalesce_field(sg_control::THRESHOLD_MASK, sg_control::THRESHOLD_SHIFT)
    }

    /// Raise the completion interrupt after `waitbound` timer ticks even if
    /// the packet threshold was not reached.
    ///
    /// Zero disables the waitbound.
    ///
    /// # Errors
    ///
    /// Same as [`set_packet_threshold`](Self::set_packet_threshold).
    pub fn set_packet_waitbound(&mut self, waitbound: u16) -> DmaResult<()> {
        self.set_coalesce_field(
            waitbound,
            sg_control::WAITBOUND_MASK,
            sg_control::WAITBOUND_SHIFT,
        )
    }

    /// Current packet waitbound (0 on channels without scatter-gather).
    pub fn packet_waitbound(&self) -> u16 {
        self.coalesce_field(sg_control::WAITBOUND_MASK, sg_control::WAITBOUND_SHIFT)
    }

    fn set_coalesce_field(&mut self, value: u16, mask: u32, shift: u32) -> DmaResult<()> {
        if !self.channel_kind().is_scatter_gather() {
            return Err(DmaError::NoFeature);
        }
        if self.run_state == RunState::Started {
            return Err(DmaError::IsStarted);
        }
        if value > MAX_COALESCE {
            return Err(DmaError::InvalidParameter);
        }
        self.port.modify(Register::SgControl, |v| {
            (v & !mask) | (((value as u32) << shift) & mask)
        });
        Ok(())
    }

    fn coalesce_field(&self, mask: u32, shift: u32) -> u16 {
        if !self.channel_kind().is_scatter_gather() {
            return 0;
        }
        ((self.port.read(Register::SgControl) & mask) >> shift) as u16
    }
}
