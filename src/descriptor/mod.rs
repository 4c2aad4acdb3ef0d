//! Scatter-gather buffer descriptor record.
//!
//! One [`Descriptor`] describes one transfer segment. The engine reads the
//! control, address and length words, follows the link word to the next
//! record, and writes the status word back when it is done.
//!
//! Records live inside a ring's storage region; software only ever sees them
//! through shared references, so every field goes through a [`VolatileCell`].

pub mod bits;

use crate::constants::USER_WORDS;
use crate::error::{DmaError, DmaResult};
use bits::{control, status};

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// SAFETY: all access is through volatile operations on naturally aligned
// words; the ring protocol decides who may write which descriptor.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        // SAFETY: the pointer comes from a live UnsafeCell.
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        // SAFETY: the pointer comes from a live UnsafeCell.
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

/// Scatter-gather buffer descriptor (56 bytes).
///
/// Layout: status, control, buffer address high/low, link, length, packet
/// status, software tag, six user words.
#[repr(C)]
pub struct Descriptor {
    status: VolatileCell<u32>,
    control: VolatileCell<u32>,
    high_addr: VolatileCell<u32>,
    low_addr: VolatileCell<u32>,
    /// Physical address of the next record; owned by the ring
    link: VolatileCell<u32>,
    length: VolatileCell<u32>,
    packet_status: VolatileCell<u32>,
    /// Reserved by the engine, free for software
    tag: VolatileCell<u32>,
    user: [VolatileCell<u32>; USER_WORDS],
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 56;

    /// Create a new zeroed descriptor.
    ///
    /// Useful as a template for [`BdRing::create`](crate::BdRing::create) and
    /// [`BdRing::apply_template`](crate::BdRing::apply_template).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: VolatileCell::new(0),
            control: VolatileCell::new(0),
            high_addr: VolatileCell::new(0),
            low_addr: VolatileCell::new(0),
            link: VolatileCell::new(0),
            length: VolatileCell::new(0),
            packet_status: VolatileCell::new(0),
            tag: VolatileCell::new(0),
            user: [const { VolatileCell::new(0) }; USER_WORDS],
        }
    }

    // =========================================================================
    // Status (hardware-written)
    // =========================================================================

    /// Check if the engine still owns this descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        (self.status.get() & status::BUSY) != 0
    }

    /// Check if the engine has finished this descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_done(&self) -> bool {
        (self.status.get() & status::DONE) != 0
    }

    /// Check the engine-reported last-of-packet bit.
    #[inline(always)]
    #[must_use]
    pub fn is_status_last(&self) -> bool {
        (self.status.get() & status::LAST) != 0
    }

    /// Check if the engine reached this descriptor's sequence gate.
    #[inline(always)]
    #[must_use]
    pub fn is_sg_done(&self) -> bool {
        (self.status.get() & status::SG_DONE) != 0
    }

    /// Check if processing ended with a bus error or timeout.
    #[inline(always)]
    #[must_use]
    pub fn has_error(&self) -> bool {
        (self.status.get() & status::ERRORS) != 0
    }

    /// Get all error flags from the status word.
    #[inline(always)]
    #[must_use]
    pub fn error_flags(&self) -> u32 {
        self.status.get() & status::ERRORS
    }

    /// Get raw status word.
    #[inline(always)]
    #[must_use]
    pub fn raw_status(&self) -> u32 {
        self.status.get()
    }

    pub(crate) fn set_raw_status(&self, value: u32) {
        self.status.set(value);
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Get raw control word.
    #[inline(always)]
    #[must_use]
    pub fn raw_control(&self) -> u32 {
        self.control.get()
    }

    /// Mark (or unmark) this descriptor as the last of a packet.
    pub fn set_last(&self, last: bool) {
        self.set_control_flag(control::LAST, last);
    }

    /// Check the software last-of-packet flag.
    #[must_use]
    pub fn is_last(&self) -> bool {
        (self.control.get() & control::LAST) != 0
    }

    /// Step the local address per transfer (`true`) or hold it fixed.
    pub fn set_addr_increment(&self, increment: bool) {
        self.set_control_flag(control::ADDR_INCREMENT, increment);
    }

    /// Check the address increment mode.
    #[must_use]
    pub fn is_addr_increment(&self) -> bool {
        (self.control.get() & control::ADDR_INCREMENT) != 0
    }

    /// Bypass the engine's data realignment.
    pub fn set_bypass_realign(&self, bypass: bool) {
        self.set_control_flag(control::BYPASS_REALIGN, bypass);
    }

    /// Check whether data realignment is bypassed.
    #[must_use]
    pub fn is_bypass_realign(&self) -> bool {
        (self.control.get() & control::BYPASS_REALIGN) != 0
    }

    /// Set the local device select.
    pub fn set_device_select(&self, device: u8) {
        self.set_control_field(control::DEVSEL_MASK, control::DEVSEL_SHIFT, device as u32);
    }

    /// Get the local device select.
    #[must_use]
    pub fn device_select(&self) -> u8 {
        ((self.control.get() & control::DEVSEL_MASK) >> control::DEVSEL_SHIFT) as u8
    }

    /// Set the local page (4 bits, upper bits ignored).
    pub fn set_page(&self, page: u8) {
        self.set_control_field(control::PAGE_MASK, control::PAGE_SHIFT, page as u32);
    }

    /// Get the local page.
    #[must_use]
    pub fn page(&self) -> u8 {
        ((self.control.get() & control::PAGE_MASK) >> control::PAGE_SHIFT) as u8
    }

    /// Set the burst/transfer type (3 bits, upper bits ignored).
    pub fn set_transfer_type(&self, kind: u8) {
        self.set_control_field(control::TYPE_MASK, control::TYPE_SHIFT, kind as u32);
    }

    /// Get the burst/transfer type.
    #[must_use]
    pub fn transfer_type(&self) -> u8 {
        ((self.control.get() & control::TYPE_MASK) >> control::TYPE_SHIFT) as u8
    }

    /// Set the transfer width (3 bits, upper bits ignored).
    pub fn set_transfer_width(&self, width: u8) {
        self.set_control_field(control::WIDTH_MASK, control::WIDTH_SHIFT, width as u32);
    }

    /// Get the transfer width.
    #[must_use]
    pub fn transfer_width(&self) -> u8 {
        ((self.control.get() & control::WIDTH_MASK) >> control::WIDTH_SHIFT) as u8
    }

    /// Check whether the engine halts after this descriptor.
    #[must_use]
    pub fn has_sequence_gate(&self) -> bool {
        (self.control.get() & control::SEQUENCE_GATE) != 0
    }

    pub(crate) fn set_sequence_gate(&self, gate: bool) {
        self.set_control_flag(control::SEQUENCE_GATE, gate);
    }

    #[inline(always)]
    fn set_control_flag(&self, flag: u32, on: bool) {
        self.control
            .update(|v| if on { v | flag } else { v & !flag });
    }

    #[inline(always)]
    fn set_control_field(&self, mask: u32, shift: u32, value: u32) {
        self.control
            .update(|v| (v & !mask) | ((value << shift) & mask));
    }

    // =========================================================================
    // Buffer
    // =========================================================================

    /// Set the 64-bit buffer address.
    pub fn set_buffer_addr(&self, addr: u64) {
        self.high_addr.set((addr >> 32) as u32);
        self.low_addr.set(addr as u32);
    }

    /// Get the 64-bit buffer address.
    #[must_use]
    pub fn buffer_addr(&self) -> u64 {
        ((self.high_addr.get() as u64) << 32) | self.low_addr.get() as u64
    }

    /// Upper 32 bits of the buffer address.
    #[must_use]
    pub fn high_addr(&self) -> u32 {
        self.high_addr.get()
    }

    /// Lower 32 bits of the buffer address.
    #[must_use]
    pub fn low_addr(&self) -> u32 {
        self.low_addr.get()
    }

    /// Set the transfer length in bytes.
    pub fn set_length(&self, length: u32) {
        self.length.set(length);
    }

    /// Get the transfer length in bytes.
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    /// Get the packet status word.
    #[must_use]
    pub fn packet_status(&self) -> u32 {
        self.packet_status.get()
    }

    /// Set the packet status word.
    pub fn set_packet_status(&self, value: u32) {
        self.packet_status.set(value);
    }

    // =========================================================================
    // Software fields
    // =========================================================================

    /// Opaque software tag; the engine never reads or writes it.
    #[must_use]
    pub fn user_tag(&self) -> u32 {
        self.tag.get()
    }

    /// Set the opaque software tag.
    pub fn set_user_tag(&self, tag: u32) {
        self.tag.set(tag);
    }

    /// Read user word `index` (0..6).
    #[must_use]
    pub fn user_word(&self, index: usize) -> Option<u32> {
        self.user.get(index).map(VolatileCell::get)
    }

    /// Write user word `index` (0..6).
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `index` is out of range.
    pub fn set_user_word(&self, index: usize, value: u32) -> DmaResult<()> {
        let word = self.user.get(index).ok_or(DmaError::InvalidParameter)?;
        word.set(value);
        Ok(())
    }

    // =========================================================================
    // Ring plumbing
    // =========================================================================

    /// Physical address of the next record in the ring.
    #[must_use]
    pub fn link_addr(&self) -> u32 {
        self.link.get()
    }

    pub(crate) fn set_link_addr(&self, phys: u32) {
        self.link.set(phys);
    }

    /// Copy every field of `template` except the link word.
    pub(crate) fn copy_from(&self, template: &Descriptor) {
        self.status.set(template.status.get());
        self.control.set(template.control.get());
        self.high_addr.set(template.high_addr.get());
        self.low_addr.set(template.low_addr.get());
        self.length.set(template.length.get());
        self.packet_status.set(template.packet_status.get());
        self.tag.set(template.tag.get());
        for (dst, src) in self.user.iter().zip(template.user.iter()) {
            dst.set(src.get());
        }
    }
}

impl core::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Descriptor")
            .field("status", &format_args!("{:#010x}", self.raw_status()))
            .field("control", &format_args!("{:#010x}", self.raw_control()))
            .field("buffer", &format_args!("{:#x}", self.buffer_addr()))
            .field("length", &self.length())
            .field("link", &format_args!("{:#010x}", self.link_addr()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BD_SIZE;

    #[test]
    fn descriptor_size() {
        assert_eq!(core::mem::size_of::<Descriptor>(), BD_SIZE);
        assert_eq!(Descriptor::SIZE, BD_SIZE);
    }

    #[test]
    fn descriptor_alignment() {
        assert_eq!(core::mem::align_of::<Descriptor>(), 4);
    }

    #[test]
    fn field_offsets_match_layout() {
        let desc = Descriptor::new();
        let base = &desc as *const Descriptor as usize;
        assert_eq!(&desc.status as *const _ as usize - base, bits::offset::STATUS);
        assert_eq!(&desc.control as *const _ as usize - base, bits::offset::CONTROL);
        assert_eq!(&desc.high_addr as *const _ as usize - base, bits::offset::HIGH_ADDR);
        assert_eq!(&desc.low_addr as *const _ as usize - base, bits::offset::LOW_ADDR);
        assert_eq!(&desc.link as *const _ as usize - base, bits::offset::LINK);
        assert_eq!(&desc.length as *const _ as usize - base, bits::offset::LENGTH);
        assert_eq!(
            &desc.packet_status as *const _ as usize - base,
            bits::offset::PACKET_STATUS
        );
        assert_eq!(&desc.tag as *const _ as usize - base, bits::offset::TAG);
        assert_eq!(&desc.user[0] as *const _ as usize - base, bits::offset::USER0);
    }

    #[test]
    fn new_descriptor_is_idle() {
        let desc = Descriptor::new();
        assert!(!desc.is_busy());
        assert!(!desc.is_done());
        assert!(!desc.is_last());
        assert!(!desc.has_sequence_gate());
        assert_eq!(desc.raw_status(), 0);
        assert_eq!(desc.raw_control(), 0);
    }

    #[test]
    fn last_flag_round_trip() {
        let desc = Descriptor::new();
        desc.set_last(true);
        assert!(desc.is_last());
        assert_eq!(desc.raw_control() & control::LAST, control::LAST);
        desc.set_last(false);
        assert!(!desc.is_last());
    }

    #[test]
    fn control_fields_are_masked() {
        let desc = Descriptor::new();
        desc.set_page(0xFF);
        assert_eq!(desc.page(), 0xF);
        desc.set_transfer_type(0xF);
        assert_eq!(desc.transfer_type(), 0x7);
        desc.set_transfer_width(0x9);
        assert_eq!(desc.transfer_width(), 0x1);
        desc.set_device_select(0xA5);
        assert_eq!(desc.device_select(), 0xA5);

        // Fields are independent
        assert_eq!(desc.page(), 0xF);
        assert_eq!(desc.transfer_type(), 0x7);
        assert!(!desc.is_last());
    }

    #[test]
    fn flags_do_not_clobber_fields() {
        let desc = Descriptor::new();
        desc.set_device_select(3);
        desc.set_addr_increment(true);
        desc.set_bypass_realign(true);
        assert!(desc.is_addr_increment());
        assert!(desc.is_bypass_realign());
        assert_eq!(desc.device_select(), 3);

        desc.set_addr_increment(false);
        assert!(!desc.is_addr_increment());
        assert!(desc.is_bypass_realign());
    }

    #[test]
    fn buffer_address_split() {
        let desc = Descriptor::new();
        desc.set_buffer_addr(0x0000_0012_3456_7890);
        assert_eq!(desc.high_addr(), 0x12);
        assert_eq!(desc.low_addr(), 0x3456_7890);
        assert_eq!(desc.buffer_addr(), 0x0000_0012_3456_7890);
    }

    #[test]
    fn status_predicates() {
        let desc = Descriptor::new();
        desc.set_raw_status(status::BUSY);
        assert!(desc.is_busy());
        assert!(!desc.has_error());

        desc.set_raw_status(status::DONE | status::LAST | status::BUS_TIMEOUT);
        assert!(!desc.is_busy());
        assert!(desc.is_done());
        assert!(desc.is_status_last());
        assert!(desc.has_error());
        assert_eq!(desc.error_flags(), status::BUS_TIMEOUT);
    }

    #[test]
    fn user_words_bounds() {
        let desc = Descriptor::new();
        assert!(desc.set_user_word(0, 0x1111).is_ok());
        assert!(desc.set_user_word(USER_WORDS - 1, 0x6666).is_ok());
        assert_eq!(
            desc.set_user_word(USER_WORDS, 1),
            Err(DmaError::InvalidParameter)
        );
        assert_eq!(desc.user_word(0), Some(0x1111));
        assert_eq!(desc.user_word(USER_WORDS - 1), Some(0x6666));
        assert_eq!(desc.user_word(USER_WORDS), None);
    }

    #[test]
    fn copy_from_preserves_link() {
        let template = Descriptor::new();
        template.set_length(1500);
        template.set_device_select(2);
        template.set_user_tag(0xCAFE);
        template.set_user_word(5, 0xBEEF).unwrap();
        template.set_link_addr(0xDEAD_0000);

        let desc = Descriptor::new();
        desc.set_link_addr(0x1000_0040);
        desc.copy_from(&template);

        assert_eq!(desc.length(), 1500);
        assert_eq!(desc.device_select(), 2);
        assert_eq!(desc.user_tag(), 0xCAFE);
        assert_eq!(desc.user_word(5), Some(0xBEEF));
        assert_eq!(desc.link_addr(), 0x1000_0040);
    }

    #[test]
    fn volatile_cell_update() {
        let cell = VolatileCell::new(0x0F_u32);
        cell.update(|v| v << 4);
        assert_eq!(cell.get(), 0xF0);
    }
}
