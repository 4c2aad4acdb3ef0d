//! Error types for the descriptor ring
//!
//! Every fallible ring operation returns [`DmaResult`]. Failures never leave
//! the zone tracker half-updated: validation runs before any descriptor or
//! cursor is written.

// =============================================================================
// DMA Errors
// =============================================================================

/// Descriptor ring and handshake errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Bad alignment, misaligned base address, zero count or undersized region
    InvalidParameter,
    /// The ring would wrap past the end of the physical or logical address space
    ListSpansReservedBoundary,
    /// Not enough descriptors in the zone the request draws from
    InsufficientResources,
    /// Out-of-sequence call: wrong set pointer or count for the zone
    ProtocolViolation,
    /// Submitted set does not end on a descriptor flagged last-of-packet
    RejectedTransfer,
    /// Ring structure is inconsistent
    ListError,
    /// Engine never acknowledged a stop request within the configured timeout
    HardwareTimeout,
    /// No ring has been created on this channel
    NoListCreated,
    /// Operation requires the engine to be stopped
    IsStarted,
    /// Channel is not configured as a scatter-gather engine
    NoFeature,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::InvalidParameter => "invalid parameter",
            DmaError::ListSpansReservedBoundary => "ring spans reserved address boundary",
            DmaError::InsufficientResources => "insufficient descriptors",
            DmaError::ProtocolViolation => "descriptor protocol violation",
            DmaError::RejectedTransfer => "transfer rejected: set does not end on last",
            DmaError::ListError => "descriptor list inconsistent",
            DmaError::HardwareTimeout => "engine did not acknowledge stop",
            DmaError::NoListCreated => "no descriptor list created",
            DmaError::IsStarted => "engine is started",
            DmaError::NoFeature => "channel is not scatter-gather",
        }
    }

    /// Returns true when the error reports caller misuse rather than
    /// hardware or structural trouble.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DmaError::InvalidParameter
                | DmaError::InsufficientResources
                | DmaError::ProtocolViolation
                | DmaError::RejectedTransfer
                | DmaError::NoListCreated
                | DmaError::IsStarted
        )
    }
}

// =============================================================================
// Result Alias
// =============================================================================

/// Result type for ring operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;
