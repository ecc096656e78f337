//! Type definitions for L2CAP operations
//!
//! This module contains the error taxonomy and the lower-layer (ACL)
//! framing metadata consumed by the receive pipeline.

use thiserror::Error;

/// Error types specific to L2CAP operations
///
/// Everything here is recoverable by the immediate caller. Invariant
/// violations that indicate a bug elsewhere in the stack (reentrant
/// receive dispatch, a fragmented ACL unit) are panics, not variants.
#[derive(Debug, Error)]
pub enum L2capError {
    #[error("message too short for L2CAP header")]
    MessageTooShort,

    #[error("L2CAP length disagrees with link-layer length")]
    MessageSizeMismatch,

    #[error("no channel registered for CID {0:#06x}")]
    ChannelNotFound(u16),

    #[error("payload of {0} bytes does not fit a 16-bit length field")]
    PayloadTooLarge(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("stale or foreign channel handle")]
    StaleHandle,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for L2CAP operations
pub type L2capResult<T> = std::result::Result<T, L2capError>;

/// Packet-boundary flag carried in the lower-layer data header
///
/// The receive pipeline only accepts complete units; reassembly of
/// fragmented units belongs to the layer below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketBoundary {
    /// A complete, unfragmented L2CAP frame
    Complete,
    /// A fragment of a larger frame (unsupported at this layer)
    Fragment,
}

/// Lower-layer (ACL) framing metadata for one inbound data unit
#[derive(Debug, Clone, Copy)]
pub struct AclDataHdr {
    /// Total length of the data unit as declared by the link layer
    pub len: u16,
    /// Packet-boundary flag
    pub pb: PacketBoundary,
}

impl AclDataHdr {
    /// Metadata for a complete data unit of the given length
    pub fn complete(len: u16) -> Self {
        Self {
            len,
            pb: PacketBoundary::Complete,
        }
    }
}
