//! L2CAP channel implementation
//!
//! This module provides the per-CID channel entity: MTU negotiation
//! state, the registered receive handler, and the receive-dispatch state
//! machine that guarantees at most one in-flight inbound buffer.

use std::cmp;
use std::fmt;

use crate::types::L2capResult;

bitflags::bitflags! {
    /// Per-channel flag bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChanFlags: u8 {
        /// The local MTU offer has been sent to the peer
        const TXED_MTU = 0x01;
    }
}

/// Callback invoked once per inbound payload on a channel
///
/// Receives the connection context, the channel itself, and the buffer
/// slot. The handler may inspect the payload in place, `take()` it to
/// assume ownership, or replace it; whatever it leaves in the slot is
/// disposed by the receive pipeline when it returns.
pub type RxHandler<C> =
    Box<dyn FnMut(&mut C, &mut Channel<C>, &mut Option<Vec<u8>>) -> L2capResult<()> + Send>;

/// State of a channel's receive slot
///
/// A channel is `Dispatching` exactly for the span of one handler
/// invocation; the pipeline restores `Idle` on every return path, so
/// receive dispatches on one channel are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxSlot {
    /// No dispatch in progress
    Idle,
    /// A handler invocation is in progress for this channel
    Dispatching,
}

/// One multiplexed logical connection endpoint
///
/// The generic parameter `C` is the connection context type owned by the
/// caller and passed through to the receive handler.
pub struct Channel<C> {
    /// Channel Identifier, assigned at creation and immutable thereafter
    cid: u16,
    /// MTU floor, fixed at creation
    default_mtu: u16,
    /// Locally offered MTU
    local_mtu: u16,
    /// Peer's offered MTU (0 = not yet received)
    peer_mtu: u16,
    /// Flag bits
    flags: ChanFlags,
    /// Registered receive handler
    rx_handler: Option<RxHandler<C>>,
    /// Receive-dispatch state
    rx_slot: RxSlot,
}

impl<C> Channel<C> {
    /// Create a new channel with the given CID and MTU floor
    pub fn new(cid: u16, default_mtu: u16) -> Self {
        Self {
            cid,
            default_mtu,
            local_mtu: default_mtu,
            peer_mtu: 0,
            flags: ChanFlags::empty(),
            rx_handler: None,
            rx_slot: RxSlot::Idle,
        }
    }

    /// Get the Channel Identifier (CID)
    pub fn cid(&self) -> u16 {
        self.cid
    }

    /// Get the MTU floor
    pub fn default_mtu(&self) -> u16 {
        self.default_mtu
    }

    /// Get the locally offered MTU
    pub fn local_mtu(&self) -> u16 {
        self.local_mtu
    }

    /// Set the locally offered MTU
    pub fn set_local_mtu(&mut self, mtu: u16) {
        self.local_mtu = mtu;
    }

    /// Get the peer's offered MTU (0 = not yet received)
    pub fn peer_mtu(&self) -> u16 {
        self.peer_mtu
    }

    /// Record the peer's offered MTU
    pub fn set_peer_mtu(&mut self, mtu: u16) {
        self.peer_mtu = mtu;
    }

    /// Record that the local MTU offer has been sent to the peer
    pub fn mark_mtu_txed(&mut self) {
        self.flags.insert(ChanFlags::TXED_MTU);
    }

    /// Whether the local MTU offer has been sent
    pub fn mtu_txed(&self) -> bool {
        self.flags.contains(ChanFlags::TXED_MTU)
    }

    /// Get the effective MTU for this channel
    ///
    /// Until both sides have exchanged MTU, the conservative default
    /// applies; once exchanged, the lesser of the two values bounds both
    /// directions.
    pub fn effective_mtu(&self) -> u16 {
        let mtu = if !self.flags.contains(ChanFlags::TXED_MTU) || self.peer_mtu == 0 {
            self.default_mtu
        } else {
            cmp::min(self.local_mtu, self.peer_mtu)
        };

        assert!(mtu >= self.default_mtu);

        mtu
    }

    /// Register the receive handler, replacing any previous one
    pub fn set_rx_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut C, &mut Channel<C>, &mut Option<Vec<u8>>) -> L2capResult<()>
            + Send
            + 'static,
    {
        self.rx_handler = Some(Box::new(handler));
    }

    /// Clear the receive handler
    pub fn clear_rx_handler(&mut self) {
        self.rx_handler = None;
    }

    /// Whether a receive handler is registered
    pub fn has_rx_handler(&self) -> bool {
        self.rx_handler.is_some()
    }

    /// Current receive-slot state
    pub fn rx_slot(&self) -> RxSlot {
        self.rx_slot
    }

    /// Enter the dispatching state
    ///
    /// Panics on overlapping dispatch for the same channel; that is a
    /// bug in the caller's serialization discipline, not a condition the
    /// stack can recover from.
    pub(crate) fn begin_rx(&mut self) {
        match self.rx_slot {
            RxSlot::Idle => self.rx_slot = RxSlot::Dispatching,
            RxSlot::Dispatching => {
                panic!("reentrant receive dispatch on CID {:#06x}", self.cid)
            }
        }
    }

    /// Return to the idle state after a dispatch
    pub(crate) fn end_rx(&mut self) {
        self.rx_slot = RxSlot::Idle;
    }

    /// Detach the receive handler for the span of one dispatch
    pub(crate) fn take_rx_handler(&mut self) -> Option<RxHandler<C>> {
        self.rx_handler.take()
    }

    /// Reattach the receive handler after a dispatch
    ///
    /// A replacement registered by the handler itself wins.
    pub(crate) fn put_rx_handler(&mut self, handler: RxHandler<C>) {
        if self.rx_handler.is_none() {
            self.rx_handler = Some(handler);
        }
    }
}

impl<C> fmt::Debug for Channel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("cid", &self.cid)
            .field("default_mtu", &self.default_mtu)
            .field("local_mtu", &self.local_mtu)
            .field("peer_mtu", &self.peer_mtu)
            .field("flags", &self.flags)
            .field("rx_slot", &self.rx_slot)
            .field("has_handler", &self.rx_handler.is_some())
            .finish()
    }
}
