//! L2CAP stack context and data pipelines
//!
//! This module provides the stack context object that owns the channel
//! pool, together with the receive and transmit pipelines and the traits
//! through which the surrounding stack plugs in: the connection
//! registry's CID lookup and the lower transport's send.

use log::{debug, trace};

use crate::channel::Channel;
use crate::constants::{L2CAP_CHAN_MAX, L2CAP_HDR_SZ};
use crate::packet::{prepend_hdr, L2capHeader};
use crate::pool::{ChannelHandle, ChannelPool};
use crate::types::{AclDataHdr, L2capError, L2capResult, PacketBoundary};

/// CID-to-channel resolution, supplied by the connection registry
pub trait ChannelLookup<C> {
    /// Resolve a CID on a connection to a channel handle
    fn find_channel(&self, conn: &C, cid: u16) -> Option<ChannelHandle>;
}

/// Outbound frame delivery, supplied by the lower transport
pub trait Transport {
    /// Transmit one framed L2CAP packet
    ///
    /// The frame is consumed unconditionally, success or failure.
    fn send(&mut self, frame: Vec<u8>) -> L2capResult<()>;
}

/// L2CAP stack context
///
/// Owns the channel pool; every operation takes the context explicitly,
/// so independent stack instances can coexist. The caller serializes
/// access (one inbound/outbound unit at a time per connection); the
/// stack performs no internal locking.
pub struct L2capStack<C> {
    pool: ChannelPool<C>,
}

impl<C> L2capStack<C> {
    /// Create a stack with the default channel capacity
    pub fn new() -> L2capResult<Self> {
        Self::with_capacity(L2CAP_CHAN_MAX)
    }

    /// Create a stack with an explicit channel capacity
    pub fn with_capacity(capacity: usize) -> L2capResult<Self> {
        Ok(Self {
            pool: ChannelPool::new(capacity)?,
        })
    }

    /// Free every channel and reinitialize the pool in place
    pub fn reset(&mut self) {
        self.pool.reset();
    }

    /// Access the channel pool
    pub fn pool(&self) -> &ChannelPool<C> {
        &self.pool
    }

    /// Allocate a channel for `cid` with the given MTU floor
    ///
    /// Returns `None` when the pool is at capacity.
    pub fn create_channel(&mut self, cid: u16, default_mtu: u16) -> Option<ChannelHandle> {
        let handle = self.pool.alloc(cid, default_mtu)?;
        trace!("created channel CID {:#06x}", cid);
        Some(handle)
    }

    /// Close a channel and return its slot to the pool
    pub fn close_channel(&mut self, handle: ChannelHandle) -> L2capResult<()> {
        let chan = self.pool.free(handle)?;
        trace!("closed channel CID {:#06x}", chan.cid());
        Ok(())
    }

    /// Look up a channel by handle
    pub fn channel(&self, handle: ChannelHandle) -> Option<&Channel<C>> {
        self.pool.get(handle)
    }

    /// Look up a channel by handle, mutably
    pub fn channel_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel<C>> {
        self.pool.get_mut(handle)
    }

    /// Process one inbound L2CAP frame
    ///
    /// Deframes the unit described by `acl_hdr`, resolves the CID
    /// through `lookup`, and dispatches the payload to the channel's
    /// registered handler. The buffer is consumed on every path; a
    /// malformed or unroutable frame is discarded without any handler
    /// running, and the handler's status is propagated to the caller.
    ///
    /// Panics if the unit is a fragment: reassembly is the link layer's
    /// job, and a fragment reaching this layer means the layer below is
    /// broken.
    pub fn rx<L>(
        &mut self,
        lookup: &L,
        conn: &mut C,
        acl_hdr: &AclDataHdr,
        mut buf: Vec<u8>,
    ) -> L2capResult<()>
    where
        L: ChannelLookup<C>,
    {
        assert_eq!(
            acl_hdr.pb,
            PacketBoundary::Complete,
            "fragmented ACL data units are unsupported"
        );

        let hdr = L2capHeader::parse(&buf, 0)?;

        // Strip the L2CAP header from the front of the buffer.
        buf.drain(..L2CAP_HDR_SZ);

        if Some(hdr.length) != acl_hdr.len.checked_sub(L2CAP_HDR_SZ as u16) {
            debug!(
                "dropping frame on CID {:#06x}: header says {} bytes, link layer says {}",
                hdr.cid, hdr.length, acl_hdr.len
            );
            return Err(L2capError::MessageSizeMismatch);
        }

        let handle = match lookup.find_channel(conn, hdr.cid) {
            Some(handle) => handle,
            None => {
                debug!("dropping frame for unknown CID {:#06x}", hdr.cid);
                return Err(L2capError::ChannelNotFound(hdr.cid));
            }
        };
        let chan = self
            .pool
            .get_mut(handle)
            .ok_or(L2capError::ChannelNotFound(hdr.cid))?;

        rx_payload(conn, chan, buf)
    }

    /// Transmit a payload on a channel
    ///
    /// The payload is consumed regardless of outcome: it is either
    /// framed and handed to `transport` (which consumes the frame
    /// unconditionally) or dropped here, exactly once, before the error
    /// is returned.
    pub fn tx<T>(
        &self,
        handle: ChannelHandle,
        payload: Vec<u8>,
        transport: &mut T,
    ) -> L2capResult<()>
    where
        T: Transport,
    {
        let chan = self.pool.get(handle).ok_or(L2capError::StaleHandle)?;

        // On failure the payload has already been dropped inside
        // prepend_hdr; ownership never forks.
        let frame = prepend_hdr(chan.cid(), payload)?;

        trace!(
            "tx {} bytes on CID {:#06x}",
            frame.len() - L2CAP_HDR_SZ,
            chan.cid()
        );

        transport.send(frame)
    }
}

/// Dispatch a deframed payload to a channel's handler
///
/// The payload occupies the channel's receive slot for exactly the span
/// of the handler invocation; whatever the handler leaves behind is
/// disposed before this function returns, so no buffer outlives a
/// dispatch.
fn rx_payload<C>(conn: &mut C, chan: &mut Channel<C>, buf: Vec<u8>) -> L2capResult<()> {
    chan.begin_rx();

    let mut slot = Some(buf);
    let rc = match chan.take_rx_handler() {
        Some(mut handler) => {
            let rc = handler(conn, chan, &mut slot);
            chan.put_rx_handler(handler);
            rc
        }
        None => {
            debug!("no handler on CID {:#06x}, payload dropped", chan.cid());
            Ok(())
        }
    };

    chan.end_rx();
    drop(slot);

    rc
}
