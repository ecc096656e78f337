//! bluemux - L2CAP channel multiplexing for a BLE host stack
//!
//! This library implements the L2CAP sublayer that sits between a single
//! physical link and the upper host protocols. It is responsible for:
//! - Multiplexing logical channels (16-bit CIDs) over one connection
//! - Framing and deframing packets with the 4-byte basic L2CAP header
//! - Negotiating and reporting the effective MTU per channel
//! - Dispatching inbound payloads to registered channel handlers with
//!   guaranteed buffer cleanup on every path
//!
//! The surrounding stack plugs in through two traits: [`ChannelLookup`]
//! (the connection registry's CID resolution) and [`Transport`] (the
//! lower layer's frame delivery). All state lives in an explicit
//! [`L2capStack`] context, so independent stack instances can coexist.

pub mod constants;
pub mod types;
pub mod packet;
pub mod channel;
pub mod pool;
pub mod core;

// Re-export the public API
pub use self::channel::{ChanFlags, Channel, RxHandler, RxSlot};
pub use self::core::{ChannelLookup, L2capStack, Transport};
pub use self::packet::{prepend_hdr, L2capHeader};
pub use self::pool::{ChannelHandle, ChannelPool};
pub use self::types::{AclDataHdr, L2capError, L2capResult, PacketBoundary};
