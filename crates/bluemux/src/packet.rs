//! L2CAP basic header codec
//!
//! This module parses and serializes the 4-byte basic L2CAP header
//! (payload length + CID, little-endian on the wire regardless of host
//! byte order) and builds outbound frames from raw payloads.

use crate::constants::L2CAP_HDR_SZ;
use crate::types::{L2capError, L2capResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// L2CAP basic header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2capHeader {
    /// Length of the L2CAP payload in bytes
    pub length: u16,
    /// Channel Identifier
    pub cid: u16,
}

impl L2capHeader {
    /// Create a new L2CAP header
    pub fn new(length: u16, cid: u16) -> Self {
        Self { length, cid }
    }

    /// Parse an L2CAP header from raw bytes starting at `offset`
    ///
    /// Reads exactly 4 bytes; fails with `MessageTooShort` if fewer are
    /// available.
    pub fn parse(data: &[u8], offset: usize) -> L2capResult<Self> {
        if data.len() < offset + L2CAP_HDR_SZ {
            return Err(L2capError::MessageTooShort);
        }

        let mut cursor = Cursor::new(&data[offset..offset + L2CAP_HDR_SZ]);
        let length = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| L2capError::MessageTooShort)?;
        let cid = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| L2capError::MessageTooShort)?;

        Ok(Self { length, cid })
    }

    /// Serialize the header to bytes
    ///
    /// Well-defined for any `u16` length/CID pair.
    pub fn to_bytes(&self) -> [u8; L2CAP_HDR_SZ] {
        let mut result = [0u8; L2CAP_HDR_SZ];
        let mut cursor = Cursor::new(&mut result[..]);

        cursor.write_u16::<LittleEndian>(self.length).unwrap();
        cursor.write_u16::<LittleEndian>(self.cid).unwrap();

        result
    }
}

/// Frame a payload for transmission on the channel identified by `cid`
///
/// Computes the header length from the payload size and returns a fresh
/// buffer holding header followed by payload. The payload is consumed on
/// every path; on failure it is dropped here so the caller never has to
/// reason about a half-transferred buffer.
///
/// Fails with `PayloadTooLarge` when the payload size does not fit the
/// 16-bit length field.
pub fn prepend_hdr(cid: u16, payload: Vec<u8>) -> L2capResult<Vec<u8>> {
    let length = u16::try_from(payload.len())
        .map_err(|_| L2capError::PayloadTooLarge(payload.len()))?;

    let hdr = L2capHeader::new(length, cid);

    let mut frame = Vec::with_capacity(L2CAP_HDR_SZ + payload.len());
    frame.extend_from_slice(&hdr.to_bytes());
    frame.extend_from_slice(&payload);

    Ok(frame)
}
