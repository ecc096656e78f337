//! Constants for the L2CAP multiplexing layer

/// Size of the basic L2CAP header in bytes (length + CID)
pub const L2CAP_HDR_SZ: usize = 4;

/// Maximum number of simultaneously live channels in the pool
pub const L2CAP_CHAN_MAX: usize = 32;

/// Default MTU floor for LE channels (the BLE default ATT MTU)
pub const L2CAP_MTU_DEFAULT: u16 = 23;

/// Fixed CID for the Attribute Protocol (ATT)
pub const L2CAP_CID_ATT: u16 = 0x0004;

/// Fixed CID for the LE signaling channel
pub const L2CAP_CID_SIG: u16 = 0x0005;

/// Fixed CID for the Security Manager Protocol (SMP)
pub const L2CAP_CID_SM: u16 = 0x0006;
