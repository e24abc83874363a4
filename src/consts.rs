// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control-byte constants shared by the XMODEM protocol family.

/// Start of 128-byte data packet.
pub const SOH: u8 = 0x01;
/// Start of 1024-byte data packet (XMODEM-1K / YMODEM).
pub const STX: u8 = 0x02;
/// End of transmission.
pub const EOT: u8 = 0x04;
/// Positive acknowledgement.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement / retransmit request.
pub const NAK: u8 = 0x15;
/// Cancel.
pub const CAN: u8 = 0x18;
/// Requests CRC-16 mode during negotiation.
pub const CRC: u8 = b'C';
/// XON flow-control character, trails ZMODEM hex headers.
pub const XON: u8 = 0x11;
