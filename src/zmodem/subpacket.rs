// SPDX-License-Identifier: MIT OR Apache-2.0
//! ZMODEM data-subpacket framing: ZDLE-decoded payload bytes terminated by a
//! tagged `ZCRC{E,G,Q,W}` code.

use core::convert::TryFrom;
use std::time::Duration;

use crate::channel::Channel;
use crate::crc::{crc16, crc32};
use crate::error::{Error, Result};

use super::frame::{Encoding, UNZDLE_TABLE, ZDLE};

/// What a subpacket's terminator says about the frame it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeKind {
    /// More subpackets follow; no acknowledgement expected.
    Continue,
    /// End of frame; a header packet follows.
    EndOfFrame,
    /// More subpackets follow; the receiver should `ZACK` this position.
    ContinueAck,
    /// End of frame; the receiver should `ZACK` this position.
    EndOfFrameAck,
}

impl SubframeKind {
    /// True when the receiver owes the sender an immediate `ZACK`.
    pub fn wants_ack(self) -> bool {
        matches!(self, SubframeKind::ContinueAck | SubframeKind::EndOfFrameAck)
    }

    /// True when this subpacket is the last one in its frame.
    pub fn ends_frame(self) -> bool {
        matches!(self, SubframeKind::EndOfFrame | SubframeKind::EndOfFrameAck)
    }
}

impl TryFrom<u8> for SubframeKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x68 => Ok(SubframeKind::EndOfFrame),  // ZCRCE
            0x69 => Ok(SubframeKind::Continue),    // ZCRCG
            0x6a => Ok(SubframeKind::ContinueAck), // ZCRCQ
            0x6b => Ok(SubframeKind::EndOfFrameAck), // ZCRCW
            _ => Err(Error::InvalidHeader),
        }
    }
}

/// One decoded unit off the wire inside a subpacket: either a data byte or
/// the terminator that closes it. Replaces the sentinel-integer encoding
/// (values `>= 0x100`) the code this is based on used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    Data(u8),
    Terminator(SubframeKind),
}

fn read_byte_unescaped<C: Channel>(channel: &mut C, timeout: Duration) -> Result<u8> {
    let b = channel
        .get_byte(timeout)
        .ok_or_else(|| Error::ChannelFailure(std::io::Error::new(std::io::ErrorKind::TimedOut, "channel timed out")))?;
    Ok(if b == ZDLE {
        let escaped = channel.get_byte(timeout).ok_or_else(|| {
            Error::ChannelFailure(std::io::Error::new(std::io::ErrorKind::TimedOut, "channel timed out"))
        })?;
        UNZDLE_TABLE[escaped as usize]
    } else {
        b
    })
}

fn read_decoded<C: Channel>(channel: &mut C, timeout: Duration) -> Result<Decoded> {
    let b = channel
        .get_byte(timeout)
        .ok_or_else(|| Error::ChannelFailure(std::io::Error::new(std::io::ErrorKind::TimedOut, "channel timed out")))?;
    if b != ZDLE {
        return Ok(Decoded::Data(b));
    }
    let escaped = channel
        .get_byte(timeout)
        .ok_or_else(|| Error::ChannelFailure(std::io::Error::new(std::io::ErrorKind::TimedOut, "channel timed out")))?;
    if let Ok(kind) = SubframeKind::try_from(escaped) {
        return Ok(Decoded::Terminator(kind));
    }
    Ok(Decoded::Data(UNZDLE_TABLE[escaped as usize]))
}

/// Reads one ZDLE-decoded subpacket, verifying its trailing CRC (16-bit for
/// [`Encoding::Bin16`], 32-bit for [`Encoding::Bin32`]; [`Encoding::Hex`]
/// subpackets never occur on the wire and are rejected).
pub fn read_subpacket<C: Channel>(
    channel: &mut C,
    encoding: Encoding,
    timeout: Duration,
) -> Result<(Vec<u8>, SubframeKind)> {
    let mut payload = Vec::new();
    let kind = loop {
        match read_decoded(channel, timeout)? {
            Decoded::Data(byte) => payload.push(byte),
            Decoded::Terminator(kind) => break kind,
        }
    };

    match encoding {
        Encoding::Bin16 => {
            let hi = read_byte_unescaped(channel, timeout)?;
            let lo = read_byte_unescaped(channel, timeout)?;
            let got = u16::from_be_bytes([hi, lo]);
            let mut with_terminator = payload.clone();
            with_terminator.push(terminator_byte(kind));
            if crc16(&with_terminator, 0) != got {
                return Err(Error::TrailerInvalid);
            }
        }
        Encoding::Bin32 => {
            let mut crc_bytes = [0u8; 4];
            for b in &mut crc_bytes {
                *b = read_byte_unescaped(channel, timeout)?;
            }
            let got = u32::from_le_bytes(crc_bytes);
            let mut with_terminator = payload.clone();
            with_terminator.push(terminator_byte(kind));
            if crc32(&with_terminator, 0) != got {
                return Err(Error::TrailerInvalid);
            }
        }
        Encoding::Hex => return Err(Error::InvalidHeader),
    }

    Ok((payload, kind))
}

fn terminator_byte(kind: SubframeKind) -> u8 {
    match kind {
        SubframeKind::EndOfFrame => 0x68,
        SubframeKind::Continue => 0x69,
        SubframeKind::ContinueAck => 0x6a,
        SubframeKind::EndOfFrameAck => 0x6b,
    }
}
