// SPDX-License-Identifier: MIT OR Apache-2.0
//! ZMODEM frame types, header encodings, the ZDLE escape codec and the
//! `ZRINIT` capability flags.

use core::convert::TryFrom;
use std::fmt;

use bitflags::bitflags;

use crate::error::{Error, Result};

/// Begins every ZMODEM header (`ZPAD ZPAD? ZDLE <encoding> ...`).
pub const ZPAD: u8 = b'*';
/// ZMODEM's data-link escape byte.
pub const ZDLE: u8 = 0x18;
/// Trails a hex header so the line discipline on old ttys stays sane.
pub const XON: u8 = 0x11;

/// One byte following a header's `ZDLE` that selects how the rest of the
/// header is encoded.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Bin16 = 0x41,
    Hex = 0x42,
    Bin32 = 0x43,
}

impl Encoding {
    /// Payload + CRC length, in *unescaped* wire bytes, excluding the
    /// `ZPAD`/`ZDLE`/encoding prefix.
    pub const fn trailer_len(self) -> usize {
        match self {
            Encoding::Bin16 => 5 + 2,
            Encoding::Bin32 => 5 + 4,
            Encoding::Hex => (5 + 2) * 2,
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x41 => Ok(Encoding::Bin16),
            0x42 => Ok(Encoding::Hex),
            0x43 => Ok(Encoding::Bin32),
            _ => Err(Error::InvalidHeader),
        }
    }
}

/// ZMODEM header (frame) types.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    ZRQINIT = 0,
    ZRINIT = 1,
    ZSINIT = 2,
    ZACK = 3,
    ZFILE = 4,
    ZSKIP = 5,
    ZNAK = 6,
    ZABORT = 7,
    ZFIN = 8,
    ZRPOS = 9,
    ZDATA = 10,
    ZEOF = 11,
    ZFERR = 12,
    ZCRC = 13,
    ZCHALLENGE = 14,
    ZCOMPL = 15,
    ZCAN = 16,
    ZFREECNT = 17,
    ZCOMMAND = 18,
    ZSTDERR = 19,
}

const FRAMES: &[Frame] = &[
    Frame::ZRQINIT,
    Frame::ZRINIT,
    Frame::ZSINIT,
    Frame::ZACK,
    Frame::ZFILE,
    Frame::ZSKIP,
    Frame::ZNAK,
    Frame::ZABORT,
    Frame::ZFIN,
    Frame::ZRPOS,
    Frame::ZDATA,
    Frame::ZEOF,
    Frame::ZFERR,
    Frame::ZCRC,
    Frame::ZCHALLENGE,
    Frame::ZCOMPL,
    Frame::ZCAN,
    Frame::ZFREECNT,
    Frame::ZCOMMAND,
    Frame::ZSTDERR,
];

impl TryFrom<u8> for Frame {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        FRAMES
            .iter()
            .copied()
            .find(|f| *f as u8 == value)
            .ok_or(Error::InvalidHeader)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u8)
    }
}

bitflags! {
    /// `ZRINIT` capability flags (the `ZF0` byte).
    pub struct Zrinit: u8 {
        /// Can send and receive in full duplex.
        const CANFDX = 0x01;
        /// Can overlap disk I/O with receiving.
        const CANOVIO = 0x02;
        /// Can send a break signal.
        const CANBRK = 0x04;
        /// Can decrypt.
        const CANCRY = 0x08;
        /// Can decompress (LZW).
        const CANLZW = 0x10;
        /// Can use a 32-bit frame check.
        const CANFC32 = 0x20;
        /// Expects control characters to be escaped.
        const ESCCTL = 0x40;
        /// Expects the 8th bit to be escaped.
        const ESC8 = 0x80;
    }
}

/// Capabilities this receiver advertises in every `ZRINIT` it sends.
pub const OUR_CAPABILITIES: Zrinit = Zrinit::from_bits_truncate(
    Zrinit::CANFDX.bits() | Zrinit::CANOVIO.bits() | Zrinit::CANFC32.bits() | 0x04,
);

/// Table mapping an escaped byte (the one following `ZDLE` on the wire) back
/// to its raw value, for reception. This receiver only ever emits hex
/// headers, which never need a raw-to-escaped table, so only this direction
/// exists.
pub const UNZDLE_TABLE: [u8; 0x100] = build_unzdle_table();

const fn build_unzdle_table() -> [u8; 0x100] {
    let mut table = [0u8; 0x100];
    let mut i = 0;
    while i < 0x100 {
        let b = i as u8;
        table[i] = match b {
            0x7f => 0x7f, // ZRUB0, overwritten below via explicit cases
            _ => b,
        };
        i += 1;
    }
    // ZRUB0/ZRUB1: the sender escapes 0x7f/0xff as ZDLE 0x6c/0x6d.
    table[0x6c] = 0x7f;
    table[0x6d] = 0xff;
    let mut i = 0;
    while i < 0x100 {
        let b = i as u8;
        if (b & 0x60) == 0x40 && b != 0x6c && b != 0x6d {
            table[i] = b ^ 0x40;
        }
        i += 1;
    }
    table
}
