// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared error taxonomy for every protocol in this crate.

use std::fmt;

/// Errors produced while driving an XMODEM/YMODEM/ZMODEM session.
///
/// Every fatal condition described by the individual protocol state machines
/// maps to one of these variants. Locally-recoverable conditions (a bad
/// sequence number, a bad trailer) are retried internally and only surface
/// here once the retry budget is exhausted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Exceeded `retry` during initial CRC/checksum negotiation.
    #[error("negotiation failed after exhausting retries")]
    NegotiationFailed,

    /// `seq1 != expected` or `seq2 != 255 - expected`.
    #[error("packet sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch {
        /// The sequence number the receiver expected.
        expected: u8,
        /// The sequence number actually observed.
        got: u8,
    },

    /// Checksum or CRC-16/32 mismatch on a packet or frame trailer.
    #[error("packet trailer failed validation")]
    TrailerInvalid,

    /// A byte outside the expected protocol alphabet was read.
    #[error("unexpected byte 0x{0:02x} on the wire")]
    ProtocolUnexpectedByte(u8),

    /// Two consecutive `CAN` bytes, or a ZMODEM `ZCAN`, were observed.
    #[error("transfer cancelled by peer")]
    PeerCancelled,

    /// The byte channel failed: `put` returned `None`, or `get` returned
    /// `None` beyond the local retry budget.
    #[error("channel I/O failure")]
    ChannelFailure(#[from] std::io::Error),

    /// The receiver could not open the destination file.
    #[error("could not open destination file: {0}")]
    OpenFailure(String),

    /// A structural header failed validation: a ZMODEM frame header failed
    /// its CRC, or a YMODEM batch-header packet didn't parse.
    #[error("invalid protocol header")]
    InvalidHeader,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for conditions that should terminate the session immediately
    /// (as opposed to ones retried internally before ever reaching a caller).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::SequenceMismatch { .. } | Error::TrailerInvalid)
    }
}

/// Byte ranges or ASCII content that fails a structural parse (YMODEM/ZMODEM
/// metadata fields). Kept distinct from [`Error`] since it never crosses the
/// channel boundary — it's always converted to a protocol-level error by the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedField;

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed protocol field")
    }
}

impl std::error::Error for MalformedField {}
