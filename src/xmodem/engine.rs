// SPDX-License-Identifier: MIT OR Apache-2.0
//! The packet-level engine shared by XMODEM, XMODEM-CRC, XMODEM-1K and
//! YMODEM. A [`Capability`] tag parameterizes the handful of places the
//! variants actually differ, so there is one frame loop rather than four
//! near-identical copies.

use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, trace, warn};

use crate::channel::Channel;
use crate::consts;
use crate::crc::TrailerMode;
use crate::error::{Error, Result};

/// The handful of knobs that distinguish the XMODEM-family variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// `STX`-prefixed 1024-byte packets are accepted/produced.
    pub allows_1k: bool,
    /// The peer must offer CRC-16; a plain `NAK` start is rejected.
    pub requires_crc: bool,
}

impl Capability {
    /// Classic XMODEM: 128-byte packets, checksum or CRC.
    pub const CLASSIC: Capability = Capability {
        allows_1k: false,
        requires_crc: false,
    };
    /// XMODEM-CRC: 128-byte packets, CRC-16 mandatory.
    pub const CRC: Capability = Capability {
        allows_1k: false,
        requires_crc: true,
    };
    /// XMODEM-1K: 128- or 1024-byte packets, CRC-16 mandatory.
    pub const ONE_K: Capability = Capability {
        allows_1k: true,
        requires_crc: true,
    };
    /// YMODEM's packet discipline: 128- or 1024-byte packets, CRC-16
    /// preferred but not mandatory (same negotiation fallback as classic
    /// XMODEM).
    pub const YMODEM: Capability = Capability {
        allows_1k: true,
        requires_crc: false,
    };
}

/// Drives the packet exchange for one direction of one file over a
/// [`Channel`]. Stateless between calls beyond the channel itself; sequence
/// numbers are threaded through explicitly so callers (YMODEM) can restart a
/// fresh packet stream at a non-zero sequence without a new engine.
pub(crate) struct Engine<C> {
    channel: C,
    cap: Capability,
}

impl<C: Channel> Engine<C> {
    pub(crate) fn new(channel: C, cap: Capability) -> Self {
        Self { channel, cap }
    }

    pub(crate) fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub(crate) fn into_channel(self) -> C {
        self.channel
    }

    /// Sends two `CAN` bytes, best-effort.
    pub(crate) fn abort(&mut self, timeout: Duration) {
        self.channel.put_byte(consts::CAN, timeout);
        self.channel.put_byte(consts::CAN, timeout);
    }

    /// Sender side negotiation: waits for the receiver's `NAK` (checksum) or
    /// `C` (CRC) start signal.
    pub(crate) fn negotiate_send(&mut self, retry: u32, timeout: Duration) -> Result<TrailerMode> {
        let mut errors = 0u32;
        let mut cancelled_once = false;
        loop {
            match self.channel.get_byte(timeout) {
                Some(consts::CRC) => return Ok(TrailerMode::Crc),
                Some(consts::NAK) if !self.cap.requires_crc => return Ok(TrailerMode::Checksum),
                Some(consts::CAN) => {
                    if cancelled_once {
                        return Err(Error::PeerCancelled);
                    }
                    cancelled_once = true;
                }
                Some(byte) => {
                    trace!("negotiate_send: ignoring unexpected byte 0x{byte:02x}");
                    cancelled_once = false;
                }
                None => {
                    cancelled_once = false;
                }
            }
            errors += 1;
            if errors >= retry {
                self.abort(timeout);
                return Err(Error::NegotiationFailed);
            }
        }
    }

    /// Receiver side negotiation: emits `C` for roughly the first half of the
    /// retry budget, then falls back to plain `NAK`. Returns the negotiated
    /// trailer mode together with the start byte (`SOH`/`STX`) that ended
    /// negotiation, since the caller already consumed it.
    pub(crate) fn negotiate_recv(
        &mut self,
        retry: u32,
        timeout: Duration,
    ) -> Result<(TrailerMode, u8)> {
        let mut errors = 0u32;
        let mut cancelled_once = false;
        loop {
            if errors >= retry {
                self.abort(timeout);
                return Err(Error::NegotiationFailed);
            }
            // A capability that mandates CRC keeps probing with `C` for the
            // whole budget; otherwise fall back to plain `NAK` once past the
            // halfway point, same as the classic negotiation dance.
            let use_crc = self.cap.requires_crc || errors < retry / 2;
            let probe = if use_crc { consts::CRC } else { consts::NAK };
            self.channel.put_byte(probe, timeout);

            let mode = if use_crc {
                TrailerMode::Crc
            } else {
                TrailerMode::Checksum
            };
            match self.channel.get_byte(timeout) {
                Some(consts::SOH) => return Ok((mode, consts::SOH)),
                Some(consts::STX) if self.cap.allows_1k => return Ok((mode, consts::STX)),
                Some(consts::CAN) => {
                    if cancelled_once {
                        return Err(Error::PeerCancelled);
                    }
                    cancelled_once = true;
                    errors += 1;
                }
                Some(byte) => {
                    trace!("negotiate_recv: ignoring unexpected byte 0x{byte:02x}");
                    cancelled_once = false;
                    errors += 1;
                }
                None => {
                    cancelled_once = false;
                    errors += 1;
                }
            }
        }
    }

    /// Sends one data packet (header, sequence pair, padded payload,
    /// trailer), retrying on `NAK` up to `retry` times.
    pub(crate) fn send_packet(
        &mut self,
        seq: u8,
        payload: &[u8],
        packet_size: usize,
        mode: TrailerMode,
        retry: u32,
        timeout: Duration,
    ) -> Result<()> {
        let start = if packet_size > 128 { consts::STX } else { consts::SOH };
        let trailer = mode.trailer(payload);
        let mut frame = Vec::with_capacity(3 + payload.len() + trailer.len());
        frame.push(start);
        frame.push(seq);
        frame.push(0xFF - seq);
        frame.extend_from_slice(payload);
        frame.extend_from_slice(&trailer);

        let mut errors = 0u32;
        loop {
            if self.channel.put(&frame, timeout).is_none() {
                return Err(Error::ChannelFailure(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "channel did not accept packet",
                )));
            }
            match self.channel.get_byte(timeout) {
                Some(consts::ACK) => return Ok(()),
                Some(consts::CAN) => return Err(Error::PeerCancelled),
                Some(byte) => {
                    if byte != consts::NAK {
                        warn!("send_packet: unexpected byte 0x{byte:02x}, retrying");
                    }
                }
                None => {}
            }
            errors += 1;
            if errors >= retry {
                self.abort(timeout);
                return Err(Error::NegotiationFailed);
            }
        }
    }

    /// Sends the `EOT` / `ACK` end-of-transmission handshake.
    pub(crate) fn send_eot(&mut self, retry: u32, timeout: Duration) -> Result<()> {
        let mut errors = 0u32;
        loop {
            self.channel.put_byte(consts::EOT, timeout);
            match self.channel.get_byte(timeout) {
                Some(consts::ACK) => return Ok(()),
                _ => {
                    errors += 1;
                    if errors >= retry {
                        return Err(Error::NegotiationFailed);
                    }
                }
            }
        }
    }

    /// Streams `input` as a sequence of data packets starting at `seq`, then
    /// sends the end-of-transmission handshake.
    pub(crate) fn send_stream<R: Read>(
        &mut self,
        input: &mut R,
        mode: TrailerMode,
        mut seq: u8,
        retry: u32,
        timeout: Duration,
    ) -> Result<()> {
        let max_chunk = if self.cap.allows_1k { 1024 } else { 128 };
        let mut buf = vec![0u8; max_chunk];
        loop {
            let n = read_fully(input, &mut buf)?;
            if n == 0 {
                break;
            }
            let packet_size = if self.cap.allows_1k && n > 128 { 1024 } else { 128 };
            let mut payload = buf[..n].to_vec();
            payload.resize(packet_size, 0x00);
            debug!("sending packet seq={seq} size={packet_size}");
            self.send_packet(seq, &payload, packet_size, mode, retry, timeout)?;
            seq = seq.wrapping_add(1);
        }
        self.send_eot(retry, timeout)
    }

    /// Receives a single packet (YMODEM's batch-header packet 0), given the
    /// start byte already consumed by negotiation. Unlike [`recv_stream`],
    /// this does not loop on a bad sequence number or trailer: the caller is
    /// expected to re-negotiate and retry the whole exchange, since a fresh
    /// start byte is needed to resynchronize with the sender either way.
    ///
    /// [`recv_stream`]: Engine::recv_stream
    pub(crate) fn recv_header_packet(
        &mut self,
        mode: TrailerMode,
        first_byte: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let packet_size = match first_byte {
            consts::SOH => 128,
            consts::STX if self.cap.allows_1k => 1024,
            other => return Err(Error::ProtocolUnexpectedByte(other)),
        };
        let seq1 = self.channel.get_byte(timeout);
        let seq2 = self.channel.get_byte(timeout);
        let body_len = packet_size + mode.trailer_len();
        if !matches!((seq1, seq2), (Some(0), Some(0xFF))) {
            drain(&mut self.channel, body_len, timeout);
            self.channel.put_byte(consts::NAK, timeout);
            return Err(Error::SequenceMismatch {
                expected: 0,
                got: seq1.unwrap_or(0),
            });
        }
        let Some(body) = self.channel.get(body_len, timeout) else {
            self.channel.put_byte(consts::NAK, timeout);
            return Err(Error::TrailerInvalid);
        };
        match mode.verify_trailer(&body) {
            Some(payload) => {
                let payload = payload.to_vec();
                self.channel.put_byte(consts::ACK, timeout);
                Ok(payload)
            }
            None => {
                self.channel.put_byte(consts::NAK, timeout);
                Err(Error::TrailerInvalid)
            }
        }
    }

    /// Receives a run of data packets into `output`, starting with
    /// `first_byte` already consumed by negotiation, until `EOT`. Returns the
    /// number of payload bytes written (trailing pad bytes included, as the
    /// protocol has no framed length).
    pub(crate) fn recv_stream<W: Write>(
        &mut self,
        output: &mut W,
        mode: TrailerMode,
        mut expected_seq: u8,
        first_byte: u8,
        retry: u32,
        timeout: Duration,
    ) -> Result<u64> {
        let mut total = 0u64;
        let mut errors = 0u32;
        let mut cancelled_once = false;
        let mut next_byte = Some(first_byte);

        loop {
            let byte = match next_byte.take() {
                Some(b) => b,
                None => match self.channel.get_byte(timeout) {
                    Some(b) => b,
                    None => {
                        errors += 1;
                        if errors >= retry {
                            self.abort(timeout);
                            return Err(Error::NegotiationFailed);
                        }
                        continue;
                    }
                },
            };

            let packet_size = match byte {
                consts::SOH => 128,
                consts::STX if self.cap.allows_1k => 1024,
                consts::EOT => {
                    self.channel.put_byte(consts::ACK, timeout);
                    return Ok(total);
                }
                consts::CAN => {
                    if cancelled_once {
                        return Err(Error::PeerCancelled);
                    }
                    cancelled_once = true;
                    continue;
                }
                other => {
                    errors += 1;
                    if errors >= retry {
                        self.abort(timeout);
                        return Err(Error::ProtocolUnexpectedByte(other));
                    }
                    self.channel.put_byte(consts::NAK, timeout);
                    continue;
                }
            };
            cancelled_once = false;

            let seq1 = self.channel.get_byte(timeout);
            let seq2 = self.channel.get_byte(timeout);
            let body_len = packet_size + mode.trailer_len();

            let seq_ok = matches!((seq1, seq2), (Some(a), Some(b)) if a == expected_seq && b == 0xFF - expected_seq);
            if !seq_ok {
                drain(&mut self.channel, body_len, timeout);
                self.channel.put_byte(consts::NAK, timeout);
                next_byte = self.channel.get_byte(timeout);
                errors += 1;
                if errors >= retry {
                    self.abort(timeout);
                    return Err(Error::SequenceMismatch {
                        expected: expected_seq,
                        got: seq1.unwrap_or(0),
                    });
                }
                continue;
            }

            let Some(body) = self.channel.get(body_len, timeout) else {
                self.channel.put_byte(consts::NAK, timeout);
                next_byte = self.channel.get_byte(timeout);
                errors += 1;
                if errors >= retry {
                    self.abort(timeout);
                    return Err(Error::TrailerInvalid);
                }
                continue;
            };

            match mode.verify_trailer(&body) {
                Some(payload) => {
                    output.write_all(payload)?;
                    total += payload.len() as u64;
                    self.channel.put_byte(consts::ACK, timeout);
                    expected_seq = expected_seq.wrapping_add(1);
                    errors = 0;
                    next_byte = self.channel.get_byte(timeout);
                }
                None => {
                    self.channel.put_byte(consts::NAK, timeout);
                    next_byte = self.channel.get_byte(timeout);
                    errors += 1;
                    if errors >= retry {
                        self.abort(timeout);
                        return Err(Error::TrailerInvalid);
                    }
                }
            }
        }
    }
}

/// Reads until `buf` is full or the stream is exhausted, unlike
/// [`Read::read_exact`] which treats a short final read as an error.
fn read_fully<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn drain<C: Channel>(channel: &mut C, len: usize, timeout: Duration) {
    channel.get(len, timeout);
}
