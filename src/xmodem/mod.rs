// SPDX-License-Identifier: MIT OR Apache-2.0
//! XMODEM, XMODEM-CRC and XMODEM-1K: single-file transfer over a [`Channel`].
//!
//! All three variants share one frame loop ([`engine::Engine`]); they differ
//! only in the [`Capability`](engine::Capability) they negotiate with.

pub(crate) mod engine;

use std::io::{Read, Write};
use std::time::Duration;

use log::info;

use crate::channel::Channel;
use crate::error::Result;
use engine::{Capability, Engine};

/// Default retry budget for negotiation and packet retransmission.
pub const DEFAULT_RETRY: u32 = 16;

/// An XMODEM-family sender/receiver, specialized by [`Capability`] at
/// construction time rather than by type.
pub struct Xmodem<C> {
    engine: Engine<C>,
}

impl<C: Channel> Xmodem<C> {
    /// Classic XMODEM: 128-byte packets, checksum or CRC-16 (receiver's choice).
    pub fn new(channel: C) -> Self {
        Self {
            engine: Engine::new(channel, Capability::CLASSIC),
        }
    }

    /// XMODEM-CRC: 128-byte packets, CRC-16 mandatory.
    pub fn new_crc(channel: C) -> Self {
        Self {
            engine: Engine::new(channel, Capability::CRC),
        }
    }

    /// XMODEM-1K: 128- or 1024-byte packets, CRC-16 mandatory.
    pub fn new_1k(channel: C) -> Self {
        Self {
            engine: Engine::new(channel, Capability::ONE_K),
        }
    }

    /// Recovers the wrapped channel.
    pub fn into_channel(self) -> C {
        self.engine.into_channel()
    }

    /// Sends the full contents of `input` as an XMODEM transfer.
    ///
    /// Returns `Err` if negotiation or retransmission exhausts `retry`, the
    /// peer cancels, or `input` itself fails to read.
    pub fn send(&mut self, input: &mut impl Read, retry: u32, timeout: Duration) -> Result<()> {
        let mode = self.engine.negotiate_send(retry, timeout)?;
        info!("xmodem: negotiated {mode:?}, sending");
        self.engine.send_stream(input, mode, 1, retry, timeout)
    }

    /// Same as [`Xmodem::send`], collapsing any failure to `false` to match
    /// the protocol's traditional boolean success contract.
    pub fn send_bool(&mut self, input: &mut impl Read, retry: u32, timeout: Duration) -> bool {
        self.send(input, retry, timeout).is_ok()
    }

    /// Receives an XMODEM transfer into `output`, returning the number of
    /// bytes written (padding included; XMODEM carries no framed length).
    pub fn recv(&mut self, output: &mut impl Write, retry: u32, timeout: Duration) -> Result<u64> {
        let (mode, first_byte) = self.engine.negotiate_recv(retry, timeout)?;
        info!("xmodem: negotiated {mode:?}, receiving");
        self.engine.recv_stream(output, mode, 1, first_byte, retry, timeout)
    }

    /// Same as [`Xmodem::recv`], collapsing any failure to `None` to match
    /// the protocol's traditional byte-count-or-none contract.
    pub fn recv_count(
        &mut self,
        output: &mut impl Write,
        retry: u32,
        timeout: Duration,
    ) -> Option<u64> {
        self.recv(output, retry, timeout).ok()
    }
}
