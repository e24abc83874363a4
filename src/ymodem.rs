// SPDX-License-Identifier: MIT OR Apache-2.0
//! YMODEM batch transfer: one or more named files in a single session, built
//! on the same packet engine as XMODEM-1K plus a text metadata packet 0 in
//! front of each file's data.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use log::{info, warn};

use crate::channel::Channel;
use crate::error::{Error, MalformedField, Result};
use crate::xmodem::engine::{Capability, Engine};

/// One file offered to [`Ymodem::send`].
pub struct OutgoingFile<'a> {
    /// Name recorded in the batch header; need not match any real path.
    pub name: String,
    /// Declared size in bytes, carried in the header for the receiver's info.
    pub size: u64,
    /// Modification time, recorded as a Unix timestamp if present.
    pub mtime: Option<u64>,
    /// Source of the file's contents.
    pub reader: &'a mut dyn Read,
}

/// A file as handed to the `on_file` callback of [`Ymodem::recv`].
pub struct IncomingFile {
    /// Basename of the path declared by the sender; any directory component
    /// the sender included is stripped before the callback ever sees it.
    pub name: String,
    /// Declared size in bytes (informational; the receiver should stop
    /// reading data once this many bytes have arrived).
    pub size: u64,
    /// Modification time, if the sender included one.
    pub mtime: Option<u64>,
}

pub struct Ymodem<C> {
    engine: Engine<C>,
}

impl<C: Channel> Ymodem<C> {
    pub fn new(channel: C) -> Self {
        Self {
            engine: Engine::new(channel, Capability::YMODEM),
        }
    }

    pub fn into_channel(self) -> C {
        self.engine.into_channel()
    }

    /// Sends a batch of files, each preceded by its own header packet,
    /// terminated by the empty header packet that signals end of batch.
    pub fn send(&mut self, files: &mut [OutgoingFile<'_>], retry: u32, timeout: Duration) -> Result<()> {
        let mut mode = self.engine.negotiate_send(retry, timeout)?;
        for file in files.iter_mut() {
            info!("ymodem: sending header for {}", file.name);
            let header = encode_header(&file.name, file.size, file.mtime);
            self.engine
                .send_packet(0, &pad(&header, 128, 0), 128, mode, retry, timeout)?;
            mode = self.engine.negotiate_send(retry, timeout)?;
            self.engine.send_stream(file.reader, mode, 1, retry, timeout)?;
            mode = self.engine.negotiate_send(retry, timeout)?;
        }
        self.engine
            .send_packet(0, &pad(&[], 128, 0), 128, mode, retry, timeout)?;
        Ok(())
    }

    /// Receives a batch, invoking `on_file` with each file's metadata and an
    /// output stream for its data before moving on to the next header.
    /// Returns the number of files received.
    pub fn recv<W: Write>(
        &mut self,
        retry: u32,
        timeout: Duration,
        mut on_file: impl FnMut(&IncomingFile) -> Result<W>,
    ) -> Result<u32> {
        let mut count = 0u32;
        loop {
            let Some((name, size, mtime)) = self.recv_header(retry, timeout)? else {
                return Ok(count);
            };
            let name = Path::new(&name)
                .file_name()
                .ok_or_else(|| Error::OpenFailure(name.clone()))?
                .to_string_lossy()
                .into_owned();
            let meta = IncomingFile { name, size, mtime };
            info!("ymodem: receiving {} ({} bytes)", meta.name, meta.size);
            let mut output = on_file(&meta)?;
            let (mode, first_byte) = self.engine.negotiate_recv(retry, timeout)?;
            self.engine
                .recv_stream(&mut output, mode, 1, first_byte, retry, timeout)?;
            count += 1;
        }
    }

    /// Receives one header packet, retrying the whole negotiate-and-fetch
    /// exchange up to `retry` times. `Ok(None)` is the empty header that
    /// signals end of batch.
    fn recv_header(&mut self, retry: u32, timeout: Duration) -> Result<Option<(String, u64, Option<u64>)>> {
        let mut last_err = Error::NegotiationFailed;
        for _ in 0..retry {
            let (mode, first_byte) = self.engine.negotiate_recv(retry, timeout)?;
            match self.engine.recv_header_packet(mode, first_byte, timeout) {
                Ok(body) => match parse_header(&body) {
                    Ok(header) => return Ok(header),
                    Err(MalformedField) => {
                        warn!("ymodem: malformed batch header, retrying");
                        last_err = Error::InvalidHeader;
                    }
                },
                Err(e @ (Error::TrailerInvalid | Error::SequenceMismatch { .. })) => {
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }
}

/// Builds a YMODEM batch-header packet body: `name\0size[ mtime-octal]\0`.
fn encode_header(name: &str, size: u64, mtime: Option<u64>) -> Vec<u8> {
    let mut s = format!("{name}\0{size}");
    if let Some(m) = mtime {
        s.push_str(&format!(" {m:o}"));
    }
    s.push('\0');
    s.into_bytes()
}

/// Parses a batch-header packet body. `Ok(None)` is the empty-name marker
/// that ends the batch; `Err` means the body didn't look like a header at
/// all (no embedded NUL).
fn parse_header(body: &[u8]) -> std::result::Result<Option<(String, u64, Option<u64>)>, MalformedField> {
    let name_end = body.iter().position(|&b| b == 0).ok_or(MalformedField)?;
    if name_end == 0 {
        return Ok(None);
    }
    let name = String::from_utf8_lossy(&body[..name_end]).into_owned();
    let rest = &body[name_end + 1..];
    let rest_end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let text = std::str::from_utf8(&rest[..rest_end]).map_err(|_| MalformedField)?;
    let mut parts = text.split_whitespace();
    let size: u64 = parts.next().ok_or(MalformedField)?.parse().map_err(|_| MalformedField)?;
    let mtime = parts.next().and_then(|m| u64::from_str_radix(m, 8).ok());
    Ok(Some((name, size, mtime)))
}

fn pad(data: &[u8], len: usize, fill: u8) -> Vec<u8> {
    let mut v = data.to_vec();
    v.resize(len, fill);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_with_mtime() {
        let encoded = encode_header("report.txt", 4096, Some(1_700_000_000));
        let (name, size, mtime) = parse_header(&encoded).unwrap().unwrap();
        assert_eq!(name, "report.txt");
        assert_eq!(size, 4096);
        assert_eq!(mtime, Some(1_700_000_000));
    }

    #[test]
    fn header_roundtrip_without_mtime() {
        let encoded = encode_header("a.bin", 1, None);
        let (name, size, mtime) = parse_header(&encoded).unwrap().unwrap();
        assert_eq!(name, "a.bin");
        assert_eq!(size, 1);
        assert_eq!(mtime, None);
    }

    #[test]
    fn empty_header_is_batch_end() {
        let encoded = pad(&[], 128, 0);
        assert_eq!(parse_header(&encoded).unwrap(), None);
    }

    #[test]
    fn header_without_nul_is_malformed() {
        let body = vec![b'x'; 128];
        assert!(parse_header(&body).is_err());
    }
}
