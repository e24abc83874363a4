// SPDX-License-Identifier: MIT OR Apache-2.0
//! ZMODEM receiver: connection handshake, file-offer/receive loop, and
//! session teardown. Sending is out of scope — this crate only ever answers
//! a ZMODEM sender's offers.

pub(crate) mod frame;
mod header;
mod subpacket;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use filetime::{set_file_times, FileTime};
use log::{debug, info, warn};

use crate::channel::Channel;
use crate::error::{Error, Result};

use frame::{Frame, OUR_CAPABILITIES};
use header::{read_header, write_header, Header};
use subpacket::read_subpacket;

/// Header-CRC error budget before a stalled exchange is given up on: this is
/// the `errors=10` referenced in the original protocol's receive loop.
pub const DEFAULT_RETRY: u32 = 10;

pub struct Zmodem<C> {
    channel: C,
}

impl<C: Channel> Zmodem<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Receives a ZMODEM session's worth of files into `base_dir`, returning
    /// how many were received.
    pub fn recv(
        &mut self,
        base_dir: &Path,
        retry: u32,
        timeout: Duration,
        delay: Duration,
    ) -> Result<u32> {
        let mut count = 0u32;
        let mut errors = 0u32;
        let mut connected = false;

        loop {
            if !connected {
                write_header(&mut self.channel, zrinit_header(), timeout);
            }
            let header = match read_header(&mut self.channel, timeout) {
                Some(h) => h,
                None => {
                    errors += 1;
                    if errors >= retry {
                        return Err(Error::NegotiationFailed);
                    }
                    if !connected {
                        thread::sleep(delay);
                    }
                    continue;
                }
            };
            errors = 0;

            if !connected {
                if header.frame == Frame::ZRQINIT {
                    thread::sleep(delay);
                    continue;
                }
                connected = true;
                info!("zmodem: connected");
            }

            match header.frame {
                Frame::ZFILE => {
                    self.receive_file(header, base_dir, retry, timeout)?;
                    count += 1;
                }
                Frame::ZFIN => break,
                Frame::ZCAN => return Err(Error::PeerCancelled),
                other => {
                    debug!("zmodem: ignoring {other:?} while awaiting a file offer");
                    write_header(&mut self.channel, Header::with_position(Frame::ZCOMPL, 0), timeout);
                }
            }
        }

        write_header(&mut self.channel, Header::new(Frame::ZFIN, [0; 4]), timeout);
        self.await_over_and_out(timeout);
        Ok(count)
    }

    /// Same as [`Zmodem::recv`], collapsing any failure to `None`.
    pub fn recv_count(
        &mut self,
        base_dir: &Path,
        retry: u32,
        timeout: Duration,
        delay: Duration,
    ) -> Option<u32> {
        self.recv(base_dir, retry, timeout, delay).ok()
    }

    fn receive_file(
        &mut self,
        file_header: Header,
        base_dir: &Path,
        retry: u32,
        timeout: Duration,
    ) -> Result<()> {
        let mut metadata = Vec::new();
        loop {
            let (chunk, terminator) = read_subpacket(&mut self.channel, file_header.encoding, timeout)?;
            metadata.extend_from_slice(&chunk);
            if terminator.wants_ack() {
                write_header(&mut self.channel, Header::with_position(Frame::ZACK, 0), timeout);
            }
            if terminator.ends_frame() {
                break;
            }
        }

        let (name, _declared_size, mtime) = parse_zfile_metadata(&metadata)?;
        let dest_name = Path::new(&name)
            .file_name()
            .ok_or_else(|| Error::OpenFailure(name.clone()))?;
        let dest_path = base_dir.join(dest_name);
        let mut file = File::create(&dest_path)
            .map_err(|e| Error::OpenFailure(format!("{}: {e}", dest_path.display())))?;
        info!("zmodem: receiving {} into {}", name, dest_path.display());

        let mut position = 0u64;
        write_header(&mut self.channel, Header::with_position(Frame::ZRPOS, position as u32), timeout);

        loop {
            let header = self.await_header(retry, timeout)?;
            match header.frame {
                Frame::ZDATA => {
                    if u64::from(header.position()) != position {
                        write_header(
                            &mut self.channel,
                            Header::with_position(Frame::ZRPOS, position as u32),
                            timeout,
                        );
                        continue;
                    }
                    loop {
                        let (data, kind) = read_subpacket(&mut self.channel, header.encoding, timeout)?;
                        file.write_all(&data)?;
                        position += data.len() as u64;
                        if kind.wants_ack() {
                            write_header(
                                &mut self.channel,
                                Header::with_position(Frame::ZACK, position as u32),
                                timeout,
                            );
                        }
                        if kind.ends_frame() {
                            break;
                        }
                    }
                }
                Frame::ZEOF => {
                    if u64::from(header.position()) == position {
                        break;
                    }
                    warn!(
                        "zmodem: ZEOF position mismatch ({} != {position})",
                        header.position()
                    );
                    write_header(
                        &mut self.channel,
                        Header::with_position(Frame::ZRPOS, position as u32),
                        timeout,
                    );
                }
                Frame::ZCAN => return Err(Error::PeerCancelled),
                _ => {
                    write_header(
                        &mut self.channel,
                        Header::with_position(Frame::ZRPOS, position as u32),
                        timeout,
                    );
                }
            }
        }

        drop(file);
        if let Some(mtime) = mtime {
            let stamp = FileTime::from_unix_time(mtime as i64, 0);
            if let Err(e) = set_file_times(&dest_path, stamp, stamp) {
                warn!("zmodem: could not set mtime on {}: {e}", dest_path.display());
            }
        }
        Ok(())
    }

    /// Reads headers until one parses, counting only failures against
    /// `retry` (the `errors=10` budget).
    fn await_header(&mut self, retry: u32, timeout: Duration) -> Result<Header> {
        let mut errors = 0u32;
        loop {
            if let Some(header) = read_header(&mut self.channel, timeout) {
                return Ok(header);
            }
            errors += 1;
            if errors >= retry {
                return Err(Error::InvalidHeader);
            }
        }
    }

    /// Waits (best-effort, bounded) for the sender's "Over and Out" `OO`.
    fn await_over_and_out(&mut self, timeout: Duration) {
        let mut run_of_o = 0u32;
        let mut attempts = 0u32;
        while run_of_o < 2 && attempts < 10 {
            match self.channel.get_byte(timeout) {
                Some(b'O') => run_of_o += 1,
                Some(_) => run_of_o = 0,
                None => attempts += 1,
            }
        }
    }
}

fn zrinit_header() -> Header {
    // P0..P2 are 0, P3 carries the capability byte: `position() << 24` is
    // exactly the anomalous `ZP3 << 0x20` reinterpreted at the correct width.
    Header::with_position(Frame::ZRINIT, u32::from(OUR_CAPABILITIES.bits()) << 24)
}

/// Parses a `ZFILE` metadata subpacket: `name\0size[ mtime-octal[ ...]]\0`.
fn parse_zfile_metadata(payload: &[u8]) -> Result<(String, u64, Option<u64>)> {
    let name_end = payload.iter().position(|&b| b == 0).ok_or(Error::InvalidHeader)?;
    if name_end == 0 {
        return Err(Error::InvalidHeader);
    }
    let name = String::from_utf8_lossy(&payload[..name_end]).into_owned();
    let rest = &payload[name_end + 1..];
    let rest_end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let text = std::str::from_utf8(&rest[..rest_end]).map_err(|_| Error::InvalidHeader)?;
    let mut parts = text.split_whitespace();
    let size: u64 = parts
        .next()
        .ok_or(Error::InvalidHeader)?
        .parse()
        .map_err(|_| Error::InvalidHeader)?;
    let mtime = parts.next().and_then(|m| u64::from_str_radix(m, 8).ok());
    Ok((name, size, mtime))
}
