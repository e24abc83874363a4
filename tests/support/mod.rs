// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared plumbing for the integration tests: a duplex stream built from two
//! independent halves, and a minimal hand-rolled ZMODEM wire encoder used to
//! play the part of a sending peer without needing a real ZMODEM sender.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use xyzmodem::crc::crc16;

/// Glues a separate reader and writer into one duplex stream, the same way
/// two halves of a pair of pipes stand in for a serial link in these tests.
pub struct InOut<R: Read, W: Write> {
    r: R,
    w: W,
}

impl<R: Read, W: Write> InOut<R, W> {
    pub fn new(r: R, w: W) -> Self {
        InOut { r, w }
    }
}

impl<R: Read, W: Write> Read for InOut<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.r.read(buf)
    }
}

impl<R: Read, W: Write> Write for InOut<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }
}

/// A `Write` sink that appends into a buffer shared with the test, for
/// callbacks (like YMODEM's `on_file`) that must return an owned writer but
/// whose contents the test still needs to inspect afterward.
#[derive(Clone)]
pub struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        SharedBuf(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn take(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const ZPAD: u8 = b'*';
const ZDLE: u8 = 0x18;
const XON: u8 = 0x11;
const HEX: u8 = 0x42;
const BIN16: u8 = 0x41;

/// Escapes one raw byte for the wire, mirroring what `UNZDLE_TABLE` expects
/// on the decode side: the usual XON/XOFF/ZDLE control bytes, plus the two
/// rubout bytes `0x7f`/`0xff`.
fn escape(b: u8, out: &mut Vec<u8>) {
    match b {
        0x10 | 0x90 | 0x11 | 0x91 | 0x13 | 0x93 | ZDLE => {
            out.push(ZDLE);
            out.push(b ^ 0x40);
        }
        0x7f => {
            out.push(ZDLE);
            out.push(0x6c);
        }
        0xff => {
            out.push(ZDLE);
            out.push(0x6d);
        }
        _ => out.push(b),
    }
}

/// Builds a hex-encoded header frame, as a peer would send `ZRQINIT`/`ZEOF`.
pub fn hex_header(frame: u8, flags: [u8; 4]) -> Vec<u8> {
    let mut payload = [0u8; 5];
    payload[0] = frame;
    payload[1..].copy_from_slice(&flags);
    let crc = crc16(&payload, 0);

    let mut out = vec![ZPAD, ZPAD, ZDLE, HEX];
    out.extend(payload.iter().map(|b| format!("{b:02x}")).collect::<String>().into_bytes());
    out.extend(format!("{:04x}", crc).into_bytes());
    out.extend_from_slice(b"\r\n");
    if frame != 3 && frame != 8 {
        // ZACK and ZFIN suppress the trailing XON, same as the receiver's
        // own header encoder.
        out.push(XON);
    }
    out
}

/// Builds a binary-16 header frame, as a peer would send `ZFILE`/`ZDATA`.
pub fn bin16_header(frame: u8, flags: [u8; 4]) -> Vec<u8> {
    let mut payload = [0u8; 5];
    payload[0] = frame;
    payload[1..].copy_from_slice(&flags);
    let crc = crc16(&payload, 0);

    let mut out = vec![ZPAD, ZDLE, BIN16];
    for &b in &payload {
        escape(b, &mut out);
    }
    for &b in &crc.to_be_bytes() {
        escape(b, &mut out);
    }
    out
}

/// Builds a binary-16 data subpacket: escaped payload, `ZDLE <terminator>`,
/// then the CRC-16 over `payload ++ terminator`.
pub fn bin16_subpacket(payload: &[u8], terminator: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for &b in payload {
        escape(b, &mut out);
    }
    out.push(ZDLE);
    out.push(terminator);

    let mut with_terminator = payload.to_vec();
    with_terminator.push(terminator);
    let crc = crc16(&with_terminator, 0);
    for &b in &crc.to_be_bytes() {
        escape(b, &mut out);
    }
    out
}
