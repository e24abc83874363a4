// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drives [`Zmodem::recv`] against a hand-built peer script instead of a
//! real ZMODEM sender, since this crate never implements the send side.

mod support;

use std::fs;
use std::io::Write;
use std::time::Duration;

use tempfile::tempdir;

use support::{bin16_header, bin16_subpacket, hex_header, InOut};
use xyzmodem::channel::IoChannel;
use xyzmodem::Zmodem;

const ZRQINIT: u8 = 0;
const ZFILE: u8 = 4;
const ZFIN: u8 = 8;
const ZDATA: u8 = 10;
const ZEOF: u8 = 11;

const ZCRCW: u8 = 0x6b;

/// The single-file receive in the spec's concrete scenario: `ZRQINIT`,
/// `ZFILE` + metadata subpacket terminated by `ZCRCW` (receiver ACKs before
/// `ZRPOS(0)`), `ZDATA(0)` + one 6-byte data subpacket, `ZEOF(6)`, `ZFIN`,
/// `OO`.
#[test]
fn recv_single_file() {
    let mut peer = Vec::new();
    peer.extend(hex_header(ZRQINIT, [0; 4]));
    peer.extend(bin16_header(ZFILE, [0; 4]));
    peer.extend(bin16_subpacket(b"bar.txt\x006 12345\x00", ZCRCW));
    peer.extend(bin16_header(ZDATA, [0, 0, 0, 0]));
    peer.extend(bin16_subpacket(b"foobar", ZCRCW));
    peer.extend(hex_header(ZEOF, [6, 0, 0, 0]));
    peer.extend(hex_header(ZFIN, [0; 4]));
    peer.extend_from_slice(b"OO");

    let (to_receiver_rx, mut to_receiver_tx) = os_pipe::pipe().unwrap();
    let (from_receiver_rx, from_receiver_tx) = os_pipe::pipe().unwrap();
    to_receiver_tx.write_all(&peer).unwrap();
    drop(to_receiver_tx);

    let channel = IoChannel::new(InOut::new(to_receiver_rx, from_receiver_tx));
    let mut zmodem = Zmodem::new(channel);
    let dir = tempdir().unwrap();

    let count = zmodem
        .recv(dir.path(), 16, Duration::from_secs(5), Duration::from_millis(1))
        .unwrap();
    assert_eq!(count, 1);

    let received = fs::read(dir.path().join("bar.txt")).unwrap();
    assert_eq!(received, b"foobar");

    drop(from_receiver_rx);
}

/// A peer that only ever sends garbage exhausts the header-CRC retry budget
/// and comes back as `NegotiationFailed` rather than hanging.
#[test]
fn recv_gives_up_after_retry_budget() {
    let (to_receiver_rx, to_receiver_tx) = os_pipe::pipe().unwrap();
    drop(to_receiver_tx);
    let (from_receiver_rx, from_receiver_tx) = os_pipe::pipe().unwrap();

    let channel = IoChannel::new(InOut::new(to_receiver_rx, from_receiver_tx));
    let mut zmodem = Zmodem::new(channel);
    let dir = tempdir().unwrap();

    let result = zmodem.recv(dir.path(), 5, Duration::from_secs(5), Duration::from_millis(1));
    assert!(result.is_err());
    drop(from_receiver_rx);
}
