// SPDX-License-Identifier: MIT OR Apache-2.0
//! The byte channel abstraction every protocol engine is driven through.

use std::io::{Read, Write};
use std::time::Duration;

/// A full-duplex byte channel with bounded, timing-out operations.
///
/// This is the one transport seam in the crate: callers hand in anything
/// that can attempt a timed read and a timed write, and the engines never
/// assume blocking vs. non-blocking semantics beyond what's documented here.
pub trait Channel {
    /// Attempts to read exactly `size` bytes within `timeout`.
    ///
    /// Returns `None` on timeout or if the peer produced fewer bytes than
    /// requested before giving up; never returns a short read as `Some`.
    fn get(&mut self, size: usize, timeout: Duration) -> Option<Vec<u8>>;

    /// Attempts to write all of `data` within `timeout`.
    ///
    /// Returns the number of bytes actually accepted, or `None` if nothing
    /// could be written.
    fn put(&mut self, data: &[u8], timeout: Duration) -> Option<usize>;

    /// Reads a single byte, or `None` on timeout.
    fn get_byte(&mut self, timeout: Duration) -> Option<u8> {
        self.get(1, timeout).map(|buf| buf[0])
    }

    /// Writes a single byte.
    fn put_byte(&mut self, byte: u8, timeout: Duration) -> Option<usize> {
        self.put(&[byte], timeout)
    }
}

/// Adapts any duplex [`Read`] + [`Write`] stream into a [`Channel`].
///
/// The wrapped stream is responsible for its own timeout configuration (a
/// serial port, a `TcpStream`, or a pipe with `O_NONBLOCK` handled upstream):
/// this adapter has no way to impose one after the fact, so `timeout` is
/// accepted for interface symmetry but not separately enforced here. This
/// mirrors how the underlying protocols were always meant to be used against
/// a pre-configured device.
pub struct IoChannel<T> {
    inner: T,
}

impl<T> IoChannel<T> {
    /// Wraps `inner` as a [`Channel`].
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Unwraps the adapter, returning the underlying stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> Channel for IoChannel<T> {
    fn get(&mut self, size: usize, _timeout: Duration) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; size];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Some(buf),
            Err(_) => None,
        }
    }

    fn put(&mut self, data: &[u8], _timeout: Duration) -> Option<usize> {
        match self.inner.write_all(data) {
            Ok(()) => Some(data.len()),
            Err(_) => None,
        }
    }
}
