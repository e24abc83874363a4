// SPDX-License-Identifier: MIT OR Apache-2.0
//! XMODEM, XMODEM-CRC, XMODEM-1K, YMODEM and ZMODEM (receive-only) file
//! transfer protocols, driven over a caller-supplied byte channel rather
//! than any particular transport.
//!
//! Every protocol in this crate shares the same shape: construct it with
//! something implementing [`Channel`], then call `send`/`recv` (or the
//! `_bool`/`_count` wrappers for the traditional sentinel-value contract).
//! None of them own a thread, a timer, or a transport; every wait is a
//! bounded call into the channel.

pub mod channel;
pub mod consts;
pub mod crc;
pub mod error;
pub mod xmodem;
pub mod ymodem;
pub mod zmodem;

pub use channel::{Channel, IoChannel};
pub use error::{Error, Result};
pub use xmodem::Xmodem;
pub use ymodem::Ymodem;
pub use zmodem::Zmodem;
