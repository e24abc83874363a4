// SPDX-License-Identifier: MIT OR Apache-2.0
//! Checksum and CRC codecs shared by every protocol in this crate.

use crc::{Crc, CRC_16_XMODEM, CRC_32_ISO_HDLC};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// 8-bit additive checksum, as used by classic XMODEM.
///
/// `seed` lets the checksum be extended incrementally:
/// `checksum(b, checksum(a, 0)) == checksum(a ++ b, 0)`.
#[must_use]
pub fn checksum(data: &[u8], seed: u8) -> u8 {
    data.iter().fold(seed, |sum, &byte| sum.wrapping_add(byte))
}

/// CRC-16/XMODEM (poly `0x1021`, init `0`, no reflection, no xorout).
#[must_use]
pub fn crc16(data: &[u8], seed: u16) -> u16 {
    let mut digest = CRC16.digest_with_initial(seed);
    digest.update(data);
    digest.finalize()
}

/// CRC-32/ISO-HDLC (zlib-compatible): reflected, init `0`, poly `0xEDB88320`.
#[must_use]
pub fn crc32(data: &[u8], seed: u32) -> u32 {
    let mut digest = CRC32.digest_with_initial(seed);
    digest.update(data);
    digest.finalize()
}

/// XMODEM trailer discipline: checksum (1 byte) or CRC-16 (2 bytes, BE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerMode {
    /// 8-bit additive checksum, one trailing byte.
    Checksum,
    /// CRC-16/XMODEM, two trailing bytes, big-endian.
    Crc,
}

impl TrailerMode {
    /// Number of trailing bytes this mode appends to a packet.
    #[must_use]
    pub const fn trailer_len(self) -> usize {
        match self {
            TrailerMode::Checksum => 1,
            TrailerMode::Crc => 2,
        }
    }

    /// Computes the trailer bytes for `payload`.
    #[must_use]
    pub fn trailer(self, payload: &[u8]) -> Vec<u8> {
        match self {
            TrailerMode::Checksum => vec![checksum(payload, 0)],
            TrailerMode::Crc => crc16(payload, 0).to_be_bytes().to_vec(),
        }
    }

    /// Validates and strips the trailer from `packet`, returning the payload.
    ///
    /// The original implementation sliced `[:-2]` for CRC mode and `[:-1]`
    /// for checksum mode from the *same* input inconsistently; this
    /// canonicalizes both paths against `trailer_len`.
    pub fn verify_trailer(self, packet: &[u8]) -> Option<&[u8]> {
        let trailer_len = self.trailer_len();
        if packet.len() < trailer_len {
            return None;
        }
        let (payload, trailer) = packet.split_at(packet.len() - trailer_len);
        if self.trailer(payload) == trailer {
            Some(payload)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_sum_mod_256() {
        let data = b"hello world";
        let expected = data.iter().fold(0u32, |acc, &b| acc + u32::from(b)) % 256;
        assert_eq!(u32::from(checksum(data, 0)), expected);
    }

    #[test]
    fn checksum_is_incremental() {
        let whole = checksum(b"helloworld", 0);
        let split = checksum(b"world", checksum(b"hello", 0));
        assert_eq!(whole, split);
    }

    #[test]
    fn crc16_hello() {
        assert_eq!(crc16(b"hello", 0), 0xD7A8);
    }

    #[test]
    fn crc16_is_incremental() {
        let whole = crc16(b"worldhello", 0);
        let split = crc16(b"hello", crc16(b"world", 0));
        assert_eq!(whole, split);
    }

    #[test]
    fn crc32_matches_zlib() {
        // crc32(b"123456789") == 0xCBF43926 is the standard check value for
        // CRC-32/ISO-HDLC (zlib-compatible).
        assert_eq!(crc32(b"123456789", 0), 0xCBF4_3926);
    }

    #[test]
    fn verify_trailer_roundtrip_crc() {
        let payload = b"abc123";
        let mut packet = payload.to_vec();
        packet.extend_from_slice(&TrailerMode::Crc.trailer(payload));
        assert_eq!(TrailerMode::Crc.verify_trailer(&packet), Some(&payload[..]));
    }

    #[test]
    fn verify_trailer_roundtrip_checksum() {
        let payload = b"abc123";
        let mut packet = payload.to_vec();
        packet.extend_from_slice(&TrailerMode::Checksum.trailer(payload));
        assert_eq!(
            TrailerMode::Checksum.verify_trailer(&packet),
            Some(&payload[..])
        );
    }

    #[test]
    fn verify_trailer_rejects_corruption() {
        let payload = b"abc123";
        let mut packet = payload.to_vec();
        packet.extend_from_slice(&TrailerMode::Crc.trailer(payload));
        let last = packet.len() - 1;
        packet[last] ^= 0xFF;
        assert_eq!(TrailerMode::Crc.verify_trailer(&packet), None);
    }
}
