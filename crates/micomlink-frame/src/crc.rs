//! CRC16 used by the micom firmware.
//!
//! Polynomial `0x1021`, MSB first, no reflection, no final XOR, processed one
//! bit at a time. With a zero seed this is CRC-16/XMODEM. The bit-serial form
//! is kept on purpose: it is what the firmware runs, and it must stay
//! bit-for-bit compatible.

use crate::error::{FrameError, Result};

/// Generator polynomial.
pub const POLYNOMIAL: u16 = 0x1021;

/// Compute the CRC16 of the first `length` bytes of `data`, starting from `seed`.
///
/// Fails with [`FrameError::InvalidLength`] when `length` exceeds `data.len()`.
pub fn compute(data: &[u8], length: usize, seed: u16) -> Result<u16> {
    let bytes = data.get(..length).ok_or(FrameError::InvalidLength {
        length,
        available: data.len(),
    })?;
    Ok(update(seed, bytes))
}

/// Fold `data` into a running CRC.
///
/// `update(update(seed, a), b)` equals `update(seed, a ++ b)`, so a frame can
/// be checksummed in pieces.
pub fn update(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}
