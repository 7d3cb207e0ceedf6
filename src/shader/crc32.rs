// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! IEEE CRC-32, as used by zip and png.
//!
//! The cache uses it as a cheap integrity check on stored bytecode; it is not a
//! substitute for the cache key hash.

/// Lookup table for the reflected IEEE polynomial.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let polynomial: u32 = 0xEDB8_8320;
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ polynomial;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Incremental CRC-32 calculator.
#[derive(Clone, Debug)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    #[inline]
    pub const fn new() -> Self {
        Self { crc: !0u32 }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let index = ((self.crc ^ byte as u32) & 0xFF) as usize;
            self.crc = (self.crc >> 8) ^ CRC32_TABLE[index];
        }
    }

    #[inline]
    pub fn finish(self) -> u32 {
        !self.crc
    }

    /// One-shot checksum.
    #[inline]
    pub fn hash(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finish()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
