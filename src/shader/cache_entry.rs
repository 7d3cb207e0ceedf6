// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! One persisted shader record.
//!
//! A [`ShaderCacheEntry`] holds the compiled bytecode for one shader variant, a CRC32
//! of that bytecode, and the vertex input layout the shader expects.
//!
//! # Record layout
//!
//! All integers are little-endian, 4 bytes wide.
//!
//! | Field                  | Size                 |
//! |------------------------|----------------------|
//! | key                    | 32                   |
//! | crc32 (`u32`)          | 4                    |
//! | element count (`i32`)  | 4                    |
//! | per element: name length (`i32`) + UTF-8 name, then semantic index, format, slot, aligned byte offset, classification, step rate (`i32` each) | 4 + name + 24 |
//! | bytecode length (`i32`)| 4                    |
//! | bytecode               | bytecode length      |
//!
//! Records carry no outer framing; a reader finds the end of a record from its own
//! length fields.
//!
//! # Life cycle
//!
//! Entries start [`EntryState::Uncompiled`] (no bytecode), become
//! [`EntryState::Compiled`] once bytecode is stored, and [`EntryState::Persisted`]
//! once written to or read from a cache file.

use crate::shader::wire::{Reader, Writer, str_len};
use crate::shader::{CacheKey, Crc32, Format, InputClassification, InputElementDescription};
use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes every record carries regardless of content: key, crc, element count,
/// bytecode length.
const FIXED_LEN: usize = CacheKey::LEN + 4 + 4 + 4;
/// Fixed integers per input element, after its name.
const ELEMENT_FIXED_LEN: usize = 6 * 4;

/// Process-wide, so no two entry contents ever share a revision.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// No bytecode yet.
    Uncompiled,
    /// Bytecode present, not yet written to disk.
    Compiled,
    /// Bytecode present and matching a cache file.
    Persisted,
}

/// A record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CorruptCacheEntryError {
    #[error("Record truncated: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("Negative {field} length {value}")]
    NegativeLength { field: &'static str, value: i32 },
    #[error("The {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
}

/// A record could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("Destination holds {available} bytes but {needed} are required")]
    DestinationTooSmall { needed: usize, available: usize },
    #[error("The {field} is {len} bytes long, which does not fit the record format")]
    TooLarge { field: &'static str, len: usize },
}

/// Stored bytecode no longer matches its checksum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Shader cache entry {key} failed its integrity check (stored crc {stored:#010x}, computed {computed:#010x})")]
pub struct StaleOrCorruptEntryError {
    pub key: CacheKey,
    pub stored: u32,
    pub computed: u32,
}

#[derive(Debug, Clone)]
pub struct ShaderCacheEntry {
    key: CacheKey,
    crc32: u32,
    input_elements: Vec<InputElementDescription>,
    bytecode: Option<Box<[u8]>>,
    persisted: bool,
    revision: u64,
}

impl ShaderCacheEntry {
    /// A fresh entry awaiting compilation.
    pub fn new(key: CacheKey, input_elements: Vec<InputElementDescription>) -> Self {
        Self {
            key,
            crc32: 0,
            input_elements,
            bytecode: None,
            persisted: false,
            revision: next_revision(),
        }
    }

    /// Assembles an entry from raw parts without recomputing the checksum.
    ///
    /// Empty bytecode is treated as absent.
    pub fn from_parts(
        key: CacheKey,
        crc32: u32,
        input_elements: Vec<InputElementDescription>,
        bytecode: Vec<u8>,
    ) -> Self {
        Self {
            key,
            crc32,
            input_elements,
            bytecode: if bytecode.is_empty() {
                None
            } else {
                Some(bytecode.into_boxed_slice())
            },
            persisted: false,
            revision: next_revision(),
        }
    }

    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn input_elements(&self) -> &[InputElementDescription] {
        &self.input_elements
    }

    pub fn set_input_elements(&mut self, input_elements: Vec<InputElementDescription>) {
        self.input_elements = input_elements;
        self.persisted = false;
        self.revision = next_revision();
    }

    pub fn bytecode(&self) -> Option<&[u8]> {
        self.bytecode.as_deref()
    }

    pub fn bytecode_len(&self) -> usize {
        self.bytecode.as_ref().map_or(0, |b| b.len())
    }

    pub fn state(&self) -> EntryState {
        match (&self.bytecode, self.persisted) {
            (None, _) => EntryState::Uncompiled,
            (Some(_), false) => EntryState::Compiled,
            (Some(_), true) => EntryState::Persisted,
        }
    }

    /// Takes ownership of freshly compiled bytecode and checksums it.
    ///
    /// Empty bytecode still moves the entry to [`EntryState::Compiled`], so a compiler
    /// that legitimately emits nothing is not asked again.  A record cannot tell empty
    /// bytecode from none, so such an entry reads back uncompiled and is never marked
    /// persisted.
    pub fn store_bytecode(&mut self, bytecode: Vec<u8>) {
        self.crc32 = Crc32::hash(&bytecode);
        self.bytecode = Some(bytecode.into_boxed_slice());
        self.persisted = false;
        self.revision = next_revision();
    }

    /// Records that the current bytecode is on disk.  No effect on entries without
    /// bytecode.
    pub fn mark_persisted(&mut self) {
        if self.bytecode_len() > 0 {
            self.persisted = true;
        }
    }

    /// Changes whenever the encoded content changes.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Releases the bytecode, returning the entry to [`EntryState::Uncompiled`].
    pub fn free(&mut self) {
        self.bytecode = None;
        self.crc32 = 0;
        self.persisted = false;
        self.revision = next_revision();
    }

    /// Checks the stored checksum against the bytecode.  Uncompiled entries pass.
    pub fn verify(&self) -> Result<(), StaleOrCorruptEntryError> {
        let Some(bytecode) = &self.bytecode else {
            return Ok(());
        };
        let computed = Crc32::hash(bytecode);
        if computed == self.crc32 {
            Ok(())
        } else {
            Err(StaleOrCorruptEntryError {
                key: self.key,
                stored: self.crc32,
                computed,
            })
        }
    }

    /// Exact size of the record `write` produces.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN
            + self
                .input_elements
                .iter()
                .map(|e| str_len(&e.semantic_name) + ELEMENT_FIXED_LEN)
                .sum::<usize>()
            + self.bytecode_len()
    }

    /// Encodes the record into the front of `dest`, returning the bytes written.
    pub fn write(&self, dest: &mut [u8]) -> Result<usize, EncodeError> {
        let needed = self.encoded_len();
        if dest.len() < needed {
            return Err(EncodeError::DestinationTooSmall {
                needed,
                available: dest.len(),
            });
        }
        let mut w = Writer::new(dest);
        w.bytes(self.key.as_bytes())?;
        w.u32(self.crc32)?;
        w.len("input element count", self.input_elements.len())?;
        for element in &self.input_elements {
            w.str("semantic name", &element.semantic_name)?;
            w.i32(element.semantic_index)?;
            w.i32(element.format.code())?;
            w.i32(element.slot)?;
            w.i32(element.aligned_byte_offset)?;
            w.i32(element.classification.code())?;
            w.i32(element.instance_data_step_rate)?;
        }
        w.len("bytecode", self.bytecode_len())?;
        if let Some(bytecode) = &self.bytecode {
            w.bytes(bytecode)?;
        }
        debug_assert_eq!(w.position(), needed);
        Ok(w.position())
    }

    /// Encodes the record into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Decodes one record from the front of `src`.
    ///
    /// Returns the entry, in [`EntryState::Persisted`] when it carries bytecode, and the
    /// number of bytes consumed.  The checksum is not verified; see [`Self::verify`].
    pub fn read(src: &[u8]) -> Result<(Self, usize), CorruptCacheEntryError> {
        let mut r = Reader::new(src);
        let key = CacheKey::from_bytes(r.key()?);
        let crc32 = r.u32()?;
        let count = r.len("input element count")?;
        // every element needs at least its fixed part; don't trust count for allocation
        let mut input_elements = Vec::with_capacity(count.min(src.len() / (4 + ELEMENT_FIXED_LEN)));
        for _ in 0..count {
            let semantic_name = r.string("semantic name")?;
            let semantic_index = r.i32()?;
            let format = Format::from_code(r.i32()?);
            let slot = r.i32()?;
            let aligned_byte_offset = r.i32()?;
            let classification = InputClassification::from_code(r.i32()?);
            let instance_data_step_rate = r.i32()?;
            input_elements.push(InputElementDescription {
                semantic_name,
                semantic_index,
                format,
                slot,
                aligned_byte_offset,
                classification,
                instance_data_step_rate,
            });
        }
        let len = r.len("bytecode")?;
        let bytecode = r.bytes(len)?;
        let mut entry = Self::from_parts(key, crc32, input_elements, bytecode.to_vec());
        entry.mark_persisted();
        Ok((entry, r.position()))
    }
}

/// Entries compare by encoded content; persistence state is ignored and empty
/// bytecode equals none.
impl PartialEq for ShaderCacheEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.crc32 == other.crc32
            && self.input_elements == other.input_elements
            && self.bytecode.as_deref().unwrap_or(&[]) == other.bytecode.as_deref().unwrap_or(&[])
    }
}

impl Eq for ShaderCacheEntry {}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_only(bytecode: Vec<u8>) -> ShaderCacheEntry {
        ShaderCacheEntry::from_parts(
            CacheKey::from_bytes([0; 32]),
            0,
            vec![InputElementDescription::new(
                "POSITION",
                0,
                Format::R32G32B32Float,
                0,
                0,
                InputClassification::PerVertex,
                0,
            )],
            bytecode,
        )
    }

    #[test]
    fn single_element_record() {
        let entry = position_only(vec![1, 2, 3, 4]);
        assert_eq!(entry.encoded_len(), 44 + (4 + 8) + 24 + 4);

        let bytes = entry.to_bytes().unwrap();
        assert_eq!(bytes.len(), 84);
        // key, then crc, then element count
        assert_eq!(&bytes[..32], &[0u8; 32]);
        assert_eq!(&bytes[32..36], &0u32.to_le_bytes());
        assert_eq!(&bytes[36..40], &1i32.to_le_bytes());
        assert_eq!(&bytes[40..44], &8i32.to_le_bytes());
        assert_eq!(&bytes[44..52], b"POSITION");
        assert_eq!(&bytes[56..60], &6i32.to_le_bytes());
        assert_eq!(&bytes[76..80], &4i32.to_le_bytes());
        assert_eq!(&bytes[80..], &[1u8, 2, 3, 4]);

        let (decoded, consumed) = ShaderCacheEntry::read(&bytes).unwrap();
        assert_eq!(consumed, 84);
        assert_eq!(decoded, entry);
        assert_eq!(decoded.state(), EntryState::Persisted);
    }

    #[test]
    fn uncompiled_entry_encodes_zero_length_bytecode() {
        let mut entry = position_only(Vec::new());
        entry.set_input_elements(Vec::new());
        assert_eq!(entry.state(), EntryState::Uncompiled);
        let bytes = entry.to_bytes().unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(&bytes[40..44], &0i32.to_le_bytes());
        let (decoded, _) = ShaderCacheEntry::read(&bytes).unwrap();
        assert_eq!(decoded.bytecode(), None);
        assert_eq!(decoded.state(), EntryState::Uncompiled);
    }

    #[test]
    fn encoded_len_counts_utf8_bytes() {
        let mut entry = position_only(vec![9; 3]);
        entry.set_input_elements(vec![InputElementDescription::per_vertex(
            "TÉXCOORD",
            1,
            Format::R32G32Float,
            InputElementDescription::APPEND_ALIGNED,
        )]);
        let bytes = entry.to_bytes().unwrap();
        assert_eq!(bytes.len(), entry.encoded_len());
        let (decoded, _) = ShaderCacheEntry::read(&bytes).unwrap();
        assert_eq!(decoded.input_elements()[0].semantic_name, "TÉXCOORD");
        assert_eq!(decoded.input_elements()[0].aligned_byte_offset, -1);
    }

    #[test]
    fn write_rejects_short_destination() {
        let entry = position_only(vec![1, 2, 3, 4]);
        let mut buf = vec![0u8; 83];
        assert_eq!(
            entry.write(&mut buf),
            Err(EncodeError::DestinationTooSmall {
                needed: 84,
                available: 83
            })
        );
    }

    #[test]
    fn write_into_larger_buffer_reports_record_size() {
        let entry = position_only(vec![1, 2, 3, 4]);
        let mut buf = vec![0xFFu8; 100];
        assert_eq!(entry.write(&mut buf), Ok(84));
        assert!(buf[84..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn read_rejects_bytecode_past_end() {
        let entry = position_only(vec![1, 2, 3, 4]);
        let bytes = entry.to_bytes().unwrap();
        let truncated = &bytes[..bytes.len() - 1];
        assert_eq!(
            ShaderCacheEntry::read(truncated),
            Err(CorruptCacheEntryError::Truncated {
                needed: 4,
                remaining: 3
            })
        );
    }

    #[test]
    fn read_rejects_negative_element_count() {
        let mut bytes = position_only(vec![1]).to_bytes().unwrap();
        bytes[36..40].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            ShaderCacheEntry::read(&bytes),
            Err(CorruptCacheEntryError::NegativeLength { value: -1, .. })
        ));
    }

    #[test]
    fn consecutive_records_decode_by_their_own_lengths() {
        let a = position_only(vec![1, 2]);
        let mut b = position_only(vec![3, 4, 5]);
        b.set_input_elements(Vec::new());
        let mut buf = a.to_bytes().unwrap();
        buf.extend(b.to_bytes().unwrap());

        let (first, used) = ShaderCacheEntry::read(&buf).unwrap();
        let (second, rest) = ShaderCacheEntry::read(&buf[used..]).unwrap();
        assert_eq!(first, a);
        assert_eq!(second, b);
        assert_eq!(used + rest, buf.len());
    }

    #[test]
    fn life_cycle() {
        let mut entry = ShaderCacheEntry::new(CacheKey::from_bytes([7; 32]), Vec::new());
        assert_eq!(entry.state(), EntryState::Uncompiled);
        entry.mark_persisted();
        assert_eq!(entry.state(), EntryState::Uncompiled);

        entry.store_bytecode(b"123456789".to_vec());
        assert_eq!(entry.state(), EntryState::Compiled);
        assert_eq!(entry.crc32(), 0xCBF4_3926);
        assert!(entry.verify().is_ok());

        entry.mark_persisted();
        assert_eq!(entry.state(), EntryState::Persisted);

        entry.free();
        assert_eq!(entry.state(), EntryState::Uncompiled);
        assert_eq!(entry.bytecode_len(), 0);
        entry.free();
        assert_eq!(entry.state(), EntryState::Uncompiled);
    }

    #[test]
    fn empty_bytecode_counts_as_compiled() {
        let mut entry = ShaderCacheEntry::new(CacheKey::from_bytes([3; 32]), Vec::new());
        entry.store_bytecode(Vec::new());
        assert_eq!(entry.state(), EntryState::Compiled);
        assert_eq!(entry.bytecode(), Some(&[][..]));
        assert!(entry.verify().is_ok());
        entry.mark_persisted();
        assert_eq!(entry.state(), EntryState::Compiled);

        let (decoded, _) = ShaderCacheEntry::read(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.state(), EntryState::Uncompiled);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn unknown_codes_equal_to_named_codes_round_trip() {
        let entry = ShaderCacheEntry::from_parts(
            CacheKey::from_bytes([0; 32]),
            0,
            vec![InputElementDescription::new(
                "POSITION",
                0,
                Format::Other(6),
                0,
                0,
                InputClassification::Other(0),
                0,
            )],
            vec![1, 2, 3, 4],
        );
        let (decoded, _) = ShaderCacheEntry::read(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.input_elements()[0].format, Format::R32G32B32Float);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn mutations_change_revision() {
        let mut entry = ShaderCacheEntry::new(CacheKey::from_bytes([5; 32]), Vec::new());
        let first = entry.revision();
        entry.store_bytecode(vec![1]);
        let second = entry.revision();
        assert_ne!(first, second);
        entry.mark_persisted();
        assert_eq!(entry.revision(), second);
        entry.set_input_elements(Vec::new());
        assert_ne!(entry.revision(), second);
    }

    #[test]
    fn verify_detects_mismatch() {
        let entry = position_only(vec![1, 2, 3, 4]);
        let err = entry.verify().unwrap_err();
        assert_eq!(err.stored, 0);
        assert_eq!(err.computed, Crc32::hash(&[1, 2, 3, 4]));
    }
}
