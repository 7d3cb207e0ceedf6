// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Little-endian cursors for cache records.

Every integer on disk is 4 bytes little-endian; strings are an `i32` byte length
followed by UTF-8 with no terminator.
*/

use crate::shader::cache_entry::{CorruptCacheEntryError, EncodeError};

pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let end = self.pos + data.len();
        let available = self.buf.len();
        let dest = self
            .buf
            .get_mut(self.pos..end)
            .ok_or(EncodeError::DestinationTooSmall {
                needed: end,
                available,
            })?;
        dest.copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    pub(crate) fn u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn i32(&mut self, value: i32) -> Result<(), EncodeError> {
        self.bytes(&value.to_le_bytes())
    }

    /// A length field; must fit in an `i32`.
    pub(crate) fn len(&mut self, field: &'static str, len: usize) -> Result<(), EncodeError> {
        let value = i32::try_from(len).map_err(|_| EncodeError::TooLarge { field, len })?;
        self.i32(value)
    }

    pub(crate) fn str(&mut self, field: &'static str, value: &str) -> Result<(), EncodeError> {
        self.len(field, value.len())?;
        self.bytes(value.as_bytes())
    }
}

/// Encoded size of a length-prefixed string.
pub(crate) fn str_len(value: &str) -> usize {
    4 + value.len()
}

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], CorruptCacheEntryError> {
        let remaining = self.buf.len() - self.pos;
        if len > remaining {
            return Err(CorruptCacheEntryError::Truncated {
                needed: len,
                remaining,
            });
        }
        let buf: &'a [u8] = self.buf;
        let data = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(data)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CorruptCacheEntryError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn key(&mut self) -> Result<[u8; 32], CorruptCacheEntryError> {
        self.array::<32>()
    }

    pub(crate) fn u32(&mut self) -> Result<u32, CorruptCacheEntryError> {
        Ok(u32::from_le_bytes(self.array::<4>()?))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, CorruptCacheEntryError> {
        Ok(i32::from_le_bytes(self.array::<4>()?))
    }

    /// A length field; negative values are corruption.
    pub(crate) fn len(&mut self, field: &'static str) -> Result<usize, CorruptCacheEntryError> {
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| CorruptCacheEntryError::NegativeLength { field, value })
    }

    pub(crate) fn string(&mut self, field: &'static str) -> Result<String, CorruptCacheEntryError> {
        let len = self.len(field)?;
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| CorruptCacheEntryError::InvalidUtf8 { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reports_short_destination() {
        let mut buf = [0u8; 6];
        let mut writer = Writer::new(&mut buf);
        writer.u32(1).unwrap();
        assert_eq!(
            writer.u32(2),
            Err(EncodeError::DestinationTooSmall {
                needed: 8,
                available: 6
            })
        );
        assert_eq!(writer.position(), 4);
    }

    #[test]
    fn reader_rejects_overlong_string() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10i32.to_le_bytes());
        buf.extend_from_slice(b"abc");
        let mut reader = Reader::new(&buf);
        assert_eq!(
            reader.string("semantic name"),
            Err(CorruptCacheEntryError::Truncated {
                needed: 10,
                remaining: 3
            })
        );
    }

    #[test]
    fn reader_rejects_negative_length() {
        let buf = (-4i32).to_le_bytes();
        let mut reader = Reader::new(&buf);
        assert_eq!(
            reader.len("bytecode"),
            Err(CorruptCacheEntryError::NegativeLength {
                field: "bytecode",
                value: -4
            })
        );
    }
}
